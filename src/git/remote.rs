//! Remote URL handling
//!
//! Derives the `{owner, project}` pair that keys the persistent cache from
//! the remote URLs git understands.

use crate::error::FetchError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `scheme://[user@]host[:port]/path[?query][#fragment]`
static URL_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://(?:[^@/]*@)?[^/?#]*(?P<path>/[^?#]*)?")
        .expect("URL-style remote pattern is valid")
});

/// `[user@]host:path`, the scp-like syntax git accepts for SSH
static SCP_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/:]+@)?[^@/:]+:(?P<path>[^?#]*)")
        .expect("scp-style remote pattern is valid")
});

/// Owner and project named by a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCoordinates {
    pub owner: String,
    pub project: String,
}

impl RemoteCoordinates {
    /// Parse a remote URL
    ///
    /// The last two path segments become owner and project; a trailing
    /// `.git` is dropped from the project.
    ///
    /// # Errors
    ///
    /// Returns `RemoteUrlUnparseable` if:
    /// - The URL matches neither the URL-style nor the scp-style syntax
    /// - The path holds fewer than two segments
    /// - A segment would escape the cache root (`.` or `..`)
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let url = url.trim();
        let path = URL_STYLE
            .captures(url)
            .map(|caps| caps.name("path").map_or("", |m| m.as_str()))
            .or_else(|| {
                SCP_STYLE
                    .captures(url)
                    .and_then(|caps| caps.name("path").map(|m| m.as_str()))
            })
            .ok_or_else(|| {
                FetchError::remote_url(url, "expected user@host:owner/repo or scheme://host/owner/repo")
            })?;

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let [.., owner, project] = segments.as_slice() else {
            return Err(FetchError::remote_url(
                url,
                "the path must contain at least an owner and a project segment",
            ));
        };

        let owner = *owner;
        let project = project.strip_suffix(".git").unwrap_or(*project);
        for segment in [owner, project] {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(FetchError::remote_url(
                    url,
                    format!("'{segment}' is not a usable owner or project name"),
                ));
            }
        }

        Ok(Self {
            owner: owner.to_owned(),
            project: project.to_owned(),
        })
    }

    /// Location of this remote's mirror under `cache_root`
    #[must_use]
    pub fn cache_path(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(&self.owner).join(&self.project)
    }
}
