use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for gitrip
#[derive(Parser, Debug, Clone)]
#[command(name = "gitrip")]
#[command(
    about = "A simple cli for downloading a subset of files or directories from a git repo"
)]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Address of the git repo to download from
    #[arg(short, long, value_name = "URL")]
    pub remote: String,

    /// Files or directories to download (comma separated or repeated)
    #[arg(
        short,
        long,
        value_name = "PATTERN",
        value_delimiter = ',',
        num_args = 1..,
        required = true
    )]
    pub paths: Vec<String>,

    /// Tree (branch, tag or commit) to download files/directories from
    #[arg(short, long, value_name = "REF", visible_alias = "revision")]
    pub tree: String,

    /// Destination to download files/directories to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub dest: PathBuf,

    /// Clone into a fresh temporary directory instead of the persistent cache
    #[arg(short, long)]
    pub ephemeral: bool,

    /// Enable verbose logging output and show git's own diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Root of the persistent clone cache
    #[arg(long, value_name = "DIR", env = "GITRIP_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Abort any single git invocation running longer than this
    #[arg(long, value_name = "SECONDS", env = "GITRIP_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Settings file path
    #[arg(long, value_name = "PATH", env = "GITRIP_CONFIG")]
    pub config: Option<PathBuf>,
}
