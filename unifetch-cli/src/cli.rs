use clap::Parser;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "Fetch local files and HTTP(S) resources through a disk cache",
    long_about = "Copies file://, http:// and https:// resources into a directory.\n\
                  \n\
                  HTTP content is kept in a local cache and revalidated with the server\n\
                  (ETag / Last-Modified) on later runs, so unchanged resources are not\n\
                  downloaded twice. Gzip payloads are decompressed on the fly and existing\n\
                  files are never overwritten: name collisions get a _1, _2, ... suffix."
)]
pub struct CliArgs {
    /// Inputs to fetch
    #[arg(
        required_unless_present = "list_cache",
        help = "file://, http:// or https:// URIs, or plain local paths"
    )]
    pub input: Vec<String>,

    /// Output directory for fetched files
    #[arg(
        short,
        long,
        default_value = ".",
        help = "Directory where fetched files will be saved"
    )]
    pub output_dir: PathBuf,

    /// Disk cache directory
    #[arg(
        long,
        default_value = ".cache",
        help = "Directory holding the HTTP cache and its index"
    )]
    pub cache_dir: PathBuf,

    /// Disable the disk cache
    #[arg(long, help = "Do not read from or write to the HTTP cache")]
    pub no_cache: bool,

    /// Write content to stdout
    #[arg(long, help = "Stream content to stdout instead of saving it to a file")]
    pub print: bool,

    /// List cache entries
    #[arg(long, help = "Print the entries of the HTTP cache and exit")]
    pub list_cache: bool,

    /// Custom HTTP headers for requests
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Proxy URL (e.g., "http://proxy.example.com:8080")
    #[arg(
        long,
        help = "Proxy server URL (e.g., \"http://proxy.example.com:8080\")"
    )]
    pub proxy: Option<String>,

    /// Proxy type (http, https, all)
    #[arg(
        long,
        default_value = "all",
        help = "Which requests go through the proxy (http, https, all)",
        value_parser = ["http", "https", "all"]
    )]
    pub proxy_type: String,

    /// Disable all proxy settings
    #[arg(long, help = "Disable all proxy settings (including system proxy)")]
    pub no_proxy: bool,

    /// User agent
    #[arg(long, help = "User agent sent with HTTP requests")]
    pub user_agent: Option<String>,

    /// Probe timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Timeout in seconds for the initial existence check of HTTP resources"
    )]
    pub probe_timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "15",
        help = "Connection timeout in seconds for the actual transfer"
    )]
    pub connect_timeout: u64,

    /// Hide progress bars
    #[arg(long, help = "Do not show progress bars")]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Log file
    #[arg(long, help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,
}
