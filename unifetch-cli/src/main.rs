use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use error::AppError;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use unifetch_engine::ReaderConfig;
use unifetch_engine::proxy::{ProxyConfig, ProxyType};

mod cli;
mod error;
mod processor;
mod utils;

use cli::CliArgs;
use processor::Output;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        // Log the full error for debugging
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) -> Result<(), AppError> {
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Logs go to stderr so `--print` output stays clean
    let result = match &args.log_file {
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_writer(MakeWriterExt::and(std::io::stderr, Arc::new(log_file)))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    result.map_err(|e| AppError::Initialization(e.to_string()))
}

fn proxy_type(name: &str) -> Result<ProxyType, AppError> {
    match name {
        "http" => Ok(ProxyType::Http),
        "https" => Ok(ProxyType::Https),
        "all" => Ok(ProxyType::All),
        _ => Err(AppError::InvalidInput(format!(
            "Invalid proxy type: '{name}'"
        ))),
    }
}

fn reader_config(args: &CliArgs) -> Result<ReaderConfig, AppError> {
    let mut builder = ReaderConfig::builder()
        .with_probe_timeout(Duration::from_secs(args.probe_timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_headers(utils::parse_headers(&args.headers));

    builder = if args.no_cache {
        info!("Disk cache disabled (--no-cache flag)");
        builder.with_caching_enabled(false)
    } else {
        builder.with_cache_dir(&args.cache_dir)
    };

    if let Some(user_agent) = &args.user_agent {
        builder = builder.with_user_agent(user_agent);
    }

    builder = if args.no_proxy {
        info!("All proxy settings disabled (--no-proxy flag)");
        builder.with_system_proxy(false)
    } else if let Some(proxy_url) = &args.proxy {
        let proxy_type = proxy_type(&args.proxy_type)?;
        info!(proxy_url = %proxy_url, proxy_type = ?proxy_type, "Using explicit proxy configuration");
        builder.with_proxy(ProxyConfig::new(proxy_url, proxy_type))
    } else {
        builder.with_system_proxy(true)
    };

    Ok(builder.build())
}

fn bootstrap() -> Result<(), AppError> {
    // Parse command-line arguments
    let args = CliArgs::parse();
    init_logging(&args)?;

    if args.list_cache {
        return processor::list_cache(&args.cache_dir);
    }

    let config = reader_config(&args)?;
    let output = if args.print {
        Output::Stdout
    } else {
        Output::Directory(&args.output_dir)
    };

    processor::process_inputs(&args.input, output, &config, !args.no_progress)
}
