use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, warn};
use unifetch_engine::{CacheConfig, CacheManager, Reader, ReaderConfig, ReaderFactory, Scheme};

use crate::error::AppError;
use crate::utils::format_bytes;
use crate::utils::progress::DownloadProgress;

/// Where fetched content goes
#[derive(Debug, Clone, Copy)]
pub enum Output<'a> {
    Directory(&'a Path),
    Stdout,
}

/// Turn a command-line input into a URI. Plain paths become `file://` URIs;
/// anything that looks like a URI is passed through untouched so unknown
/// schemes are still reported as such.
pub fn normalize_input(input: &str) -> String {
    if ReaderFactory::detect_scheme(input).is_ok() || input.contains("://") {
        input.to_string()
    } else {
        format!("file://{input}")
    }
}

/// Opens readers, building the HTTP side only once it is first needed
struct Session<'a> {
    config: &'a ReaderConfig,
    factory: Option<ReaderFactory>,
}

impl Session<'_> {
    fn open(&mut self, uri: &str) -> Result<Reader, AppError> {
        if ReaderFactory::detect_scheme(uri)? == Scheme::File {
            return Ok(Reader::with_config(uri, self.config)?);
        }

        let factory = match self.factory.take() {
            Some(factory) => factory,
            None => ReaderFactory::with_config(self.config.clone())?,
        };
        let reader = factory.open(uri);
        self.factory = Some(factory);
        Ok(reader?)
    }
}

/// Fetch every input in order, stopping at the first failure
pub fn process_inputs(
    inputs: &[String],
    output: Output<'_>,
    config: &ReaderConfig,
    show_progress: bool,
) -> Result<(), AppError> {
    let inputs_len = inputs.len();
    info!(
        inputs_count = inputs_len,
        "Starting processing of {} input{}",
        inputs_len,
        if inputs_len == 1 { "" } else { "s" }
    );

    if let Output::Directory(dir) = output {
        fs::create_dir_all(dir)?;
    }

    let mut session = Session {
        config,
        factory: None,
    };

    for input in inputs {
        let uri = normalize_input(input);
        let mut reader = session.open(&uri)?;

        match output {
            Output::Stdout => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                let bytes = io::copy(&mut reader, &mut lock)?;
                lock.flush()?;
                reader.close()?;
                info!(input = %input, size = %format_bytes(bytes), "Printed");
            }
            Output::Directory(dir) => fetch_to_dir(input, &mut reader, dir, show_progress)?,
        }
    }

    Ok(())
}

fn fetch_to_dir(
    input: &str,
    reader: &mut Reader,
    dir: &Path,
    show_progress: bool,
) -> Result<(), AppError> {
    let name = reader.filename().unwrap_or_default().to_string();
    let progress = DownloadProgress::new(&name, reader.total_size(), show_progress);

    match reader.stream_to_file_with_progress(dir, |done, total| progress.update(done, total)) {
        Ok((path, bytes)) => {
            progress.finish(format!("Saved {}", path.display()));
            info!(
                input = %input,
                path = %path.display(),
                size = %format_bytes(bytes),
                from_cache = reader.served_from_cache(),
                "Fetched"
            );
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            if let Some(staging) = &e.staging_path {
                warn!(path = %staging.display(), bytes = e.bytes_written, "Partial download left in place");
            }
            Err(AppError::Fetch {
                input: input.to_string(),
                source: e,
            })
        }
    }
}

/// Print every cache entry, one per line
pub fn list_cache(cache_dir: &Path) -> Result<(), AppError> {
    let cache = CacheManager::new(&CacheConfig::new(cache_dir))?;
    let entries = cache.entries();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in &entries {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            entry.url,
            entry.filename,
            format_bytes(entry.size),
            if entry.etag.is_empty() { "-" } else { entry.etag.as_str() }
        )?;
    }
    out.flush()?;

    info!(root = %cache.root().display(), entries = entries.len(), "Listed cache");
    Ok(())
}
