//! # HTTP Source
//!
//! Reads an HTTP(S) resource through the disk cache. The resource is probed
//! when the source is created; the actual byte pipeline is chosen on the
//! first read and never revisited:
//!
//! - a completed cache entry that the server confirms with `304 Not Modified`
//!   is read straight from disk,
//! - otherwise the body is fetched, gunzipped when the content type says so,
//!   and teed into a staging file that is committed to the cache once the
//!   consumer has read it to the end.
//!
//! If that first decision fails, every later read repeats the failure
//! without touching the network again.

use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;

use flate2::read::GzDecoder;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{
    CONTENT_DISPOSITION, CONTENT_LENGTH, HeaderMap, IF_MODIFIED_SINCE, IF_NONE_MATCH,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::Source;
use crate::cache::{CacheEntry, CacheManager, StagedDownload, extract_cache_headers};
use crate::client::HttpClients;
use crate::paths::sanitize_filename;
use crate::tee::{OnTeeClose, TeeReader, TeeSummary};
use crate::ReaderError;

const DEFAULT_FILENAME: &str = "download";

type Body = Box<dyn Read + Send>;

enum Pipeline {
    Unestablished,
    DirectCache(File),
    FreshTeed(TeeReader<Body, File>),
    FreshPlain(Body),
    Failed(io::ErrorKind, String),
    Closed,
}

/// HTTP(S) source with conditional revalidation against the disk cache
pub struct HttpSource {
    url: Url,
    filename: String,
    total_size: Option<u64>,
    client: Client,
    cache: Option<Arc<CacheManager>>,
    pipeline: Pipeline,
    from_cache: bool,
}

impl HttpSource {
    /// Check that `url` exists and capture its filename and size.
    ///
    /// A HEAD request is tried first; if it cannot be sent at all the probe
    /// falls back to a GET whose body is discarded. Any non-success status
    /// fails with [`ReaderError::UrlNotFound`].
    #[instrument(skip(clients, cache), level = "debug")]
    pub fn probe(
        url: &str,
        clients: &HttpClients,
        cache: Option<Arc<CacheManager>>,
    ) -> Result<Self, ReaderError> {
        let parsed =
            Url::parse(url).map_err(|e| ReaderError::UrlError(format!("{url}: {e}")))?;

        let response = match clients.probe.head(parsed.clone()).send() {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "HEAD probe failed, retrying with GET");
                clients.probe.get(parsed.clone()).send()?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ReaderError::UrlNotFound {
                url: url.to_string(),
                status,
            });
        }

        let filename = content_disposition_filename(response.headers())
            .or_else(|| filename_from_url(&parsed))
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let total_size = content_length(response.headers());

        info!(url = %parsed, filename = %filename, size = ?total_size, "Probed HTTP source");

        Ok(Self {
            url: parsed,
            filename,
            total_size,
            client: clients.transfer.clone(),
            cache,
            pipeline: Pipeline::Unestablished,
            from_cache: false,
        })
    }

    fn not_found(&self, status: StatusCode) -> ReaderError {
        ReaderError::UrlNotFound {
            url: self.url.to_string(),
            status,
        }
    }

    /// Decide where the bytes come from. Runs once, on the first read.
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    fn establish(&mut self) -> Result<(), ReaderError> {
        let cached = self
            .cache
            .as_ref()
            .and_then(|cache| cache.get(self.url.as_str()))
            .filter(|entry| entry.completed && entry.has_validators());

        if let Some(entry) = cached {
            let response = self.conditional_get(&entry)?;
            let status = response.status();

            if status == StatusCode::NOT_MODIFIED {
                if self.adopt_cached(&entry) {
                    return Ok(());
                }
            } else if status.is_success() {
                debug!(url = %self.url, "Cached content is stale, refreshing");
                return self.establish_fresh(response);
            } else {
                return Err(self.not_found(status));
            }
        }

        info!(url = %self.url, "Fetching content");
        let response = self.client.get(self.url.clone()).send()?;
        if !response.status().is_success() {
            return Err(self.not_found(response.status()));
        }
        self.establish_fresh(response)
    }

    fn conditional_get(&self, entry: &CacheEntry) -> Result<Response, ReaderError> {
        let mut request = self.client.get(self.url.clone());
        if !entry.etag.is_empty() {
            request = request.header(IF_NONE_MATCH, &entry.etag);
        }
        if !entry.last_modified.is_empty() {
            request = request.header(IF_MODIFIED_SINCE, &entry.last_modified);
        }

        debug!(url = %self.url, etag = %entry.etag, last_modified = %entry.last_modified, "Revalidating cache entry");
        Ok(request.send()?)
    }

    /// Switch to reading the cached artifact. Returns `false` if the file
    /// is gone, in which case the caller fetches again.
    fn adopt_cached(&mut self, entry: &CacheEntry) -> bool {
        let Some(cache) = self.cache.as_ref() else {
            return false;
        };

        match cache.open_existing(entry) {
            Ok(file) => {
                info!(url = %self.url, path = ?entry.path, "Content not modified, serving from cache");
                self.filename = entry.filename.clone();
                if entry.size > 0 {
                    self.total_size = Some(entry.size);
                }
                self.from_cache = true;
                self.pipeline = Pipeline::DirectCache(file);
                true
            }
            Err(e) => {
                warn!(url = %self.url, path = ?entry.path, error = %e, "Cached file unavailable, fetching again");
                false
            }
        }
    }

    fn establish_fresh(&mut self, response: Response) -> Result<(), ReaderError> {
        let (etag, last_modified, content_type) = extract_cache_headers(&response);

        let mut staged = match &self.cache {
            Some(cache) => match cache.begin_staging(self.url.as_str()) {
                Ok(staged) => Some((Arc::clone(cache), staged)),
                Err(e) => {
                    warn!(url = %self.url, error = %e, "Could not stage cache entry, continuing uncached");
                    None
                }
            },
            None => None,
        };

        let body: Body = if content_type.as_deref().is_some_and(is_gzip_content_type) {
            let decoder = GzDecoder::new(response);
            let Some(header) = decoder.header() else {
                if let Some((cache, StagedDownload { path, file })) = staged.take() {
                    drop(file);
                    cache.discard_staging(&path);
                }
                return Err(ReaderError::Decode(format!(
                    "{}: missing or malformed gzip header",
                    self.url
                )));
            };

            if let Some(name) = header
                .filename()
                .and_then(|raw| sanitize_filename(&String::from_utf8_lossy(raw)))
            {
                debug!(filename = %name, "Using filename embedded in gzip header");
                self.filename = name;
            }
            // The declared length is that of the compressed body
            self.total_size = None;
            Box::new(GzipBody(decoder))
        } else {
            Box::new(response)
        };

        self.pipeline = match staged {
            Some((cache, StagedDownload { path, file })) => {
                let url = self.url.to_string();
                let filename = self.filename.clone();
                let etag = etag.unwrap_or_default();
                let last_modified = last_modified.unwrap_or_default();

                let on_close: OnTeeClose = Box::new(move |summary: TeeSummary| {
                    if !summary.complete {
                        debug!(url = %url, written = summary.written, "Transfer incomplete, dropping staged copy");
                        cache.discard_staging(&path);
                        return;
                    }
                    if let Err(e) = cache.commit(
                        &url,
                        &path,
                        &filename,
                        &etag,
                        &last_modified,
                        summary.written,
                    ) {
                        warn!(url = %url, error = %e, "Failed to commit cache entry");
                    }
                });
                Pipeline::FreshTeed(TeeReader::new(body, file, on_close))
            }
            None => Pipeline::FreshPlain(body),
        };

        Ok(())
    }
}

impl Read for HttpSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Pipeline::Unestablished = self.pipeline {
            if let Err(e) = self.establish() {
                self.pipeline = Pipeline::Failed(e.io_kind(), e.to_string());
                return Err(e.into());
            }
        }

        match &mut self.pipeline {
            Pipeline::DirectCache(file) => file.read(buf),
            Pipeline::FreshTeed(tee) => tee.read(buf),
            Pipeline::FreshPlain(body) => body.read(buf),
            Pipeline::Failed(kind, message) => Err(io::Error::new(
                *kind,
                format!("{}: not established: {message}", self.url),
            )),
            Pipeline::Unestablished | Pipeline::Closed => Ok(0),
        }
    }
}

impl Source for HttpSource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    fn close(&mut self) -> Result<(), ReaderError> {
        if let Pipeline::FreshTeed(mut tee) = std::mem::replace(&mut self.pipeline, Pipeline::Closed)
        {
            tee.close()?;
        }
        Ok(())
    }

    fn served_from_cache(&self) -> bool {
        self.from_cache
    }
}

/// Gzip decoder whose corruption errors surface as [`ReaderError::Decode`]
struct GzipBody<R>(GzDecoder<R>);

impl<R: Read> Read for GzipBody<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
                ReaderError::Decode(e.to_string()).into()
            }
            _ => e,
        })
    }
}

fn is_gzip_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("application/gzip") || content_type.contains("application/x-gzip")
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// `filename*=` (RFC 5987) wins over `filename=`
fn content_disposition_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;

    let mut plain = None;
    let mut extended = None;
    for param in value.split(';').map(str::trim) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename" => plain = Some(raw.trim()),
            "filename*" => {
                extended = raw
                    .trim()
                    .split_once("''")
                    .map(|(_, name)| name)
                    .or(Some(raw.trim()))
            }
            _ => {}
        }
    }

    extended
        .and_then(sanitize_filename)
        .or_else(|| plain.and_then(sanitize_filename))
}

/// Last non-empty path segment, then the host name
fn filename_from_url(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .and_then(sanitize_filename)
        .or_else(|| url.host_str().and_then(sanitize_filename))
}
