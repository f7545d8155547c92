// src/recipe/kitchen/fetch.rs

//! Network access for listing pages and source downloads
//!
//! `http(s)://` URLs go through a blocking reqwest client; `file://` URLs are
//! read from the local filesystem so mirrors and fixtures work offline.
//! Failures are reported once and never retried.

use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Retrieves remote content for the kitchen and livecheck
pub trait Fetcher: Send + Sync {
    /// Fetch a page as text
    fn fetch_text(&self, url: &str) -> Result<String>;

    /// Download `url` into `dest`, replacing any existing file
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Local path for a `file://` URL
fn local_path(url: &str) -> Option<PathBuf> {
    url.strip_prefix("file://").map(PathBuf::from)
}

/// HTTP client wrapper
pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("bindcook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            show_progress,
        })
    }

    fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::DownloadError(format!("Failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::DownloadError(format!(
                "Failed to fetch {url}: HTTP {}",
                response.status()
            )));
        }
        Ok(response)
    }

    fn progress_bar(&self, total_size: u64, display_name: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            if let Ok(style) = ProgressStyle::with_template(
                "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
            ) {
                pb.set_style(style.progress_chars("=> "));
            }
            pb
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_message(display_name.to_string());
        Some(pb)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String> {
        if let Some(path) = local_path(url) {
            return fs::read_to_string(&path)
                .map_err(|e| Error::DownloadError(format!("Failed to read {}: {}", path.display(), e)));
        }

        info!("Fetching {}", url);
        self.get(url)?
            .text()
            .map_err(|e| Error::DownloadError(format!("Failed to read response from {url}: {e}")))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(path) = local_path(url) {
            debug!("Copying {} to {}", path.display(), dest.display());
            fs::copy(&path, dest).map_err(|e| {
                Error::DownloadError(format!("Failed to copy {}: {}", path.display(), e))
            })?;
            return Ok(());
        }

        let response = self.get(url)?;
        let total_size = response.content_length().unwrap_or(0);
        let display_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| url.to_string());

        let mut file = File::create(dest)
            .map_err(|e| Error::IoError(format!("Failed to create {}: {}", dest.display(), e)))?;
        let progress = self.progress_bar(total_size, &display_name);
        let downloaded = stream_response_to_file(response, &mut file, progress.as_ref())?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        debug!("Downloaded {} bytes from {}", downloaded, url);
        Ok(())
    }
}

/// Stream an HTTP response to a file, never buffering the whole body
fn stream_response_to_file(
    mut response: Response,
    file: &mut File,
    progress_bar: Option<&ProgressBar>,
) -> Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Error::DownloadError(format!("Failed to read response: {e}")))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| Error::IoError(format!("Failed to write data: {e}")))?;

        downloaded += bytes_read as u64;

        if let Some(pb) = progress_bar {
            pb.set_position(downloaded);
        }
    }

    Ok(downloaded)
}
