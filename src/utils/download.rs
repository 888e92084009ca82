use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::blocking::Client;
use std::fs::File;
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("unsupported url scheme \"{0}\"")]
    UnsupportedScheme(String),
    #[error("\"{0}\" does not name a local file")]
    InvalidFileUrl(String),
    #[error("could not read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },
}

/// Moves the body behind a URL into a writer.
pub trait Transport: Sync {
    /// Streams the content at `url` into `out`, returning the number of bytes written.
    fn fetch(&self, url: &Url, out: &mut dyn Write) -> Result<u64, FetchError>;
}

/// Plain GET over `reqwest`, plus `file://` for locally staged content.
///
/// Progress bars of concurrent fetches are stacked on one shared stderr target.
pub struct HttpTransport {
    client: Client,
    bars: Option<MultiProgress>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        let bars = config
            .show_progress
            .then(|| MultiProgress::with_draw_target(ProgressDrawTarget::stderr()));

        Ok(Self { client, bars })
    }

    fn fetch_http(&self, url: &Url, out: &mut dyn Write) -> Result<u64, FetchError> {
        tracing::debug!(%url, "GET");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let pb = self.progress_bar(resp.content_length());
        let mut reader = pb.wrap_read(resp);
        let copied = io::copy(&mut reader, out);
        self.clear(&pb);
        let written = copied.map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(%url, bytes = written, "download complete");
        Ok(written)
    }

    fn progress_bar(&self, total_size: Option<u64>) -> ProgressBar {
        let Some(bars) = &self.bars else {
            return ProgressBar::hidden();
        };

        let pb = bars.add(ProgressBar::with_draw_target(total_size, ProgressDrawTarget::hidden()));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }

    fn clear(&self, pb: &ProgressBar) {
        pb.finish_and_clear();
        if let Some(bars) = &self.bars {
            bars.remove(pb);
        }
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &Url, out: &mut dyn Write) -> Result<u64, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url, out),
            "file" => fetch_file(url, out),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn fetch_file(url: &Url, out: &mut dyn Write) -> Result<u64, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|_| FetchError::InvalidFileUrl(url.to_string()))?;
    tracing::debug!(path = %path.display(), "reading local file");

    let io_err = |source| FetchError::Io {
        url: url.to_string(),
        source,
    };
    let mut file = File::open(&path).map_err(io_err)?;
    io::copy(&mut file, out).map_err(io_err)
}
