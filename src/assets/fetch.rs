use std::{io::Read as _, path::Path, time::Duration};

use anyhow::Context as _;
use rayon::prelude::*;

use crate::{
    assets::decode::{DecodedImage, decode_image},
    foundation::error::{AdreelError, AdreelResult},
    scene::model::ImageSource,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Network and IO limits for image retrieval.
pub struct FetchOpts {
    /// Upper bound for one remote retrieval, connect through last body byte.
    #[serde(with = "secs_f64")]
    pub timeout: Duration,
    /// Largest accepted payload in bytes.
    pub max_bytes: u64,
    /// Maximum number of concurrent retrievals per job.
    pub concurrency: usize,
    /// `User-Agent` header sent with remote requests.
    pub user_agent: String,
}

impl Default for FetchOpts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_bytes: 32 * 1024 * 1024,
            concurrency: 4,
            user_agent: concat!("adreel/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

mod secs_f64 {
    use std::time::Duration;

    pub(super) fn serialize<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs: f64 = serde::Deserialize::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Resolves [`ImageSource`]s into validated [`DecodedImage`]s.
///
/// Fallback contract: [`Fetcher::fetch`] never fails. Any retrieval, content-type, size,
/// decode or shape problem is logged and replaced by [`DecodedImage::fallback`], so one bad
/// source cannot abort a video. [`Fetcher::try_fetch`] exposes the underlying
/// [`AdreelError::Fetch`] for callers that want it.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::blocking::Client,
    opts: FetchOpts,
}

impl Fetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(opts: FetchOpts) -> AdreelResult<Self> {
        if opts.concurrency == 0 {
            return Err(AdreelError::config("fetch concurrency must be >= 1"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(opts.timeout)
            .connect_timeout(opts.timeout)
            .user_agent(opts.user_agent.clone())
            .build()
            .map_err(|e| AdreelError::config(format!("failed to build http client: {e}")))?;
        Ok(Self { client, opts })
    }

    /// Options this fetcher was built with.
    pub fn opts(&self) -> &FetchOpts {
        &self.opts
    }

    /// Resolve `source`, substituting the fallback image on any failure.
    pub fn fetch(&self, source: &ImageSource) -> DecodedImage {
        match self.try_fetch(source) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(source = %source, error = %e, "image unavailable; using fallback");
                DecodedImage::fallback()
            }
        }
    }

    /// Resolve `source`, reporting the failure instead of substituting.
    pub fn try_fetch(&self, source: &ImageSource) -> AdreelResult<DecodedImage> {
        let bytes = match source {
            ImageSource::Local(path) => self.read_local(path)?,
            ImageSource::Remote(url) => self.read_remote(url)?,
        };
        let img = decode_image(&bytes)?;
        tracing::debug!(
            source = %source,
            width = img.width,
            height = img.height,
            channels = img.channel_count,
            "decoded image"
        );
        Ok(img)
    }

    /// Resolve all sources on a bounded worker pool; output order matches `sources`.
    pub fn fetch_all(&self, sources: &[ImageSource]) -> Vec<DecodedImage> {
        let workers = self.opts.concurrency.min(sources.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("adreel-fetch-{i}"))
            .build();
        match pool {
            Ok(pool) => pool.install(|| sources.par_iter().map(|s| self.fetch(s)).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "fetch pool unavailable; fetching sequentially");
                sources.iter().map(|s| self.fetch(s)).collect()
            }
        }
    }

    fn read_local(&self, path: &Path) -> AdreelResult<Vec<u8>> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("stat image '{}'", path.display()))
            .map_err(|e| AdreelError::fetch(format!("{e:#}")))?;
        if !meta.is_file() {
            return Err(AdreelError::fetch(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }
        if meta.len() > self.opts.max_bytes {
            return Err(AdreelError::fetch(format!(
                "'{}' is {} bytes (limit {})",
                path.display(),
                meta.len(),
                self.opts.max_bytes
            )));
        }
        std::fs::read(path)
            .with_context(|| format!("read image '{}'", path.display()))
            .map_err(|e| AdreelError::fetch(format!("{e:#}")))
    }

    fn read_remote(&self, url: &reqwest::Url) -> AdreelResult<Vec<u8>> {
        let resp = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "image/*,*/*;q=0.8")
            .send()
            .map_err(|e| AdreelError::fetch(format!("GET {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AdreelError::fetch(format!("GET {url}: status {status}")));
        }

        if let Some(ct) = resp.headers().get(reqwest::header::CONTENT_TYPE) {
            let ct = ct.to_str().unwrap_or_default();
            if !is_image_content_type(ct) {
                return Err(AdreelError::fetch(format!(
                    "GET {url}: unsupported content type '{ct}'"
                )));
            }
        }

        if let Some(len) = resp.content_length()
            && len > self.opts.max_bytes
        {
            return Err(AdreelError::fetch(format!(
                "GET {url}: body is {len} bytes (limit {})",
                self.opts.max_bytes
            )));
        }

        let mut bytes = Vec::new();
        resp.take(self.opts.max_bytes + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| AdreelError::fetch(format!("GET {url}: reading body: {e}")))?;
        if bytes.len() as u64 > self.opts.max_bytes {
            return Err(AdreelError::fetch(format!(
                "GET {url}: body exceeds {} bytes",
                self.opts.max_bytes
            )));
        }
        Ok(bytes)
    }
}

/// Accept `image/*` and generic binary types; the bytes are sniffed before decoding anyway.
pub(crate) fn is_image_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.is_empty()
        || essence.starts_with("image/")
        || essence == "application/octet-stream"
        || essence == "binary/octet-stream"
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
