// Remote image downloads for large icons and big-picture notifications
// Images are fetched once per URL into temp files and reused until they age out.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tempfile::NamedTempFile;
use url::Url;

use crate::components::{PushError, PushResult};

/// Cached image entry with TTL tracking
#[derive(Debug, Clone)]
struct CachedImage {
    path: PathBuf,
    cached_at: Instant,
}

/// Cache TTL: 1 hour
const CACHE_TTL_SECS: u64 = 3600;

/// Maximum cache entries before forced eviction
const MAX_CACHE_ENTRIES: usize = 100;

/// Refuse anything larger than 10MB
const MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;

/// Parse `source` as an http(s) URL, or None for anything else
pub fn remote_url(source: &str) -> Option<Url> {
    if !(source.starts_with("http://") || source.starts_with("https://")) {
        return None;
    }
    Url::parse(source).ok()
}

/// Downloads and caches images. Owned by the renderer; dropped caches leave their files
/// behind until `cleanup_all` runs.
pub struct ImageFetcher {
    client: reqwest::Client,
    cache: DashMap<String, CachedImage>,
}

impl ImageFetcher {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> PushResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .user_agent(concat!("push-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PushError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }

    /// Evict stale entries from cache (TTL expired or over size limit)
    fn evict_stale_entries(&self) {
        let now = Instant::now();
        let ttl = Duration::from_secs(CACHE_TTL_SECS);

        self.cache.retain(|_, entry| {
            let is_valid = now.duration_since(entry.cached_at) < ttl;
            if !is_valid {
                let _ = std::fs::remove_file(&entry.path);
            }
            is_valid
        });

        while self.cache.len() > MAX_CACHE_ENTRIES {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|entry| entry.cached_at)
                .map(|entry| entry.key().clone());

            match oldest.and_then(|key| self.cache.remove(&key)) {
                Some((_, entry)) => {
                    let _ = std::fs::remove_file(&entry.path);
                },
                None => break,
            }
        }
    }

    /// Download `url` to a local file, reusing a cached copy when one is still fresh
    pub async fn fetch(&self, url: &Url) -> PushResult<PathBuf> {
        let url_string = url.to_string();
        let failure = |message: String| PushError::NetworkFailure {
            url: url_string.clone(),
            message,
        };

        self.evict_stale_entries();

        if let Some(cached) = self.cache.get(&url_string) {
            if cached.path.exists() {
                return Ok(cached.path.clone());
            }
            drop(cached);
            self.cache.remove(&url_string);
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| failure(format!("Failed to download image: {}", e)))?;

        if !response.status().is_success() {
            return Err(failure(format!("HTTP {} downloading image", response.status())));
        }

        if let Some(size) = response.content_length()
            && size > MAX_IMAGE_SIZE
        {
            return Err(failure(format!(
                "Image too large: {} bytes exceeds {} byte limit",
                size, MAX_IMAGE_SIZE
            )));
        }

        let extension = image_extension(url, response.headers());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| failure(format!("Failed to read image bytes: {}", e)))?;

        if bytes.len() < 8 {
            return Err(failure("Downloaded image is too small to be valid".to_string()));
        }

        let temp_file = NamedTempFile::with_suffix(format!(".{}", extension))
            .map_err(|e| failure(format!("Failed to create temp file: {}", e)))?;

        let temp_path = temp_file.path().to_path_buf();
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| failure(format!("Failed to write temp file: {}", e)))?;

        let persisted_path = temp_file
            .into_temp_path()
            .keep()
            .map_err(|e| failure(format!("Failed to persist temp file: {}", e)))?;

        self.cache.insert(
            url_string.clone(),
            CachedImage {
                path: persisted_path.clone(),
                cached_at: Instant::now(),
            },
        );

        tracing::debug!("Downloaded image {} -> {:?}", url_string, persisted_path);
        Ok(persisted_path)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Remove every downloaded file and forget the cache
    pub fn cleanup_all(&self) {
        for entry in self.cache.iter() {
            if let Err(e) = std::fs::remove_file(&entry.value().path) {
                tracing::debug!("Failed to cleanup cached image {:?}: {}", entry.value().path, e);
            }
        }
        self.cache.clear();
    }
}

const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/bmp", "bmp"),
];

/// Suffix for the temp file: the URL's own extension if it has a short one, else one
/// derived from Content-Type, else png
fn image_extension(url: &Url, headers: &reqwest::header::HeaderMap) -> String {
    let from_path = std::path::Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| (1..=4).contains(&ext.len()))
        .map(str::to_ascii_lowercase);
    if let Some(ext) = from_path {
        return ext;
    }

    let content_type = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    MIME_EXTENSIONS
        .iter()
        .find(|(mime, _)| content_type.starts_with(*mime))
        .map_or("png", |(_, ext)| *ext)
        .to_string()
}
