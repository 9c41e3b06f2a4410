// SPDX-License-Identifier: MPL-2.0
//! Default [`ResourceLoader`] backed by `reqwest` and the in-memory cache.
//!
//! Each retrieval runs on a spawned tokio task: memory cache lookup first
//! (unless a refresh is forced), then a streamed fetch with cumulative
//! progress callbacks and a cancellation check between chunks, then a decode
//! on the blocking pool.

use crate::cache::{CacheConfig, ImageMemoryCache};
use crate::error::{LoadError, Result};
use crate::image_data::ImageData;
use crate::loader::{
    is_cancelled, CacheOrigin, CancellationToken, CompletionCallback, LoadOutcome,
    ProgressCallback, ResourceLoader, TaskHandle,
};
use crate::options::LoadOptions;
use crate::resource::Resource;
use crate::status;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex};

const USER_AGENT: &str = concat!("remote_image/", env!("CARGO_PKG_VERSION"));

/// HTTP image loader with an in-memory decode cache.
pub struct HttpLoader {
    client: reqwest::Client,
    cache: Arc<Mutex<ImageMemoryCache>>,
}

impl HttpLoader {
    /// Creates a loader with the given cache configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Network`] if the HTTP client cannot be built.
    pub fn new(cache_config: CacheConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LoadError::Network(e.to_string()))?;

        Ok(Self {
            client,
            cache: Arc::new(Mutex::new(ImageMemoryCache::new(cache_config))),
        })
    }

    /// Creates a loader with the default cache configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Network`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(CacheConfig::default())
    }

    /// Looks up a cached decode for `resource` without fetching.
    #[must_use]
    pub fn cached(&self, resource: &Resource) -> Option<ImageData> {
        self.lock_cache().get(resource.cache_key())
    }

    /// Stores a decode under the resource's cache key, e.g. to seed the
    /// cache with locally produced images.
    pub fn store_in_cache(&self, resource: &Resource, image: ImageData) {
        self.lock_cache().insert(resource.cache_key().to_string(), image);
    }

    /// Snapshot of the cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.lock_cache().stats()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ImageMemoryCache> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResourceLoader for HttpLoader {
    /// # Panics
    ///
    /// Must be called from within a tokio runtime; the retrieval is spawned
    /// onto it.
    fn retrieve(
        &self,
        resource: Resource,
        options: LoadOptions,
        mut on_progress: ProgressCallback,
        on_complete: CompletionCallback,
    ) -> TaskHandle {
        let handle = TaskHandle::new();
        let token = handle.token().expect("fresh task handle carries a token");
        let client = self.client.clone();
        let cache = Arc::clone(&self.cache);

        tokio::spawn(async move {
            let outcome =
                match run_retrieval(client, cache, &resource, &options, &token, &mut on_progress)
                    .await
                {
                    Ok((image, origin)) => LoadOutcome::success(image, origin, resource),
                    Err(error) => {
                        log::debug!("retrieval of {} failed: {error}", resource.url());
                        LoadOutcome::failure(error, resource)
                    }
                };
            on_complete(outcome);
        });

        handle
    }
}

async fn run_retrieval(
    client: reqwest::Client,
    cache: Arc<Mutex<ImageMemoryCache>>,
    resource: &Resource,
    options: &LoadOptions,
    token: &CancellationToken,
    on_progress: &mut ProgressCallback,
) -> Result<(ImageData, CacheOrigin)> {
    if is_cancelled(token) {
        return Err(LoadError::Cancelled);
    }

    if !options.wants_refresh() {
        let cached = cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(resource.cache_key());
        if let Some(image) = cached {
            return Ok((image, CacheOrigin::Memory));
        }
    }

    let body = fetch_body(&client, resource, options, token, on_progress).await?;

    if is_cancelled(token) {
        return Err(LoadError::Cancelled);
    }

    let image = tokio::task::spawn_blocking(move || ImageData::from_encoded(&body))
        .await
        .map_err(|e| LoadError::Io(format!("decode task failed: {e}")))??;

    if options.wants_caching() {
        cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(resource.cache_key().to_string(), image.clone());
    }

    Ok((image, CacheOrigin::None))
}

/// Streams the response body, reporting cumulative progress per chunk and
/// honoring the cancellation token between chunks.
async fn fetch_body(
    client: &reqwest::Client,
    resource: &Resource,
    options: &LoadOptions,
    token: &CancellationToken,
    on_progress: &mut ProgressCallback,
) -> Result<Vec<u8>> {
    let response = client
        .get(resource.url())
        .timeout(options.timeout())
        .send()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;

    let code = response.status().as_u16();
    if !status::is_success(code) {
        return Err(LoadError::Http { code });
    }

    let total_size = response.content_length().unwrap_or(0);
    // Trust the announced length for preallocation only up to a sane bound.
    let mut body: Vec<u8> = Vec::with_capacity(total_size.min(16 * 1024 * 1024) as usize);
    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        if is_cancelled(token) {
            return Err(LoadError::Cancelled);
        }
        let chunk = chunk.map_err(|e| LoadError::Network(e.to_string()))?;
        body.extend_from_slice(&chunk);
        downloaded += chunk.len() as u64;
        on_progress(downloaded, total_size);
    }

    Ok(body)
}
