// SPDX-License-Identifier: MPL-2.0
//! The contract between the binding layer and whatever performs the actual
//! fetch, cache lookup and decode.

use crate::error::LoadError;
use crate::image_data::ImageData;
use crate::options::LoadOptions;
use crate::resource::Resource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation token shared between a task handle and the running task.
pub type CancellationToken = Arc<AtomicBool>;

/// Checks if the cancellation token has been triggered.
#[inline]
#[must_use]
pub fn is_cancelled(token: &CancellationToken) -> bool {
    token.load(Ordering::SeqCst)
}

/// Progress callback: `(received_bytes, total_bytes)`. Total is 0 when the
/// server did not announce a content length.
pub type ProgressCallback = Box<dyn FnMut(u64, u64) + Send + 'static>;

/// Completion callback, invoked exactly once per retrieval.
pub type CompletionCallback = Box<dyn FnOnce(LoadOutcome) + Send + 'static>;

/// Where a completed load's image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheOrigin {
    /// Fetched from the network (or no image was produced at all).
    #[default]
    None,
    /// Served from the in-memory cache.
    Memory,
}

/// Everything a completion callback learns about a finished load.
///
/// This is deliberately not a `Result`: the absent-resource path completes
/// with all four fields empty, and a failed load still carries the resolved
/// resource so callers can tell which request failed.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub image: Option<ImageData>,
    pub error: Option<LoadError>,
    pub cache_origin: CacheOrigin,
    pub resource: Option<Resource>,
}

impl LoadOutcome {
    /// The outcome delivered when no resource was requested.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn success(image: ImageData, cache_origin: CacheOrigin, resource: Resource) -> Self {
        Self {
            image: Some(image),
            error: None,
            cache_origin,
            resource: Some(resource),
        }
    }

    #[must_use]
    pub fn failure(error: LoadError, resource: Resource) -> Self {
        Self {
            image: None,
            error: Some(error),
            cache_origin: CacheOrigin::None,
            resource: Some(resource),
        }
    }
}

/// Advisory-cancel handle for an outstanding retrieval.
///
/// Cloneable so the binding can keep one copy per channel while returning
/// another to the caller. Cancelling is best-effort: a task past the point
/// where the token is checked still delivers its completion, which the
/// binding then filters by staleness.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    token: Option<CancellationToken>,
}

impl TaskHandle {
    /// Creates a live handle with a fresh cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Some(Arc::new(AtomicBool::new(false))),
        }
    }

    /// The inert handle returned when no work was started.
    #[must_use]
    pub fn empty() -> Self {
        Self { token: None }
    }

    /// Requests cancellation. Never blocks; a no-op on an empty handle.
    pub fn cancel(&self) {
        if let Some(token) = &self.token {
            token.store(true, Ordering::SeqCst);
        }
    }

    /// Whether cancellation has been requested. Always false for an empty
    /// handle.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.token.as_ref().is_some_and(is_cancelled)
    }

    /// The shared token, for loader tasks that poll it. `None` on an empty
    /// handle.
    #[must_use]
    pub fn token(&self) -> Option<CancellationToken> {
        self.token.clone()
    }
}

/// Performs the fetch + cache + decode for a resource.
///
/// Implementations run the retrieval on their own scheduling (worker tasks,
/// thread pools) and may invoke the callbacks from any context, but never
/// re-entrantly from within `retrieve` itself: the binding layer holds its
/// channel lock across the call, and a synchronous callback would deadlock
/// on it. `on_progress` may fire any number of times before `on_complete`,
/// which fires exactly once.
pub trait ResourceLoader: Send + Sync {
    fn retrieve(
        &self,
        resource: Resource,
        options: LoadOptions,
        on_progress: ProgressCallback,
        on_complete: CompletionCallback,
    ) -> TaskHandle;
}
