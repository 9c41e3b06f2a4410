// SPDX-License-Identifier: MPL-2.0
//! Identification of remote resources.

use serde::{Deserialize, Serialize};

/// Identifies a remote image: where to fetch it and how to key it in caches.
///
/// Staleness detection in the binding layer compares download URLs: a
/// completion is applied to the target only while its URL still equals the
/// URL most recently requested for the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    url: String,
    cache_key: String,
}

impl Resource {
    /// Creates a resource whose cache key is its URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let cache_key = url.clone();
        Self { url, cache_key }
    }

    /// Creates a resource with an explicit cache key, for URLs that embed
    /// volatile parts (signed query parameters and the like).
    #[must_use]
    pub fn with_cache_key(url: impl Into<String>, cache_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_key: cache_key.into(),
        }
    }

    /// The download URL; also the staleness identity of this resource.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The key under which a decode of this resource is cached.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }
}
