// SPDX-License-Identifier: MPL-2.0
//! Per-load options and process-wide defaults.
//!
//! Every field is optional so a caller can override just the keys it cares
//! about; [`LoadOptions::merged_with`] resolves a call's options against the
//! process-wide defaults with the caller's keys taking precedence.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;

/// Hard default for the per-request fetch timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Keep whatever the target currently shows instead of applying the
    /// placeholder while the load is in flight.
    #[serde(default)]
    pub keep_current_while_loading: Option<bool>,

    /// Skip the memory cache and always hit the network.
    #[serde(default)]
    pub force_refresh: Option<bool>,

    /// Store successful decodes in the memory cache.
    #[serde(default)]
    pub cache_images: Option<bool>,

    /// Per-request fetch timeout in seconds. Enforced by the loader, never
    /// by the binding layer.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl LoadOptions {
    /// Merges `self` over `defaults`: keys set on `self` win, unset keys
    /// fall back to the defaults.
    #[must_use]
    pub fn merged_with(&self, defaults: &LoadOptions) -> LoadOptions {
        LoadOptions {
            keep_current_while_loading: self
                .keep_current_while_loading
                .or(defaults.keep_current_while_loading),
            force_refresh: self.force_refresh.or(defaults.force_refresh),
            cache_images: self.cache_images.or(defaults.cache_images),
            timeout_secs: self.timeout_secs.or(defaults.timeout_secs),
        }
    }

    #[must_use]
    pub fn keep_current(&self) -> bool {
        self.keep_current_while_loading.unwrap_or(false)
    }

    #[must_use]
    pub fn wants_refresh(&self) -> bool {
        self.force_refresh.unwrap_or(false)
    }

    #[must_use]
    pub fn wants_caching(&self) -> bool {
        self.cache_images.unwrap_or(true)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

static DEFAULT_OPTIONS: RwLock<LoadOptions> = RwLock::new(LoadOptions {
    keep_current_while_loading: None,
    force_refresh: None,
    cache_images: None,
    timeout_secs: None,
});

/// Returns a snapshot of the process-wide default options.
#[must_use]
pub fn default_options() -> LoadOptions {
    DEFAULT_OPTIONS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Replaces the process-wide default options.
pub fn set_default_options(options: LoadOptions) {
    *DEFAULT_OPTIONS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = options;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_caller_keys() {
        let defaults = LoadOptions {
            keep_current_while_loading: Some(true),
            timeout_secs: Some(10),
            ..Default::default()
        };
        let call = LoadOptions {
            keep_current_while_loading: Some(false),
            ..Default::default()
        };

        let merged = call.merged_with(&defaults);
        assert_eq!(merged.keep_current_while_loading, Some(false));
        assert_eq!(merged.timeout_secs, Some(10));
    }

    #[test]
    fn merge_of_empty_options_is_defaults() {
        let defaults = LoadOptions {
            force_refresh: Some(true),
            cache_images: Some(false),
            ..Default::default()
        };
        let merged = LoadOptions::default().merged_with(&defaults);
        assert_eq!(merged, defaults);
    }

    #[test]
    fn resolved_getters_have_hard_defaults() {
        let opts = LoadOptions::default();
        assert!(!opts.keep_current());
        assert!(!opts.wants_refresh());
        assert!(opts.wants_caching());
        assert_eq!(opts.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
