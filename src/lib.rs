// SPDX-License-Identifier: MPL-2.0
//! `remote_image` binds asynchronous network-image retrieval to a UI target.
//!
//! The core of the crate is [`binding::ImageBinding`], which tracks at most one
//! in-flight retrieval per content channel, discards results that arrive for a
//! resource the target no longer wants, and exposes advisory cancellation.
//! Fetching, caching and decoding live behind the [`loader::ResourceLoader`]
//! trait; [`http::HttpLoader`] is the bundled implementation.

#![doc(html_root_url = "https://docs.rs/remote_image/0.1.0")]

pub mod binding;
pub mod cache;
pub mod error;
pub mod http;
pub mod image_data;
pub mod loader;
pub mod options;
pub mod resource;
pub mod status;

pub use binding::{Channel, ImageBinding, ImageTarget};
pub use error::{LoadError, Result};
pub use image_data::ImageData;
pub use loader::{CacheOrigin, LoadOutcome, ResourceLoader, TaskHandle};
pub use options::LoadOptions;
pub use resource::Resource;
