//! Content management backend adapter.
//!
//! Implements the [`release::ContentStore`] trait over the content management
//! HTTP API: entries, assets, and releases of one space environment.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. URL layout,
//! authentication, media types, status mapping, and the JSON wire format live
//! here; the [`release`] crate never sees them.
//!
//! ## Failure handling
//!
//! Every call is a single request with the configured timeout. There is no
//! retry: `404` on an entry or asset becomes [`release::ContentError::NotFound`],
//! `409` on a release update becomes [`release::ContentError::Conflict`], and
//! every other non-success status becomes [`release::ContentError::Api`].

pub mod client;
pub mod wire;

pub use client::{ContentfulClient, ContentfulSettings, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use wire::NamedResource;
