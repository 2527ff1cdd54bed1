//! # Catalog API Module
//!
//! Typed access to the remote item catalog.
//!
//! ## Components
//!
//! - [`CatalogApi`] - the capability every other module depends on
//! - [`HttpCatalogClient`] - `reqwest` implementation against the HTTP API
//! - [`InMemoryCatalog`] - in-process implementation for offline mode and tests
//! - [`mod@model`] - request/response bodies
//!
//! The API is treated as the authority over which items exist and which are
//! selected. Order is mirrored locally (see [`crate::persist`]).

mod client;
mod error;
pub mod memory;
pub mod model;

pub use client::{CatalogApi, HttpCatalogClient};
pub use error::ApiError;
pub use memory::{InMemoryCatalog, Operation, RecordedCall};
pub use model::{Item, ItemId, ItemsPage, OrderSnapshot, PageQuery, SelectedPage};
