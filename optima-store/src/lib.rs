//! Optima content-store client
//!
//! Talks to the content-store HTTP API to swap the bytes behind an existing
//! asset. The transport is injected so the whole protocol runs against a
//! mock in tests.

pub mod client;
pub mod config;
pub mod http;
pub mod strategy;
pub mod types;

pub use client::ContentStoreClient;
pub use config::{StoreConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
pub use http::ReqwestTransport;
pub use strategy::{
    AssetReplacer, CreateAndDelete, ReplaceInPlace, ReplacementPolicy, ReplacementStrategy,
    ReplacementStrategyParseError,
};
