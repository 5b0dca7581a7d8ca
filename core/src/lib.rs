//! Typed client for the LinguaTech learning-management backend.
//!
//! # Overview
//! Three layers, each usable on its own:
//! - `ResourceClient<R>` builds `HttpRequest` values and parses
//!   `HttpResponse` values without touching the network, so request shapes
//!   are testable in isolation.
//! - `ApiClient` executes requests through a pluggable `Transport`, attaches
//!   the bearer token and maps failures to `ApiError`. `ResourceApi<R>` runs
//!   the six standard operations of a resource through it.
//! - `QueryClient` adds a shared `QueryCache` on top: keyed reads with
//!   in-flight deduplication and a read retry policy, and writes that
//!   invalidate the keys they make stale.
//!
//! # Design
//! - Every backend entity is a type implementing `Resource`; its path
//!   segment doubles as the root of its cache keys.
//! - DTOs carry their constraints as `validator` derives and are checked
//!   before a request is built.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod abort;
pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod queries;
pub mod resource;
pub mod resources;
pub mod transport;
pub mod types;
pub mod validation;

pub use abort::{AbortController, AbortSignal};
pub use api::{ApiClient, ApiResponse, RequestOptions};
pub use auth::{LoginRequest, MemoryTokenStore, TokenPair, TokenStore};
pub use cache::{QueryCache, QueryKey};
pub use client::ResourceClient;
pub use config::{CacheConfig, ClientConfig, RetryPolicy};
pub use error::ApiError;
pub use http::{Body, HttpMethod, HttpRequest, HttpResponse, Multipart};
pub use queries::{QueryClient, QueryOptions, QueryState, ResourceQueries};
pub use resource::{Resource, ResourceApi};
pub use transport::{Transport, UreqTransport};
pub use types::{Envelope, ErrorEnvelope, ListParams, PageRequest, Paginated};
pub use validation::{ensure_valid, parse_validated};
