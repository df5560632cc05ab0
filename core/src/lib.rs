//! Client core for the property listing admin console.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, which keeps the listing state machine, the forms
//! and the request mapping fully deterministic and testable.
//!
//! # Design
//! - `ApiClient` holds `base_url` and an explicit `Session`; the bearer token
//!   is attached to every request built while the session holds one.
//! - `QueryState` is a plain value updated by a pure reducer; the
//!   `ListingController` tags each fetch with a sequence number and only
//!   commits the response of the latest one.
//! - Forms (`LoginForm`, `RegisterForm`, `PropertyForm`) validate locally and
//!   produce requests; field errors never reach the network.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod assets;
pub mod auth;
pub mod client;
pub mod error;
pub mod form;
pub mod http;
pub mod listing;
pub mod query;
pub mod session;
pub mod types;

pub use assets::AssetUrls;
pub use auth::{LoginForm, RegisterForm};
pub use client::ApiClient;
pub use error::{ApiError, FieldErrors, FormError};
pub use form::{FormMode, Preview, PropertyForm, PropertyFields};
pub use http::{FileUpload, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use listing::{Confirm, FetchOutcome, ListingController, PendingDelete, PendingFetch, RequestSeq};
pub use query::{QueryAction, QueryState};
pub use session::{FileTokenStore, MemoryTokenStore, Session, StoreError, TokenStore};
pub use types::{
    AuthToken, Page, PerPage, Property, PropertyDetail, PropertyId, PropertyImage, PropertyStatus,
    PropertyType, SortBy, SortOrder,
};
