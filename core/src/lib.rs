//! Blocking API client and scenario suite for the PetFriends pet service.
//!
//! # Overview
//! `PetFriendsClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). `PetFriends`
//! pairs it with a `Transport` and exposes one method per endpoint, each
//! returning the raw `(status, body)` envelope. The `scenarios` module holds
//! the checks run against a live service, and `suite` runs and reports them.
//!
//! # Design
//! - `PetFriendsClient` is stateless; it holds only `base_url`.
//! - Failure statuses are data, never errors. `ApiError` is reserved for
//!   requests that never produced a status.
//! - DTOs are defined independently from the mock server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod scenarios;
pub mod suite;
pub mod transport;
pub mod types;

pub use api::PetFriends;
pub use client::PetFriendsClient;
pub use config::{Fixtures, Settings};
pub use error::{ApiError, ConfigError, ScenarioError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody};
pub use response::{ApiResponse, ResponseBody};
pub use suite::{run_suite, Expectation, Outcome, Scenario, SuiteReport};
pub use transport::{Transport, UreqTransport};
pub use types::{Credentials, Pet, PetFields, PetFilter, PhotoUpload};
