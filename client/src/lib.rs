//! Typed client for the TubeGenie content API.
//!
//! Layers, bottom-up: [`schema`] contracts, the [`transport`] seam, one
//! service per resource in [`services`], and the cached [`query`] layer
//! exposed through [`ApiClient`].

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod services;
pub mod transport;

pub use auth::{
    inspect_token, BearerToken, EnvTokenSource, SessionUser, StaticTokenSource, TokenSource,
};
pub use client::ApiClient;
pub use config::Config;
pub use error::{Error, Result, ValidationError, ValidationIssue};
pub use query::{
    Mutation, MutationCallbacks, MutationKind, Query, QueryCache, QueryFamily, QueryKey,
    QueryOptions, QueryState,
};
pub use schema::{Envelope, Schema, Success};
pub use transport::{ApiRequest, HttpTransport, RawResponse, Transport, TransportError};
