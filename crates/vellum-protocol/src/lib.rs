//! # vellum-protocol
//!
//! Client side of the zero-knowledge credential protocol: registration,
//! login, second-factor management, and sealed-vault transfer against a
//! remote authority.
//!
//! The user secret never crosses the wire. Every operation that proves
//! knowledge of it derives a one-way verifier under the account's
//! authentication salt and submits that instead; the derivation runs on
//! a blocking worker because of its deliberate cost.
//!
//! The wire transport sits behind the [`RemoteAuthority`] trait.
//! [`HttpAuthority`] implements it over HTTP/JSON; the `testing`
//! feature adds an in-memory implementation with real rate limiting
//! for use in test suites.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wire;

pub use authority::RemoteAuthority;
pub use client::AuthClient;
pub use config::ClientConfig;
pub use error::{ProtocolError, ProtocolResult};
pub use http::HttpAuthority;
