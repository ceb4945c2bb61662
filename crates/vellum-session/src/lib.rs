//! # vellum-session
//!
//! The session-lock state machine gating access to decrypted
//! credentials: `Unlocked`, `Locked` and `AwaitingSecondFactor`, with
//! an idle countdown that keeps running while the application is
//! backgrounded.
//!
//! [`SessionController`] owns the unlocked [`CredentialCollection`]
//! and the transient user secret, drives lock transitions from an
//! idle watchdog and a host event channel, and re-authorizes access
//! on unlock by unsealing the current vault and re-acquiring a
//! session token. Lock transitions and unlock failures land in an
//! in-memory audit trail.
//!
//! [`CredentialCollection`]: vellum_vault::CredentialCollection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;

pub use audit::{AuditEntry, AuditEvent, LockReason};
pub use config::SessionConfig;
pub use controller::{AuthOutcome, LockState, SessionController};
pub use error::{SessionError, SessionResult};
pub use events::HostEvent;
