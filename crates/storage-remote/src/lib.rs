//! Hosted REST storage implementation for GoalPath.
//!
//! This crate talks to a hosted Postgres behind a PostgREST-style API and its
//! companion auth API. It implements the repository and identity traits
//! defined in `goalpath-core` and contains:
//! - Connection settings loaded from the environment
//! - Password and refresh-token sign-in with session refresh
//! - A thin REST client that scopes every call to the signed-in user
//! - The goals repository and its wire models
//!
//! ```text
//!        core (domain)
//!              │
//!              ▼
//!   storage-remote (this crate)
//!        │            │
//!        ▼            ▼
//!   /rest/v1      /auth/v1
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod goals;

pub use auth::{AuthClient, Session, SessionManager};
pub use client::RestClient;
pub use config::RemoteConfig;
pub use errors::StorageError;
pub use goals::RestGoalRepository;
