//! merchant-auth - credentials for Merchant API tooling
//!
//! Resolves OAuth2 credentials from a service account key, a stored refresh
//! token, or an interactive browser authorization, in that order.

pub mod auth;
pub mod config;
pub mod error;
pub mod ui;

pub use error::{Error, Result};
