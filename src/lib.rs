// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth Gateway - Credential Service for HTTP APIs
//!
//! This crate registers principals, issues API keys and short-lived access
//! tokens, and verifies them on incoming requests. Routing is left to the
//! embedding application; the [`auth`] extractors plug into any Axum router
//! whose state exposes a [`GatewayState`].
//!
//! ## Modules
//!
//! - `auth` - Password hashing, API keys, tokens and Axum extractors
//! - `config` - Environment configuration
//! - `error` - Operation errors and their HTTP mapping
//! - `state` - Shared router state
//! - `store` - In-memory credential records
//! - `telemetry` - Tracing subscriber setup

pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod telemetry;

pub use auth::{AuthGateway, Principal, Token};
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use state::GatewayState;
