// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{
    ApiKeyAuthenticator, AuthGateway, BasicAuthenticator, BearerAuthenticator,
};
use crate::config::GatewayConfig;

/// Router state carrying the shared gateway.
///
/// Larger application states expose it to the extractors through
/// `axum::extract::FromRef`.
#[derive(Clone)]
pub struct GatewayState {
    pub gateway: Arc<AuthGateway>,
}

impl GatewayState {
    pub fn new(gateway: AuthGateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(AuthGateway::from_config(config))
    }

    pub fn basic(&self) -> BasicAuthenticator {
        BasicAuthenticator::new(self.gateway.clone())
    }

    pub fn api_key(&self) -> ApiKeyAuthenticator {
        ApiKeyAuthenticator::new(self.gateway.clone())
    }

    pub fn bearer(&self) -> BearerAuthenticator {
        BearerAuthenticator::new(self.gateway.clone())
    }
}
