//! # Application State
//!
//! Shared state for the Axum application: the registry service, the clock
//! that stamps every mutation, and the resolved configuration.

use std::path::PathBuf;
use std::sync::Arc;

use twin_core::{Clock, Principal, SystemClock, Timestamp};
use twin_state::{ServiceConfig, StatusPolicy, TwinService};

/// Resolved server configuration.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared secret for bearer tokens. `None` disables authentication and
    /// trusts the `X-Principal` header.
    pub auth_token: Option<String>,
    /// The only principal allowed to create products.
    pub registrar: Principal,
    /// Journal file. `None` keeps the registry in memory.
    pub journal: Option<PathBuf>,
    pub status_policy: StatusPolicy,
}

impl AppConfig {
    pub const DEFAULT_PORT: u16 = 8080;

    /// In-memory, unauthenticated configuration for `registrar`.
    pub fn new(registrar: Principal) -> Self {
        Self {
            port: Self::DEFAULT_PORT,
            auth_token: None,
            registrar,
            journal: None,
            status_policy: StatusPolicy::default(),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(self.registrar.clone()).with_status_policy(self.status_policy)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("registrar", &self.registrar)
            .field("journal", &self.journal)
            .field("status_policy", &self.status_policy)
            .finish()
    }
}

/// Shared application state, cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: TwinService,
    pub clock: Arc<dyn Clock>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(service: TwinService, clock: Arc<dyn Clock>, config: AppConfig) -> Self {
        Self {
            service,
            clock,
            config,
        }
    }

    /// In-memory state on the system clock, for tests and local runs.
    pub fn in_memory(config: AppConfig) -> Self {
        let service = TwinService::in_memory(config.service_config());
        Self::new(service, Arc::new(SystemClock::new()), config)
    }

    /// The timestamp for the mutation being handled.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
