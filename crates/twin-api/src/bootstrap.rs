//! # Server Bootstrap
//!
//! Resolves [`AppConfig`] and builds the [`AppState`] the router serves.
//!
//! ## Sources
//!
//! 1. **YAML file** named by `TWIN_CONFIG`, if set.
//! 2. **Environment** (`PORT`, `AUTH_TOKEN`, `TWIN_REGISTRAR`,
//!    `TWIN_JOURNAL`, `TWIN_STATUS_POLICY`), each overriding the file.
//!
//! The registrar is mandatory. When a journal path is configured, the
//! registry is replayed from it before the server accepts requests, and the
//! configured registrar must match the one the journal was created under.
//! The server clock is seeded with the newest replayed event time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use twin_core::{Principal, SystemClock};
use twin_state::{StatusPolicy, StorageError, TwinService, TwinStore};

use crate::state::{AppConfig, AppState};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// `TWIN_CONFIG` points at a file that does not exist.
    #[error("config file not found: {path}")]
    ConfigNotFound { path: String },

    /// The config file is not valid YAML for [`FileConfig`].
    #[error("invalid config file {path}: {reason}")]
    InvalidConfig { path: String, reason: String },

    /// An environment variable has an unusable value.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    /// No registrar in either the file or the environment.
    #[error("registrar not configured: set TWIN_REGISTRAR or `registrar` in the config file")]
    MissingRegistrar,

    /// The journal was created under a different registrar.
    #[error("TWIN_REGISTRAR is {configured} but the journal was created by {recorded}")]
    RegistrarMismatch {
        recorded: Principal,
        configured: Principal,
    },

    /// The journal could not be opened or replayed.
    #[error("journal error: {0}")]
    Storage(#[from] StorageError),

    /// IO error reading the config file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Contents of the YAML config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    port: Option<u16>,
    auth_token: Option<String>,
    registrar: Option<String>,
    journal: Option<PathBuf>,
    status_policy: Option<StatusPolicy>,
}

fn read_config_file(path: &Path) -> Result<FileConfig, BootstrapError> {
    if !path.exists() {
        return Err(BootstrapError::ConfigNotFound {
            path: path.display().to_string(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&raw).map_err(|e| BootstrapError::InvalidConfig {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Resolve configuration from an environment lookup.
///
/// Takes the lookup as a function so tests never touch the process
/// environment.
pub fn load_config<F>(env: F) -> Result<AppConfig, BootstrapError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match env("TWIN_CONFIG") {
        Some(path) => read_config_file(Path::new(&path))?,
        None => FileConfig::default(),
    };

    let port = match env("PORT") {
        Some(raw) => raw.parse::<u16>().map_err(|e| BootstrapError::InvalidEnv {
            var: "PORT",
            reason: format!("{raw:?}: {e}"),
        })?,
        None => file.port.unwrap_or(AppConfig::DEFAULT_PORT),
    };

    let auth_token = env("AUTH_TOKEN")
        .or(file.auth_token)
        .filter(|t| !t.is_empty());

    let registrar_raw = env("TWIN_REGISTRAR")
        .or(file.registrar)
        .ok_or(BootstrapError::MissingRegistrar)?;
    let registrar = Principal::new(registrar_raw).map_err(|e| BootstrapError::InvalidEnv {
        var: "TWIN_REGISTRAR",
        reason: e.to_string(),
    })?;

    let journal = env("TWIN_JOURNAL").map(PathBuf::from).or(file.journal);

    let status_policy = match env("TWIN_STATUS_POLICY") {
        Some(raw) => raw
            .parse::<StatusPolicy>()
            .map_err(|reason| BootstrapError::InvalidEnv {
                var: "TWIN_STATUS_POLICY",
                reason,
            })?,
        None => file.status_policy.unwrap_or_default(),
    };

    Ok(AppConfig {
        port,
        auth_token,
        registrar,
        journal,
        status_policy,
    })
}

/// [`load_config`] over the process environment.
pub fn load_config_from_env() -> Result<AppConfig, BootstrapError> {
    load_config(|key| std::env::var(key).ok())
}

/// Open the store, build the service, and return the state for `app()`.
pub fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let store = match &config.journal {
        Some(path) => TwinStore::open(path)?,
        None => {
            tracing::warn!("no journal configured, registry state will not survive restart");
            TwinStore::in_memory()
        }
    };
    let service = TwinService::new(config.service_config(), store).map_err(|e| match e {
        StorageError::RegistrarMismatch {
            recorded,
            configured,
        } => BootstrapError::RegistrarMismatch {
            recorded,
            configured,
        },
        other => BootstrapError::Storage(other),
    })?;
    let clock = match service.store().read().latest_event_at() {
        Some(latest) => SystemClock::not_before(latest),
        None => SystemClock::new(),
    };

    tracing::info!(
        registrar = %config.registrar,
        status_policy = %config.status_policy,
        auth = config.auth_token.is_some(),
        journal = ?config.journal,
        products = service.product_ids().len(),
        "bootstrap complete"
    );

    Ok(AppState::new(service, Arc::new(clock), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use twin_core::ProductId;
    use twin_state::{Dimensions, ProductMetadata};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_only_config() {
        let cfg = load_config(lookup(&[
            ("TWIN_REGISTRAR", "did:key:z6MkRegistrar"),
            ("PORT", "9090"),
            ("AUTH_TOKEN", "s3cret"),
            ("TWIN_STATUS_POLICY", "forward-only"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(cfg.registrar.as_str(), "did:key:z6MkRegistrar");
        assert_eq!(cfg.status_policy, StatusPolicy::ForwardOnly);
        assert!(cfg.journal.is_none());
    }

    #[test]
    fn defaults_apply() {
        let cfg = load_config(lookup(&[("TWIN_REGISTRAR", "r")])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.auth_token.is_none());
        assert_eq!(cfg.status_policy, StatusPolicy::Unrestricted);
    }

    #[test]
    fn empty_auth_token_disables_auth() {
        let cfg = load_config(lookup(&[("TWIN_REGISTRAR", "r"), ("AUTH_TOKEN", "")])).unwrap();
        assert!(cfg.auth_token.is_none());
    }

    #[test]
    fn missing_registrar_is_an_error() {
        let err = load_config(lookup(&[])).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingRegistrar));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = load_config(lookup(&[("TWIN_REGISTRAR", "r"), ("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidEnv { var: "PORT", .. }));
    }

    #[test]
    fn bad_policy_is_an_error() {
        let err = load_config(lookup(&[
            ("TWIN_REGISTRAR", "r"),
            ("TWIN_STATUS_POLICY", "sideways"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidEnv {
                var: "TWIN_STATUS_POLICY",
                ..
            }
        ));
    }

    #[test]
    fn yaml_file_is_overridden_by_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twin.yaml");
        std::fs::write(
            &path,
            "port: 7000\nregistrar: file-registrar\nstatus_policy: forward_only\njournal: /tmp/twin.journal\n",
        )
        .unwrap();
        let path_str = path.display().to_string();

        let cfg = load_config(lookup(&[
            ("TWIN_CONFIG", path_str.as_str()),
            ("PORT", "7001"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 7001);
        assert_eq!(cfg.registrar.as_str(), "file-registrar");
        assert_eq!(cfg.status_policy, StatusPolicy::ForwardOnly);
        assert_eq!(cfg.journal, Some(PathBuf::from("/tmp/twin.journal")));

        let cfg = load_config(lookup(&[
            ("TWIN_CONFIG", path_str.as_str()),
            ("TWIN_REGISTRAR", "env-registrar"),
        ]))
        .unwrap();
        assert_eq!(cfg.registrar.as_str(), "env-registrar");
    }

    #[test]
    fn missing_config_file() {
        let err = load_config(lookup(&[("TWIN_CONFIG", "/nonexistent/twin.yaml")])).unwrap_err();
        assert!(matches!(err, BootstrapError::ConfigNotFound { .. }));
    }

    #[test]
    fn unknown_config_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twin.yaml");
        std::fs::write(&path, "registrar: r\nregistar_typo: x\n").unwrap();
        let path_str = path.display().to_string();
        let err = load_config(lookup(&[("TWIN_CONFIG", path_str.as_str())])).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidConfig { .. }));
    }

    #[test]
    fn bootstrap_replays_journal() {
        let dir = tempfile::tempdir().unwrap();
        let registrar = Principal::new("r").unwrap();
        let mut config = AppConfig::new(registrar.clone());
        config.journal = Some(dir.path().join("twin.journal"));

        {
            let state = bootstrap(config.clone()).unwrap();
            assert!(state.service.store().is_durable());
            let metadata = ProductMetadata {
                name: "Valve".into(),
                batch_number: "B1".into(),
                model: "V1".into(),
                serial_number: "S1".into(),
                materials: vec![],
                weight: 900,
                dimensions: Dimensions::default(),
                location: None,
                certification: None,
                warranty_months: 12,
            };
            state
                .service
                .create_product(ProductId::new("P1").unwrap(), metadata, &registrar, state.now())
                .unwrap();
        }

        let state = bootstrap(config).unwrap();
        assert_eq!(state.service.product_ids(), vec![ProductId::new("P1").unwrap()]);
        assert_eq!(state.service.get_event_count(&ProductId::new("P1").unwrap()), 1);
    }

    #[test]
    fn bootstrap_rejects_a_changed_registrar() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("twin.journal");
        let mut config = AppConfig::new(Principal::new("registrar-a").unwrap());
        config.journal = Some(journal.clone());
        bootstrap(config).unwrap();

        let mut config = AppConfig::new(Principal::new("registrar-b").unwrap());
        config.journal = Some(journal);
        let err = bootstrap(config).unwrap_err();
        match err {
            BootstrapError::RegistrarMismatch {
                recorded,
                configured,
            } => {
                assert_eq!(recorded.as_str(), "registrar-a");
                assert_eq!(configured.as_str(), "registrar-b");
            }
            other => panic!("expected RegistrarMismatch, got {other:?}"),
        }
    }

    #[test]
    fn clock_starts_at_latest_replayed_event() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join("twin.journal");
        let registrar = Principal::new("r").unwrap();
        let ahead = twin_core::Timestamp::now().checked_add_secs(86_400).unwrap();
        {
            let service = TwinService::new(
                twin_state::ServiceConfig::new(registrar.clone()),
                TwinStore::open(&journal).unwrap(),
            )
            .unwrap();
            let metadata = ProductMetadata {
                name: "Valve".into(),
                batch_number: "B1".into(),
                model: "V1".into(),
                serial_number: "S1".into(),
                materials: vec![],
                weight: 900,
                dimensions: Dimensions::default(),
                location: None,
                certification: None,
                warranty_months: 0,
            };
            service
                .create_product(ProductId::new("P1").unwrap(), metadata, &registrar, ahead)
                .unwrap();
        }

        let mut config = AppConfig::new(registrar);
        config.journal = Some(journal);
        let state = bootstrap(config).unwrap();
        assert!(state.now() >= ahead);
    }
}
