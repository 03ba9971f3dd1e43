use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Error as SerdeError;
use tracing::{debug, info};

use crate::domain::{RateTables, ShipmentQuoteRequest};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "ExportLogisticsQuoter";
const APP_NAME: &str = "ExportLogisticsQuoter";
const RATE_TABLES_FILE: &str = "rate_tables.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: SerdeError,
    },
}

/// Per-user rate-table override, e.g. `~/.config/ExportLogisticsQuoter/rate_tables.json`.
pub fn user_rate_tables_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(RATE_TABLES_FILE))
}

/// Explicit path first, then the per-user file, then the built-in tables.
pub fn resolve_rate_tables(explicit: Option<&Path>) -> Result<RateTables, ConfigError> {
    if let Some(path) = explicit {
        return load_rate_tables(path);
    }

    match user_rate_tables_file() {
        Some(path) if path.exists() => load_rate_tables(&path),
        _ => {
            debug!("using built-in rate tables");
            Ok(RateTables::default())
        }
    }
}

pub fn load_rate_tables(path: &Path) -> Result<RateTables, ConfigError> {
    let tables: RateTables = read_json(path)?;
    info!(
        path = %path.display(),
        lanes = tables.lane_count(),
        origins = tables.inland_transport.len(),
        "loaded rate tables"
    );
    Ok(tables)
}

pub fn save_rate_tables(path: &Path, tables: &RateTables) -> Result<(), ConfigError> {
    write_json(path, tables)
}

/// Writes the tables to the per-user config location and returns that path.
pub fn save_user_rate_tables(tables: &RateTables) -> Result<PathBuf, ConfigError> {
    let path = user_rate_tables_file().ok_or(ConfigError::StorageUnavailable)?;
    write_json(&path, tables)?;
    Ok(path)
}

pub fn load_request(path: &Path) -> Result<ShipmentQuoteRequest, ConfigError> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ConfigError::Serde {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|source| ConfigError::Serde {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContainerType, Incoterms};

    #[test]
    fn exported_tables_load_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join(RATE_TABLES_FILE);
        let tables = RateTables::default();

        save_rate_tables(&path, &tables).unwrap();
        let loaded = resolve_rate_tables(Some(&path)).unwrap();

        assert_eq!(loaded, tables);
    }

    #[test]
    fn explicit_path_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            resolve_rate_tables(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "[1, 2").unwrap();
        let error = load_rate_tables(&broken).unwrap_err();
        assert!(matches!(error, ConfigError::Serde { .. }));
        assert!(error.to_string().contains("broken.json"));
    }

    #[test]
    fn request_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        fs::write(
            &path,
            r#"{"incoterms":"CFR","departure_city":"화성","departure_port":"인천항",
                "destination_port":"도쿄","container_type":"40ft","margin_percent":7.5}"#,
        )
        .unwrap();

        let request = load_request(&path).unwrap();
        assert_eq!(request.incoterms, Incoterms::Cfr);
        assert_eq!(request.container_type, ContainerType::Ft40);
        assert_eq!(request.margin_percent, 7.5);
    }
}
