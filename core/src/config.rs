//! Runtime configuration from environment variables

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::Error;
use crate::record::{FileRecordStore, HttpRecordStore, HttpStoreConfig, RecordStore};
use crate::Result;

pub const DEFAULT_DATA_DIR: &str = ".taskflow-data";
pub const DEFAULT_TASK_TABLE: &str = "tasks";
pub const DEFAULT_PROJECT_TABLE: &str = "projects";
pub const DEFAULT_PORT: u16 = 8081;

/// Where records live
#[derive(Debug, Clone)]
pub enum Backend {
    /// JSON file in the data directory
    Local,
    /// Managed backend over HTTP
    Remote(HttpStoreConfig),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote(_) => "remote",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub task_table: String,
    pub project_table: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            task_table: DEFAULT_TASK_TABLE.to_string(),
            project_table: DEFAULT_PROJECT_TABLE.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                Error::Config(format!("{} must be set for the remote backend", name))
            })
        };

        let backend = match var("TASKFLOW_BACKEND")
            .unwrap_or_else(|| "local".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "local" | "file" => Backend::Local,
            "remote" | "http" => {
                let http = HttpStoreConfig {
                    base_url: required("TASKFLOW_API_URL")?
                        .trim_end_matches('/')
                        .to_string(),
                    project_id: required("TASKFLOW_PROJECT_ID")?,
                    public_key: required("TASKFLOW_PUBLIC_KEY")?,
                };
                http.validate()?;
                Backend::Remote(http)
            }
            other => {
                return Err(Error::Config(format!("unknown backend: {}", other)));
            }
        };

        let port = match var("TASKFLOW_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("invalid TASKFLOW_PORT: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            backend,
            data_dir: var("TASKFLOW_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            task_table: var("TASKFLOW_TASK_TABLE").unwrap_or_else(|| DEFAULT_TASK_TABLE.to_string()),
            project_table: var("TASKFLOW_PROJECT_TABLE")
                .unwrap_or_else(|| DEFAULT_PROJECT_TABLE.to_string()),
            port,
        })
    }

    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    /// Open the configured record store
    pub async fn open_store(&self) -> Result<Arc<dyn RecordStore>> {
        match &self.backend {
            Backend::Local => {
                let path = self.records_path();
                info!("Using local record store at {:?}", path);
                Ok(Arc::new(FileRecordStore::new(path).await?))
            }
            Backend::Remote(http) => {
                info!("Using remote record store at {}", http.base_url);
                Ok(Arc::new(HttpRecordStore::new(http.clone())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert!(matches!(config.backend, Backend::Local));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.task_table, "tasks");
        assert_eq!(config.project_table, "projects");
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn test_remote_backend() {
        let config = Config::from_lookup(lookup(&[
            ("TASKFLOW_BACKEND", "Remote"),
            ("TASKFLOW_API_URL", "https://api.example.com/v1/"),
            ("TASKFLOW_PROJECT_ID", "proj-1"),
            ("TASKFLOW_PUBLIC_KEY", "pk"),
            ("TASKFLOW_PORT", "9000"),
        ]))
        .unwrap();

        let Backend::Remote(http) = &config.backend else {
            panic!("expected remote backend");
        };
        assert_eq!(http.base_url, "https://api.example.com/v1");
        assert_eq!(http.project_id, "proj-1");
        assert_eq!(config.backend.name(), "remote");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_remote_requires_credentials() {
        let err = Config::from_lookup(lookup(&[
            ("TASKFLOW_BACKEND", "remote"),
            ("TASKFLOW_API_URL", "https://api.example.com"),
            ("TASKFLOW_PROJECT_ID", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TASKFLOW_PROJECT_ID"));
    }

    #[test]
    fn test_remote_rejects_unsendable_credentials() {
        let err = Config::from_lookup(lookup(&[
            ("TASKFLOW_BACKEND", "remote"),
            ("TASKFLOW_API_URL", "https://api.example.com"),
            ("TASKFLOW_PROJECT_ID", "proj-1"),
            ("TASKFLOW_PUBLIC_KEY", "pk\u{7}bell"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("X-Public-Key"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("TASKFLOW_BACKEND", "ftp")])).is_err());
        assert!(Config::from_lookup(lookup(&[("TASKFLOW_PORT", "http")])).is_err());
    }

    #[tokio::test]
    async fn test_open_local_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        let store = config.open_store().await.unwrap();
        assert_eq!(store.backend_name(), "file");
    }
}
