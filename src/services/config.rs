//! Configuration service for testgenie
//!
//! Layers, lowest first: built-in defaults, global file, project file,
//! environment variables.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use toml::Table;

use crate::error::ConfigError;
use crate::models::config::TestGenieConfig;

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self, global_only: bool) -> Result<TestGenieConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
    async fn edit(&self, global: bool) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
    global_path: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self::with_global_path(root, Self::global_config_path())
    }

    pub fn with_global_path(root: &Path, global_path: PathBuf) -> Self {
        Self {
            root: root.to_path_buf(),
            global_path,
        }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/testgenie/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("testgenie")
            .join("config.toml")
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(".testgenie").join("config.toml")
    }

    /// Missing file is an empty layer
    async fn load_table(path: &Path) -> Result<Table, ConfigError> {
        if !path.exists() {
            return Ok(Table::new());
        }
        let content = tokio::fs::read_to_string(path).await?;
        content
            .parse::<Table>()
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Global then project, merged per key, before env overrides
    async fn load_layers(&self, global_only: bool) -> Result<TestGenieConfig, ConfigError> {
        let mut table = Self::load_table(&self.global_path).await?;
        if !global_only {
            let project = Self::load_table(&self.project_config_path()).await?;
            merge_tables(&mut table, project);
        }

        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))
    }

    async fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(&TestGenieConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn get_editor() -> String {
        std::env::var("EDITOR").unwrap_or_else(|_| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "vi".to_string()
            }
        })
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self, global_only: bool) -> Result<TestGenieConfig, ConfigError> {
        let config = self.load_layers(global_only).await?;
        let config = apply_env_overrides(config, |key| std::env::var(key).ok());
        validate(&config)?;
        Ok(config)
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            self.global_path.clone()
        } else {
            self.project_config_path()
        }
    }

    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path));
        }

        Self::write_default_config(&path).await?;
        tracing::info!("Wrote default config to {}", path.display());
        Ok(path)
    }

    async fn edit(&self, global: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);
        if !path.exists() {
            return Err(ConfigError::NotFound(format!(
                "Config file does not exist: {}\nRun: testgenie config init{}",
                path.display(),
                if global { " --global" } else { "" }
            )));
        }

        launch_editor(&Self::get_editor(), &path).await?;
        Ok(path)
    }
}

async fn launch_editor(editor: &str, path: &Path) -> Result<(), ConfigError> {
    let failed = |message: String| ConfigError::Editor {
        editor: editor.to_string(),
        message,
    };

    let status = Command::new(editor)
        .arg(path)
        .status()
        .await
        .map_err(|e| failed(e.to_string()))?;

    if status.success() {
        Ok(())
    } else {
        Err(failed(format!("exited with {}", status)))
    }
}

/// Deep merge; overlay keys win, nested tables merge key by key
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides(
    mut config: TestGenieConfig,
    env: impl Fn(&str) -> Option<String>,
) -> TestGenieConfig {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(val) = non_empty("TESTGENIE_BACKEND_URL") {
        config.generation.backend_url = val;
    }
    if let Some(val) = non_empty("TESTGENIE_TIMEOUT") {
        match val.parse() {
            Ok(secs) => config.generation.timeout_secs = secs,
            Err(_) => tracing::warn!("Ignoring invalid TESTGENIE_TIMEOUT: {}", val),
        }
    }
    if let Some(val) = non_empty("TESTGENIE_API_KEY") {
        config.generation.api_key = Some(val);
    } else if config.generation.require_api_key().is_none()
        && let Some(val) = non_empty("OPENAI_API_KEY")
    {
        config.generation.api_key = Some(val);
    }
    if let Some(val) = non_empty("TESTGENIE_TRACKER_URL") {
        config.tracker.url = Some(val);
    }
    if let Some(val) = non_empty("TESTGENIE_TRACKER_EMAIL") {
        config.tracker.email = Some(val);
    }
    if let Some(val) = non_empty("TESTGENIE_TRACKER_TOKEN") {
        config.tracker.token = Some(val);
    }
    config
}

fn validate(config: &TestGenieConfig) -> Result<(), ConfigError> {
    let url = &config.generation.backend_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: "generation.backend_url".to_string(),
            message: format!("expected an http(s) URL, got '{}'", url),
        });
    }
    if config.generation.timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "generation.timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn service(temp: &TempDir) -> DefaultConfigService {
        DefaultConfigService::with_global_path(
            &temp.path().join("project"),
            temp.path().join("global").join("config.toml"),
        )
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_project_overrides_global_per_key() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp);
        write(
            &svc.config_path(true),
            "[generation]\nbackend_url = \"http://global:9000\"\ntimeout_secs = 30\n\n[tracker]\nemail = \"dev@acme.io\"\n",
        );
        write(
            &svc.config_path(false),
            "[generation]\ntimeout_secs = 60\n\n[tracker]\nurl = \"https://acme.atlassian.net\"\n",
        );

        let config = svc.load_layers(false).await.unwrap();
        assert_eq!(config.generation.backend_url, "http://global:9000");
        assert_eq!(config.generation.timeout_secs, 60);
        assert_eq!(config.tracker.email.as_deref(), Some("dev@acme.io"));
        assert_eq!(config.tracker.url.as_deref(), Some("https://acme.atlassian.net"));
        assert_eq!(config.output.format, "json");

        let global = svc.load_layers(true).await.unwrap();
        assert_eq!(global.generation.timeout_secs, 30);
        assert!(global.tracker.url.is_none());
    }

    #[tokio::test]
    async fn test_load_merges_layers_and_validates() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp);
        write(&svc.config_path(true), "[generation]\ntimeout_secs = 30\n");
        write(&svc.config_path(false), "[output]\nformat = \"json\"\n");

        let config = svc.load(false).await.unwrap();
        // Process env may override the timeout; the file layers must still apply
        if std::env::var("TESTGENIE_TIMEOUT").is_err() {
            assert_eq!(config.generation.timeout_secs, 30);
        }
        assert_eq!(config.output.format, "json");

        write(&svc.config_path(false), "[generation]\ntimeout_secs = 0\n");
        if std::env::var("TESTGENIE_TIMEOUT").is_err() {
            let err = svc.load(false).await.unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
        }
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TESTGENIE_BACKEND_URL", "https://gen.example.com"),
            ("TESTGENIE_TIMEOUT", "15"),
            ("OPENAI_API_KEY", "sk-env"),
            ("TESTGENIE_TRACKER_TOKEN", "tok"),
        ]
        .into_iter()
        .collect();

        let config = apply_env_overrides(TestGenieConfig::default(), |k| {
            env.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.generation.backend_url, "https://gen.example.com");
        assert_eq!(config.generation.timeout_secs, 15);
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.tracker.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_openai_key_is_only_a_fallback() {
        let mut base = TestGenieConfig::default();
        base.generation.api_key = Some("sk-file".to_string());

        let config = apply_env_overrides(base, |k| {
            (k == "OPENAI_API_KEY").then(|| "sk-env".to_string())
        });
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-file"));

        let config = apply_env_overrides(config, |k| {
            (k == "TESTGENIE_API_KEY").then(|| "sk-explicit".to_string())
        });
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-explicit"));
    }

    #[test]
    fn test_invalid_timeout_env_ignored() {
        let config = apply_env_overrides(TestGenieConfig::default(), |k| {
            (k == "TESTGENIE_TIMEOUT").then(|| "soon".to_string())
        });
        assert_eq!(config.generation.timeout_secs, 120);
    }

    #[test]
    fn test_validate() {
        let mut config = TestGenieConfig::default();
        assert!(validate(&config).is_ok());

        config.generation.backend_url = "localhost:8000".to_string();
        assert!(validate(&config).is_err());

        config.generation.backend_url = "http://localhost:8000".to_string();
        config.generation.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[tokio::test]
    async fn test_init_refuses_existing_without_force() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp);

        let path = svc.init(false, false).await.unwrap();
        assert!(path.ends_with(".testgenie/config.toml"));
        let written: TestGenieConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.generation.timeout_secs, 120);

        let err = svc.init(false, false).await.unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));
        assert!(svc.init(false, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let svc = service(&temp);
        write(&svc.config_path(false), "[generation\n");

        let err = svc.load(false).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[tokio::test]
    async fn test_edit_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let err = service(&temp).edit(true).await.unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
