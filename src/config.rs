use std::fs;
use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm::DEFAULT_MODEL;

/// Configuration for the Cortex server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// TCP port the server listens on
    pub port: u16,
    /// Directory holding uploaded course files
    pub upload_dir: String,
    /// Directory for rolling log files; stderr only when unset
    pub log_dir: Option<String>,
    /// Secret used to sign session tokens
    pub jwt_secret: String,
    /// Key for the model API; AI endpoints fail without one
    pub openai_api_key: Option<String>,
    /// Model used for every generation task
    pub openai_model: String,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub upload_dir: Option<String>,
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_model: Option<String>,
}

/// Command line arguments for the application
#[derive(Parser, Debug)]
#[clap(name = "cortex", about = "Education-assistant backend")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Listen port
    #[clap(long, env = "PORT")]
    pub port: Option<u16>,

    /// Uploads directory
    #[clap(long, env = "UPLOAD_DIR")]
    pub upload_dir: Option<String>,

    /// Log directory
    #[clap(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,

    /// Token signing secret
    #[clap(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Model API key
    #[clap(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Model name
    #[clap(long, env = "OPENAI_MODEL")]
    pub openai_model: Option<String>,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            port: update.port.unwrap_or(self.port),
            upload_dir: update.upload_dir.unwrap_or(self.upload_dir),
            log_dir: update.log_dir.or(self.log_dir),
            jwt_secret: update.jwt_secret.unwrap_or(self.jwt_secret),
            openai_api_key: update.openai_api_key.or(self.openai_api_key),
            openai_model: update.openai_model.unwrap_or(self.openai_model),
        }
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("cortex.db".to_string(), |path| {
        path.join("cortex.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        port: 3000,
        upload_dir: "uploads".to_string(),
        log_dir: None,
        jwt_secret: "dev-secret-change-me".to_string(),
        openai_api_key: None,
        openai_model: DEFAULT_MODEL.to_string(),
    }
}

/// Loads configuration from a TOML file
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    match fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str::<ConfigUpdate>(&content) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", config_path);
                Ok(config)
            }
            Err(e) => {
                warn!("Failed to parse config file: {}", e);
                Err(format!("Failed to parse config file: {e}"))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            Err(format!("Failed to read config file: {e}"))
        }
    }
}

/// Loads configuration from command line arguments
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        port: args.port,
        upload_dir: args.upload_dir,
        log_dir: args.log_dir,
        jwt_secret: args.jwt_secret,
        openai_api_key: args.openai_api_key,
        openai_model: args.openai_model,
    }
}

/// Gets the complete configuration by combining defaults with values
/// from the config file and environment/command line arguments, in
/// order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_dir = ProjectDirs::from("fr", "cortex", "cortex")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .filter(|path| path.exists());
    if config_dir.is_none() {
        info!("No config directory found, using defaults");
    }

    let config_file = config_dir.as_ref().map(|dir| dir.join("config.toml"));

    let base = base_config(config_dir);
    let config = base
        .apply_update(config_from_file(config_file).unwrap_or_default())
        .apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, port={}, upload_dir={}, model={}",
        config.database_url, config.port, config.upload_dir, config.openai_model
    );

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::{tempdir, TempDir};

    fn create_test_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let config_path = dir.path().join("config.toml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        config_path
    }

    fn empty_args() -> CliArgs {
        CliArgs {
            database_url: None,
            port: None,
            upload_dir: None,
            log_dir: None,
            jwt_secret: None,
            openai_api_key: None,
            openai_model: None,
        }
    }

    #[test]
    fn test_apply_update_overrides_set_fields_only() {
        let base = base_config(None);
        let updated = base.clone().apply_update(ConfigUpdate {
            port: Some(8080),
            jwt_secret: Some("prod-secret".to_string()),
            ..ConfigUpdate::default()
        });

        assert_eq!(updated.port, 8080);
        assert_eq!(updated.jwt_secret, "prod-secret");
        assert_eq!(updated.database_url, base.database_url);
        assert_eq!(updated.openai_model, base.openai_model);
    }

    #[test]
    fn test_config_from_file_with_valid_toml() {
        let temp_dir = tempdir().unwrap();
        let config_path = create_test_config_file(
            &temp_dir,
            r#"
                database_url = "file.db"
                port = 4000
                openai_api_key = "sk-from-file"
            "#,
        );

        let update = config_from_file(Some(config_path)).unwrap();
        assert_eq!(update.database_url, Some("file.db".to_string()));
        assert_eq!(update.port, Some(4000));
        assert_eq!(update.openai_api_key, Some("sk-from-file".to_string()));
        assert_eq!(update.jwt_secret, None);
    }

    #[test]
    fn test_config_from_file_with_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let config_path = create_test_config_file(&temp_dir, r#"port = "not a number""#);
        assert!(config_from_file(Some(config_path)).is_err());
    }

    #[test]
    fn test_config_from_missing_file_is_default() {
        let temp_dir = tempdir().unwrap();
        let update = config_from_file(Some(temp_dir.path().join("absent.toml"))).unwrap();
        assert_eq!(update.database_url, None);
    }

    #[test]
    fn test_args_take_precedence_over_file() {
        let mut args = empty_args();
        args.database_url = Some("args.db".to_string());

        let file_update = ConfigUpdate {
            database_url: Some("file.db".to_string()),
            port: Some(5000),
            ..ConfigUpdate::default()
        };

        let config = base_config(None)
            .apply_update(file_update)
            .apply_update(config_from_args(args));

        assert_eq!(config.database_url, "args.db");
        assert_eq!(config.port, 5000);
    }
}
