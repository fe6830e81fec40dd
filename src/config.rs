use std::{env, fs, path::PathBuf};

use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

const CONFIG: &str = include_str!("../.config/config.json5");

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

/// Tunables for the derivation pipeline.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeriveConfig {
    pub columns_per_page: usize,
    pub rows_per_page: usize,
    pub sample_limit: usize,
    pub headroom: f64,
    pub minor_slice_fraction: f64,
    pub extra_projection_keywords: Vec<String>,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            columns_per_page: 5,
            rows_per_page: 10,
            sample_limit: 50,
            headroom: 1.05,
            minor_slice_fraction: 0.06,
            extra_projection_keywords: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub derive: DeriveConfig,
}

impl Config {
    /// Load configuration, merging a user file over the embedded defaults.
    ///
    /// Resolution order for the file: explicit `config_path`, then
    /// `$TABVIZ_CONFIG/config.json5`, then `~/.tabviz-config.json5` (created
    /// from the embedded defaults on first run).
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let selected_path = if let Some(p) = config_path {
            expand_tilde(p)
        } else if let Some(folder) = CONFIG_FOLDER.clone() {
            folder.join("config.json5")
        } else {
            let home_cfg = default_home_config_path();
            if !home_cfg.exists() {
                if let Some(parent) = home_cfg.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(&home_cfg, CONFIG);
            }
            home_cfg
        };

        let builder = config::Config::builder().add_source(
            config::File::from_str(CONFIG, config::FileFormat::Json5),
        );
        let builder = if selected_path.exists() {
            builder.add_source(
                config::File::from(selected_path)
                    .format(config::FileFormat::Json5)
                    .required(false),
            )
        } else {
            builder
        };

        builder.build()?.try_deserialize()
    }
}

fn default_home_config_path() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".tabviz-config.json5"))
        .unwrap_or_else(|| PathBuf::from(".tabviz-config.json5"))
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    let raw = path.to_string_lossy();
    if let Some(stripped) = raw.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(stripped);
        }
    }
    path.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let cfg: Config = json5::from_str(CONFIG).unwrap();
        assert_eq!(cfg.derive.columns_per_page, 5);
        assert_eq!(cfg.derive.rows_per_page, 10);
        assert_eq!(cfg.derive.sample_limit, 50);
        assert!((cfg.derive.headroom - 1.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.json5");
        std::fs::write(&path, r#"{ "derive": { "rows_per_page": 25 } }"#).unwrap();
        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.derive.rows_per_page, 25);
        // untouched keys keep their embedded defaults
        assert_eq!(cfg.derive.columns_per_page, 5);
    }
}
