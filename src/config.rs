use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "MORGUE_CONFIG";
pub const DATA_DIR_ENV: &str = "MORGUE_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bodies_file: String,
    pub sanitary_file: String,
    pub staff_file: String,
    pub coordinations_file: String,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            bodies_file: "bodies.json".to_string(),
            sanitary_file: "sanitary.json".to_string(),
            staff_file: "staff.json".to_string(),
            coordinations_file: "funeral_services.json".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
            seed_demo_data: false,
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file (explicit path or `MORGUE_CONFIG`), then
    /// `MORGUE_DATA_DIR`, then the explicit data directory override.
    /// Empty environment values count as unset.
    pub fn resolve(config_path: Option<&Path>, data_dir: Option<&Path>) -> AppResult<Self> {
        Self::resolve_with(
            config_path,
            data_dir,
            std::env::var_os(CONFIG_ENV),
            std::env::var_os(DATA_DIR_ENV),
        )
    }

    fn resolve_with(
        config_path: Option<&Path>,
        data_dir: Option<&Path>,
        env_config: Option<OsString>,
        env_data_dir: Option<OsString>,
    ) -> AppResult<Self> {
        let env_path = env_config.filter(|value| !value.is_empty()).map(PathBuf::from);
        let mut config = match config_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        if let Some(dir) = env_data_dir.filter(|value| !value.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = data_dir {
            config.data_dir = dir.to_path_buf();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|error| AppError::Config(format!("cannot read {}: {}", path.display(), error)))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&raw)
            .map_err(|error| AppError::Config(format!("{}: {}", path.display(), error)))?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        let files = [
            ("bodies_file", &self.bodies_file),
            ("sanitary_file", &self.sanitary_file),
            ("staff_file", &self.staff_file),
            ("coordinations_file", &self.coordinations_file),
        ];
        for (field, value) in files {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} must not be empty", field)));
            }
        }
        let mut names: Vec<&String> = files.iter().map(|(_, value)| *value).collect();
        names.sort();
        names.dedup();
        if names.len() != files.len() {
            return Err(AppError::Config(
                "each record kind needs its own document file".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bodies_path(&self) -> PathBuf {
        self.data_dir.join(&self.bodies_file)
    }

    pub fn sanitary_path(&self) -> PathBuf {
        self.data_dir.join(&self.sanitary_file)
    }

    pub fn staff_path(&self) -> PathBuf {
        self.data_dir.join(&self.staff_file)
    }

    pub fn coordinations_path(&self) -> PathBuf {
        self.data_dir.join(&self.coordinations_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_environment_values_are_ignored() {
        let config = AppConfig::resolve_with(None, None, Some(OsString::new()), Some(OsString::new()))
            .expect("defaults");
        assert_eq!(config, AppConfig::default());

        let root = tempfile::tempdir().expect("temp root");
        let path = root.path().join("morgue.yaml");
        fs::write(&path, "staff_file: roster.json\n").expect("write config");
        let config = AppConfig::resolve_with(
            None,
            Some(Path::new("/srv/records")),
            Some(path.into_os_string()),
            Some(OsString::from("/ignored")),
        )
        .expect("config from env path");
        assert_eq!(config.staff_file, "roster.json");
        assert_eq!(config.data_dir, PathBuf::from("/srv/records"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let root = tempfile::tempdir().expect("temp root");
        let path = root.path().join("morgue.yaml");
        fs::write(&path, "data_dir: /var/lib/morgue\nlog_level: debug\n").expect("write config");

        let config = AppConfig::from_file(&path).expect("config parsed");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/morgue"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bodies_file, "bodies.json");
        assert_eq!(
            config.coordinations_path(),
            PathBuf::from("/var/lib/morgue/funeral_services.json")
        );
    }

    #[test]
    fn invalid_yaml_is_a_config_error() {
        let root = tempfile::tempdir().expect("temp root");
        let path = root.path().join("morgue.yaml");
        fs::write(&path, "seed_demo_data: [not, a, bool]\n").expect("write config");
        let error = AppConfig::from_file(&path).expect_err("must reject");
        assert!(error.to_string().starts_with("CONFIG_INVALID"));
    }

    #[test]
    fn shared_document_names_are_rejected() {
        let config = AppConfig {
            staff_file: "bodies.json".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(AppConfig::default().validate().is_ok());
    }
}
