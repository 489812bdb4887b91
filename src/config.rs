use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::attendance::StoreConfig;
use crate::recognition::{FaceMatcher, MatchPolicy, DEFAULT_TOLERANCE};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub attendance: AttendanceConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    pub encodings: EncodingsConfig,
    #[serde(default)]
    pub nats: NatsConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceConfig {
    pub records_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

/// Matching of face encodings received without an identity
#[derive(Debug, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

#[derive(Debug, Deserialize)]
pub struct EncodingsConfig {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct NatsConfig {
    /// Leave unset to run without the NATS bridge
    pub url: Option<String>,
    #[serde(default = "default_recognized_subject")]
    pub recognized_subject: String,
    #[serde(default = "default_marked_subject")]
    pub marked_subject: String,
}

fn default_file_prefix() -> String {
    "attendance".to_string()
}

fn default_tolerance() -> f32 {
    DEFAULT_TOLERANCE
}

fn default_recognized_subject() -> String {
    "face.recognized.>".to_string()
}

fn default_marked_subject() -> String {
    "attendance.marked".to_string()
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            match_policy: MatchPolicy::default(),
        }
    }
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: None,
            recognized_subject: default_recognized_subject(),
            marked_subject: default_marked_subject(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("FACE_ATTENDANCE").separator("__"))
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.recognition.tolerance.is_nan() || self.recognition.tolerance <= 0.0 {
            bail!("recognition.tolerance must be positive");
        }
        if self.attendance.file_prefix.trim().is_empty() {
            bail!("attendance.file_prefix must not be empty");
        }
        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            records_dir: expand_path(&self.attendance.records_dir),
            file_prefix: self.attendance.file_prefix.clone(),
        }
    }

    pub fn encodings_path(&self) -> PathBuf {
        expand_path(&self.encodings.path)
    }

    pub fn matcher(&self) -> FaceMatcher {
        FaceMatcher::new(self.recognition.tolerance, self.recognition.match_policy)
    }
}

/// Expand `~` and `$VARS` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(path).map(|p| p.into_owned()).unwrap_or_else(|_| path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_toml_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("face-attendance.toml");
        fs::write(
            &path,
            r#"
[service]
name = "face-attendance"

[service.http]
bind = "127.0.0.1"
port = 3040

[attendance]
records_dir = "/tmp/attendance"

[encodings]
path = "/tmp/encodings.json"
"#,
        )
        .unwrap();

        let cfg = Config::load(path.with_extension("").to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.http.port, 3040);
        assert_eq!(cfg.attendance.file_prefix, "attendance");
        assert_eq!(cfg.recognition.match_policy, MatchPolicy::ClosestMatch);
        assert_eq!(cfg.matcher().tolerance, DEFAULT_TOLERANCE);
        assert!(cfg.nats.url.is_none());
    }

    #[test]
    fn recognition_section_configures_matcher() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("first.toml");
        fs::write(
            &path,
            r#"
[service]
name = "x"
[service.http]
bind = "127.0.0.1"
port = 1
[attendance]
records_dir = "/tmp/a"
[recognition]
tolerance = 0.45
match_policy = "first_match"
[encodings]
path = "/tmp/e.json"
"#,
        )
        .unwrap();

        let matcher = Config::load(path.with_extension("").to_str().unwrap())
            .unwrap()
            .matcher();
        assert_eq!(matcher.tolerance, 0.45);
        assert_eq!(matcher.policy, MatchPolicy::FirstMatch);
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(
            &path,
            r#"
[service]
name = "x"
[service.http]
bind = "127.0.0.1"
port = 1
[attendance]
records_dir = "/tmp/a"
[recognition]
tolerance = 0.0
[encodings]
path = "/tmp/e.json"
"#,
        )
        .unwrap();

        assert!(Config::load(path.with_extension("").to_str().unwrap()).is_err());
    }
}
