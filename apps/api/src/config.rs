use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Where compiled PDFs are kept.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactBackend {
    Local { dir: PathBuf },
    S3(S3Settings),
}

#[derive(Debug, Clone, PartialEq)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub anthropic_api_key: Option<String>,
    pub artifacts: ArtifactBackend,
    pub compile_work_dir: PathBuf,
    pub latex_command: String,
    pub compile_timeout: Duration,
    /// Overrides the embedded LaTeX template.
    pub template_path: Option<PathBuf>,
    /// Directory of `*.json` documents loaded at startup.
    pub seed_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let artifacts = match var("S3_BUCKET") {
            Some(bucket) => ArtifactBackend::S3(S3Settings {
                bucket,
                endpoint: var("S3_ENDPOINT"),
                access_key_id: var("AWS_ACCESS_KEY_ID"),
                secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            }),
            None => ArtifactBackend::Local {
                dir: var("PDF_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("cache/pdfs")),
            },
        };

        let compile_timeout_secs = var("COMPILE_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse::<u64>()
            .context("COMPILE_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://db/resumes.db?mode=rwc".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            anthropic_api_key: var("ANTHROPIC_API_KEY"),
            artifacts,
            compile_work_dir: var("COMPILE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            latex_command: var("LATEX_COMMAND").unwrap_or_else(|| "pdflatex".to_string()),
            compile_timeout: Duration::from_secs(compile_timeout_secs),
            template_path: var("TEMPLATE_PATH").map(PathBuf::from),
            seed_dir: var("SEED_DIR").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite://db/resumes.db?mode=rwc");
        assert_eq!(config.port, 3001);
        assert_eq!(config.latex_command, "pdflatex");
        assert_eq!(config.compile_timeout, Duration::from_secs(30));
        assert_eq!(
            config.artifacts,
            ArtifactBackend::Local {
                dir: PathBuf::from("cache/pdfs")
            }
        );
        assert!(config.anthropic_api_key.is_none());
        assert!(config.seed_dir.is_none());
    }

    #[test]
    fn test_s3_bucket_selects_s3_backend() {
        let config = config_from(&[
            ("S3_BUCKET", "resumes"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("PDF_CACHE_DIR", "/ignored"),
        ])
        .unwrap();
        let ArtifactBackend::S3(s3) = config.artifacts else {
            panic!("expected S3 backend");
        };
        assert_eq!(s3.bucket, "resumes");
        assert_eq!(s3.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(s3.access_key_id.is_none());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config_from(&[("ANTHROPIC_API_KEY", ""), ("PORT", " ")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn test_malformed_numbers_fail() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("COMPILE_TIMEOUT_SECS", "soon")]).is_err());
    }
}
