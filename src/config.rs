//! Configuration loading and types for ResumeStore.
//!
//! Configuration is read from a YAML file and deserialized into the
//! [`Config`] struct.  Every field has a default except the `storage.s3`
//! section, which the default `s3` backend requires; a file that only
//! sets `storage.backend: memory` is enough for local development.

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Object storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Image normalization settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted upload body in bytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// Which object store client to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Memory,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend type: `s3` or `memory`.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Bucket holding every object.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Skip the bucket existence check (and provisioning) at startup.
    #[serde(default)]
    pub skip_bucket_check: bool,

    /// Base URL objects are publicly served from.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// S3 client configuration.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: default_bucket(),
            skip_bucket_check: false,
            public_url: default_public_url(),
            s3: None,
        }
    }
}

/// S3 or S3-compatible endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Region to sign requests for.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3-compatible endpoint (e.g. MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: String,
    /// Force path-style URL addressing.
    #[serde(default = "default_true")]
    pub use_path_style: bool,
    /// Explicit access key (falls back to env/credential chain).
    #[serde(default)]
    pub access_key_id: String,
    /// Explicit secret key (falls back to env/credential chain).
    #[serde(default)]
    pub secret_access_key: String,
}

/// Image normalization configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImageConfig {
    /// Upper bound for both width and height, in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    /// JPEG re-encode quality, 1-100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.  `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: text or json.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics collection and the `/metrics` endpoint.
    #[serde(default = "default_true")]
    pub metrics: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { metrics: true }
    }
}

impl Config {
    /// Reject values that would only fail later at request time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.bucket.trim().is_empty() {
            anyhow::bail!("storage.bucket must not be empty");
        }
        let url = &self.storage.public_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("storage.public_url must start with http:// or https://, got '{url}'");
        }
        if self.storage.backend == StorageBackend::S3 && self.storage.s3.is_none() {
            anyhow::bail!("storage.backend is 's3' but storage.s3 config section is missing");
        }
        if self.image.max_dimension == 0 {
            anyhow::bail!("image.max_dimension must be greater than zero");
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            anyhow::bail!(
                "image.jpeg_quality must be between 1 and 100, got {}",
                self.image.jpeg_quality
            );
        }
        Ok(())
    }
}

// -- Defaults ----------------------------------------------------------------

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024
}

fn default_bucket() -> String {
    "default".to_string()
}

fn default_public_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_dimension() -> u32 {
    600
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_log_level() -> String {
    "info".to_string()
}

// -- Loader ------------------------------------------------------------------

/// Load, parse and validate configuration from a YAML file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: Config = serde_yaml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3100);
        assert_eq!(config.storage.bucket, "default");
        assert!(!config.storage.skip_bucket_check);
        assert_eq!(config.image.max_dimension, 600);
        assert_eq!(config.image.jpeg_quality, 80);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert!(config.observability.metrics);
    }

    #[test]
    fn test_default_backend_needs_s3_section() {
        let file = write_config("server:\n  port: 3100\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("storage.s3"));
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
server:
  port: 8080
storage:
  backend: s3
  bucket: resumes
  skip_bucket_check: true
  public_url: https://cdn.example.com
  s3:
    region: eu-west-1
    endpoint_url: http://minio:9000
    access_key_id: minio
    secret_access_key: minio123
image:
  max_dimension: 400
logging:
  format: json
"#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.bucket, "resumes");
        assert!(config.storage.skip_bucket_check);
        let s3 = config.storage.s3.unwrap();
        assert_eq!(s3.region, "eu-west-1");
        assert!(s3.use_path_style);
        assert_eq!(config.image.max_dimension, 400);
        assert_eq!(config.image.jpeg_quality, 80);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_memory_backend_needs_no_s3_section() {
        let file = write_config("storage:\n  backend: memory\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
    }

    #[test]
    fn test_s3_backend_requires_section() {
        let file = write_config("storage:\n  backend: s3\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("storage.s3"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config.validate().unwrap();

        config.storage.public_url = "cdn.example.com".to_string();
        assert!(config.validate().is_err());

        config.storage.public_url = "http://localhost:9000".to_string();
        config.image.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.image.jpeg_quality = 80;
        config.storage.bucket = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/resumestore.example.yaml");
        let config = load_config(path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.bucket, "default");
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let file = write_config("storage:\n  backend: azure\n");
        assert!(load_config(file.path()).is_err());
    }
}
