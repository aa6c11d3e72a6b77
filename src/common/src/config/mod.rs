//! Connection and storage settings.
//!
//! Every value is looked up in the same order: an explicit environment
//! variable, then the config-file section chosen by the target environment,
//! then a literal fallback. The config file is TOML, read from
//! `private/config.toml` by default. An existing INI-style `config.ini`
//! carries over section for section; quote string values when converting:
//!
//! ```toml
//! [default]
//! target = "dev"
//!
//! [dev]
//! trino = "trino-dev"
//! s3 = "s3-dev"
//!
//! [trino-dev]
//! host = "trino.example.org"
//! port = 443
//! scheme = "https"
//!
//! [s3-dev]
//! ca = "true"
//! bucket = "analytics"
//! key = "CHANGE.ME"
//! secret = "CHANGE.ME"
//! endpoint = "s3.example.org"
//! ```

mod settings;

use std::fmt;
use std::path::{Path, PathBuf};

use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Format, Toml},
    value::{Dict, Map, Value},
};
use serde::Deserialize;

pub use settings::{
    EngineSettings, Scheme, Settings, StorageClientKind, StorageCredentials, StorageSettings,
    TEST_USER, TlsVerification, is_set,
};

/// Sentinel written into config templates for values that must be filled in.
pub const UNSET_VALUE: &str = "CHANGE.ME";
pub const DEFAULT_CONFIG_PATH: &str = "private/config.toml";
pub const DEFAULT_SECTION: &str = "default";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SCHEME: &str = "http";
const DEFAULT_CA: &str = "true";

/// Environment variables that take precedence over the config file.
pub mod vars {
    pub const CONFIG_PATH: &str = "TRINO_TEST_CONFIG";
    pub const TARGET_ENV: &str = "TRINO_TEST_ENV";
    pub const HOST: &str = "TRINO_HOST";
    pub const PORT: &str = "TRINO_PORT";
    pub const SCHEME: &str = "TRINO_SCHEME";
    pub const CA_BUNDLE: &str = "CA_BUNDLE";
    pub const BUCKET: &str = "AWS_S3_BUCKET";
    pub const ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const ENDPOINT: &str = "AWS_S3_ENDPOINT";
    pub const STORAGE_CLIENT: &str = "STORAGE_CLIENT";

    pub const ALL: &[&str] = &[
        CONFIG_PATH,
        TARGET_ENV,
        HOST,
        PORT,
        SCHEME,
        CA_BUNDLE,
        BUCKET,
        ACCESS_KEY,
        SECRET_KEY,
        ENDPOINT,
        STORAGE_CLIENT,
    ];
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("S3 bucket not set")]
    BucketNotSet,

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read configuration: {0}")]
    Source(#[from] Box<figment::Error>),
}

/// Any scalar a TOML file or an environment variable can hold.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(v) => f.write_str(v),
        }
    }
}

/// The recognised environment variables, each kept as the exact string set.
///
/// `figment::providers::Env` parses values into typed scalars, which would
/// turn a bucket named `0042` into `42`.
struct RawEnv;

impl Provider for RawEnv {
    fn metadata(&self) -> Metadata {
        Metadata::named("environment variable(s)")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let dict = vars::ALL
            .iter()
            .filter_map(|var| {
                std::env::var(var)
                    .ok()
                    .map(|value| (var.to_string(), Value::from(value)))
            })
            .collect::<Dict>();
        Ok(Profile::Default.collect(dict))
    }
}

/// Resolves fixture settings from the environment and a config file.
pub struct ConfigResolver {
    file: Figment,
    env: Figment,
}

impl ConfigResolver {
    /// Reads the config file named by `TRINO_TEST_CONFIG`, or
    /// `private/config.toml` when unset.
    pub fn load() -> Self {
        Self::from_path(None)
    }

    pub fn from_path(path: Option<&Path>) -> Self {
        let env = Figment::from(RawEnv);
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env_lookup(&env, vars::CONFIG_PATH).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        tracing::debug!(path = %path.display(), "Using configuration file");
        Self::with_providers(Toml::file(path), RawEnv)
    }

    /// Builds a resolver over arbitrary providers for the file and
    /// environment layers.
    pub fn with_providers(file: impl Provider, env: impl Provider) -> Self {
        Self {
            file: Figment::from(file),
            env: Figment::from(env),
        }
    }

    /// Target environment: `TRINO_TEST_ENV`, else `[default].target`,
    /// else `default`.
    pub fn target(&self) -> String {
        env_lookup(&self.env, vars::TARGET_ENV)
            .or_else(|| self.file_value(DEFAULT_SECTION, "target"))
            .unwrap_or_else(|| DEFAULT_SECTION.to_string())
    }

    /// Looks up one value: environment variable first, then
    /// `[section].key` from the file.
    pub fn value(&self, var: Option<&str>, section: &str, key: &str) -> Option<String> {
        var.and_then(|var| env_lookup(&self.env, var))
            .or_else(|| self.file_value(section, key))
    }

    fn file_value(&self, section: &str, key: &str) -> Option<String> {
        lookup(&self.file, &format!("{section}.{key}"))
    }

    pub fn resolve(&self) -> Result<Settings, ConfigurationError> {
        // Surface a malformed file instead of silently falling back.
        self.file.extract::<Dict>().map_err(Box::new)?;

        let target = self.target();
        let engine_section = self
            .file_value(&target, "trino")
            .unwrap_or_else(|| DEFAULT_SECTION.to_string());
        let storage_section = self
            .file_value(&target, "s3")
            .unwrap_or_else(|| DEFAULT_SECTION.to_string());

        let engine = self.resolve_engine(&engine_section)?;
        let storage = self.resolve_storage(&storage_section)?;

        Ok(Settings {
            target,
            engine,
            storage,
        })
    }

    fn resolve_engine(&self, section: &str) -> Result<EngineSettings, ConfigurationError> {
        let host = self
            .value(Some(vars::HOST), section, "host")
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match self.value(Some(vars::PORT), section, "port") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigurationError::InvalidValue {
                    key: "port",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        let raw_scheme = self
            .value(Some(vars::SCHEME), section, "scheme")
            .unwrap_or_else(|| DEFAULT_SCHEME.to_string());
        let scheme = raw_scheme
            .parse::<Scheme>()
            .map_err(|reason| ConfigurationError::InvalidValue {
                key: "scheme",
                value: raw_scheme.clone(),
                reason,
            })?;

        Ok(EngineSettings {
            host,
            port,
            scheme,
            user: TEST_USER.to_string(),
        })
    }

    fn resolve_storage(&self, section: &str) -> Result<StorageSettings, ConfigurationError> {
        let bucket = self
            .value(Some(vars::BUCKET), section, "bucket")
            .filter(|bucket| is_set(bucket))
            .ok_or(ConfigurationError::BucketNotSet)?;

        let tls = TlsVerification::parse(
            &self
                .value(Some(vars::CA_BUNDLE), section, "ca")
                .unwrap_or_else(|| DEFAULT_CA.to_string()),
        );

        let client = match self.value(Some(vars::STORAGE_CLIENT), section, "client") {
            Some(raw) => raw
                .parse::<StorageClientKind>()
                .map_err(|reason| ConfigurationError::InvalidValue {
                    key: "client",
                    value: raw.clone(),
                    reason,
                })?,
            None => StorageClientKind::default(),
        };

        Ok(StorageSettings {
            bucket,
            tls,
            client,
            access_key: self.value(Some(vars::ACCESS_KEY), section, "key"),
            secret_key: self.value(Some(vars::SECRET_KEY), section, "secret"),
            endpoint: self.value(Some(vars::ENDPOINT), section, "endpoint"),
        })
    }
}

fn lookup(figment: &Figment, key: &str) -> Option<String> {
    figment
        .extract_inner::<Scalar>(key)
        .ok()
        .map(|value| value.to_string())
        .filter(|value| !value.is_empty())
}

fn env_lookup(env: &Figment, var: &str) -> Option<String> {
    lookup(env, var).or_else(|| lookup(env, &var.to_ascii_lowercase()))
}
