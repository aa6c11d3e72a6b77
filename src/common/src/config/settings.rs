use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::UNSET_VALUE;

/// User the fixture connects to Trino as.
pub const TEST_USER: &str = "test";

/// Returns true when a resolved value is present and not the `CHANGE.ME` sentinel.
pub fn is_set(value: &str) -> bool {
    !value.is_empty() && value != UNSET_VALUE
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(format!("unsupported scheme '{other}', expected http or https")),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => f.write_str("http"),
            Scheme::Https => f.write_str("https"),
        }
    }
}

/// Certificate verification for the storage endpoint.
///
/// The raw `ca` setting is either a boolean-like string or a path to a
/// CA bundle; anything that is not `true`/`false` (case-insensitive) is
/// kept as a path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "path")]
pub enum TlsVerification {
    Enabled,
    Disabled,
    CaBundle(PathBuf),
}

impl TlsVerification {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            TlsVerification::Enabled
        } else if raw.eq_ignore_ascii_case("false") {
            TlsVerification::Disabled
        } else {
            TlsVerification::CaBundle(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for TlsVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsVerification::Enabled => f.write_str("true"),
            TlsVerification::Disabled => f.write_str("false"),
            TlsVerification::CaBundle(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Which storage client teardown constructs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClientKind {
    /// Paginated `ListObjectsV2` + `DeleteObjects` (aws-sdk-s3).
    #[default]
    Batch,
    /// Recursive prefix deletion (object_store).
    Directory,
}

impl FromStr for StorageClientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batch" => Ok(StorageClientKind::Batch),
            "directory" => Ok(StorageClientKind::Directory),
            other => Err(format!(
                "unsupported storage client '{other}', expected batch or directory"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngineSettings {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    pub user: String,
}

impl EngineSettings {
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            scheme: Scheme::Http,
            user: TEST_USER.to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct StorageSettings {
    pub bucket: String,
    pub tls: TlsVerification,
    pub client: StorageClientKind,
    #[serde(serialize_with = "redact")]
    pub access_key: Option<String>,
    #[serde(serialize_with = "redact")]
    pub secret_key: Option<String>,
    pub endpoint: Option<String>,
}

impl StorageSettings {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            tls: TlsVerification::Enabled,
            client: StorageClientKind::default(),
            access_key: None,
            secret_key: None,
            endpoint: None,
        }
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_client(mut self, client: StorageClientKind) -> Self {
        self.client = client;
        self
    }

    /// Credentials for storage cleanup, present only when the access key,
    /// secret key and endpoint are all set and none is the sentinel.
    pub fn credentials(&self) -> Option<StorageCredentials> {
        let access_key = self.access_key.as_deref().filter(|v| is_set(v))?;
        let secret_key = self.secret_key.as_deref().filter(|v| is_set(v))?;
        let endpoint = self.endpoint.as_deref().filter(|v| is_set(v))?;
        Some(StorageCredentials {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            endpoint: endpoint.to_string(),
        })
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("bucket", &self.bucket)
            .field("tls", &self.tls)
            .field("client", &self.client)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: String,
}

impl StorageCredentials {
    /// Storage endpoints are always addressed over https.
    pub fn endpoint_url(&self) -> String {
        format!("https://{}", self.endpoint)
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Fully resolved fixture settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Target environment the config-file sections were selected by.
    pub target: String,
    pub engine: EngineSettings,
    pub storage: StorageSettings,
}

impl Settings {
    pub fn new(engine: EngineSettings, storage: StorageSettings) -> Self {
        Self {
            target: super::DEFAULT_SECTION.to_string(),
            engine,
            storage,
        }
    }
}

fn redact<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) if is_set(v) => serializer.serialize_some("***"),
        Some(v) => serializer.serialize_some(v),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_flag_is_case_insensitive() {
        assert_eq!(TlsVerification::parse("TRUE"), TlsVerification::Enabled);
        assert_eq!(TlsVerification::parse("False"), TlsVerification::Disabled);
        assert_eq!(
            TlsVerification::parse("/etc/ssl/bundle.pem"),
            TlsVerification::CaBundle(PathBuf::from("/etc/ssl/bundle.pem"))
        );
    }

    #[test]
    fn test_credentials_require_all_three_values() {
        let storage = StorageSettings::new("bucket");
        assert!(storage.credentials().is_none());

        let storage = storage.with_credentials("key", "secret", "s3.example.org");
        let credentials = storage.credentials().unwrap();
        assert_eq!(credentials.endpoint_url(), "https://s3.example.org");

        let mut partial = storage.clone();
        partial.secret_key = Some(UNSET_VALUE.to_string());
        assert!(partial.credentials().is_none());

        let mut partial = storage;
        partial.endpoint = None;
        assert!(partial.credentials().is_none());
    }

    #[test]
    fn test_secrets_are_redacted() {
        let storage =
            StorageSettings::new("bucket").with_credentials("AKIA123", "s3cr3t", "s3.example.org");

        let debug = format!("{storage:?}");
        assert!(!debug.contains("AKIA123"));
        assert!(!debug.contains("s3cr3t"));

        let json = serde_json::to_string(&storage).unwrap();
        assert!(!json.contains("AKIA123"));
        assert!(!json.contains("s3cr3t"));
        assert!(json.contains("s3.example.org"));
    }

    #[test]
    fn test_scheme_and_client_parsing() {
        assert_eq!("HTTPS".parse::<Scheme>().unwrap(), Scheme::Https);
        assert!("ftp".parse::<Scheme>().is_err());
        assert_eq!(
            "directory".parse::<StorageClientKind>().unwrap(),
            StorageClientKind::Directory
        );
        assert!("pyarrow".parse::<StorageClientKind>().is_err());
    }

    #[test]
    fn test_engine_base_url() {
        let engine = EngineSettings {
            host: "trino.example.org".to_string(),
            port: 443,
            scheme: Scheme::Https,
            user: TEST_USER.to_string(),
        };
        assert_eq!(engine.base_url(), "https://trino.example.org:443");
    }
}
