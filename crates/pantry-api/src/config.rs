use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    S3,
    /// Process-local; everything is lost on exit.
    Memory,
}

/// How `DELETE /recipes/{id}` reports failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteErrors {
    /// Every failure becomes the 200 "No Recipe found" message.
    #[default]
    Mask,
    /// Failures are returned like on every other endpoint.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for StoreKind {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s3" => Ok(StoreKind::S3),
            "memory" => Ok(StoreKind::Memory),
            other => Err(eyre::eyre!("unknown store `{other}` (expected `s3` or `memory`)")),
        }
    }
}

impl FromStr for DeleteErrors {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mask" => Ok(DeleteErrors::Mask),
            "surface" => Ok(DeleteErrors::Surface),
            other => Err(eyre::eyre!(
                "unknown delete error policy `{other}` (expected `mask` or `surface`)"
            )),
        }
    }
}

impl FromStr for LogFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(eyre::eyre!("unknown log format `{other}` (expected `json` or `pretty`)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub store: StoreKind,
    pub bucket: String,
    /// S3-compatible endpoint override (MinIO, LocalStack).
    pub s3_endpoint: Option<String>,
    /// Unset: run as an AWS Lambda function. Set: serve HTTP on this address.
    pub listen_addr: Option<SocketAddr>,
    pub delete_errors: DeleteErrors,
    pub log_format: LogFormat,
}

impl ApiConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let listen_addr = match var("PANTRY_LISTEN_ADDR") {
            Some(addr) => Some(
                addr.parse()
                    .map_err(|e| eyre::eyre!("invalid PANTRY_LISTEN_ADDR `{addr}`: {e}"))?,
            ),
            None => None,
        };

        Ok(Self {
            store: or_default("PANTRY_STORE", "s3").parse()?,
            bucket: or_default("PANTRY_BUCKET", "pantry"),
            s3_endpoint: var("PANTRY_S3_ENDPOINT"),
            listen_addr,
            delete_errors: or_default("PANTRY_DELETE_ERRORS", "mask").parse()?,
            log_format: or_default("PANTRY_LOG_FORMAT", "json").parse()?,
        })
    }
}
