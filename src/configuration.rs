//! src/configuration.rs
use anyhow::Context;
use secrecy::SecretString;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::{net::IpAddr, path::PathBuf, str::FromStr, time::Duration};

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub input: InputSettings,
    pub cluster: ClusterSettings,
    pub rpc: RpcSettings,
    pub output: OutputSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct InputSettings {
    pub path: PathBuf,
    #[serde(
        default = "default_batch_size",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    10_000
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    Sequential,
    Parallel,
    Distributed,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ClusterSettings {
    pub executor: ExecutorKind,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub workers: u16,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct RpcSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_in_flight: usize,
}

impl RpcSettings {
    pub fn get_host(&self) -> Result<IpAddr, anyhow::Error> {
        IpAddr::from_str(&self.host).context(format!("Invalid rpc host: {}", self.host))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputBackend {
    File,
    S3,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct OutputSettings {
    pub backend: OutputBackend,
    pub path: PathBuf,
    pub s3: Option<S3Settings>,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct S3Settings {
    pub region: String,
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub bucket: String,
    pub key: String,
}

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub otlp: bool,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory.");
    let config_dir = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base.yaml")))
        .add_source(
            config::Environment::with_prefix("TRACKSTATS")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
