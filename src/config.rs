use std::{path::Path, time::Duration};

use anyhow::Result;
use log::debug;
use reqwest::{Client, Url};
use serde::Deserialize;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
pub const DEFAULT_ENDPOINT: &str = "/api/process";
pub const DEFAULT_FILE_FIELD: &str = "excel";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub server: String,
    pub endpoint: String,
    pub file_field: String,
    pub output_dir: String,
    pub connection_timeout: Option<Duration>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_owned(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            file_field: DEFAULT_FILE_FIELD.to_owned(),
            output_dir: ".".to_owned(),
            connection_timeout: None,
        }
    }
}

impl RelayConfig {
    pub fn server(self, server: String) -> Self {
        Self { server, ..self }
    }

    pub fn endpoint(self, endpoint: String) -> Self {
        Self { endpoint, ..self }
    }

    pub fn file_field(self, file_field: String) -> Self {
        Self { file_field, ..self }
    }

    pub fn output_dir(self, output_dir: String) -> Self {
        Self { output_dir, ..self }
    }

    pub fn connection_timeout(self, timeout: Duration) -> Self {
        Self {
            connection_timeout: Some(timeout),
            ..self
        }
    }

    /// Apply the values set in a config file on top of `self`.
    pub fn merge(self, file: FileConfig) -> Self {
        Self {
            server: file.server.unwrap_or(self.server),
            endpoint: file.endpoint.unwrap_or(self.endpoint),
            file_field: file.file_field.unwrap_or(self.file_field),
            output_dir: file.output_dir.unwrap_or(self.output_dir),
            connection_timeout: file
                .connection_timeout
                .map(Duration::from_millis)
                .or(self.connection_timeout),
        }
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let base = Url::parse(&self.server)?;
        Ok(base.join(&self.endpoint)?)
    }

    /// No overall request timeout: a submission runs until it completes or fails.
    pub fn client(&self) -> reqwest::Result<Client> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.connection_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder.build()
    }
}

/// Keys accepted in a TOML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub server: Option<String>,
    pub endpoint: Option<String>,
    pub file_field: Option<String>,
    pub output_dir: Option<String>,
    /// Milliseconds.
    pub connection_timeout: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub async fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        debug!("Loaded config from {}.", path.as_ref().display());
        Self::parse(&text)
    }
}
