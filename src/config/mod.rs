pub mod loader;

pub use loader::{load_config, load_config_or_default};

use crate::encoding::{HashStrategy, DEFAULT_FILTERS, DEFAULT_SEPARATOR};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/spam-responder.toml";
pub const DEFAULT_VOCABULARY_SIZE: usize = 9013;
pub const DEFAULT_SAMPLE_LENGTH: usize = 240;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoding: EncodingConfig,
    pub inference: InferenceConfig,
    pub storage: ServiceEndpoint,
    pub mailer: ServiceEndpoint,
    pub notebook: NotebookConfig,
    pub reply: ReplyConfig,
}

/// Must match the settings the deployed model was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub vocabulary_size: usize,
    pub hash: HashStrategy,
    pub lowercase: bool,
    pub separator: String,
    pub filters: String,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            vocabulary_size: DEFAULT_VOCABULARY_SIZE,
            hash: HashStrategy::Md5,
            lowercase: true,
            separator: DEFAULT_SEPARATOR.to_string(),
            filters: DEFAULT_FILTERS.to_string(),
        }
    }
}

/// Base URL, timeout and optional bearer token of an HTTP collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8700".to_string(),
            timeout_seconds: 30,
            auth_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,
    #[serde(flatten)]
    pub service: ServiceEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    pub instance_name: String,
    #[serde(flatten)]
    pub service: ServiceEndpoint,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            instance_name: "SageMaker-Tutorial".to_string(),
            service: ServiceEndpoint::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    pub sample_length: usize,
    pub signature: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            sample_length: DEFAULT_SAMPLE_LENGTH,
            signature: "Email Classifier Bot".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config(path)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        loader::write_config(self, path)
    }

    /// The endpoint identifier, or a configuration error when it is unset.
    pub fn endpoint_name(&self) -> Result<&str> {
        match self.inference.endpoint_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(Error::Config(
                "inference.endpoint_name is not set".to_string(),
            )),
        }
    }

    /// Checks everything a classification needs before any email is touched.
    pub fn validate(&self) -> Result<()> {
        if self.encoding.vocabulary_size <= 1 {
            return Err(Error::Config(format!(
                "encoding.vocabulary_size must be greater than 1, got {}",
                self.encoding.vocabulary_size
            )));
        }
        if self.encoding.separator.is_empty() {
            return Err(Error::Config(
                "encoding.separator must not be empty".to_string(),
            ));
        }
        self.endpoint_name()?;

        for (section, endpoint) in [
            ("inference", &self.inference.service),
            ("storage", &self.storage),
            ("mailer", &self.mailer),
            ("notebook", &self.notebook.service),
        ] {
            url::Url::parse(&endpoint.base_url).map_err(|e| {
                Error::Config(format!(
                    "{section}.base_url '{}' is not a valid URL: {e}",
                    endpoint.base_url
                ))
            })?;
        }

        if self.reply.sample_length == 0 {
            log::warn!("reply.sample_length is 0, replies will carry no body sample");
        }

        Ok(())
    }
}
