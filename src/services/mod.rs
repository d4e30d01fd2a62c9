//! Narrow interfaces over the managed services the responder talks to.

pub mod http;

pub use http::{HttpInferenceClient, HttpMailer, HttpNotebookControl, HttpObjectStore};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Source of raw email objects.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<String>;
}

/// Remote model endpoint. Receives the serialized request body and returns
/// the raw response body.
#[allow(async_fn_in_trait)]
pub trait InferenceClient {
    async fn invoke_endpoint(
        &self,
        endpoint: &str,
        content_type: &str,
        body: String,
    ) -> Result<String>;
}

/// Outbound mail delivery.
#[allow(async_fn_in_trait)]
pub trait Mailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<()>;
}

/// Lifecycle control of a hosted notebook instance.
#[allow(async_fn_in_trait)]
pub trait NotebookControl {
    async fn describe(&self, instance: &str) -> Result<NotebookStatus>;
    async fn stop(&self, instance: &str) -> Result<()>;
    async fn start(&self, instance: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub source: String,
    pub destination: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookStatus {
    pub status: String,
}
