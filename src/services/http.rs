use super::{
    InferenceClient, Mailer, NotebookControl, NotebookStatus, ObjectStore, OutgoingMessage,
};
use crate::config::ServiceEndpoint;
use crate::error::{Error, Result};
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use url::Url;

/// Connection details shared by every HTTP collaborator.
#[derive(Debug, Clone)]
struct HttpService {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpService {
    fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        let base_url = Url::parse(&endpoint.base_url).map_err(|e| {
            Error::Config(format!("Invalid base URL '{}': {e}", endpoint.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Base URL '{}' cannot carry a path",
                endpoint.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_seconds))
            .user_agent(concat!("spam-responder/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            client,
            base_url,
            auth_token: endpoint.auth_token.clone(),
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn url<'a, I>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Reads the body of a successful response, mapping transport and HTTP
/// status failures through `kind`.
async fn success_body(
    response: std::result::Result<Response, reqwest::Error>,
    kind: fn(String) -> Error,
) -> Result<String> {
    let response = response.map_err(|e| kind(e.to_string()))?;
    let status = response.status();
    let body = response.text().await.map_err(|e| kind(e.to_string()))?;
    if !status.is_success() {
        return Err(kind(format!("HTTP {}: {}", status.as_u16(), body.trim())));
    }
    Ok(body)
}

/// Fetches raw messages with `GET {base}/{bucket}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    service: HttpService,
}

impl HttpObjectStore {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(endpoint)?,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> Url {
        self.service.url(std::iter::once(bucket).chain(key.split('/')))
    }
}

impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<String> {
        let url = self.object_url(bucket, key);
        debug!("Fetching object {}", url);
        let request = self.service.authorize(self.service.client.get(url));
        success_body(request.send().await, Error::Storage).await
    }
}

/// Invokes a model with `POST {base}/endpoints/{name}/invocations`.
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    service: HttpService,
}

impl HttpInferenceClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(endpoint)?,
        })
    }

    fn invocation_url(&self, endpoint: &str) -> Url {
        self.service.url(["endpoints", endpoint, "invocations"])
    }
}

impl InferenceClient for HttpInferenceClient {
    async fn invoke_endpoint(
        &self,
        endpoint: &str,
        content_type: &str,
        body: String,
    ) -> Result<String> {
        let url = self.invocation_url(endpoint);
        debug!("Invoking endpoint {} ({} bytes)", url, body.len());
        let request = self
            .service
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, "application/json")
            .body(body);
        let request = self.service.authorize(request);
        success_body(request.send().await, Error::Inference).await
    }
}

/// Delivers replies with `POST {base}/send`.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    service: HttpService,
}

impl HttpMailer {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(endpoint)?,
        })
    }
}

impl Mailer for HttpMailer {
    async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let url = self.service.url(["send"]);
        debug!("Sending reply to {} via {}", message.destination, url);
        let request = self.service.authorize(self.service.client.post(url).json(message));
        success_body(request.send().await, Error::Delivery).await?;
        Ok(())
    }
}

/// Notebook lifecycle under `{base}/notebook-instances/{name}`.
#[derive(Debug, Clone)]
pub struct HttpNotebookControl {
    service: HttpService,
}

impl HttpNotebookControl {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self> {
        Ok(Self {
            service: HttpService::new(endpoint)?,
        })
    }

    fn instance_url(&self, instance: &str, action: Option<&str>) -> Url {
        self.service
            .url(["notebook-instances", instance].into_iter().chain(action))
    }

    async fn post_action(&self, instance: &str, action: &str) -> Result<()> {
        let url = self.instance_url(instance, Some(action));
        let request = self.service.authorize(self.service.client.post(url));
        success_body(request.send().await, Error::Notebook).await?;
        Ok(())
    }
}

impl NotebookControl for HttpNotebookControl {
    async fn describe(&self, instance: &str) -> Result<NotebookStatus> {
        let url = self.instance_url(instance, None);
        let request = self.service.authorize(self.service.client.get(url));
        let body = success_body(request.send().await, Error::Notebook).await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Notebook(format!("Unreadable status response: {e}")))
    }

    async fn stop(&self, instance: &str) -> Result<()> {
        self.post_action(instance, "stop").await
    }

    async fn start(&self, instance: &str) -> Result<()> {
        self.post_action(instance, "start").await
    }
}
