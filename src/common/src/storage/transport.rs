//! reqwest transport for aws-sdk-s3, built from the storage `ca` setting.

use aws_smithy_runtime_api::client::http::{
    HttpClient, HttpConnector, HttpConnectorFuture, HttpConnectorSettings, SharedHttpConnector,
};
use aws_smithy_runtime_api::client::orchestrator::{HttpRequest, HttpResponse};
use aws_smithy_runtime_api::client::result::ConnectorError;
use aws_smithy_runtime_api::client::runtime_components::RuntimeComponents;
use aws_smithy_runtime_api::http::StatusCode;
use aws_smithy_types::body::SdkBody;

use super::StoreError;
use crate::config::TlsVerification;

/// HTTP client trusting whatever `tls` says to trust.
pub fn tls_client(tls: &TlsVerification) -> Result<reqwest::Client, StoreError> {
    let builder = reqwest::Client::builder();
    let builder = match tls {
        TlsVerification::Enabled => builder,
        TlsVerification::Disabled => builder.danger_accept_invalid_certs(true),
        TlsVerification::CaBundle(path) => {
            let pem = std::fs::read(path).map_err(|e| {
                StoreError::backend("read CA bundle", format!("{}: {e}", path.display()))
            })?;
            reqwest::Certificate::from_pem_bundle(&pem)
                .map_err(|e| StoreError::backend("parse CA bundle", e))?
                .into_iter()
                .fold(builder, reqwest::ClientBuilder::add_root_certificate)
        }
    };
    builder
        .build()
        .map_err(|e| StoreError::backend("build HTTP client", e))
}

/// Sends SDK requests through a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_tls(tls: &TlsVerification) -> Result<Self, StoreError> {
        tls_client(tls).map(Self::new)
    }
}

impl HttpClient for ReqwestHttpClient {
    fn http_connector(
        &self,
        _settings: &HttpConnectorSettings,
        _components: &RuntimeComponents,
    ) -> SharedHttpConnector {
        SharedHttpConnector::new(self.clone())
    }
}

impl HttpConnector for ReqwestHttpClient {
    fn call(&self, request: HttpRequest) -> HttpConnectorFuture {
        let client = self.client.clone();
        HttpConnectorFuture::new(async move { send(&client, request).await })
    }
}

async fn send(
    client: &reqwest::Client,
    request: HttpRequest,
) -> Result<HttpResponse, ConnectorError> {
    let method = reqwest::Method::from_bytes(request.method().as_bytes())
        .map_err(|e| ConnectorError::user(e.into()))?;
    // S3 list and batch-delete bodies are always buffered
    let body = request
        .body()
        .bytes()
        .ok_or_else(|| ConnectorError::user("streaming request bodies are not supported".into()))?
        .to_vec();

    let mut outgoing = client.request(method, request.uri());
    // reqwest derives content-length from the body
    for (name, value) in request.headers() {
        if !name.eq_ignore_ascii_case("content-length") {
            outgoing = outgoing.header(name, value);
        }
    }

    let response = outgoing.body(body).send().await.map_err(|e| {
        if e.is_timeout() {
            ConnectorError::timeout(e.into())
        } else {
            ConnectorError::io(e.into())
        }
    })?;

    let status = StatusCode::try_from(response.status().as_u16())
        .map_err(|e| ConnectorError::other(e.into(), None))?;
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConnectorError::io(e.into()))?;

    let mut sdk_response = HttpResponse::new(status, SdkBody::from(bytes.to_vec()));
    for (name, value) in headers {
        sdk_response
            .headers_mut()
            .try_append(name, value)
            .map_err(|e| ConnectorError::other(e.into(), None))?;
    }
    Ok(sdk_response)
}
