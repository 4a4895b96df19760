// Hand-crafted async HTTP client for the portal node API.
//
// Auth: `Authorization: Bearer <node key>` on every request.
// All endpoints live directly under the portal's node API base path.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::transport::TransportConfig;
use crate::types::{CertificateBundle, ConnectEvent, DisconnectEvent, Envelope};

/// Async client for the portal node API.
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PortalClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a node API key and transport config.
    ///
    /// Injects the bearer token as a default header on every request.
    pub fn new(
        base_url: &str,
        api_key: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
                .map_err(|_| ApiError::InvalidApiKey)?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let http = transport.build_client(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, ApiError> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Parse the base URL and make sure it ends with `/` so joins work.
    fn normalize_base_url(raw: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    // ── API calls ────────────────────────────────────────────────────

    /// Fetch the profile map, keyed by profile id.
    ///
    /// Generic over the profile payload so this crate stays free of domain
    /// types; `vpnode-core` supplies its `ProfileDefinition`. A `BTreeMap`
    /// keeps iteration order deterministic for downstream synthesis.
    pub async fn profile_list<T: DeserializeOwned>(
        &self,
    ) -> Result<BTreeMap<String, T>, ApiError> {
        self.get("profile_list").await
    }

    /// Request server key material for the given common name.
    pub async fn add_server_certificate(
        &self,
        common_name: &str,
    ) -> Result<CertificateBundle, ApiError> {
        #[derive(Serialize)]
        struct Body<'a> {
            common_name: &'a str,
        }
        self.post("add_server_certificate", &Body { common_name })
            .await
    }

    /// Relay a client-connect event.
    pub async fn connect(&self, event: &ConnectEvent) -> Result<(), ApiError> {
        self.post_ack("connect", event).await
    }

    /// Relay a client-disconnect event.
    pub async fn disconnect(&self, event: &DisconnectEvent) -> Result<(), ApiError> {
        self.post_ack("disconnect", event).await
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &'static str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(path, resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &'static str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(path, resp).await
    }

    /// POST where only the envelope's `ok` flag matters.
    async fn post_ack<B: Serialize + Sync>(
        &self,
        path: &'static str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let envelope: Envelope<serde_json::Value> = Self::decode(resp).await?;
        if envelope.ok {
            Ok(())
        } else {
            Err(ApiError::Rejected {
                message: envelope.error.unwrap_or_else(|| "unspecified".into()),
            })
        }
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        call: &'static str,
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let envelope: Envelope<T> = Self::decode(resp).await?;
        if !envelope.ok {
            return Err(ApiError::Rejected {
                message: envelope.error.unwrap_or_else(|| "unspecified".into()),
            });
        }
        envelope.data.ok_or(ApiError::MissingData { call })
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            ApiError::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> ApiError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return ApiError::InvalidApiKey;
        }

        let raw = resp.text().await.unwrap_or_default();

        // The portal wraps errors in the envelope even on non-2xx.
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&raw)
            .ok()
            .and_then(|e| e.error)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        ApiError::Portal {
            status: status.as_u16(),
            message,
        }
    }
}
