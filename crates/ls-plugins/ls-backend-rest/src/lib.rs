//! # ls-backend-rest
//!
//! Adapter for a hosted backend-as-a-service exposing three HTTP APIs under
//! one base URL:
//!
//! - `/auth/v1/*`    identity (sign-up, password grant, logout)
//! - `/rest/v1/*`    relational tables (`profiles`, `posts`)
//! - `/storage/v1/*` object storage with public URLs
//!
//! One `RestBackend` implements every port; share it behind an `Arc`.

mod auth;
mod records;
mod storage;

use std::sync::RwLock;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use ls_core::models::Session;
use reqwest::{Client, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::info;

pub struct RestBackend {
    http: Client,
    base_url: String,
    /// Parsed `base_url`, used where path segments need encoding
    base: Url,
    api_key: SecretString,
    /// User JWT from the last successful sign-in
    access_token: RwLock<Option<SecretString>>,
    session: watch::Sender<Option<Session>>,
}

impl RestBackend {
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("invalid backend url {base_url}"))?;
        if base.cannot_be_a_base() {
            bail!("backend url {base_url} cannot carry a path");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to create HTTP client")?;
        let (session, _rx) = watch::channel(None);

        info!(%base_url, "hosted backend client initialized");

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            base,
            api_key,
            access_token: RwLock::new(None),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/{prefix..}/{bucket}/{key}`, with the bucket and every key
    /// segment percent-encoded.
    fn object_url(&self, prefix: &[&str], bucket: &str, key: &str) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(prefix)
                .push(bucket)
                .extend(key.split('/'));
        }
        url
    }

    /// Attaches the project key and the bearer token (the user's JWT when
    /// signed in, the project key otherwise).
    fn authorized(&self, request: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        let bearer = {
            let token = self
                .access_token
                .read()
                .map_err(|_| anyhow!("access token lock poisoned"))?;
            match token.as_ref() {
                Some(token) => token.expose_secret().to_string(),
                None => self.api_key.expose_secret().to_string(),
            }
        };
        Ok(request
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(bearer))
    }

    fn set_access_token(&self, token: Option<SecretString>) -> anyhow::Result<()> {
        *self
            .access_token
            .write()
            .map_err(|_| anyhow!("access token lock poisoned"))? = token;
        Ok(())
    }
}

/// Turns a non-2xx response into an error carrying the response body.
async fn ensure_success(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    bail!("backend returned {status}: {body}")
}
