//! Analytical query service client.
//!
//! The core only needs "submit query → rows | failure" semantics, so the
//! seam is a single-method trait. The HTTP implementation signs a
//! short-lived tenant-scoped HS256 token per request — tenant isolation
//! is enforced by the service from the token claims, never from query
//! contents.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::QueryError;
use crate::query::{Row, SubQuery};

/// Seam to the analytical query service.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Submit one structured sub-query, scoped to `tenant_id`.
    async fn submit(&self, query: &SubQuery, tenant_id: &str) -> Result<Vec<Row>, QueryError>;
}

/// Token lifetime for per-request tenant tokens.
const TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Serialize)]
struct TenantClaims<'a> {
    sub: &'a str,
    tenant_id: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct LoadResponse {
    #[serde(default)]
    data: Vec<Row>,
}

/// HTTP client for the analytical query service.
pub struct HttpQueryClient {
    base_url: String,
    secret: String,
    http: reqwest::Client,
}

impl HttpQueryClient {
    /// Create a client for `base_url` with the shared signing `secret`.
    /// `timeout` bounds every request.
    pub fn new(
        base_url: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            secret: secret.into(),
            http,
        })
    }

    /// Sign a short-lived tenant-scoped token.
    fn tenant_token(&self, tenant_id: &str) -> Result<String, QueryError> {
        let now = Utc::now().timestamp();
        let claims = TenantClaims {
            sub: tenant_id,
            tenant_id,
            iat: now,
            exp: now + TOKEN_TTL.as_secs() as i64,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| QueryError::Service(format!("token signing failed: {e}")))
    }
}

#[async_trait]
impl QueryClient for HttpQueryClient {
    #[instrument(skip(self, query), fields(label = %query.label))]
    async fn submit(&self, query: &SubQuery, tenant_id: &str) -> Result<Vec<Row>, QueryError> {
        let token = self.tenant_token(tenant_id)?;
        let body = serde_json::to_string(query)
            .map_err(|e| QueryError::Service(format!("query serialization failed: {e}")))?;

        let response = self
            .http
            .get(format!("{}/v1/load", self.base_url))
            .bearer_auth(token)
            .query(&[("query", body.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(QueryError::Service(format!("HTTP {status}: {detail}")));
        }

        let parsed: LoadResponse = response
            .json::<Value>()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| QueryError::Decode(e.to_string()))
            })?;
        debug!(rows = parsed.data.len(), "query service responded");
        Ok(parsed.data)
    }
}
