//! Verdict persistence
//!
//! Write-only upsert of the full prediction document, keyed by
//! (app namespace, user, cattle id). The store is a fire-and-forget side
//! effect: callers spawn the write and a failure never touches the HTTP
//! response already computed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// User identity substituted when the request carries no `X-User-Id` header
pub const ANONYMOUS_USER: &str = "anonymous_user";

/// Document key for one animal's latest verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictKey {
    pub app_namespace: String,
    pub user_id: String,
    pub cattle_id: String,
}

impl VerdictKey {
    pub fn new(
        app_namespace: impl Into<String>,
        user_id: impl Into<String>,
        cattle_id: impl Into<String>,
    ) -> Self {
        Self {
            app_namespace: app_namespace.into(),
            user_id: user_id.into(),
            cattle_id: cattle_id.into(),
        }
    }

    /// Document path under the store root
    pub fn document_path(&self) -> String {
        format!(
            "artifacts/{}/users/{}/cattle/{}",
            self.app_namespace, self.user_id, self.cattle_id
        )
    }
}

/// Trait for verdict persistence implementations
#[async_trait]
pub trait VerdictStore: Send + Sync {
    /// Upsert the full verdict document at the given key
    async fn upsert(&self, key: &VerdictKey, document: &Value) -> Result<()>;
}

/// HTTP-backed store that upserts documents with PUT
pub struct HttpVerdictStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpVerdictStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn document_url(&self, key: &VerdictKey) -> String {
        format!("{}/{}", self.base_url, key.document_path())
    }
}

#[async_trait]
impl VerdictStore for HttpVerdictStore {
    async fn upsert(&self, key: &VerdictKey, document: &Value) -> Result<()> {
        let url = self.document_url(key);
        let response = self
            .client
            .put(&url)
            .json(document)
            .send()
            .await
            .with_context(|| format!("Failed to reach verdict store at {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Verdict store rejected upsert at {url}: {status}");
        }

        debug!(cattle_id = %key.cattle_id, user_id = %key.user_id, "Verdict persisted");
        Ok(())
    }
}
