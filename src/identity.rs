//! Identity resolution: owner id to the display name used in pattern rules.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::context::RequestContext;
use crate::error::IdentityError;

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves `owner_id` to exactly one user name.
    async fn resolve_owner_name(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> Result<String, IdentityError>;
}

/// Resolver over a fixed id → name map.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityResolver {
    names: HashMap<String, String>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(owner_id.into(), name.into());
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve_owner_name(
        &self,
        _ctx: &RequestContext,
        owner_id: &str,
    ) -> Result<String, IdentityError> {
        self.names
            .get(owner_id)
            .cloned()
            .ok_or_else(|| IdentityError::NotFound(owner_id.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserCollection {
    total_records: u64,
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    username: String,
}

/// Looks users up through the tenant gateway's `/users` endpoint.
pub struct HttpUserResolver {
    client: reqwest::Client,
}

impl HttpUserResolver {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityResolver for HttpUserResolver {
    async fn resolve_owner_name(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> Result<String, IdentityError> {
        let lookup = |e: reqwest::Error| IdentityError::Lookup(e.to_string());

        let query = format!("id=={}", owner_id);
        let mut request = self
            .client
            .get(ctx.resolve("/users"))
            .query(&[("query", query.as_str())])
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in ctx.headers() {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(lookup)?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(IdentityError::Lookup(format!(
                "Error getting user by user id {}: HTTP {}",
                owner_id,
                response.status().as_u16()
            )));
        }

        let collection: UserCollection = response.json().await.map_err(lookup)?;
        match (collection.total_records, collection.users.into_iter().next()) {
            (0, _) => Err(IdentityError::NotFound(owner_id.to_string())),
            (1, Some(user)) => Ok(user.username),
            (1, None) => Err(IdentityError::Lookup(
                "User response reports one record but lists none".to_string(),
            )),
            (matches, _) => Err(IdentityError::Ambiguous {
                owner: owner_id.to_string(),
                matches,
            }),
        }
    }
}
