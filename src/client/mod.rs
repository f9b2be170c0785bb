//! Outbound HTTP collaborators used by the rule evaluators.
//!
//! Evaluators only see the [`DelegateClient`] and [`RangeClient`] traits; the
//! `Http*` types are the production implementations.

mod delegate;
mod range;

pub use delegate::HttpDelegateClient;
pub use range::{HttpRangeClient, parse_range_body};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{DelegateError, RangeError};

/// One `SUFFIX:COUNT` record returned by the range service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPasswordUsage {
    pub suffix: String,
    pub usage_count: u64,
}

/// Raw answer from a delegate endpoint. Interpretation is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateResponse {
    pub status: u16,
    pub body: String,
}

/// Body posted to a delegate endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegatePayload<'a> {
    pub password: &'a str,
    pub user_id: &'a str,
}

#[async_trait]
pub trait DelegateClient: Send + Sync {
    /// POSTs `payload` as JSON to `url`, forwarding `headers`.
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        payload: &DelegatePayload<'_>,
    ) -> Result<DelegateResponse, DelegateError>;
}

#[async_trait]
pub trait RangeClient: Send + Sync {
    /// Returns every known compromised digest suffix sharing `prefix`.
    async fn range(&self, prefix: &str) -> Result<Vec<HashedPasswordUsage>, RangeError>;
}
