//! k-anonymity range service client (`GET /range/{prefix}`).

use std::time::Duration;

use async_trait::async_trait;

use super::{HashedPasswordUsage, RangeClient};
use crate::error::RangeError;

const ADD_PADDING_HEADER: &str = "Add-Padding";

/// Parses a newline-delimited `SUFFIX:COUNT` body.
///
/// Whitespace around either field is tolerated and blank lines are skipped.
/// Any other malformed line fails the whole body with its 0-based line number.
pub fn parse_range_body(body: &str) -> Result<Vec<HashedPasswordUsage>, RangeError> {
    let mut usages = Vec::new();

    for (line_no, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let invalid_line = || RangeError::InvalidLine {
            line: line_no,
            content: line.to_string(),
        };

        let (suffix, count) = line.split_once(':').ok_or_else(invalid_line)?;
        let (suffix, count) = (suffix.trim(), count.trim());

        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid_line());
        }
        if count.is_empty() || !count.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid_line());
        }

        let usage_count = count.parse::<u64>().map_err(|_| RangeError::InvalidCount {
            line: line_no,
            value: count.to_string(),
        })?;

        usages.push(HashedPasswordUsage {
            suffix: suffix.to_string(),
            usage_count,
        });
    }

    Ok(usages)
}

/// Range service client backed by [`reqwest`].
pub struct HttpRangeClient {
    client: reqwest::Client,
    base_url: String,
    padding: bool,
}

impl HttpRangeClient {
    /// * `base_url` - service root, e.g. `https://api.pwnedpasswords.com`.
    /// * `padding` - ask the service to pad answers with zero-count decoys.
    pub fn new(
        base_url: impl Into<String>,
        padding: bool,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, base_url, padding))
    }

    /// Reuses an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, padding: bool) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            padding,
        }
    }
}

#[async_trait]
impl RangeClient for HttpRangeClient {
    async fn range(&self, prefix: &str) -> Result<Vec<HashedPasswordUsage>, RangeError> {
        let mut request = self
            .client
            .get(format!("{}/range/{}", self.base_url, prefix))
            .header(reqwest::header::ACCEPT, "text/plain");
        if self.padding {
            request = request.header(ADD_PADDING_HEADER, "true");
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RangeError::HttpStatus(status.as_u16()));
        }

        let usages = parse_range_body(&response.text().await?)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            prefix,
            records = usages.len(),
            "Hashed password usages extracted from range response"
        );

        Ok(usages)
    }
}
