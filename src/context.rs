//! Per-call tenant and gateway context.

pub const TENANT_HEADER: &str = "x-okapi-tenant";
pub const TOKEN_HEADER: &str = "x-okapi-token";

/// Tenant identity and the headers needed to reach tenant-scoped services.
///
/// Passed explicitly into every validation call; nothing is read from
/// ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    tenant: String,
    gateway_url: String,
    headers: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(tenant: impl Into<String>, gateway_url: impl Into<String>) -> Self {
        let tenant = tenant.into();
        Self {
            headers: vec![(TENANT_HEADER.to_string(), tenant.clone())],
            tenant,
            gateway_url: gateway_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.with_header(TOKEN_HEADER, token)
    }

    /// Adds a header forwarded on every outbound call. Replaces an existing
    /// header of the same name (case-insensitive).
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        self.headers.retain(|(existing, _)| *existing != name);
        self.headers.push((name, value.into()));
        self
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Absolute URL of a gateway-relative path.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.gateway_url, path)
        } else {
            format!("{}/{}", self.gateway_url, path)
        }
    }
}
