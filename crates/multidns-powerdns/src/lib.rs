// # PowerDNS Client
//
// This crate provides the single-server client for PowerDNS authoritative
// servers, speaking the HTTP API v1.
//
// ## Behavior
//
// - ✅ One HTTP request per operation, against the profile's `api_url` only
// - ✅ Per-profile request timeout and TLS verification
// - ✅ HTTP status codes mapped to typed errors (401/403, 404, 409, 400/422, 5xx)
// - ✅ Error bodies truncated before they reach logs or responses
// - ❌ NO retry logic (a failed server is reported, never retried)
// - ❌ NO caching between calls
// - ❌ NO background tasks (every call is joined by the dispatcher)
//
// ## Security Requirements
//
// - API key is sent only in the `X-API-Key` header
// - API key NEVER appears in logs or error messages
//
// ## API Reference
//
// - Create zone: POST `/api/v1/servers/:server_id/zones`
// - Delete zone: DELETE `/api/v1/servers/:server_id/zones/:zone`
// - Change rrsets: PATCH `/api/v1/servers/:server_id/zones/:zone`
// - Server info: GET `/api/v1/servers/:server_id`
// - List zones: GET `/api/v1/servers/:server_id/zones`

pub mod rrset;

use async_trait::async_trait;
use multidns_core::traits::{DnsServerClient, ServerInfo};
use multidns_core::{Error, OperationDescriptor, OperationKind, Result, ServerProfile};
use rrset::{RrSet, RrSetPatch};
use serde_json::Value;

/// Name reported by [`DnsServerClient::client_name`]
pub const CLIENT_NAME: &str = "powerdns";

/// Header carrying the API key
const API_KEY_HEADER: &str = "X-API-Key";

/// Error bodies longer than this are cut before being reported
const MAX_ERROR_BODY_CHARS: usize = 200;

/// PowerDNS API v1 client
///
/// Holds no per-server state: the target URL, key, timeout and TLS policy
/// come from the profile passed to each call, so one client serves every
/// server of an orchestration call.
#[derive(Clone)]
pub struct PowerDnsClient {
    /// HTTP client verifying TLS certificates
    client: reqwest::Client,

    /// HTTP client for profiles with `verify_tls = false`
    insecure_client: reqwest::Client,
}

impl std::fmt::Debug for PowerDnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerDnsClient").finish_non_exhaustive()
    }
}

impl PowerDnsClient {
    /// Create a new PowerDNS client
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let build = |verify_tls: bool| {
            reqwest::Client::builder()
                .user_agent(concat!("multidns/", env!("CARGO_PKG_VERSION")))
                .danger_accept_invalid_certs(!verify_tls)
                .build()
                .map_err(|e| {
                    Error::client(CLIENT_NAME, format!("Failed to build HTTP client: {}", e))
                })
        };

        Ok(Self {
            client: build(true)?,
            insecure_client: build(false)?,
        })
    }

    fn http(&self, profile: &ServerProfile) -> &reqwest::Client {
        if profile.verify_tls {
            &self.client
        } else {
            &self.insecure_client
        }
    }

    /// Send one request and decode the JSON answer (`Null` for empty bodies)
    async fn request(
        &self,
        profile: &ServerProfile,
        method: reqwest::Method,
        url: String,
        body: Option<Value>,
    ) -> Result<Value> {
        tracing::debug!("{} {} on {}", method, url, profile.name);

        let mut request = self
            .http(profile)
            .request(method, &url)
            .timeout(profile.timeout())
            .header(API_KEY_HEADER, &profile.api_key);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_transport_error(profile, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(profile, e))?;

        if !status.is_success() {
            return Err(map_status(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            Error::invalid_response(format!("Failed to parse PowerDNS response: {}", e))
        })
    }
}

#[async_trait]
impl DnsServerClient for PowerDnsClient {
    /// Apply one operation to one PowerDNS server
    ///
    /// # API Calls
    ///
    /// ```http
    /// # CreateZone (201, returns the zone)
    /// POST /api/v1/servers/localhost/zones
    /// {"name": "example.com.", "kind": "Native", "nameservers": []}
    ///
    /// # DeleteZone (204)
    /// DELETE /api/v1/servers/localhost/zones/example.com.
    ///
    /// # Create/UpdateRecord (204, the rrset is returned to the caller)
    /// PATCH /api/v1/servers/localhost/zones/example.com.
    /// {"rrsets": [{"name": "...", "type": "A", "ttl": 300,
    ///              "changetype": "REPLACE", "records": [...]}]}
    ///
    /// # DeleteRecord (204)
    /// PATCH /api/v1/servers/localhost/zones/example.com.
    /// {"rrsets": [{"name": "...", "type": "A", "changetype": "DELETE"}]}
    /// ```
    async fn execute(
        &self,
        profile: &ServerProfile,
        operation: &OperationDescriptor,
    ) -> Result<Value> {
        let zone_url = zone_url(profile, &operation.zone);

        match operation.kind {
            OperationKind::CreateZone => {
                let spec = rrset::zone_spec(&operation.zone, &operation.payload)?;
                let body = serde_json::to_value(&spec)?;
                self.request(profile, reqwest::Method::POST, zones_url(profile), Some(body))
                    .await
            }
            OperationKind::DeleteZone => {
                self.request(profile, reqwest::Method::DELETE, zone_url, None)
                    .await
            }
            OperationKind::CreateRecord | OperationKind::UpdateRecord => {
                let record = rrset::record_spec(operation.kind, &operation.payload)?;
                let rrset = RrSet::replace(&record);
                let body = serde_json::to_value(RrSetPatch::single(rrset.clone()))?;
                self.request(profile, reqwest::Method::PATCH, zone_url, Some(body))
                    .await?;
                Ok(rrset.representation())
            }
            OperationKind::DeleteRecord => {
                let (name, record_type) = rrset::record_key(&operation.payload)?;
                let rrset = RrSet::delete(name, record_type);
                let body = serde_json::to_value(RrSetPatch::single(rrset))?;
                self.request(profile, reqwest::Method::PATCH, zone_url, Some(body))
                    .await
            }
            other => Err(Error::client(
                CLIENT_NAME,
                format!("Unsupported operation: {}", other),
            )),
        }
    }

    /// Read the server object
    ///
    /// ```http
    /// GET /api/v1/servers/localhost
    /// ```
    async fn server_info(&self, profile: &ServerProfile) -> Result<ServerInfo> {
        let value = self
            .request(profile, reqwest::Method::GET, server_url(profile), None)
            .await?;
        serde_json::from_value(value)
            .map_err(|e| Error::invalid_response(format!("Unexpected server object: {}", e)))
    }

    /// Count the zones the server hosts
    ///
    /// ```http
    /// GET /api/v1/servers/localhost/zones
    /// ```
    async fn zone_count(&self, profile: &ServerProfile) -> Result<usize> {
        let value = self
            .request(profile, reqwest::Method::GET, zones_url(profile), None)
            .await?;
        value
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| Error::invalid_response("Zone list is not an array"))
    }

    fn client_name(&self) -> &'static str {
        CLIENT_NAME
    }
}

fn server_url(profile: &ServerProfile) -> String {
    format!(
        "{}/api/v1/servers/{}",
        profile.api_url.trim_end_matches('/'),
        profile.server_id
    )
}

fn zones_url(profile: &ServerProfile) -> String {
    format!("{}/zones", server_url(profile))
}

fn zone_url(profile: &ServerProfile, zone: &str) -> String {
    format!("{}/{}", zones_url(profile), zone)
}

/// Map a failed send to a timeout, connectivity or generic client error
fn map_transport_error(profile: &ServerProfile, err: reqwest::Error) -> Error {
    // Strip the URL so nothing request-specific leaks into messages
    let err = err.without_url();
    if err.is_timeout() {
        Error::timeout(format!("No response within {}ms", profile.timeout_millis))
    } else if err.is_connect() {
        Error::connection(format!("Cannot reach {}: {}", profile.name, err))
    } else {
        Error::client(CLIENT_NAME, format!("HTTP request failed: {}", err))
    }
}

/// Map a non-success HTTP status to a typed error
fn map_status(status: u16, body: &str) -> Error {
    let detail = error_text(body);
    match status {
        401 | 403 => Error::auth(format!("{} (HTTP {})", detail, status)),
        404 => Error::not_found(detail),
        409 => Error::conflict(detail),
        400 | 422 => Error::rejected(detail),
        500..=599 => Error::server(status, detail),
        _ => Error::client(CLIENT_NAME, format!("Unexpected status {}: {}", status, detail)),
    }
}

/// The `error` field of a PowerDNS error body, or the raw body, truncated
fn error_text(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if message.is_empty() {
        return "empty response body".to_string();
    }
    truncate(&message, MAX_ERROR_BODY_CHARS)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multidns_core::FailureCause;

    fn profile() -> ServerProfile {
        ServerProfile::new(1, "Primary", "http://ns1:8081/", "secret_key_12345")
    }

    #[test]
    fn test_urls() {
        let p = profile();
        assert_eq!(server_url(&p), "http://ns1:8081/api/v1/servers/localhost");
        assert_eq!(
            zone_url(&p, "example.com."),
            "http://ns1:8081/api/v1/servers/localhost/zones/example.com."
        );

        let p = profile().with_server_id("ns1");
        assert_eq!(zones_url(&p), "http://ns1:8081/api/v1/servers/ns1/zones");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (401, FailureCause::Authentication),
            (403, FailureCause::Authentication),
            (404, FailureCause::NotFound),
            (409, FailureCause::Conflict),
            (400, FailureCause::Rejected),
            (422, FailureCause::Rejected),
            (500, FailureCause::ServerError),
            (503, FailureCause::ServerError),
            (418, FailureCause::Other),
        ];
        for (status, cause) in cases {
            assert_eq!(map_status(status, "").cause(), cause, "status {}", status);
        }
    }

    #[test]
    fn test_error_text_prefers_error_field() {
        assert_eq!(
            error_text(r#"{"error": "Domain 'example.com.' already exists"}"#),
            "Domain 'example.com.' already exists"
        );
        assert_eq!(error_text("  plain failure \n"), "plain failure");
        assert_eq!(error_text(""), "empty response body");
    }

    #[test]
    fn test_error_text_truncated() {
        let long = "é".repeat(500);
        let text = error_text(&long);
        assert_eq!(text.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_client_name() {
        let client = PowerDnsClient::new().unwrap();
        assert_eq!(client.client_name(), "powerdns");
    }

    #[test]
    fn test_api_key_not_exposed_in_debug() {
        let client = PowerDnsClient::new().unwrap();
        let debug_str = format!("{:?} {:?}", client, profile());
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("PowerDnsClient"));
    }
}
