// Async HTTP client for the firewall control-plane API.
//
// Base path: /api/
// Auth: Authorization: Bearer <key>

use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::auth::bearer_headers;
use crate::transport::TransportConfig;
use crate::types;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the control-plane REST API.
///
/// Every method maps to exactly one HTTP request. Envelopes are stripped
/// before the caller sees the payload, and every failure is normalized
/// into [`Error`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `Authorization: Bearer <key>` as a default header.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(bearer_headers(api_key)?)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: crate::transport::DEFAULT_TIMEOUT,
        })
    }

    /// Append `/api/` unless the URL already points at it.
    ///
    /// `http://fw:8080` and `http://fw:8080/api` both become
    /// `http://fw:8080/api/`.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The normalized `/api/` base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        self.handle_response(resp).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url)).await?;
        self.handle_empty(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body)).await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.send(self.http.delete(url)).await?;
        self.handle_empty(resp).await
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    /// `{ "error": "..." }` first, then the raw body, then the status line.
    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<types::ErrorBody>(&raw)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if raw.trim().is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Rules ────────────────────────────────────────────────────────

    pub async fn list_rules(&self) -> Result<Vec<types::RuleResponse>, Error> {
        let env: types::RulesEnvelope = self.get("rules").await?;
        Ok(env.rules.unwrap_or_default())
    }

    pub async fn create_rule(&self, body: &types::RuleBody) -> Result<types::RuleResponse, Error> {
        let env: types::RuleEnvelope = self.post("rules", body).await?;
        Ok(env.rule)
    }

    pub async fn update_rule(
        &self,
        id: &str,
        body: &types::RuleBody,
    ) -> Result<types::RuleResponse, Error> {
        let env: types::RuleEnvelope = self.put(&format!("rules/{id}"), body).await?;
        Ok(env.rule)
    }

    pub async fn delete_rule(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("rules/{id}")).await
    }

    // ── NAT rules ────────────────────────────────────────────────────

    pub async fn list_nat_rules(&self) -> Result<Vec<types::NatRuleResponse>, Error> {
        let env: types::NatRulesEnvelope = self.get("nat-rules").await?;
        Ok(env.nat_rules.unwrap_or_default())
    }

    pub async fn create_nat_rule(
        &self,
        body: &types::NatRuleBody,
    ) -> Result<types::NatRuleResponse, Error> {
        let env: types::NatRuleEnvelope = self.post("nat-rules", body).await?;
        Ok(env.nat_rule)
    }

    pub async fn update_nat_rule(
        &self,
        id: &str,
        body: &types::NatRuleBody,
    ) -> Result<types::NatRuleResponse, Error> {
        let env: types::NatRuleEnvelope = self.put(&format!("nat-rules/{id}"), body).await?;
        Ok(env.nat_rule)
    }

    pub async fn delete_nat_rule(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("nat-rules/{id}")).await
    }

    // ── Zones ────────────────────────────────────────────────────────

    pub async fn list_zones(&self) -> Result<Vec<types::ZoneResponse>, Error> {
        let env: types::ZonesEnvelope = self.get("zones").await?;
        Ok(env.zones.unwrap_or_default())
    }

    pub async fn create_zone(&self, body: &types::ZoneBody) -> Result<types::ZoneResponse, Error> {
        let env: types::ZoneEnvelope = self.post("zones", body).await?;
        Ok(env.zone)
    }

    pub async fn update_zone(
        &self,
        id: &str,
        body: &types::ZoneBody,
    ) -> Result<types::ZoneResponse, Error> {
        let env: types::ZoneEnvelope = self.put(&format!("zones/{id}"), body).await?;
        Ok(env.zone)
    }

    pub async fn delete_zone(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("zones/{id}")).await
    }

    // ── Interfaces ───────────────────────────────────────────────────

    pub async fn list_interfaces(&self) -> Result<Vec<types::InterfaceResponse>, Error> {
        let env: types::InterfacesEnvelope = self.get("interfaces").await?;
        Ok(env.interfaces.unwrap_or_default())
    }

    pub async fn create_interface(
        &self,
        body: &types::InterfaceBody,
    ) -> Result<types::InterfaceResponse, Error> {
        let env: types::InterfaceEnvelope = self.post("interfaces", body).await?;
        Ok(env.interface)
    }

    pub async fn update_interface(
        &self,
        id: &str,
        body: &types::InterfaceBody,
    ) -> Result<types::InterfaceResponse, Error> {
        let env: types::InterfaceEnvelope = self.put(&format!("interfaces/{id}"), body).await?;
        Ok(env.interface)
    }

    pub async fn delete_interface(&self, id: &str) -> Result<(), Error> {
        self.delete(&format!("interfaces/{id}")).await
    }

    // ── Global config ────────────────────────────────────────────────

    pub async fn get_config(&self) -> Result<types::ConfigResponse, Error> {
        let env: types::ConfigEnvelope = self.get("config").await?;
        Ok(env.config)
    }

    pub async fn update_config(
        &self,
        body: &types::ConfigUpdateBody,
    ) -> Result<types::ConfigResponse, Error> {
        let env: types::ConfigEnvelope = self.post("config", body).await?;
        Ok(env.config)
    }

    // ── Firewall control ─────────────────────────────────────────────

    /// Ask the control plane to atomically apply the stored ruleset.
    pub async fn apply(&self) -> Result<(), Error> {
        self.post_empty("apply").await
    }

    /// Ask the control plane to restore its last-known-good snapshot.
    pub async fn rollback(&self) -> Result<(), Error> {
        self.post_empty("rollback").await
    }

    pub async fn list_counters(&self) -> Result<Vec<types::CounterResponse>, Error> {
        let env: types::CountersEnvelope = self.get("counters").await?;
        Ok(env.counters.unwrap_or_default())
    }

    pub async fn health(&self) -> Result<types::HealthResponse, Error> {
        self.get("health").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::ApiClient;

    #[test]
    fn base_url_gets_api_suffix() {
        let client = ApiClient::from_reqwest("http://fw.lan:8080", reqwest::Client::new()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://fw.lan:8080/api/");
    }

    #[test]
    fn base_url_keeps_existing_api_suffix() {
        let client =
            ApiClient::from_reqwest("http://fw.lan:8080/api/", reqwest::Client::new()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://fw.lan:8080/api/");

        let nested =
            ApiClient::from_reqwest("https://gw.example/firewall", reqwest::Client::new()).unwrap();
        assert_eq!(nested.base_url().as_str(), "https://gw.example/firewall/api/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(ApiClient::from_reqwest("not a url", reqwest::Client::new()).is_err());
    }
}
