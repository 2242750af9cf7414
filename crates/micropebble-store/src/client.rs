//! HTTP client for the app-store REST API.

use serde::de::DeserializeOwned;

use micropebble_core::prelude::*;

use crate::models::{AppstoreCollectionPage, HomeDocument};

/// Default User-Agent sent with every store request.
pub const DEFAULT_USER_AGENT: &str = concat!("micropebble/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around `reqwest` shaping store responses into typed models.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
}

impl StoreClient {
    pub fn new(user_agent: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;
        Ok(Self { http })
    }

    /// Fetch one page of a paginated collection endpoint.
    pub async fn fetch_collection_page(&self, url: &str) -> Result<AppstoreCollectionPage> {
        self.get_json(url).await
    }

    /// Fetch the store home document for a watch platform
    /// (e.g. `basalt`, `chalk`).
    pub async fn fetch_home(&self, base_url: &str, platform: &str) -> Result<HomeDocument> {
        let url = format!(
            "{}/v1/home/apps/{}",
            base_url.trim_end_matches('/'),
            platform
        );
        self.get_json(&url).await
    }

    /// GET a URL and decode the JSON body.
    ///
    /// Transport failures classify as connectivity, body decode failures as
    /// remote-parsing, so the UI can offer the right retry affordance.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url, "store GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        serde_json::from_slice(&body).map_err(|e| Error::data_parsing(e.to_string()))
    }
}

fn classify_transport_error(e: &reqwest::Error) -> Error {
    if e.is_connect() {
        Error::NoNetwork
    } else {
        Error::http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(DEFAULT_USER_AGENT.starts_with("micropebble/"));
    }

    #[test]
    fn test_home_url_shape() {
        // trim_end_matches keeps double slashes out of the request line
        let base = "https://appstore-api.rebble.io/api/";
        let url = format!("{}/v1/home/apps/{}", base.trim_end_matches('/'), "basalt");
        assert_eq!(
            url,
            "https://appstore-api.rebble.io/api/v1/home/apps/basalt"
        );
    }
}
