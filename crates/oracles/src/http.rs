use crate::auth::sign_request;
use crate::error::ApiError;
use crate::responses::OracleErrorResponse;
use chrono::Utc;
use configuration::EndpointConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// The transport shared by both HTTP oracles: base URL, credentials and signing.
#[derive(Clone)]
pub(crate) struct OracleHttp {
    client: reqwest::Client,
    base_url: String,
    api_secret: Option<String>,
}

impl OracleHttp {
    pub(crate) fn new(config: &EndpointConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ApiError::InvalidData(format!("invalid API key header: {e}")))?;
            headers.insert("X-API-KEY", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_secret: config.api_secret.clone(),
        })
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Builds the full URL for `path`, adding `timestamp` and `signature` parameters
    /// when a secret is configured. `body` is appended to the signed payload.
    pub(crate) fn url(
        &self,
        path: &str,
        params: &mut BTreeMap<&str, String>,
        body: Option<&str>,
    ) -> Result<String, ApiError> {
        if let Some(secret) = &self.api_secret {
            params.insert("timestamp", Utc::now().timestamp_millis().to_string());
            let query_string = encode_query(params)?;
            let payload = format!("{}{}", query_string, body.unwrap_or_default());
            let signature = sign_request(secret, &payload);
            return Ok(format!(
                "{}{}?{}&signature={}",
                self.base_url, path, query_string, signature
            ));
        }

        if params.is_empty() {
            Ok(format!("{}{}", self.base_url, path))
        } else {
            Ok(format!("{}{}?{}", self.base_url, path, encode_query(params)?))
        }
    }

    /// Sends the request and decodes either the success body or the oracle's error body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
        } else {
            let message = match serde_json::from_str::<OracleErrorResponse>(&text) {
                Ok(body) => match body.code {
                    Some(code) => format!("[{}] {}", code, body.message),
                    None => body.message,
                },
                Err(_) => text,
            };
            Err(ApiError::Upstream {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn encode_query(params: &BTreeMap<&str, String>) -> Result<String, ApiError> {
    serde_qs::to_string(params).map_err(|e| ApiError::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(secret: Option<&str>) -> EndpointConfig {
        EndpointConfig {
            base_url: "http://oracle.test/".to_string(),
            api_key: Some("key".to_string()),
            api_secret: secret.map(str::to_string),
            request_timeout_ms: 1_000,
        }
    }

    #[test]
    fn unsigned_url_has_plain_query() {
        let http = OracleHttp::new(&endpoint(None)).unwrap();
        let mut params = BTreeMap::from([("currencies", "EUR".to_string())]);
        let url = http.url("/rates", &mut params, None).unwrap();
        assert_eq!(url, "http://oracle.test/rates?currencies=EUR");
    }

    #[test]
    fn unsigned_url_without_params_has_no_query() {
        let http = OracleHttp::new(&endpoint(None)).unwrap();
        let url = http.url("/analyze", &mut BTreeMap::new(), None).unwrap();
        assert_eq!(url, "http://oracle.test/analyze");
    }

    #[test]
    fn signed_url_carries_timestamp_and_signature() {
        let http = OracleHttp::new(&endpoint(Some("secret"))).unwrap();
        let mut params = BTreeMap::from([("currencies", "EUR".to_string())]);
        let url = http.url("/rates", &mut params, None).unwrap();

        let query_string = encode_query(&params).unwrap();
        let expected = sign_request("secret", &query_string);
        assert!(url.contains("timestamp="), "{url}");
        assert!(url.ends_with(&format!("&signature={expected}")), "{url}");
    }
}
