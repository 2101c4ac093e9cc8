use crate::error::ApiError;
use crate::http::OracleHttp;
use crate::responses::{AnalyzeRequest, SignalResponse};
use crate::MarketSignal;
use async_trait::async_trait;
use configuration::EndpointConfig;
use core_types::{MarketData, SignalSet};
use std::collections::{BTreeMap, BTreeSet};

/// A `MarketSignal` backed by an HTTP prediction service.
///
/// Posts `{"assets": [...], "context": <MarketData>}` to `{base_url}/analyze` and
/// expects `{"signals": {"ASSET": {"score": 0.4, "confidence": 0.8}}}`. The service
/// may leave assets out.
#[derive(Clone)]
pub struct HttpSignalClient {
    http: OracleHttp,
}

impl HttpSignalClient {
    pub fn new(config: &EndpointConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: OracleHttp::new(config)?,
        })
    }
}

#[async_trait]
impl MarketSignal for HttpSignalClient {
    async fn analyze_market(
        &self,
        assets: &BTreeSet<String>,
        context: &MarketData,
    ) -> Result<SignalSet, ApiError> {
        let body = serde_json::to_string(&AnalyzeRequest { assets, context })
            .map_err(|e| ApiError::InvalidData(e.to_string()))?;
        let url = self.http.url("/analyze", &mut BTreeMap::new(), Some(&body))?;

        tracing::debug!(count = assets.len(), "Requesting market signals.");
        let request = self
            .http
            .client()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let response: SignalResponse = self.http.send(request).await?;
        Ok(response.into_signal_set(assets))
    }
}
