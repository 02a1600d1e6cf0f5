//! Forecast backend REST integration.
//!
//! Endpoints used:
//! - `GET /forecasts/{plant_id}?start&end`
//! - `GET /metrics/{model_id}?start&end&metric&other_models...`
//! - `GET /metrics/available`

use reqwest::blocking::{Client, Request, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::domain::{DateRange, MetricOption, RawObservation, ResourceQuery};
use crate::error::AppError;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Connection settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Option<String>,
}

impl ApiSettings {
    /// `SF_API_URL` (default `http://localhost:5000`) and optional `SF_API_TOKEN`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(
            std::env::var("SF_API_URL").ok(),
            std::env::var("SF_API_TOKEN").ok(),
        )
    }

    fn from_vars(base_url: Option<String>, token: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        Self { base_url, token }
    }
}

pub struct ApiClient {
    client: Client,
    settings: ApiSettings,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn from_env() -> Self {
        Self::new(ApiSettings::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Fetch the observations for a forecast or metric query.
    pub fn fetch(&self, query: &ResourceQuery, range: Option<&DateRange>) -> Result<Vec<RawObservation>, AppError> {
        let req = self.build_request(query, range)?;
        tracing::info!(url = %req.url(), query = %query.label(), "fetching observations");
        let records: Vec<RawObservation> = self.send_json(req)?;
        tracing::info!(records = records.len(), "fetched observations");
        Ok(records)
    }

    /// The GET request `fetch` sends.
    ///
    /// `start`/`end` only with a range; for metrics, `metric` only when set and
    /// one `other_models` per non-empty comparison id.
    pub fn build_request(&self, query: &ResourceQuery, range: Option<&DateRange>) -> Result<Request, AppError> {
        let url = endpoint_url(&self.settings.base_url, query);
        let mut req = self.client.get(&url);

        if let Some(range) = range {
            let (start, end) = range.wire_bounds();
            req = req.query(&[("start", start), ("end", end)]);
        }

        if let ResourceQuery::Metric { metric, compare, .. } = query {
            if let Some(metric) = metric {
                req = req.query(&[("metric", metric)]);
            }
            for other in compare.iter().filter(|id| !id.is_empty()) {
                req = req.query(&[("other_models", other)]);
            }
        }

        self.finish(req)
    }

    /// Metric kinds the backend can report on.
    pub fn available_metrics(&self) -> Result<Vec<MetricOption>, AppError> {
        let url = format!("{}/metrics/available", self.settings.base_url);
        let req = self.finish(self.client.get(url))?;
        self.send_json(req)
    }

    /// Attach the bearer token (when configured) and build.
    fn finish(&self, mut req: RequestBuilder) -> Result<Request, AppError> {
        if let Some(token) = &self.settings.token {
            req = req.bearer_auth(token);
        }
        req.build()
            .map_err(|e| AppError::new(2, format!("Invalid backend request: {e}")))
    }

    fn send_json<T: DeserializeOwned>(&self, req: Request) -> Result<T, AppError> {
        let resp = self
            .client
            .execute(req)
            .map_err(|e| AppError::new(4, format!("Backend request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Backend request failed with status {}.", resp.status()),
            ));
        }

        resp.json()
            .map_err(|e| AppError::new(4, format!("Failed to parse backend response: {e}")))
    }
}

fn endpoint_url(base_url: &str, query: &ResourceQuery) -> String {
    match query {
        ResourceQuery::Forecast { plant_id } => format!("{base_url}/forecasts/{plant_id}"),
        ResourceQuery::Metric { model_id, .. } => format!("{base_url}/metrics/{model_id}"),
    }
}
