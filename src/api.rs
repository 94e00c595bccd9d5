// HTTP client for the airport search and flight offers endpoints

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::models::{
    AirportOption, ErrorBody, FlightOffer, HealthResponse, LocationsResponse, SearchCriteria,
};

pub const AIRPORT_SEARCH_PATH: &str = "airport-search";
pub const FLIGHT_OFFERS_PATH: &str = "flight-offers";
pub const HEALTH_PATH: &str = "health";
pub const AIRPORT_SUB_TYPE: &str = "AIRPORT";

// Error types for the HTTP layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {status_code}")]
    ServerError {
        status_code: u16,
        body: Option<ErrorBody>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    // Message carried by a structured error payload, if any
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::ServerError {
                body: Some(body), ..
            } => body.display_message(),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Default, Clone)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub airport_searches: usize,
    pub offer_searches: usize,
    pub average_response_time_ms: f64,
    pub max_response_time_ms: f64,
}

impl ClientStats {
    fn record(&mut self, elapsed_ms: f64, succeeded: bool) {
        if succeeded {
            self.requests_succeeded += 1;
        } else {
            self.requests_failed += 1;
        }

        let completed = (self.requests_succeeded + self.requests_failed) as f64;
        self.average_response_time_ms =
            (self.average_response_time_ms * (completed - 1.0) + elapsed_ms) / completed;
        self.max_response_time_ms = self.max_response_time_ms.max(elapsed_ms);
    }
}

// Resolves a free-text keyword to airport candidates
#[async_trait]
pub trait AirportLookup: Send + Sync + 'static {
    async fn search_airports(&self, keyword: &str) -> Result<Vec<AirportOption>, ApiError>;
}

// Fetches priced offers for a complete search
#[async_trait]
pub trait FlightOfferSource: Send + Sync + 'static {
    async fn flight_offers(&self, criteria: &SearchCriteria) -> Result<Vec<FlightOffer>, ApiError>;
}

#[async_trait]
impl<L: AirportLookup + ?Sized> AirportLookup for Arc<L> {
    async fn search_airports(&self, keyword: &str) -> Result<Vec<AirportOption>, ApiError> {
        (**self).search_airports(keyword).await
    }
}

#[async_trait]
impl<S: FlightOfferSource + ?Sized> FlightOfferSource for Arc<S> {
    async fn flight_offers(&self, criteria: &SearchCriteria) -> Result<Vec<FlightOffer>, ApiError> {
        (**self).flight_offers(criteria).await
    }
}

pub fn airport_search_url(config: &ClientConfig, keyword: &str) -> Result<Url, ApiError> {
    Url::parse_with_params(
        &config.endpoint(AIRPORT_SEARCH_PATH),
        &[("keyword", keyword), ("subType", AIRPORT_SUB_TYPE)],
    )
    .map_err(|e| ApiError::InvalidUrl(e.to_string()))
}

pub fn flight_offers_url(config: &ClientConfig, criteria: &SearchCriteria) -> Result<Url, ApiError> {
    Url::parse_with_params(&config.endpoint(FLIGHT_OFFERS_PATH), criteria.query_params())
        .map_err(|e| ApiError::InvalidUrl(e.to_string()))
}

fn decode_json<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApiError> {
    if status.is_success() {
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    } else {
        // A non-JSON error body is a decode failure, not a server payload
        let payload: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
            ApiError::InvalidResponse(format!("status {}: {e}", status.as_u16()))
        })?;
        Err(ApiError::ServerError {
            status_code: status.as_u16(),
            body: serde_json::from_value(payload).ok(),
        })
    }
}

pub fn decode_airports(status: StatusCode, body: &[u8]) -> Result<Vec<AirportOption>, ApiError> {
    decode_json::<LocationsResponse>(status, body).map(Into::into)
}

pub fn decode_offers(status: StatusCode, body: &[u8]) -> Result<Vec<FlightOffer>, ApiError> {
    decode_json(status, body)
}

pub struct HttpApiClient {
    config: ClientConfig,
    http: reqwest::Client,
    stats: Mutex<ClientStats>,
}

impl HttpApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            config,
            http,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }

    pub async fn health(&self) -> Result<bool, ApiError> {
        let url = Url::parse(&self.config.endpoint(HEALTH_PATH))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let (status, body) = self.get(url).await?;
        let health: HealthResponse = decode_json(status, &body)?;
        Ok(health.status == "healthy")
    }

    async fn get(&self, url: Url) -> Result<(StatusCode, Bytes), ApiError> {
        let started = Instant::now();
        self.stats.lock().requests_sent += 1;
        debug!(%url, "Sending request");

        let result = async {
            let response = self.http.get(url.clone()).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match result {
            Ok((status, body)) => {
                self.stats.lock().record(elapsed_ms, status.is_success());
                if !status.is_success() {
                    warn!(%url, status = status.as_u16(), "Server returned an error");
                }
                Ok((status, body))
            }
            Err(e) => {
                self.stats.lock().record(elapsed_ms, false);
                error!(%url, error = %e, "Request failed");
                if e.is_timeout() {
                    Err(ApiError::NetworkError(format!(
                        "Request timeout after {}ms",
                        self.config.timeout_ms
                    )))
                } else {
                    Err(ApiError::NetworkError(e.to_string()))
                }
            }
        }
    }
}

#[async_trait]
impl AirportLookup for HttpApiClient {
    async fn search_airports(&self, keyword: &str) -> Result<Vec<AirportOption>, ApiError> {
        self.stats.lock().airport_searches += 1;
        let url = airport_search_url(&self.config, keyword)?;
        let (status, body) = self.get(url).await?;
        let options = decode_airports(status, &body)?;
        info!(keyword, count = options.len(), "Airport search completed");
        Ok(options)
    }
}

#[async_trait]
impl FlightOfferSource for HttpApiClient {
    async fn flight_offers(&self, criteria: &SearchCriteria) -> Result<Vec<FlightOffer>, ApiError> {
        self.stats.lock().offer_searches += 1;
        let url = flight_offers_url(&self.config, criteria)?;
        let (status, body) = self.get(url).await?;
        let offers = decode_offers(status, &body)?;
        info!(
            origin = %criteria.origin.code,
            destination = %criteria.destination.code,
            count = offers.len(),
            "Flight offer search completed"
        );
        Ok(offers)
    }
}
