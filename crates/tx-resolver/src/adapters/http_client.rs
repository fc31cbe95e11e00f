//! HTTP Indexer Client
//!
//! Implements `TransactionDataClient` and `BlueScoreFeed` against the
//! indexer REST API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | fetch transaction | `GET /transactions/{id}` |
//! | batch projection | `POST /transactions/search` |
//! | chain tip | `GET /info/virtual-chain-blue-score` |
//!
//! Both transaction requests send `resolve_previous_outpoints=no`. The fetch
//! adds `inputs=true&outputs=true`; the batch adds
//! `fields=transaction_id,outputs` for the outputs-only projection.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::domain::{BlueScore, ClientError, SourceTransaction, Transaction, TransactionId};
use crate::ports::{
    BatchProjection, BlueScoreFeed, FetchOutcome, TransactionDataClient, NOT_FOUND_DETAIL,
};

/// Longest response body kept in a `ClientError::Status`.
const MAX_ERROR_BODY: usize = 256;

/// Fields requested for the outputs-only projection.
const OUTPUTS_ONLY_FIELDS: &str = "transaction_id,outputs";

#[derive(Serialize)]
struct BatchRequest<'a> {
    #[serde(rename = "transactionIds")]
    transaction_ids: &'a [TransactionId],
}

#[derive(Deserialize)]
struct BlueScoreResponse {
    #[serde(rename = "blueScore", alias = "blue_score")]
    blue_score: BlueScore,
}

/// REST client for the indexer.
pub struct HttpTransactionClient {
    client: Client,
    base_url: Url,
}

impl HttpTransactionClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2).min(timeout))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Create a client from the resolver configuration.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ClientError> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Base URL with `segments` appended (each one percent-encoded).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read(response: reqwest::Response) -> Result<(u16, String), ClientError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl TransactionDataClient for HttpTransactionClient {
    async fn fetch_transaction(&self, id: &TransactionId) -> Result<FetchOutcome, ClientError> {
        let url = self.endpoint(&["transactions", id.as_str()])?;
        debug!(tx_id = %id, "[tx-resolver] GET {}", url);

        let response = self
            .client
            .get(url)
            .query(&[
                ("inputs", "true"),
                ("outputs", "true"),
                ("resolve_previous_outpoints", "no"),
            ])
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let (status, body) = Self::read(response).await?;
        parse_transaction_response(status, &body)
    }

    async fn fetch_transactions_batch(
        &self,
        ids: &[TransactionId],
        projection: BatchProjection,
    ) -> Result<Vec<SourceTransaction>, ClientError> {
        let url = self.endpoint(&["transactions", "search"])?;
        debug!("[tx-resolver] POST {} ({} ids)", url, ids.len());

        let mut request = self.client.post(url);
        if projection.outputs_only {
            request = request.query(&[("fields", OUTPUTS_ONLY_FIELDS)]);
        }
        let response = request
            .query(&[("resolve_previous_outpoints", "no")])
            .json(&BatchRequest {
                transaction_ids: ids,
            })
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let (status, body) = Self::read(response).await?;
        parse_batch_response(status, &body)
    }
}

#[async_trait]
impl BlueScoreFeed for HttpTransactionClient {
    async fn fetch_blue_score(&self) -> Result<BlueScore, ClientError> {
        let url = self.endpoint(&["info", "virtual-chain-blue-score"])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let (status, body) = Self::read(response).await?;
        parse_blue_score_response(status, &body)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn status_error(status: u16, body: &str) -> ClientError {
    ClientError::Status {
        status,
        body: body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

/// Map a primary fetch response to its outcome.
///
/// 404, or a `{"detail": "Transaction not found"}` body with any status, is
/// the not-found outcome.
pub fn parse_transaction_response(
    status: u16,
    body: &str,
) -> Result<FetchOutcome, ClientError> {
    if status == 404 {
        return Ok(FetchOutcome::NotFound);
    }

    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !is_success(status) => return Err(status_error(status, body)),
        Err(e) => return Err(ClientError::Decode(e.to_string())),
    };

    if value.get("detail").and_then(|d| d.as_str()) == Some(NOT_FOUND_DETAIL) {
        return Ok(FetchOutcome::NotFound);
    }
    if !is_success(status) {
        return Err(status_error(status, body));
    }

    serde_json::from_value::<Transaction>(value)
        .map(FetchOutcome::Found)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Decode a batch projection response. 404 means none were found.
pub fn parse_batch_response(
    status: u16,
    body: &str,
) -> Result<Vec<SourceTransaction>, ClientError> {
    if status == 404 {
        return Ok(Vec::new());
    }
    if !is_success(status) {
        return Err(status_error(status, body));
    }
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// Decode a `{"blueScore": n}` response.
pub fn parse_blue_score_response(status: u16, body: &str) -> Result<BlueScore, ClientError> {
    if !is_success(status) {
        return Err(status_error(status, body));
    }
    serde_json::from_str::<BlueScoreResponse>(body)
        .map(|r| r.blue_score)
        .map_err(|e| ClientError::Decode(e.to_string()))
}
