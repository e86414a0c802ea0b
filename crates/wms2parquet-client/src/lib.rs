// wms2parquet-client - Warehouse API access
//
// Fetches entity rows from the upstream list views with a bounded retry
// loop per query. Each returned row is annotated with load provenance
// (_loaded_at, _query_id, _warehouse) before conversion downstream.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use wms2parquet_config::{ApiConfig, CollectorConfig};

mod error;
mod query;

pub use error::{ClientError, Result};
pub use query::QuerySpec;

/// HTTP client for the warehouse API
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    take: u32,
    lookback_days: u32,
    max_retries: u32,
    retry_delay: std::time::Duration,
}

impl ApiClient {
    /// Build a client from the API and collector configuration sections.
    pub fn from_config(api: &ApiConfig, collector: &CollectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(collector.request_timeout())
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: api.base_url.clone(),
            token: api.token.clone(),
            take: collector.take,
            lookback_days: collector.lookback_days,
            max_retries: collector.max_retries,
            retry_delay: collector.retry_delay(),
        })
    }

    /// Fetch one query, optionally filtered to a single warehouse.
    ///
    /// Retries up to `max_retries` times on transport errors and non-2xx
    /// statuses, sleeping `retry_delay` between attempts. An empty result
    /// set is not an error; it yields an empty row list and a warning.
    pub async fn fetch_query(
        &self,
        spec: &QuerySpec,
        warehouse: Option<&str>,
    ) -> Result<Vec<Value>> {
        let url = spec.build_url(&self.base_url, self.take, self.lookback_days, warehouse)?;
        let query_id = spec.query_id();
        let total_attempts = self.max_retries + 1;

        let mut last_reason = String::new();
        for attempt in 1..=total_attempts {
            debug!(query_id, attempt, %url, "Executing query");
            if let Some(code) = warehouse {
                debug!(query_id, warehouse = code, "Warehouse filter applied");
            }

            match self.try_fetch(&url, query_id).await {
                Ok(mut rows) => {
                    if rows.is_empty() {
                        warn!(query_id, "Query returned no rows");
                    } else {
                        info!(query_id, rows = rows.len(), "Query succeeded");
                    }
                    annotate_rows(&mut rows, query_id, warehouse);
                    return Ok(rows);
                }
                Err(FetchFailure::Fatal(err)) => return Err(err),
                Err(FetchFailure::Retryable(reason)) => {
                    last_reason = reason;
                    if attempt < total_attempts {
                        warn!(
                            query_id,
                            attempt,
                            reason = %last_reason,
                            delay_secs = self.retry_delay.as_secs(),
                            "Query attempt failed; retrying"
                        );
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(ClientError::QueryFailed {
            query_id: query_id.to_string(),
            attempts: total_attempts,
            reason: last_reason,
        })
    }

    async fn try_fetch(
        &self,
        url: &url::Url,
        query_id: &str,
    ) -> std::result::Result<Vec<Value>, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .header("token", &self.token)
            .send()
            .await
            .map_err(|e| FetchFailure::Retryable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Retryable(format!("HTTP {}", status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchFailure::Retryable(format!("Invalid JSON body: {}", e)))?;

        match body {
            Value::Array(rows) => Ok(rows),
            _ => Err(FetchFailure::Fatal(ClientError::UnexpectedShape {
                query_id: query_id.to_string(),
            })),
        }
    }
}

enum FetchFailure {
    Retryable(String),
    Fatal(ClientError),
}

/// Stamp load provenance onto each row, mirroring the columns the snapshot
/// schema extracts.
fn annotate_rows(rows: &mut [Value], query_id: &str, warehouse: Option<&str>) {
    let loaded_at = Utc::now().to_rfc3339();
    for row in rows.iter_mut() {
        if let Some(obj) = row.as_object_mut() {
            obj.insert("_loaded_at".to_string(), Value::String(loaded_at.clone()));
            obj.insert("_query_id".to_string(), Value::String(query_id.to_string()));
            if let Some(code) = warehouse {
                obj.insert("_warehouse".to_string(), Value::String(code.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use wms2parquet_core::Entity;

    fn test_client(base_url: &str, max_retries: u32) -> ApiClient {
        let api = ApiConfig {
            base_url: base_url.to_string(),
            token: "test-token".to_string(),
            warehouses: vec![],
        };
        let collector = CollectorConfig {
            max_retries,
            retry_delay_secs: 0,
            request_delay_secs: 0,
            take: 100,
            lookback_days: 30,
            request_timeout_secs: 5,
        };
        ApiClient::from_config(&api, &collector).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_query_success_annotates_rows() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/System.MaterialTransactions.List.View1")
                    .header("token", "test-token");
                then.status(200)
                    .json_body(json!([{"ctxn_document_number": "MV-1"}]));
            })
            .await;

        let client = test_client(&server.base_url(), 0);
        let spec = QuerySpec::for_entity(Entity::GoodsIssues);
        let rows = client.fetch_query(&spec, Some("1145")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 1);
        let obj = rows[0].as_object().unwrap();
        assert_eq!(obj["_query_id"], "goods_issues");
        assert_eq!(obj["_warehouse"], "1145");
        assert!(obj.contains_key("_loaded_at"));
    }

    #[tokio::test]
    async fn test_fetch_query_empty_is_not_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!([]));
            })
            .await;

        let client = test_client(&server.base_url(), 0);
        let spec = QuerySpec::for_entity(Entity::SalesOrders);
        let rows = client.fetch_query(&spec, None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_query_exhausts_retries() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        let client = test_client(&server.base_url(), 2);
        let spec = QuerySpec::for_entity(Entity::GoodsReceipts);
        let err = client.fetch_query(&spec, None).await.unwrap_err();

        // 1 initial attempt + 2 retries
        mock.assert_hits_async(3).await;
        match err {
            ClientError::QueryFailed { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_query_rejects_non_array_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({"error": "nope"}));
            })
            .await;

        let client = test_client(&server.base_url(), 2);
        let spec = QuerySpec::for_entity(Entity::InboundDeliveries);
        let err = client.fetch_query(&spec, None).await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedShape { .. }));
    }
}
