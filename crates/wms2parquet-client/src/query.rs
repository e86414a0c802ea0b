// Query definitions per entity
//
// Each entity maps to one list view of the warehouse API. Filters follow
// the upstream query language: `ilike` matches and a rolling
// `current_date - N` transaction-date window.

use crate::error::{ClientError, Result};
use url::Url;
use wms2parquet_core::Entity;

/// Declarative description of one entity query.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub entity: Entity,
    pub endpoint: &'static str,
    pub orderby: &'static str,
    /// Optional movement-type filter, e.g. receipts vs. issues
    pub movement_filter: Option<&'static str>,
    /// Whether the query is repeated once per configured warehouse
    pub per_warehouse: bool,
}

impl QuerySpec {
    /// Query definition for one entity.
    pub fn for_entity(entity: Entity) -> QuerySpec {
        match entity {
            Entity::SalesOrders => QuerySpec {
                entity,
                endpoint: "/System.SalesOrders.List.View1",
                orderby: "ctxn_transaction_date desc",
                movement_filter: None,
                per_warehouse: true,
            },
            Entity::GoodsReceipts => QuerySpec {
                entity,
                endpoint: "/System.MaterialTransactions.List.View1",
                orderby: "ctxn_transaction_date desc",
                movement_filter: Some("ctxn_movement_type ilike '101%'"),
                per_warehouse: true,
            },
            Entity::GoodsIssues => QuerySpec {
                entity,
                endpoint: "/System.MaterialTransactions.List.View1",
                orderby: "ctxn_transaction_date desc",
                movement_filter: Some("ctxn_movement_type ilike '261%'"),
                per_warehouse: true,
            },
            Entity::InboundDeliveries => QuerySpec {
                entity,
                endpoint: "/System.InboundDeliveries.List.View1",
                orderby: "ctxn_transaction_date desc",
                movement_filter: None,
                per_warehouse: true,
            },
            Entity::OutboundDeliveries => QuerySpec {
                entity,
                endpoint: "/System.OutboundDeliveries.List.View1",
                orderby: "ctxn_transaction_date desc",
                movement_filter: None,
                per_warehouse: true,
            },
        }
    }

    /// All five entity queries, in collection order.
    pub fn all() -> Vec<QuerySpec> {
        Entity::ALL.iter().map(|e| Self::for_entity(*e)).collect()
    }

    /// Identifier recorded on every fetched row.
    pub fn query_id(&self) -> &'static str {
        self.entity.as_str()
    }

    /// Build the `where` expression: rolling date window, optional movement
    /// filter, optional warehouse match.
    pub fn where_expr(&self, lookback_days: u32, warehouse: Option<&str>) -> String {
        let mut parts = vec![format!(
            "(ctxn_transaction_date > current_date - {})",
            lookback_days
        )];
        if let Some(filter) = self.movement_filter {
            parts.push(filter.to_string());
        }
        if let Some(code) = warehouse {
            parts.push(format!("ctxn_warehouse_code ilike '{}'", code));
        }
        parts.join(" and ")
    }

    /// Build the full query URL with encoded parameters.
    pub fn build_url(
        &self,
        base_url: &str,
        take: u32,
        lookback_days: u32,
        warehouse: Option<&str>,
    ) -> Result<Url> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), self.endpoint);
        let mut url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            query_id: self.query_id().to_string(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("orderby", self.orderby)
            .append_pair("take", &take.to_string())
            .append_pair("where", &self.where_expr(lookback_days, warehouse));

        Ok(url)
    }
}
