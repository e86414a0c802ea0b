// The five warehouse business entities collected on every run.

use std::fmt;
use std::str::FromStr;

/// A business entity snapshotted once per collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    SalesOrders,
    GoodsReceipts,
    GoodsIssues,
    InboundDeliveries,
    OutboundDeliveries,
}

impl Entity {
    /// All entities, in collection order.
    pub const ALL: [Entity; 5] = [
        Entity::SalesOrders,
        Entity::GoodsReceipts,
        Entity::GoodsIssues,
        Entity::InboundDeliveries,
        Entity::OutboundDeliveries,
    ];

    /// Snake-case name used in filenames and query ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::SalesOrders => "sales_orders",
            Entity::GoodsReceipts => "goods_receipts",
            Entity::GoodsIssues => "goods_issues",
            Entity::InboundDeliveries => "inbound_deliveries",
            Entity::OutboundDeliveries => "outbound_deliveries",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales_orders" => Ok(Entity::SalesOrders),
            "goods_receipts" => Ok(Entity::GoodsReceipts),
            "goods_issues" => Ok(Entity::GoodsIssues),
            "inbound_deliveries" => Ok(Entity::InboundDeliveries),
            "outbound_deliveries" => Ok(Entity::OutboundDeliveries),
            _ => anyhow::bail!(
                "Unknown entity: {}. Expected one of: sales_orders, goods_receipts, \
                 goods_issues, inbound_deliveries, outbound_deliveries",
                s
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_round_trip() {
        for entity in Entity::ALL {
            assert_eq!(entity.as_str().parse::<Entity>().unwrap(), entity);
        }
    }

    #[test]
    fn test_unknown_entity_rejected() {
        assert!("stock_counts".parse::<Entity>().is_err());
    }
}
