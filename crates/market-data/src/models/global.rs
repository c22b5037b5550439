use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated market-wide statistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Total crypto market capitalization in USD.
    pub total_market_cap: Decimal,

    /// Total 24h volume in USD.
    pub total_volume_24h: Decimal,

    /// Bitcoin share of total market cap, in percent.
    pub btc_dominance: f64,

    /// Ether share of total market cap, in percent.
    pub eth_dominance: f64,
}
