//! Versioned prompt template for the hourly market article.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coinpulse_core::articles::ArticleContext;

/// Coins listed in the prompt's market table.
pub const MAX_PROMPT_COINS: usize = 15;
/// Headlines included in the prompt.
pub const MAX_PROMPT_HEADLINES: usize = 8;
const TOP_MOVERS: usize = 3;

const SYSTEM_PROMPT: &str = "You are a markets editor writing a short hourly briefing \
on the cryptocurrency market for a general audience. You are factual and neutral, \
you never give investment advice, and you only use the figures you are given.";

const INSTRUCTIONS: &str = "Write the briefing as an HTML fragment.
Rules:
- Use only <h2>, <p>, <ul>, <li> and <strong> tags
- Start with one <h2> headline summarizing the hour
- Two to four short paragraphs, under 300 words in total
- Mention the biggest movers and the overall market direction
- Reference news only if headlines are provided
- No markdown, no code fences, no <html> or <body> wrapper";

/// A prompt template with a stable id and version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub version: String,
    /// Preamble given to the agent.
    pub system: String,
    /// Output rules appended to the rendered market data.
    pub instructions: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::market_summary()
    }
}

impl PromptTemplate {
    pub fn market_summary() -> Self {
        Self {
            id: "coinpulse-market-summary".to_string(),
            version: "1.0.0".to_string(),
            system: SYSTEM_PROMPT.to_string(),
            instructions: INSTRUCTIONS.to_string(),
        }
    }

    /// User prompt for `context`.
    pub fn render(&self, context: &ArticleContext) -> String {
        let mut out = format!(
            "Market data as of {} UTC.\n\n",
            context.generated_at.format("%Y-%m-%d %H:%M")
        );

        if let Some(global) = &context.global {
            out.push_str("Global market:\n");
            out.push_str(&format!(
                "- Total market cap: {}\n- 24h volume: {}\n- BTC dominance: {:.1}%\n- ETH dominance: {:.1}%\n\n",
                compact_usd(global.total_market_cap),
                compact_usd(global.total_volume_24h),
                global.btc_dominance,
                global.eth_dominance
            ));
        }

        if !context.market.is_empty() {
            out.push_str("Top coins by market cap (price, 24h change, market cap):\n");
            for coin in context.market.iter().take(MAX_PROMPT_COINS) {
                out.push_str(&format!(
                    "- {} ({}): {} | {:+.2}% | {}\n",
                    coin.name,
                    coin.symbol,
                    price_usd(coin.price),
                    coin.change_percent_24h,
                    compact_usd(coin.market_cap)
                ));
            }

            let movers = context.top_movers(TOP_MOVERS);
            if !movers.is_empty() {
                let list: Vec<String> = movers
                    .iter()
                    .map(|m| format!("{} {:+.2}%", m.symbol, m.change_percent_24h))
                    .collect();
                out.push_str(&format!("Biggest movers: {}\n", list.join(", ")));
            }
            out.push('\n');
        }

        if !context.headlines.is_empty() {
            out.push_str("Latest headlines:\n");
            for item in context.headlines.iter().take(MAX_PROMPT_HEADLINES) {
                out.push_str(&format!("- {} ({})\n", item.title.trim(), item.source));
            }
            out.push('\n');
        }

        out.push_str(&self.instructions);
        out
    }
}

/// `$1.23T`, `$45.60B`, `$7.80M`, or plain dollars below a million.
pub fn compact_usd(value: Decimal) -> String {
    let v = value.to_f64().unwrap_or(0.0);
    let abs = v.abs();
    if abs >= 1e12 {
        format!("${:.2}T", v / 1e12)
    } else if abs >= 1e9 {
        format!("${:.2}B", v / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", v / 1e6)
    } else {
        format!("${:.0}", v)
    }
}

/// Prices keep more precision the smaller they are.
fn price_usd(value: Decimal) -> String {
    if value >= Decimal::ONE {
        format!("${}", value.round_dp(2))
    } else {
        format!("${}", value.round_dp(6).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coinpulse_core::market::MarketSnapshot;
    use coinpulse_market_data::{GlobalStats, NewsItem};
    use rust_decimal_macros::dec;

    fn context() -> ArticleContext {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap();
        let coin = |symbol: &str, name: &str, price: Decimal, change: f64, cap: Decimal| {
            MarketSnapshot {
                id: MarketSnapshot::snapshot_id(symbol, now),
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
                change_percent_24h: change,
                volume: dec!(0),
                market_cap: cap,
                timestamp: now,
                hour_bucket: now,
            }
        };
        ArticleContext {
            generated_at: now,
            market: vec![
                coin("BTC", "Bitcoin", dec!(64250.1234), 2.5, dec!(1268000000000)),
                coin("DOGE", "Dogecoin", dec!(0.1234567), -8.25, dec!(17800000000)),
            ],
            global: Some(GlobalStats {
                total_market_cap: dec!(2400000000000),
                total_volume_24h: dec!(88500000000),
                btc_dominance: 52.71,
                eth_dominance: 16.9,
            }),
            headlines: vec![NewsItem {
                title: " ETF inflows hit record ".to_string(),
                description: String::new(),
                published_at: now,
                source: "CoinDesk".to_string(),
                url: None,
            }],
        }
    }

    #[test]
    fn test_render_includes_market_news_and_rules() {
        let prompt = PromptTemplate::market_summary().render(&context());

        assert!(prompt.starts_with("Market data as of 2026-03-01 14:00 UTC."));
        assert!(prompt.contains("- Total market cap: $2.40T"));
        assert!(prompt.contains("- BTC dominance: 52.7%"));
        assert!(prompt.contains("- Bitcoin (BTC): $64250.12 | +2.50% | $1.27T"));
        assert!(prompt.contains("- Dogecoin (DOGE): $0.123457 | -8.25% | $17.80B"));
        assert!(prompt.contains("Biggest movers: DOGE -8.25%, BTC +2.50%"));
        assert!(prompt.contains("- ETF inflows hit record (CoinDesk)"));
        assert!(prompt.ends_with(INSTRUCTIONS));
    }

    #[test]
    fn test_render_skips_empty_sections() {
        let mut ctx = context();
        ctx.global = None;
        ctx.headlines.clear();
        let prompt = PromptTemplate::default().render(&ctx);
        assert!(!prompt.contains("Global market"));
        assert!(!prompt.contains("Latest headlines"));
    }

    #[test]
    fn test_compact_usd() {
        assert_eq!(compact_usd(dec!(950000)), "$950000");
        assert_eq!(compact_usd(dec!(7800000)), "$7.80M");
    }
}
