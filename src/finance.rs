//! Yahoo Finance Client
//!
//! Fetches quotes, analyst recommendations, fundamentals, and company
//! news from Yahoo Finance's public JSON endpoints. Responses are
//! parsed defensively: absent fields degrade to "n/a" rather than
//! failing the whole lookup.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;

const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";
const YAHOO_TIMEOUT_SECS: u64 = 15;
const DEFAULT_NEWS_COUNT: usize = 5;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone, Debug)]
pub struct StockQuote {
    pub symbol: String,
    pub currency: String,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct RecommendationTrend {
    pub period: String,
    pub strong_buy: i64,
    pub buy: i64,
    pub hold: i64,
    pub sell: i64,
    pub strong_sell: i64,
}

#[derive(Clone, Debug)]
pub struct AnalystSummary {
    pub symbol: String,
    pub mean_rating: Option<String>,
    pub target_price: Option<String>,
    pub trend: Vec<RecommendationTrend>,
}

#[derive(Clone, Debug)]
pub struct NewsItem {
    pub title: String,
    pub publisher: String,
    pub link: String,
    pub published_at: Option<String>,
}

/// HTTP client for Yahoo Finance's query endpoints.
pub struct FinanceClient {
    api_url: String,
    http: Client,
}

impl FinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_API_URL.to_string())
    }

    pub fn with_base_url(api_url: String) -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(YAHOO_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { api_url, http }
    }

    /// Internal helper: GET a Yahoo endpoint and return the JSON body.
    async fn request(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.api_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Yahoo Finance request failed: {}", path))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo Finance error: {}: {}", status.as_u16(), text);
        }

        let json: Value = resp
            .json()
            .await
            .context("Failed to parse Yahoo Finance response")?;
        Ok(json)
    }

    /// Current price for a ticker symbol, from the chart endpoint meta.
    pub async fn stock_price(&self, symbol: &str) -> Result<StockQuote> {
        let path = format!(
            "/v8/finance/chart/{}?range=1d&interval=1d",
            urlencoding::encode(symbol)
        );
        let data = self.request(&path).await?;
        parse_stock_quote(symbol, &data)
    }

    /// Analyst recommendation trend plus mean rating and target price.
    pub async fn analyst_recommendations(&self, symbol: &str) -> Result<AnalystSummary> {
        let path = format!(
            "/v10/finance/quoteSummary/{}?modules=recommendationTrend,financialData",
            urlencoding::encode(symbol)
        );
        let data = self.request(&path).await?;
        parse_analyst_summary(symbol, &data)
    }

    /// Key statistics and summary detail, formatted as a markdown table.
    pub async fn stock_fundamentals(&self, symbol: &str) -> Result<String> {
        let path = format!(
            "/v10/finance/quoteSummary/{}?modules=defaultKeyStatistics,summaryDetail",
            urlencoding::encode(symbol)
        );
        let data = self.request(&path).await?;
        Ok(format_fundamentals(symbol, &data))
    }

    /// Recent news items mentioning the symbol.
    pub async fn company_news(&self, symbol: &str, count: Option<usize>) -> Result<Vec<NewsItem>> {
        let count = count.unwrap_or(DEFAULT_NEWS_COUNT);
        let path = format!(
            "/v1/finance/search?q={}&newsCount={}",
            urlencoding::encode(symbol),
            count
        );
        let data = self.request(&path).await?;
        Ok(parse_news(&data, count))
    }
}

impl Default for FinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Parsing ─────────────────────────────────────────────────────

fn parse_stock_quote(symbol: &str, data: &Value) -> Result<StockQuote> {
    let meta = &data["chart"]["result"][0]["meta"];
    let price = meta["regularMarketPrice"]
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("No price data for symbol: {}", symbol))?;

    Ok(StockQuote {
        symbol: meta["symbol"].as_str().unwrap_or(symbol).to_string(),
        currency: meta["currency"].as_str().unwrap_or("USD").to_string(),
        price,
        previous_close: meta["chartPreviousClose"]
            .as_f64()
            .or_else(|| meta["previousClose"].as_f64()),
        day_high: meta["regularMarketDayHigh"].as_f64(),
        day_low: meta["regularMarketDayLow"].as_f64(),
    })
}

fn parse_analyst_summary(symbol: &str, data: &Value) -> Result<AnalystSummary> {
    let result = data["quoteSummary"]["result"]
        .get(0)
        .ok_or_else(|| anyhow::anyhow!("No analyst data for symbol: {}", symbol))?;

    let trend = result["recommendationTrend"]["trend"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| RecommendationTrend {
                    period: row["period"].as_str().unwrap_or("").to_string(),
                    strong_buy: row["strongBuy"].as_i64().unwrap_or(0),
                    buy: row["buy"].as_i64().unwrap_or(0),
                    hold: row["hold"].as_i64().unwrap_or(0),
                    sell: row["sell"].as_i64().unwrap_or(0),
                    strong_sell: row["strongSell"].as_i64().unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    let financial = &result["financialData"];
    Ok(AnalystSummary {
        symbol: symbol.to_string(),
        mean_rating: fmt_field(&financial["recommendationMean"])
            .map(|mean| match financial["recommendationKey"].as_str() {
                Some(key) => format!("{} ({})", mean, key),
                None => mean,
            }),
        target_price: fmt_field(&financial["targetMeanPrice"]),
        trend,
    })
}

fn parse_news(data: &Value, count: usize) -> Vec<NewsItem> {
    data["news"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .take(count)
                .map(|item| NewsItem {
                    title: item["title"].as_str().unwrap_or("").to_string(),
                    publisher: item["publisher"].as_str().unwrap_or("").to_string(),
                    link: item["link"].as_str().unwrap_or("").to_string(),
                    published_at: item["providerPublishTime"].as_i64().and_then(|ts| {
                        DateTime::from_timestamp(ts, 0).map(|t| t.format("%Y-%m-%d").to_string())
                    }),
                })
                .filter(|n| !n.title.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Yahoo's quoteSummary numbers arrive as `{ "raw": 3.14, "fmt": "3.14" }`.
/// Prefer the pre-formatted string, fall back to the raw number.
fn fmt_field(value: &Value) -> Option<String> {
    if let Some(fmt) = value["fmt"].as_str() {
        return Some(fmt.to_string());
    }
    value["raw"].as_f64().map(|raw| raw.to_string())
}

// ─── Formatting ──────────────────────────────────────────────────

pub fn format_quote(quote: &StockQuote) -> String {
    let mut out = format!(
        "| Symbol | Price | Currency |\n|---|---|---|\n| {} | {:.2} | {} |",
        quote.symbol, quote.price, quote.currency
    );
    if let Some(prev) = quote.previous_close {
        let change = quote.price - prev;
        let pct = if prev != 0.0 { change / prev * 100.0 } else { 0.0 };
        out.push_str(&format!(
            "\n\nPrevious close: {:.2} ({:+.2}, {:+.2}%)",
            prev, change, pct
        ));
    }
    if let (Some(low), Some(high)) = (quote.day_low, quote.day_high) {
        out.push_str(&format!("\nDay range: {:.2} - {:.2}", low, high));
    }
    out
}

pub fn format_analyst_summary(summary: &AnalystSummary) -> String {
    let mut out = format!("Analyst recommendations for {}:\n", summary.symbol);
    if let Some(ref mean) = summary.mean_rating {
        out.push_str(&format!("\nMean rating: {}", mean));
    }
    if let Some(ref target) = summary.target_price {
        out.push_str(&format!("\nMean target price: {}", target));
    }
    if !summary.trend.is_empty() {
        out.push_str(
            "\n\n| Period | Strong Buy | Buy | Hold | Sell | Strong Sell |\n|---|---|---|---|---|---|",
        );
        for row in &summary.trend {
            out.push_str(&format!(
                "\n| {} | {} | {} | {} | {} | {} |",
                row.period, row.strong_buy, row.buy, row.hold, row.sell, row.strong_sell
            ));
        }
    }
    out
}

fn format_fundamentals(symbol: &str, data: &Value) -> String {
    let result = &data["quoteSummary"]["result"][0];
    let stats = &result["defaultKeyStatistics"];
    let detail = &result["summaryDetail"];

    let rows = [
        ("Market cap", fmt_field(&detail["marketCap"])),
        ("Trailing P/E", fmt_field(&detail["trailingPE"])),
        ("Forward P/E", fmt_field(&stats["forwardPE"])),
        ("Trailing EPS", fmt_field(&stats["trailingEps"])),
        ("52w high", fmt_field(&detail["fiftyTwoWeekHigh"])),
        ("52w low", fmt_field(&detail["fiftyTwoWeekLow"])),
        ("Dividend yield", fmt_field(&detail["dividendYield"])),
        ("Beta", fmt_field(&stats["beta"])),
    ];

    let mut out = format!("Fundamentals for {}:\n\n| Metric | Value |\n|---|---|", symbol);
    for (label, value) in rows {
        out.push_str(&format!(
            "\n| {} | {} |",
            label,
            value.unwrap_or_else(|| "n/a".to_string())
        ));
    }
    out
}

pub fn format_news(symbol: &str, items: &[NewsItem]) -> String {
    if items.is_empty() {
        return format!("No recent news found for {}", symbol);
    }
    let mut out = format!("Recent news for {}:\n", symbol);
    for item in items {
        let date = item.published_at.as_deref().unwrap_or("");
        out.push_str(&format!(
            "\n- {} ({} {}) {}",
            item.title, item.publisher, date, item.link
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_stock_quote() {
        let data = json!({
            "chart": { "result": [ { "meta": {
                "symbol": "NVDA",
                "currency": "USD",
                "regularMarketPrice": 181.5,
                "chartPreviousClose": 180.0,
                "regularMarketDayHigh": 183.0,
                "regularMarketDayLow": 179.2
            } } ] }
        });
        let quote = parse_stock_quote("NVDA", &data).unwrap();
        assert_eq!(quote.symbol, "NVDA");
        assert_eq!(quote.price, 181.5);
        assert_eq!(quote.previous_close, Some(180.0));

        let text = format_quote(&quote);
        assert!(text.contains("| NVDA | 181.50 | USD |"));
        assert!(text.contains("Day range: 179.20 - 183.00"));
    }

    #[test]
    fn test_parse_stock_quote_missing_price_errors() {
        let data = json!({ "chart": { "result": [ { "meta": {} } ] } });
        let err = parse_stock_quote("ZZZZ", &data).unwrap_err();
        assert!(err.to_string().contains("ZZZZ"));
    }

    #[test]
    fn test_parse_analyst_summary() {
        let data = json!({
            "quoteSummary": { "result": [ {
                "recommendationTrend": { "trend": [
                    { "period": "0m", "strongBuy": 12, "buy": 20, "hold": 5, "sell": 1, "strongSell": 0 }
                ] },
                "financialData": {
                    "recommendationMean": { "raw": 1.6, "fmt": "1.6" },
                    "recommendationKey": "buy",
                    "targetMeanPrice": { "raw": 210.0, "fmt": "210.00" }
                }
            } ] }
        });
        let summary = parse_analyst_summary("NVDA", &data).unwrap();
        assert_eq!(summary.mean_rating.as_deref(), Some("1.6 (buy)"));
        assert_eq!(summary.target_price.as_deref(), Some("210.00"));
        assert_eq!(summary.trend.len(), 1);
        assert_eq!(summary.trend[0].strong_buy, 12);

        let text = format_analyst_summary(&summary);
        assert!(text.contains("| 0m | 12 | 20 | 5 | 1 | 0 |"));
    }

    #[test]
    fn test_parse_analyst_summary_no_result_errors() {
        let data = json!({ "quoteSummary": { "result": [] } });
        assert!(parse_analyst_summary("ZZZZ", &data).is_err());
    }

    #[test]
    fn test_format_fundamentals_missing_fields_degrade() {
        let data = json!({
            "quoteSummary": { "result": [ {
                "defaultKeyStatistics": { "trailingEps": { "fmt": "2.94" } },
                "summaryDetail": { "marketCap": { "fmt": "4.42T" } }
            } ] }
        });
        let text = format_fundamentals("NVDA", &data);
        assert!(text.contains("| Market cap | 4.42T |"));
        assert!(text.contains("| Trailing EPS | 2.94 |"));
        assert!(text.contains("| Beta | n/a |"));
    }

    #[test]
    fn test_parse_news() {
        let data = json!({
            "news": [
                { "title": "Nvidia tops estimates", "publisher": "Reuters",
                  "link": "https://example.com/1", "providerPublishTime": 1724630400 },
                { "title": "", "publisher": "x", "link": "y" },
                { "title": "Chip demand surges", "publisher": "AP",
                  "link": "https://example.com/2" }
            ]
        });
        let items = parse_news(&data, 5);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].publisher, "Reuters");
        assert_eq!(items[0].published_at.as_deref(), Some("2024-08-26"));

        let text = format_news("NVDA", &items);
        assert!(text.contains("Nvidia tops estimates"));
        assert!(text.contains("https://example.com/2"));
    }

    #[test]
    fn test_fmt_field_prefers_fmt() {
        assert_eq!(fmt_field(&json!({ "raw": 1.55, "fmt": "1.6" })).as_deref(), Some("1.6"));
        assert_eq!(fmt_field(&json!({ "raw": 2.0 })).as_deref(), Some("2"));
        assert_eq!(fmt_field(&json!({})), None);
    }
}
