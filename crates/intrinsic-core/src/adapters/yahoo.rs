use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::http_client::{HttpClient, HttpError, HttpRequest, ReqwestHttpClient};
use crate::policy::{RequestPolicy, RequestThrottle};
use crate::provider::{MarketDataProvider, ProviderError, ProviderFuture};
use crate::{CashFlowStatement, Symbol};

const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
];
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

const OPERATING_CASH_FLOW: &str = "annualOperatingCashFlow";
const CAPITAL_EXPENDITURE: &str = "annualCapitalExpenditure";
/// Earliest statement date requested from the timeseries endpoint (1985-08-23).
const TIMESERIES_PERIOD_START: u64 = 493_590_046;

// ============================================================================
// Session - cookie/crumb handshake
// ============================================================================

/// Caches the crumb Yahoo requires on API calls. The matching session cookie
/// lives in the transport's cookie jar.
#[derive(Default)]
struct YahooSession {
    crumb: RwLock<Option<String>>,
}

impl YahooSession {
    async fn crumb(&self, http_client: &dyn HttpClient) -> Result<String, ProviderError> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let mut slot = self.crumb.write().await;
        // Another task may have refreshed while we waited for the write lock.
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = fetch_crumb(http_client).await?;
        tracing::debug!("obtained yahoo session crumb");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    async fn invalidate(&self) {
        *self.crumb.write().await = None;
    }
}

async fn fetch_crumb(http_client: &dyn HttpClient) -> Result<String, ProviderError> {
    // Only the Set-Cookie side effect matters; fc.yahoo.com answers 404.
    let cookie_request = HttpRequest::get(COOKIE_URL).with_header("referer", REFERER);
    http_client
        .execute(cookie_request)
        .await
        .map_err(|e| transport_error("yahoo session cookie", &e))?;

    for endpoint in CRUMB_URLS {
        let request = HttpRequest::get(endpoint).with_header("referer", REFERER);
        let response = match http_client.execute(request).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(endpoint, error = %error, "crumb endpoint failed");
                continue;
            }
        };

        if response.status == 429 {
            return Err(ProviderError::rate_limited(
                "yahoo rate limited while fetching crumb",
            ));
        }

        let body = response.body.trim();
        let looks_valid = response.is_success()
            && !body.is_empty()
            && body.len() < 100
            && !body.contains(' ')
            && !body.contains('<');
        if looks_valid {
            return Ok(body.to_owned());
        }
    }

    Err(ProviderError::unavailable(
        "failed to fetch yahoo crumb from all endpoints",
    ))
}

// ============================================================================
// Provider
// ============================================================================

/// Yahoo Finance provider.
///
/// - cash flow: annual fundamentals timeseries, most recent period
/// - shares outstanding: `quoteSummary` `defaultKeyStatistics`
/// - latest close: daily chart for the last session
#[derive(Clone)]
pub struct YahooProvider {
    http_client: Arc<dyn HttpClient>,
    policy: RequestPolicy,
    throttle: RequestThrottle,
    session: Arc<YahooSession>,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(RequestPolicy::default())
    }
}

impl YahooProvider {
    pub fn new(policy: RequestPolicy) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), policy)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, policy: RequestPolicy) -> Self {
        Self {
            http_client,
            throttle: RequestThrottle::from_policy(&policy),
            policy,
            session: Arc::new(YahooSession::default()),
        }
    }

    pub fn policy(&self) -> &RequestPolicy {
        &self.policy
    }

    /// Fetches `request` with the session crumb attached and decodes the body.
    ///
    /// `not_found` is the error reported when Yahoo does not know the ticker.
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        not_found: fn() -> ProviderError,
    ) -> Result<T, ProviderError> {
        self.policy
            .retry(move || async move {
                self.throttle.acquire().await;
                let crumb = self.session.crumb(self.http_client.as_ref()).await?;
                let request = request
                    .clone()
                    .with_query("crumb", &crumb)
                    .with_header("referer", REFERER)
                    .with_timeout(self.policy.request_timeout);

                let response = self
                    .http_client
                    .execute(request)
                    .await
                    .map_err(|e| transport_error("yahoo", &e))?;

                match response.status {
                    status if (200..300).contains(&status) => serde_json::from_str(&response.body)
                        .map_err(|e| {
                            ProviderError::malformed(format!("failed to parse yahoo payload: {e}"))
                        }),
                    401 | 403 => {
                        self.session.invalidate().await;
                        Err(ProviderError::unavailable(format!(
                            "yahoo rejected session (status {})",
                            response.status
                        )))
                    }
                    404 => Err(not_found()),
                    429 => Err(ProviderError::rate_limited("yahoo returned status 429")),
                    status => Err(ProviderError::unavailable(format!(
                        "yahoo returned status {status}"
                    ))),
                }
            })
            .await
    }

    async fn fetch_cash_flow(&self, symbol: &Symbol) -> Result<CashFlowStatement, ProviderError> {
        let request = HttpRequest::get(format!(
            "{TIMESERIES_URL}/{}",
            urlencoding::encode(symbol.as_str())
        ))
        .with_query("symbol", symbol.as_str())
        .with_query(
            "type",
            &format!("{OPERATING_CASH_FLOW},{CAPITAL_EXPENDITURE}"),
        )
        .with_query("period1", &TIMESERIES_PERIOD_START.to_string())
        .with_query("period2", &unix_now().to_string());

        let payload: TimeseriesResponse = self
            .get_json(&request, ProviderError::no_cash_flow_data)
            .await?;
        latest_cash_flow(payload)
    }

    async fn fetch_shares_outstanding(&self, symbol: &Symbol) -> Result<f64, ProviderError> {
        let request = HttpRequest::get(format!(
            "{QUOTE_SUMMARY_URL}/{}",
            urlencoding::encode(symbol.as_str())
        ))
        .with_query("modules", "defaultKeyStatistics");

        let payload: QuoteSummaryResponse =
            self.get_json(&request, ProviderError::no_shares_data).await?;
        payload
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .find_map(|result| result.default_key_statistics?.shares_outstanding?.raw)
            .ok_or_else(ProviderError::no_shares_data)
    }

    async fn fetch_latest_close(&self, symbol: &Symbol) -> Result<f64, ProviderError> {
        let request = HttpRequest::get(format!(
            "{CHART_URL}/{}",
            urlencoding::encode(symbol.as_str())
        ))
        .with_query("range", "1d")
        .with_query("interval", "1d");

        let payload: ChartResponse = self.get_json(&request, ProviderError::no_price_data).await?;
        payload
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|result| result.indicators.quote.into_iter().next())
            .and_then(|quote| quote.close.into_iter().rev().flatten().next())
            .ok_or_else(ProviderError::no_price_data)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn cash_flow<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, CashFlowStatement> {
        Box::pin(self.fetch_cash_flow(symbol))
    }

    fn shares_outstanding<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64> {
        Box::pin(self.fetch_shares_outstanding(symbol))
    }

    fn latest_close<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, f64> {
        Box::pin(self.fetch_latest_close(symbol))
    }
}

fn transport_error(context: &str, error: &HttpError) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(format!("{context} timed out: {}", error.message()))
    } else {
        ProviderError::unavailable(format!("{context} transport error: {}", error.message()))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(TIMESERIES_PERIOD_START)
}

/// Picks the most recent reporting date across both series and reads each
/// line item for that date only.
fn latest_cash_flow(payload: TimeseriesResponse) -> Result<CashFlowStatement, ProviderError> {
    let mut by_type: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

    for result in payload.timeseries.result.unwrap_or_default() {
        let Some(series_type) = result.meta.series_type.into_iter().next() else {
            continue;
        };
        let Some(points) = result.series.get(&series_type) else {
            continue;
        };
        let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(points.clone())
            .map_err(|e| {
                ProviderError::malformed(format!("failed to parse yahoo {series_type}: {e}"))
            })?;

        let values = by_type.entry(series_type).or_default();
        for point in points.into_iter().flatten() {
            if let Some(raw) = point.reported_value.and_then(|value| value.raw) {
                values.insert(point.as_of_date, raw);
            }
        }
    }

    let latest_period = by_type
        .values()
        .filter_map(|values| values.keys().next_back())
        .max()
        .cloned()
        .ok_or_else(ProviderError::no_cash_flow_data)?;

    let value_at = |series: &str| {
        by_type
            .get(series)
            .and_then(|values| values.get(&latest_period))
            .copied()
    };

    let statement = CashFlowStatement::new(value_at(OPERATING_CASH_FLOW), value_at(CAPITAL_EXPENDITURE))
        .with_period_end(latest_period.clone());
    Ok(statement)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesBody,
}

#[derive(Debug, Deserialize)]
struct TimeseriesBody {
    #[serde(default)]
    result: Option<Vec<TimeseriesResult>>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    /// One key per requested type, next to unrelated keys such as `timestamp`.
    #[serde(flatten)]
    series: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    series_type: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: String,
    reported_value: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    shares_outstanding: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
