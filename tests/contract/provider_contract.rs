use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use intrinsic_core::{
    Backoff, FixtureEntry, FixtureProvider, HttpClient, HttpError, HttpRequest, HttpResponse,
    MarketDataProvider, ProviderErrorKind, RequestPolicy, Symbol, YahooProvider,
};

/// Canned Yahoo endpoints: KO is fully reported, every other ticker is unknown.
struct CannedYahoo;

impl CannedYahoo {
    fn respond(url: &str) -> HttpResponse {
        if url.contains("/v1/test/getcrumb") {
            return HttpResponse::ok_json("contract-crumb");
        }
        if url.starts_with("https://fc.yahoo.com") {
            return HttpResponse::new(404, "");
        }
        if !url.contains("/KO?") {
            return HttpResponse::new(404, r#"{"finance":{"error":{"code":"Not Found"}}}"#);
        }

        if url.contains("fundamentals-timeseries") {
            HttpResponse::ok_json(
                r#"{"timeseries":{"result":[
                    {"meta":{"type":["annualOperatingCashFlow"]},
                     "annualOperatingCashFlow":[{"asOfDate":"2023-12-31","reportedValue":{"raw":1000.0}}]},
                    {"meta":{"type":["annualCapitalExpenditure"]},
                     "annualCapitalExpenditure":[{"asOfDate":"2023-12-31","reportedValue":{"raw":-150.0}}]}
                ]}}"#,
            )
        } else if url.contains("quoteSummary") {
            HttpResponse::ok_json(
                r#"{"quoteSummary":{"result":[{"defaultKeyStatistics":{"sharesOutstanding":{"raw":100}}}]}}"#,
            )
        } else if url.contains("/v8/finance/chart/") {
            HttpResponse::ok_json(
                r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[58.5,59.25]}]}}]}}"#,
            )
        } else {
            HttpResponse::new(500, "unexpected endpoint")
        }
    }
}

impl HttpClient for CannedYahoo {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = Self::respond(&request.url);
        Box::pin(async move { Ok(response) })
    }
}

struct ProviderCase {
    name: &'static str,
    provider: Arc<dyn MarketDataProvider>,
}

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

fn provider_cases() -> Vec<ProviderCase> {
    let policy = RequestPolicy {
        backoff: Backoff {
            base: Duration::from_millis(1),
            factor: 1.0,
            max: Duration::from_millis(1),
            jitter: false,
        },
        ..RequestPolicy::default()
    };

    vec![
        ProviderCase {
            name: "fixture",
            provider: Arc::new(
                FixtureProvider::new()
                    .with_entry(symbol("KO"), FixtureEntry::complete(1_000.0, -150.0, 100.0, 59.25)),
            ),
        },
        ProviderCase {
            name: "yahoo",
            provider: Arc::new(YahooProvider::with_http_client(Arc::new(CannedYahoo), policy)),
        },
    ]
}

#[tokio::test]
async fn reported_ticker_serves_all_three_queries() {
    for case in provider_cases() {
        let ko = symbol("KO");

        let statement = case
            .provider
            .cash_flow(&ko)
            .await
            .unwrap_or_else(|error| panic!("provider '{}' cash flow failed: {error}", case.name));
        assert_eq!(
            statement.operating_cash_flow,
            Some(1_000.0),
            "provider '{}': operating cash flow",
            case.name
        );
        assert_eq!(
            statement.capital_expenditure,
            Some(-150.0),
            "provider '{}': capital expenditure",
            case.name
        );

        assert_eq!(
            case.provider.shares_outstanding(&ko).await,
            Ok(100.0),
            "provider '{}': shares",
            case.name
        );
        assert_eq!(
            case.provider.latest_close(&ko).await,
            Ok(59.25),
            "provider '{}': latest close",
            case.name
        );
    }
}

#[tokio::test]
async fn unknown_ticker_reports_query_specific_no_data() {
    for case in provider_cases() {
        let unknown = symbol("ZZZZ");

        let cash_flow = case.provider.cash_flow(&unknown).await.expect_err("must fail");
        let shares = case
            .provider
            .shares_outstanding(&unknown)
            .await
            .expect_err("must fail");
        let price = case.provider.latest_close(&unknown).await.expect_err("must fail");

        assert_eq!(
            [cash_flow.kind(), shares.kind(), price.kind()],
            [
                ProviderErrorKind::NoCashFlowData,
                ProviderErrorKind::NoSharesData,
                ProviderErrorKind::NoPriceData,
            ],
            "provider '{}'",
            case.name
        );
        assert!(
            [&cash_flow, &shares, &price]
                .iter()
                .all(|error| error.is_data_unavailable() && !error.retryable()),
            "provider '{}': no-data errors are final",
            case.name
        );
    }
}

#[tokio::test]
async fn providers_are_shareable_across_tasks() {
    for case in provider_cases() {
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..4 {
            let provider = Arc::clone(&case.provider);
            tasks.spawn(async move {
                let ko = symbol("KO");
                let close = provider.latest_close(&ko).await;
                close
            });
        }

        while let Some(joined) = tasks.join_next().await {
            assert_eq!(
                joined.expect("task should not panic"),
                Ok(59.25),
                "provider '{}'",
                case.name
            );
        }
    }
}

#[test]
fn provider_names_are_stable() {
    let names = provider_cases()
        .iter()
        .map(|case| case.provider.name())
        .collect::<Vec<_>>();
    assert_eq!(names, ["fixture", "yahoo"]);
}
