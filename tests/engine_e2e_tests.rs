//! End-to-end engine tests against a local HTTP server

use std::time::Duration;

use deal_tracker::infrastructure::config::defaults;
use deal_tracker::{
    BatchRunner, ExtractionOrchestrator, FieldExtractor, HttpClientConfig, HttpPageFetcher, PageFetcher,
    ProductRecord,
};
use rust_decimal::Decimal;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn deal_page(title: &str, deal: &str, regular: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
        <html><body>
            <div id="centerCol">
                <span id="productTitle">
                    {title}
                </span>
                <span id="priceblock_ourprice" class="a-size-medium a-color-price">{regular}</span>
                <span id="priceblock_dealprice" class="a-size-medium a-color-price">{deal}</span>
            </div>
        </body></html>"#
    )
}

fn engine(timeout_seconds: u64) -> ExtractionOrchestrator<HttpPageFetcher> {
    let fetcher = HttpPageFetcher::new(HttpClientConfig {
        timeout_seconds,
        ..HttpClientConfig::default()
    })
    .unwrap();
    ExtractionOrchestrator::new(fetcher, FieldExtractor::new().unwrap(), BatchRunner::default())
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn lookup_extracts_deal_price_and_isolates_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/dp/A", deal_page("Noise Cancelling Headphones", "$19.99", "$24.99")).await;
    Mock::given(method("GET"))
        .and(path("/dp/B"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let url_a = format!("{}/dp/A", server.uri());
    let url_b = format!("{}/dp/B", server.uri());

    let report = engine(5).lookup(&[url_a.clone(), url_b]).await;

    assert_eq!(report.len(), 2);
    assert_eq!(
        report.records[0],
        Some(ProductRecord::new(
            Some("Noise Cancelling Headphones".to_string()),
            Some(Decimal::new(1999, 2)),
            url_a,
        ))
    );
    assert_eq!(report.records[1], None);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn requests_carry_browser_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dp/ID"))
        .and(header("referer", defaults::REFERRER))
        .respond_with(ResponseTemplate::new(200).set_body_string(deal_page("x", "1.00", "2.00")))
        .expect(1)
        .mount(&server)
        .await;

    let report = engine(5).lookup(&[format!("{}/dp/ID", server.uri())]).await;

    // Without the referrer the mock would not match and the fetch would 404.
    assert!(report.is_complete());

    let requests = server.received_requests().await.unwrap();
    let user_agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
    assert_eq!(user_agent, defaults::USER_AGENT);
}

#[tokio::test]
async fn update_over_http_shifts_prices() {
    let server = MockServer::start().await;
    mount_page(&server, "/dp/A", deal_page("Site title", "EUR 19,99", "EUR 29,99")).await;
    mount_page(&server, "/dp/C", "<html><body>Currently unavailable.</body></html>".to_string()).await;

    let known = vec![
        ProductRecord::new(Some("Headphones".to_string()), Some(Decimal::new(2500, 2)), format!("{}/dp/A", server.uri())),
        ProductRecord::new(Some("Cable".to_string()), Some(Decimal::new(800, 2)), format!("{}/dp/C", server.uri())),
    ];

    let report = engine(5).update(&known, Some(20)).await;

    let records = report.into_complete_records().expect("both pages were served");
    assert_eq!(records[0].title.as_deref(), Some("Headphones"));
    assert_eq!(records[0].current_price, Some(Decimal::new(1999, 2)));
    assert_eq!(records[0].previous_price, Some(Decimal::new(2500, 2)));
    assert!(records[0].is_on_sale());

    assert_eq!(records[1].current_price, None);
    assert_eq!(records[1].previous_price, Some(Decimal::new(800, 2)));
    assert!(!records[1].is_on_sale());
}

#[tokio::test]
async fn many_urls_keep_their_slots() {
    let server = MockServer::start().await;
    let mut urls = Vec::new();
    for i in 0..20 {
        let route = format!("/dp/{i}");
        if i % 4 != 0 {
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(deal_page(&format!("Item {i}"), &format!("{i}.50"), "999.00"))
                        .set_delay(Duration::from_millis(fastrand::u64(0..30))),
                )
                .mount(&server)
                .await;
        }
        urls.push(format!("{}{}", server.uri(), route));
    }

    let report = engine(5).lookup(&urls).await;

    for (i, slot) in report.records.iter().enumerate() {
        if i % 4 == 0 {
            assert!(slot.is_none(), "slot {i} should be absent");
        } else {
            let record = slot.as_ref().unwrap();
            assert_eq!(record.url, urls[i]);
            assert_eq!(record.title.as_deref(), Some(format!("Item {i}").as_str()));
            assert_eq!(record.current_price, Some(Decimal::new(i as i64 * 100 + 50, 2)));
        }
    }
}

#[tokio::test]
async fn fetcher_treats_timeouts_and_empty_bodies_as_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_string("late").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    mount_page(&server, "/empty", "   ".to_string()).await;

    let fetcher = HttpPageFetcher::new(HttpClientConfig {
        timeout_seconds: 1,
        ..HttpClientConfig::default()
    })
    .unwrap();

    assert!(fetcher.fetch(&format!("{}/slow", server.uri())).await.is_none());
    assert!(fetcher.fetch(&format!("{}/empty", server.uri())).await.is_none());
    assert!(fetcher.fetch(&format!("{}/missing", server.uri())).await.is_none());
}
