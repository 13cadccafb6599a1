#![allow(missing_docs, clippy::unwrap_used, clippy::float_cmp)]

use sitemill_core::{
    FetchSettings, HttpCrawler, ParserOptions, ResponseContext, ResultMap, SitemapParser,
};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Data = Arc<Mutex<Vec<(ResponseContext, ResultMap)>>>;
type Errors = Arc<Mutex<Vec<(String, String)>>>;

struct Harness {
    crawler: Arc<HttpCrawler>,
    parser: Arc<SitemapParser>,
    data: Data,
    errors: Errors,
}

impl Harness {
    fn new(options: ParserOptions) -> Self {
        let crawler = Arc::new(HttpCrawler::new(&FetchSettings::default()).unwrap());
        let data: Data = Arc::default();
        let errors: Errors = Arc::default();

        let data_sink = Arc::clone(&data);
        let error_sink = Arc::clone(&errors);
        let parser = Arc::new(
            SitemapParser::builder(crawler.clone())
                .options(options)
                .on_data(move |records, context| {
                    data_sink.lock().unwrap().push((context.clone(), records));
                })
                .on_error(move |error, context| {
                    error_sink
                        .lock()
                        .unwrap()
                        .push((context.url.clone(), error.category().to_string()));
                })
                .build(),
        );
        crawler.attach(&parser).unwrap();

        Self {
            crawler,
            parser,
            data,
            errors,
        }
    }

    fn delivered_urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self
            .data
            .lock()
            .unwrap()
            .iter()
            .map(|(context, _)| context.url.clone())
            .collect();
        urls.sort();
        urls
    }
}

fn xml_response(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "application/xml")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn index_for(server: &MockServer, children: &[&str]) -> String {
    let entries: String = children
        .iter()
        .map(|child| format!("<sitemap><loc>{}{child}</loc></sitemap>", server.uri()))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</sitemapindex>"#
    )
}

const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/page1</loc><lastmod>2024-01-15</lastmod></url>
  <url><loc>https://example.com/page2</loc><priority>0.3</priority></url>
</urlset>"#;

#[tokio::test]
async fn test_plain_sitemap() {
    let server = MockServer::start().await;
    mount(&server, "/sitemap.xml", xml_response(URLSET)).await;

    let harness = Harness::new(ParserOptions::default());
    harness
        .crawler
        .run(format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap();

    let data = harness.data.lock().unwrap();
    assert_eq!(data.len(), 1);
    let (context, records) = &data[0];
    assert_eq!(context.status, 200);
    assert!(!context.marked);
    assert_eq!(records.len(), 2);
    assert_eq!(records.get("https://example.com/page2").unwrap().priority(), Some(0.3));
    assert_eq!(harness.crawler.fetched_count(), 1);
}

#[tokio::test]
async fn test_start_then_wait_idle() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/sitemap_index.xml",
        xml_response(index_for(&server, &["/sitemap-1.xml"])),
    )
    .await;
    mount(&server, "/sitemap-1.xml", xml_response(URLSET)).await;

    let harness = Harness::new(ParserOptions::default());
    harness
        .crawler
        .start(format!("{}/sitemap_index.xml", server.uri()));
    harness.crawler.wait_idle().await.unwrap();

    assert_eq!(harness.crawler.fetched_count(), 2);
    assert_eq!(harness.data.lock().unwrap().len(), 2);
    assert!(harness.parser.cumulative().contains("https://example.com/page1"));

    // A failed initial fetch is only logged.
    harness.crawler.start("http://127.0.0.1:1/sitemap.xml");
    harness.crawler.wait_idle().await.unwrap();
    assert_eq!(harness.crawler.fetched_count(), 3);
    assert!(harness.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_index_follows_children() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/sitemap_index.xml",
        xml_response(index_for(&server, &["/sitemap-1.xml", "/sitemap-2.xml"])),
    )
    .await;
    mount(&server, "/sitemap-1.xml", xml_response(URLSET)).await;
    mount(
        &server,
        "/sitemap-2.xml",
        xml_response(
            r"<urlset><url><loc>https://example.com/page3</loc></url></urlset>".to_string(),
        ),
    )
    .await;

    let harness = Harness::new(ParserOptions::default());
    harness
        .crawler
        .run(format!("{}/sitemap_index.xml", server.uri()))
        .await
        .unwrap();

    assert_eq!(harness.crawler.fetched_count(), 3);
    assert_eq!(
        harness.delivered_urls(),
        [
            format!("{}/sitemap-1.xml", server.uri()),
            format!("{}/sitemap-2.xml", server.uri()),
            format!("{}/sitemap_index.xml", server.uri()),
        ]
    );

    let data = harness.data.lock().unwrap();
    let children: Vec<_> = data.iter().filter(|(context, _)| context.marked).collect();
    assert_eq!(children.len(), 2);

    // Index entries plus every page.
    let cumulative = harness.parser.cumulative();
    assert_eq!(cumulative.len(), 5);
    assert!(cumulative.contains("https://example.com/page3"));
    assert!(harness.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_follow_disabled() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/sitemap_index.xml",
        xml_response(index_for(&server, &["/sitemap-1.xml"])),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-1.xml"))
        .respond_with(xml_response(URLSET))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(ParserOptions::default().with_follow(false));
    harness
        .crawler
        .run(format!("{}/sitemap_index.xml", server.uri()))
        .await
        .unwrap();

    assert_eq!(harness.crawler.fetched_count(), 1);
    let data = harness.data.lock().unwrap();
    assert_eq!(data.len(), 1);
    assert!(
        data[0]
            .1
            .contains(&format!("{}/sitemap-1.xml", server.uri()))
    );
}

#[tokio::test]
async fn test_other_xml_is_ignored() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/feed.xml",
        xml_response(r#"<?xml version="1.0"?><index>Some other xml</index>"#.to_string()),
    )
    .await;

    let harness = Harness::new(ParserOptions::default());
    harness
        .crawler
        .run(format!("{}/feed.xml", server.uri()))
        .await
        .unwrap();

    assert!(harness.data.lock().unwrap().is_empty());
    assert!(harness.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_content_type_and_status_filters() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/page.html",
        ResponseTemplate::new(200).set_body_raw(URLSET, "text/html"),
    )
    .await;
    mount(
        &server,
        "/missing.xml",
        ResponseTemplate::new(404).set_body_raw(URLSET, "application/xml"),
    )
    .await;

    let harness = Harness::new(ParserOptions::default());
    harness
        .crawler
        .run(format!("{}/page.html", server.uri()))
        .await
        .unwrap();
    // Non-2xx is a completed exchange, not a fetch error.
    harness
        .crawler
        .run(format!("{}/missing.xml", server.uri()))
        .await
        .unwrap();

    assert!(harness.data.lock().unwrap().is_empty());
    assert!(harness.parser.cumulative().is_empty());
}

#[tokio::test]
async fn test_failed_child_fetch_reaches_on_error() {
    let server = MockServer::start().await;
    let index = r#"<sitemapindex><sitemap><loc>http://127.0.0.1:1/unreachable.xml</loc></sitemap><sitemap><loc>not a url</loc></sitemap></sitemapindex>"#;
    mount(&server, "/sitemap_index.xml", xml_response(index.to_string())).await;

    let harness = Harness::new(ParserOptions::default());
    let index_url = format!("{}/sitemap_index.xml", server.uri());
    harness.crawler.run(index_url.clone()).await.unwrap();

    let mut errors = harness.errors.lock().unwrap().clone();
    errors.sort();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|(url, _)| *url == index_url));
    let categories: Vec<_> = errors.iter().map(|(_, category)| category.as_str()).collect();
    assert!(categories.contains(&"invalid_url"));
    assert!(categories.contains(&"network") || categories.contains(&"timeout"));

    // The index itself was still delivered.
    assert_eq!(harness.data.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_initial_fetch_failure_is_returned() {
    let harness = Harness::new(ParserOptions::default());
    let err = harness
        .crawler
        .run("http://127.0.0.1:1/sitemap.xml")
        .await
        .unwrap_err();
    assert!(err.category() == "network" || err.category() == "timeout");
}
