#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a configured `sitemill` command suitable for integration tests.
#[allow(dead_code)]
pub fn sitemill_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemill"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("SITEMILL_CONFIG");
    cmd
}

/// Serve `body` as `application/xml` at `route`.
#[allow(dead_code)]
pub async fn serve_xml(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into(), "application/xml"))
        .mount(server)
        .await;
}

/// A sitemap index listing `children` (paths on `server`).
#[allow(dead_code)]
pub fn index_xml(server: &MockServer, children: &[&str]) -> String {
    let entries: String = children
        .iter()
        .map(|child| format!("  <sitemap><loc>{}{child}</loc></sitemap>\n", server.uri()))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{entries}</sitemapindex>\n"
    )
}

#[allow(dead_code)]
pub const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/page1</loc>
    <lastmod>2024-01-15</lastmod>
    <changefreq>weekly</changefreq>
    <priority>0.8</priority>
  </url>
  <url>
    <loc>https://example.com/page2</loc>
  </url>
</urlset>
"#;
