//! Competitor domain mining: sitemap slugs plus homepage headings.

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use keywordscout_shared::{KeywordScoutError, Result};

use crate::{CompetitorMiner, http_client};

/// Sitemap URLs to harvest per domain.
const MAX_SITEMAP_URLS: usize = 50;

/// Headings to harvest from the homepage.
const MAX_HEADINGS: usize = 20;

/// Mines candidate phrases from a competitor's sitemap and homepage.
pub struct SitemapCompetitorMiner {
    client: reqwest::Client,
    /// Scheme + host template; `{domain}` is substituted. Overridable so
    /// tests can point at a mock server.
    origin_template: String,
}

impl SitemapCompetitorMiner {
    /// Build the miner against real competitor domains (HTTPS).
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            origin_template: "https://{domain}".into(),
        })
    }

    /// Override the origin template (for tests: `http://127.0.0.1:port`).
    pub fn with_origin_template(mut self, template: impl Into<String>) -> Self {
        self.origin_template = template.into();
        self
    }

    fn origin_for(&self, domain: &str) -> String {
        self.origin_template.replace("{domain}", domain)
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KeywordScoutError::Network(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(KeywordScoutError::Network(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| KeywordScoutError::Network(format!("{url}: {e}")))
    }

    async fn mine_sitemap(&self, domain: &str) -> Result<Vec<String>> {
        let xml = self
            .fetch_text(&format!("{}/sitemap.xml", self.origin_for(domain)))
            .await?;
        Ok(extract_sitemap_phrases(&xml))
    }

    async fn mine_homepage(&self, domain: &str) -> Result<Vec<String>> {
        let html = self.fetch_text(&self.origin_for(domain)).await?;
        Ok(extract_headings(&html))
    }
}

#[async_trait]
impl CompetitorMiner for SitemapCompetitorMiner {
    async fn mine(&self, domain: &str) -> Result<Vec<String>> {
        let mut phrases = Vec::new();

        match self.mine_sitemap(domain).await {
            Ok(mut slugs) => phrases.append(&mut slugs),
            Err(e) => warn!(domain, error = %e, "sitemap fetch failed, continuing without"),
        }

        match self.mine_homepage(domain).await {
            Ok(mut headings) => phrases.append(&mut headings),
            Err(e) => warn!(domain, error = %e, "homepage fetch failed, continuing without"),
        }

        debug!(domain, count = phrases.len(), "competitor phrases mined");
        Ok(phrases)
    }
}

/// Turn sitemap `<loc>` entries into phrases from their path slugs.
fn extract_sitemap_phrases(xml: &str) -> Vec<String> {
    let loc_re = Regex::new(r"<loc>\s*([^<]+?)\s*</loc>").expect("static regex");

    loc_re
        .captures_iter(xml)
        .filter_map(|c| Url::parse(c[1].trim()).ok())
        .filter_map(|url| slug_phrase(&url))
        .take(MAX_SITEMAP_URLS)
        .collect()
}

/// The last path segment of a URL as a space-separated phrase.
fn slug_phrase(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;

    let phrase = segment
        .trim_end_matches(".html")
        .replace(['-', '_'], " ")
        .trim()
        .to_string();

    // Slugs that are just ids or single tokens carry no keyword signal.
    if phrase.split_whitespace().count() >= 2 {
        Some(phrase)
    } else {
        None
    }
}

/// Pull h1/h2/h3 text from a homepage.
fn extract_headings(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("h1, h2, h3").expect("static selector");

    doc.select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .take(MAX_HEADINGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://rival.dev/blog/keyword-research-basics</loc></url>
  <url><loc>https://rival.dev/blog/content-strategy-guide.html</loc></url>
  <url><loc>https://rival.dev/pricing</loc></url>
</urlset>"#;

    const HOMEPAGE: &str = r#"
<html><body>
  <h1>Keyword Research for Startups</h1>
  <h2>Find content opportunities</h2>
  <h3></h3>
  <p>Not a heading</p>
</body></html>"#;

    #[test]
    fn sitemap_slugs_become_phrases() {
        let phrases = extract_sitemap_phrases(SITEMAP);
        assert_eq!(
            phrases,
            vec!["keyword research basics", "content strategy guide"]
        );
    }

    #[test]
    fn single_token_slugs_are_skipped() {
        let xml = "<urlset><url><loc>https://a.example/pricing</loc></url></urlset>";
        assert!(extract_sitemap_phrases(xml).is_empty());
    }

    #[test]
    fn headings_are_extracted_and_trimmed() {
        let headings = extract_headings(HOMEPAGE);
        assert_eq!(
            headings,
            vec!["Keyword Research for Startups", "Find content opportunities"]
        );
    }

    #[tokio::test]
    async fn mines_sitemap_and_homepage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SITEMAP))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOMEPAGE))
            .mount(&server)
            .await;

        let miner = SitemapCompetitorMiner::new()
            .expect("build miner")
            .with_origin_template(server.uri());
        let phrases = miner.mine("rival.dev").await.expect("mine");

        assert!(phrases.contains(&"keyword research basics".to_string()));
        assert!(phrases.contains(&"Keyword Research for Startups".to_string()));
        assert_eq!(phrases.len(), 4);
    }

    #[tokio::test]
    async fn unreachable_domain_degrades_to_empty() {
        let server = MockServer::start().await;
        // No mocks mounted: both fetches 404.
        let miner = SitemapCompetitorMiner::new()
            .expect("build miner")
            .with_origin_template(server.uri());
        let phrases = miner.mine("rival.dev").await.expect("soft failure");
        assert!(phrases.is_empty());
    }
}
