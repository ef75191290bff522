//! DuckDuckGo Search Client
//!
//! Queries the DuckDuckGo HTML lite endpoint and parses the result
//! blocks into structured records. No API key required.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const DDG_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_RESULTS: usize = 5;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// HTTP client for DuckDuckGo web search.
pub struct SearchClient {
    http: Client,
}

impl SearchClient {
    pub fn new() -> Self {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DDG_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    /// Run a web search and return up to `max_results` parsed results.
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let max_results = max_results.unwrap_or(DEFAULT_MAX_RESULTS);

        let response = self
            .http
            .post(DDG_HTML_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(format!("q={}&b=", urlencoding::encode(query)))
            .send()
            .await
            .context("DuckDuckGo search request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("DuckDuckGo search error: {}", status.as_u16());
        }

        let html = response
            .text()
            .await
            .context("Failed to read DuckDuckGo response")?;

        Ok(parse_ddg_html(&html, max_results))
    }
}

impl Default for SearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Render results as a markdown list with source URLs, the shape the
/// model is instructed to cite from.
pub fn format_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results found for \"{}\"", query);
    }

    let mut out = format!("Search results for \"{}\":\n", query);
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("\n{}. {} ({})", i + 1, r.title, r.url));
        if !r.snippet.is_empty() {
            out.push_str(&format!("\n   {}", r.snippet));
        }
    }
    out
}

/// Parse DuckDuckGo HTML lite response into structured results.
///
/// The HTML lite page contains result blocks with:
///   - `<a class="result__a" href="...">TITLE</a>`
///   - `<a class="result__snippet" ...>SNIPPET</a>`
fn parse_ddg_html(html: &str, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();
    let mut pos = 0;

    while results.len() < max_results {
        let marker = "class=\"result__a\"";
        let marker_pos = match html[pos..].find(marker) {
            Some(i) => pos + i,
            None => break,
        };

        // Backtrack to the <a that carries this class
        let a_start = match html[..marker_pos].rfind("<a ") {
            Some(i) => i,
            None => {
                pos = marker_pos + marker.len();
                continue;
            }
        };

        let a_tag_end = match html[a_start..].find('>') {
            Some(i) => a_start + i,
            None => {
                pos = marker_pos + marker.len();
                continue;
            }
        };
        let a_tag = &html[a_start..a_tag_end];
        let href = match extract_attr(a_tag, "href") {
            Some(h) => h,
            None => {
                pos = a_tag_end;
                continue;
            }
        };

        let title_start = a_tag_end + 1;
        let title_end = match html[title_start..].find("</a>") {
            Some(i) => title_start + i,
            None => {
                pos = title_start;
                continue;
            }
        };
        let title = strip_html_tags(&html[title_start..title_end]);

        // Snippet anchor follows the title within the same result block
        let search_region_end = (title_end + 2000).min(html.len());
        let snippet = html[title_end..search_region_end]
            .find("class=\"result__snippet\"")
            .and_then(|snippet_class_pos| {
                let abs = title_end + snippet_class_pos;
                let tag_end = html[abs..search_region_end].find('>')? + abs + 1;
                let close = html[tag_end..search_region_end].find("</a>")? + tag_end;
                Some(strip_html_tags(&html[tag_end..close]))
            })
            .unwrap_or_default();

        let url = resolve_ddg_url(&href);

        if !title.is_empty() && !url.is_empty() {
            results.push(SearchResult { title, url, snippet });
        }

        pos = title_end + 4;
    }

    results
}

/// Resolve DuckDuckGo redirect URLs to the actual destination.
///
/// DDG lite wraps links as `//duckduckgo.com/l/?uddg=ENCODED_URL&...`
fn resolve_ddg_url(href: &str) -> String {
    if let Some(rest) = href
        .strip_prefix("//duckduckgo.com/l/?uddg=")
        .or_else(|| href.strip_prefix("/l/?uddg="))
    {
        let encoded = rest.split('&').next().unwrap_or(rest);
        urlencoding::decode(encoded)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| href.to_string())
    } else if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        String::new()
    }
}

/// Extract the value of an HTML attribute from a tag string.
fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=\"", attr);
    let start = tag.find(&pattern)? + pattern.len();
    let end = tag[start..].find('"')? + start;
    Some(html_decode(&tag[start..end]))
}

/// Strip HTML tags from a string, returning plain text.
fn strip_html_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    html_decode(out.trim())
}

/// Decode common HTML entities.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
}
