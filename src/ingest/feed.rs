//! RSS/RDF feed fetch + permissive item parsing.
//!
//! Parses by local tag name only (ignores namespace prefixes) so the same
//! code handles RSS 2.0 `<item>` and RDF `<item>` interchangeably, and a
//! malformed item is simply skipped rather than aborting the batch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ServiceError;

#[derive(Debug, Clone)]
pub struct FeedItem {
    pub url: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub subject: Option<String>,
    pub posted_at: DateTime<Utc>,
    pub bookmark_count: i64,
}

const USER_AGENT: &str = "hateblog-ingest/1.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<String, ServiceError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ServiceError::DependencyUnavailable(format!(
            "feed fetch {url} returned {}",
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ServiceError::DependencyUnavailable(e.to_string()))
}

fn local_name(tag: &[u8]) -> String {
    let full = String::from_utf8_lossy(tag);
    full.rsplit(':').next().unwrap_or(&full).to_string()
}

/// Returns every item that parsed cleanly; malformed items are dropped with
/// no effect on the rest of the batch.
pub fn parse_items(xml: &str) -> Vec<FeedItem> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();

    let mut in_item = false;
    let mut current_tag = String::new();
    let mut builder = RawItem::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(e.name().as_ref());
                if name == "item" {
                    in_item = true;
                    builder = RawItem::default();
                }
                current_tag = name;
            }
            Ok(Event::Text(e)) if in_item => {
                let text = e.unescape().unwrap_or_default().into_owned();
                builder.push(&current_tag, text);
            }
            Ok(Event::CData(e)) if in_item => {
                let text = String::from_utf8_lossy(e.into_inner().as_ref()).into_owned();
                builder.push(&current_tag, text);
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.name().as_ref());
                if name == "item" && in_item {
                    if let Some(item) = builder.finish() {
                        items.push(item);
                    }
                    in_item = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    items
}

#[derive(Default)]
struct RawItem {
    title: String,
    link: String,
    description: String,
    content_encoded: String,
    date: String,
    subject: Vec<String>,
    bookmark_count: i64,
}

impl RawItem {
    fn push(&mut self, tag: &str, text: String) {
        match tag {
            "title" => self.title.push_str(&text),
            "link" => self.link.push_str(&text),
            "description" => self.description.push_str(&text),
            "encoded" => self.content_encoded.push_str(&text),
            "date" => self.date.push_str(&text),
            "subject" => self.subject.push(text),
            "bookmarkcount" => {
                if let Ok(n) = text.trim().parse::<i64>() {
                    self.bookmark_count = n;
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Option<FeedItem> {
        let url = self.link.trim().to_string();
        let title = self.title.trim().to_string();
        if url.is_empty() || title.is_empty() {
            return None;
        }

        let posted_at = DateTime::parse_from_rfc3339(self.date.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let excerpt = if !self.content_encoded.trim().is_empty() {
            Some(self.content_encoded.trim().to_string())
        } else if !self.description.trim().is_empty() {
            Some(self.description.trim().to_string())
        } else {
            None
        };

        let subject = self.subject.first().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        Some(FeedItem {
            url,
            title,
            excerpt,
            subject,
            posted_at,
            bookmark_count: self.bookmark_count.max(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_rss_item() {
        let xml = r#"
            <rss><channel>
            <item>
                <title>Example post</title>
                <link>https://example.com/post</link>
                <description>An excerpt</description>
                <dc:date>2025-01-05T12:00:00Z</dc:date>
                <dc:subject>rust</dc:subject>
                <hatena:bookmarkcount>12</hatena:bookmarkcount>
            </item>
            </channel></rss>
        "#;

        let items = parse_items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://example.com/post");
        assert_eq!(items[0].bookmark_count, 12);
        assert_eq!(items[0].subject.as_deref(), Some("rust"));
    }

    #[test]
    fn skips_item_missing_link() {
        let xml = r#"<rss><channel><item><title>No link</title></item></channel></rss>"#;
        assert!(parse_items(xml).is_empty());
    }

    #[test]
    fn malformed_item_does_not_abort_the_batch() {
        let xml = r#"
            <rss><channel>
            <item><title>Good</title><link>https://example.com/a</link></item>
            <item><title></title><link></link></item>
            </channel></rss>
        "#;
        let items = parse_items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://example.com/a");
    }
}
