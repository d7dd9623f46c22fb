//! RSS 2.0 feeds.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct SyndicationItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub id: String,
    /// Unix timestamp.
    pub published_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyndicationFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published_at: i64,
    pub items: Vec<SyndicationItem>,
}

fn rfc2822(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .to_rfc2822()
}

/// Escape text for XML element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

impl SyndicationFeed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, link: impl Into<String>, published_at: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            published_at,
            items: Vec::new(),
        }
    }

    pub fn to_rss(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<rss version=\"2.0\">\n<channel>\n");
        xml.push_str(&format!("<title>{}</title>\n", escape_xml(&self.title)));
        xml.push_str(&format!("<link>{}</link>\n", escape_xml(&self.link)));
        xml.push_str(&format!("<description>{}</description>\n", escape_xml(&self.description)));
        xml.push_str(&format!("<lastBuildDate>{}</lastBuildDate>\n", rfc2822(self.published_at)));
        for item in &self.items {
            xml.push_str("<item>\n");
            xml.push_str(&format!("<guid isPermaLink=\"false\">{}</guid>\n", escape_xml(&item.id)));
            xml.push_str(&format!("<link>{}</link>\n", escape_xml(&item.link)));
            xml.push_str(&format!("<title>{}</title>\n", escape_xml(&item.title)));
            xml.push_str(&format!("<description>{}</description>\n", escape_xml(&item.description)));
            xml.push_str(&format!("<pubDate>{}</pubDate>\n", rfc2822(item.published_at)));
            xml.push_str("</item>\n");
        }
        xml.push_str("</channel>\n</rss>\n");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_escapes_and_dates() {
        let mut feed = SyndicationFeed::new("Shop & Co", "New <products>", "http://shop.local/", 0);
        feed.items.push(SyndicationItem {
            title: "Tom's \"best\"".to_string(),
            description: "a < b".to_string(),
            link: "http://shop.local/product/1".to_string(),
            id: "urn:store:1:product:1".to_string(),
            published_at: 86_400,
        });
        let rss = feed.to_rss();
        assert!(rss.contains("<title>Shop &amp; Co</title>"));
        assert!(rss.contains("<description>New &lt;products&gt;</description>"));
        assert!(rss.contains("<title>Tom&apos;s &quot;best&quot;</title>"));
        assert!(rss.contains("<pubDate>Fri, 2 Jan 1970 00:00:00 +0000</pubDate>"));
        assert_eq!(rss.matches("<item>").count(), 1);
    }
}
