//! Forum post text to HTML.
//!
//! The text is HTML-escaped first, then a small BBCode subset is turned
//! into markup: `[b]`, `[i]`, `[u]`, `[quote]`/`[quote=name]` and
//! `[url=...]`. Link targets must be http(s) or site-relative.

use crate::feed::escape_xml;

pub fn format_post_text(text: &str) -> String {
    let escaped = escape_xml(text.trim());
    let mut html = escaped;
    for (tag, element) in [("b", "strong"), ("i", "em"), ("u", "u")] {
        html = replace_pair(&html, tag, element);
    }
    html = replace_quotes(&html);
    html = replace_urls(&html);
    html.replace("\r\n", "\n").replace('\n', "<br />")
}

/// Replace balanced `[tag]..[/tag]` pairs, leaving stray tags as text.
fn replace_pair(text: &str, tag: &str, element: &str) -> String {
    let open = format!("[{}]", tag);
    let close = format!("[/{}]", tag);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&format!("<{}>{}</{}>", element, &after[..end], element));
        rest = &after[end + close.len()..];
    }
    out.push_str(rest);
    out
}

fn replace_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[quote") {
        let after_tag = &rest[start + "[quote".len()..];
        let Some(tag_end) = after_tag.find(']') else {
            break;
        };
        let attribute = &after_tag[..tag_end];
        let author = match attribute.strip_prefix('=') {
            Some(name) => Some(name.trim_matches(|c| c == '"' || c == '\'').trim()),
            None if attribute.is_empty() => None,
            None => {
                // `[quoted]` or similar, not a quote tag
                out.push_str(&rest[..start + "[quote".len()]);
                rest = after_tag;
                continue;
            }
        };
        let body_start = &after_tag[tag_end + 1..];
        let Some(body_end) = body_start.find("[/quote]") else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str("<div class=\"quote\">");
        if let Some(author) = author.filter(|a| !a.is_empty()) {
            out.push_str(&format!("<b>{} wrote:</b>", author));
        }
        out.push_str(&format!("<div>{}</div></div>", body_start[..body_end].trim()));
        rest = &body_start[body_end + "[/quote]".len()..];
    }
    out.push_str(rest);
    out
}

fn is_safe_link(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || (target.starts_with('/') && !target.starts_with("//"))
}

fn replace_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[url=") {
        let after_tag = &rest[start + "[url=".len()..];
        let Some(tag_end) = after_tag.find(']') else {
            break;
        };
        let target = after_tag[..tag_end].trim();
        let body_start = &after_tag[tag_end + 1..];
        let Some(body_end) = body_start.find("[/url]") else {
            break;
        };
        let label = &body_start[..body_end];
        out.push_str(&rest[..start]);
        if is_safe_link(target) {
            out.push_str(&format!("<a href=\"{}\" rel=\"nofollow\">{}</a>", target, label));
        } else {
            out.push_str(label);
        }
        rest = &body_start[body_end + "[/url]".len()..];
    }
    out.push_str(rest);
    out
}

/// Quote an existing post for a reply form.
pub fn quote_for_reply(author: &str, text: &str) -> String {
    format!("[quote={}]{}[/quote]\n", author, strip_quotes(text))
}

/// Drop nested quotes so replies don't grow with every level.
fn strip_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("[quote") {
        let Some(end) = rest[start..].find("[/quote]") else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + end + "[/quote]".len()..];
    }
    out.push_str(rest);
    out.trim().to_string()
}
