//! Minimal HTML rendering of entity representations
//!
//! Pages are generated from the same JSON values the API returns, so both
//! formats always show the same attributes.

use serde_json::Value;

use super::flash::{Flash, FlashKind};

const NAV: [(&str, &str); 3] = [("Teams", "/teams"), ("Members", "/members"), ("Projects", "/projects")];

/// Escape text for use in element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    out
}

/// Wrap a body fragment in a complete page with navigation and the flash message
pub fn document(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(label, href)| format!(r#"<a href="{}">{}</a>"#, href, label))
        .collect::<Vec<_>>()
        .join(" | ");

    let flash = flash
        .map(|flash| {
            let class = match flash.kind {
                FlashKind::Notice => "notice",
                FlashKind::Alert => "alert",
            };
            format!(r#"<p class="{}">{}</p>"#, class, escape(&flash.message))
        })
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<nav>{nav}</nav>\n{flash}\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

/// Render a value; `base` is the collection path used to link rows by id
pub fn render_value(value: &Value, base: Option<&str>) -> String {
    match value {
        Value::Object(map) => {
            let rows: String = map
                .iter()
                .map(|(key, value)| {
                    let nested_base = match value {
                        Value::Object(_) => format!("/{}s", key),
                        _ => format!("/{}", key),
                    };
                    let cell = match value {
                        Value::Array(_) | Value::Object(_) => render_value(value, Some(&nested_base)),
                        _ => render_cell(key, value, base),
                    };
                    format!("<dt>{}</dt><dd>{}</dd>", escape(&label(key)), cell)
                })
                .collect();
            format!("<dl>{}</dl>", rows)
        }
        Value::Array(items) if items.is_empty() => "<p>None</p>".to_string(),
        Value::Array(items) => render_table(items, base),
        scalar => escape(&scalar_text(scalar)),
    }
}

fn render_table(items: &[Value], base: Option<&str>) -> String {
    let Some(Value::Object(first)) = items.first() else {
        let list: String = items
            .iter()
            .map(|item| format!("<li>{}</li>", render_value(item, base)))
            .collect();
        return format!("<ul>{}</ul>", list);
    };

    let columns: Vec<&String> = first.keys().collect();
    let head: String = columns
        .iter()
        .map(|column| format!("<th>{}</th>", escape(&label(column))))
        .collect();

    let body: String = items
        .iter()
        .map(|item| {
            let cells: String = columns
                .iter()
                .map(|column| {
                    let cell = match item.get(column.as_str()) {
                        Some(Value::Array(rows)) if rows.iter().all(Value::is_object) => summarize(rows),
                        Some(value) => render_cell(column, value, base),
                        None => String::new(),
                    };
                    format!("<td>{}</td>", cell)
                })
                .collect();
            format!("<tr>{}</tr>", cells)
        })
        .collect();

    format!("<table>\n<thead><tr>{}</tr></thead>\n<tbody>{}</tbody>\n</table>", head, body)
}

/// A scalar cell; ids link to their own row, `*_id` columns to the referenced row
fn render_cell(key: &str, value: &Value, base: Option<&str>) -> String {
    let text = escape(&scalar_text(value));

    if value.is_null() {
        return text;
    }

    if key == "id" {
        if let Some(base) = base {
            return format!(r#"<a href="{}/{}">{}</a>"#, base, text, text);
        }
    }

    if let Some(prefix) = key.strip_suffix("_id") {
        return format!(r#"<a href="/{}s/{}">{}</a>"#, prefix, text, text);
    }

    text
}

/// Comma-separated names of embedded rows
fn summarize(items: &[Value]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }

    items
        .iter()
        .map(|item| {
            let name = match (item.get("first_name"), item.get("last_name"), item.get("name")) {
                (Some(first), Some(last), _) => format!("{} {}", scalar_text(first), scalar_text(last)),
                (_, _, Some(name)) => scalar_text(name),
                _ => scalar_text(item.get("id").unwrap_or(&Value::Null)),
            };
            escape(&name)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `first_name` -> `First name`
fn label(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Previous/next links for a paged listing
pub fn pager(page: usize, total_pages: usize, path: &str) -> String {
    let mut links = Vec::new();

    if page > 1 {
        links.push(format!(r#"<a href="{}?page={}">Previous</a>"#, path, page - 1));
    }

    links.push(format!("Page {} of {}", page, total_pages.max(1)));

    if page < total_pages {
        links.push(format!(r#"<a href="{}?page={}">Next</a>"#, path, page + 1));
    }

    format!("<nav class=\"pager\">{}</nav>", links.join(" "))
}

/// List of full validation messages
pub fn error_list(messages: &[String]) -> String {
    let items: String = messages
        .iter()
        .map(|message| format!("<li>{}</li>", escape(message)))
        .collect();

    format!(
        "<div id=\"error_explanation\"><h2>{} prohibited this record from being saved:</h2><ul>{}</ul></div>",
        pluralize(messages.len(), "error"),
        items
    )
}

/// Links shown under a page body
pub fn links(links: &[(String, String)]) -> String {
    if links.is_empty() {
        return String::new();
    }

    let anchors: Vec<String> = links
        .iter()
        .map(|(label, href)| format!(r#"<a href="{}">{}</a>"#, escape(href), escape(label)))
        .collect();

    format!("<p>{}</p>", anchors.join(" | "))
}

fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", count, word)
    }
}
