use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;

use crate::model::{PointOfInterest, Region, Road};

/// The parts of a record a popup is built from.
#[derive(Clone, Copy, Debug, Default)]
pub struct PopupFields<'a> {
    pub name: &'a str,
    pub wiki_link: Option<&'a str>,
    pub pronunciation: Option<&'a str>,
    pub type_: Option<&'a str>,
    pub value: Option<&'a str>,
    pub properties: Option<&'a BTreeMap<String, Value>>,
    pub description: Option<&'a str>,
    pub summary: Option<&'a str>,
}

impl<'a> From<&'a PointOfInterest> for PopupFields<'a> {
    fn from(p: &'a PointOfInterest) -> Self {
        PopupFields {
            name: &p.name,
            wiki_link: p.wiki_link.as_deref(),
            pronunciation: p.pronunciation.as_deref(),
            type_: p.type_.as_deref(),
            value: None,
            properties: Some(&p.properties),
            description: p.description.as_deref(),
            summary: p.summary.as_deref(),
        }
    }
}

impl<'a> From<&'a Region> for PopupFields<'a> {
    fn from(r: &'a Region) -> Self {
        PopupFields {
            name: &r.name,
            wiki_link: r.wiki_link.as_deref(),
            pronunciation: None,
            type_: r.type_.as_deref(),
            value: r.value.as_deref(),
            properties: Some(&r.properties),
            description: r.description.as_deref(),
            summary: r.summary.as_deref(),
        }
    }
}

impl<'a> From<&'a Road> for PopupFields<'a> {
    fn from(r: &'a Road) -> Self {
        PopupFields {
            name: &r.name,
            wiki_link: r.wiki_link.as_deref(),
            pronunciation: None,
            type_: r.type_.as_deref(),
            value: None,
            properties: Some(&r.properties),
            description: r.description.as_deref(),
            summary: r.summary.as_deref(),
        }
    }
}

const READ_MORE: &str = "Read More";
const READ_LESS: &str = "Read Less";

/// Label for the expand button once the popup is (or is not) expanded.
pub fn expand_label(expanded: bool) -> &'static str {
    if expanded { READ_LESS } else { READ_MORE }
}

/// Neutralise `<` and `>`.
pub fn escape_angle(s: &str) -> String {
    s.replace('<', "&lt;").replace('>', "&gt;")
}

/// Upper-case the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Property value as display text; falsy JSON values yield `None`.
fn property_text(v: &Value) -> Option<String> {
    match v {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn properties_html(props: Option<&BTreeMap<String, Value>>, description_follows: bool) -> String {
    let Some(props) = props else {
        return String::new();
    };
    let mut items = String::new();
    for (key, value) in props {
        if let Some(text) = property_text(value) {
            let _ = write!(
                items,
                "<li><strong>{}:</strong> {}</li>",
                escape_angle(key),
                escape_angle(&text)
            );
        }
    }
    if items.is_empty() {
        return items;
    }
    let mut html = format!("<ul>{items}</ul>");
    if description_follows {
        html.push_str(
            "<hr style=\"border-top: 1px dotted var(--border-color); border-bottom: none; margin: 10px 0;\">",
        );
    }
    html
}

/// Build the popup markup for a record.
pub fn popup_html(f: &PopupFields<'_>) -> String {
    let mut header = String::new();
    if !f.name.is_empty() {
        match non_empty(f.wiki_link) {
            Some(link) => {
                let _ = write!(
                    header,
                    "<h3><a href=\"{link}\" target=\"_blank\" rel=\"noopener noreferrer\" title=\"Visit wiki page for {name}\">{name}</a></h3>",
                    name = f.name
                );
            }
            None => {
                let _ = write!(header, "<h3>{}</h3>", f.name);
            }
        }
    }
    if let Some(p) = non_empty(f.pronunciation) {
        let _ = write!(
            header,
            "<p style=\"margin-top: -10px; margin-bottom: 5px;\"><em>{p}</em></p>"
        );
    }

    let description = non_empty(f.description);
    let mut body = String::new();
    match (non_empty(f.type_), non_empty(f.value)) {
        (Some(t), Some(v)) => {
            let _ = write!(body, "<p><em>{t}: {v}</em></p>");
        }
        (Some(t), None) => {
            let _ = write!(body, "<p><em>Type: {}</em></p>", capitalize(t));
        }
        _ => {}
    }
    body.push_str(&properties_html(f.properties, description.is_some()));
    if let Some(d) = description {
        let _ = write!(body, "<p>{d}</p>");
    }

    let summary = f.summary.map(str::trim).filter(|s| !s.is_empty());
    let has_body = !body.trim().is_empty();
    if summary.is_none() && !has_body {
        return header;
    }

    let container = match summary {
        Some(s) => format!(
            "<div class=\"popup-content-container\"><div class=\"popup-summary\"><p>{s}</p></div><div class=\"popup-full-content\">{body}</div></div>"
        ),
        None => format!("<div class=\"popup-content-container\">{body}</div>"),
    };
    let button = if has_body {
        format!("<div class=\"popup-read-more\" onclick=\"togglePopupExpand(this)\">{READ_MORE}</div>")
    } else {
        String::new()
    };
    header + &container + &button
}
