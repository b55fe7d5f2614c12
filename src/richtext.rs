//! Structured rich text as the content API delivers it: a flat sequence of
//! typed fragments, each carrying plain text plus inline formatting spans.
//! Two renderings exist — plain text for word counting and HTML for display.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichTextFragment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
}

/// Plain-text rendering: fragment texts joined by newlines. Formatting
/// spans carry no text of their own, so they are simply dropped.
pub fn as_text(fragments: &[RichTextFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// HTML rendering. Consecutive list items are grouped into a single
/// `<ul>`/`<ol>`; everything else maps fragment-per-element. Unknown
/// fragment kinds fall back to paragraphs.
pub fn as_html(fragments: &[RichTextFragment]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&str> = None;

    for fragment in fragments {
        let list_tag = match fragment.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        let body = render_spans(&fragment.text, &fragment.spans);
        match fragment.kind.as_str() {
            "heading1" => html.push_str(&format!("<h1>{}</h1>", body)),
            "heading2" => html.push_str(&format!("<h2>{}</h2>", body)),
            "heading3" => html.push_str(&format!("<h3>{}</h3>", body)),
            "heading4" => html.push_str(&format!("<h4>{}</h4>", body)),
            "heading5" => html.push_str(&format!("<h5>{}</h5>", body)),
            "heading6" => html.push_str(&format!("<h6>{}</h6>", body)),
            "preformatted" => html.push_str(&format!("<pre>{}</pre>", body)),
            "list-item" | "o-list-item" => html.push_str(&format!("<li>{}</li>", body)),
            _ => html.push_str(&format!("<p>{}</p>", body)),
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

/// Applies inline spans to one fragment's text. Span offsets index
/// characters. Spans are applied in start order; an overlapping span is
/// dropped rather than producing interleaved tags.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut ordered: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.end <= chars.len())
        .collect();
    ordered.sort_by_key(|s| s.start);

    let mut out = String::new();
    let mut pos = 0;

    for span in ordered {
        if span.start < pos {
            continue;
        }

        out.push_str(&escape(&slice(&chars, pos, span.start)));
        let inner = escape(&slice(&chars, span.start, span.end));

        match span.kind.as_str() {
            "strong" => out.push_str(&format!("<strong>{}</strong>", inner)),
            "em" => out.push_str(&format!("<em>{}</em>", inner)),
            "hyperlink" => {
                let href = span
                    .data
                    .as_ref()
                    .and_then(|d| d.url.as_deref())
                    .unwrap_or("#");
                out.push_str(&format!("<a href=\"{}\">{}</a>", escape(href), inner));
            }
            _ => out.push_str(&inner),
        }

        pos = span.end;
    }

    out.push_str(&escape(&slice(&chars, pos, chars.len())));
    out
}

fn slice(chars: &[char], start: usize, end: usize) -> String {
    chars[start..end].iter().collect()
}

fn escape(text: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> RichTextFragment {
        RichTextFragment {
            kind: "paragraph".to_string(),
            text: text.to_string(),
            spans: Vec::new(),
        }
    }

    #[test]
    fn as_text_joins_fragments() {
        let fragments = vec![paragraph("First paragraph."), paragraph("Second one.")];
        assert_eq!(as_text(&fragments), "First paragraph.\nSecond one.");
    }

    #[test]
    fn as_text_of_empty_body_is_empty() {
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn paragraphs_render_as_p_elements() {
        let fragments = vec![paragraph("Hello"), paragraph("world")];
        assert_eq!(as_html(&fragments), "<p>Hello</p><p>world</p>");
    }

    #[test]
    fn list_items_are_grouped() {
        let fragments = vec![
            paragraph("Intro"),
            RichTextFragment {
                kind: "list-item".to_string(),
                text: "one".to_string(),
                spans: Vec::new(),
            },
            RichTextFragment {
                kind: "list-item".to_string(),
                text: "two".to_string(),
                spans: Vec::new(),
            },
            paragraph("Outro"),
        ];
        assert_eq!(
            as_html(&fragments),
            "<p>Intro</p><ul><li>one</li><li>two</li></ul><p>Outro</p>"
        );
    }

    #[test]
    fn strong_and_link_spans_apply() {
        let fragment = RichTextFragment {
            kind: "paragraph".to_string(),
            text: "read the docs now".to_string(),
            spans: vec![
                Span {
                    start: 0,
                    end: 4,
                    kind: "strong".to_string(),
                    data: None,
                },
                Span {
                    start: 9,
                    end: 13,
                    kind: "hyperlink".to_string(),
                    data: Some(SpanData {
                        url: Some("https://example.com".to_string()),
                    }),
                },
            ],
        };
        assert_eq!(
            as_html(&[fragment]),
            "<p><strong>read</strong> the <a href=\"https://example.com\">docs</a> now</p>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let fragments = vec![paragraph("a < b & \"c\"")];
        assert_eq!(as_html(&fragments), "<p>a &lt; b &amp; &quot;c&quot;</p>");
    }

    #[test]
    fn out_of_bounds_span_is_ignored() {
        let fragment = RichTextFragment {
            kind: "paragraph".to_string(),
            text: "short".to_string(),
            spans: vec![Span {
                start: 2,
                end: 40,
                kind: "strong".to_string(),
                data: None,
            }],
        };
        assert_eq!(as_html(&[fragment]), "<p>short</p>");
    }
}
