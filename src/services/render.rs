//! Turns answer attachments into HTML fragments for the dashboard chat panel.

use serde_json::Value;

use crate::error::GatewayError;
use crate::i18n::{self, Locale};
use crate::models::{Attachment, RenderedContent};

pub const MAX_TABLE_ROWS: usize = 25;
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// Renders typed attachments in order. An empty list gets the canned
/// "no results" fragment so an empty answer is still visibly an answer.
pub fn render(attachments: &[Attachment], locale: Locale) -> RenderedContent {
    if attachments.is_empty() {
        return empty_result(locale);
    }
    let mut out = RenderedContent::default();
    for attachment in attachments {
        out.push(&render_one(attachment, locale));
    }
    out
}

/// Renders a raw completed payload. Malformed items are dropped one by one;
/// only a payload that arrived empty gets the canned fragment.
pub fn render_payload(raw: &[Value], locale: Locale) -> RenderedContent {
    if raw.is_empty() {
        return empty_result(locale);
    }
    let parsed: Vec<Attachment> = raw.iter().flat_map(Attachment::from_wire).collect();
    if parsed.len() < raw.len() {
        tracing::debug!(received = raw.len(), rendered = parsed.len(), "some attachments were skipped");
    }
    let mut out = RenderedContent::default();
    for attachment in &parsed {
        out.push(&render_one(attachment, locale));
    }
    out
}

pub fn render_question(question: &str) -> RenderedContent {
    RenderedContent::new(text_markup(question))
}

pub fn render_error(err: &GatewayError, locale: Locale) -> RenderedContent {
    let detail = match err {
        GatewayError::Timeout { .. } => i18n::timed_out(locale).to_string(),
        GatewayError::Interrupted => i18n::interrupted(locale).to_string(),
        GatewayError::Configuration(_) => i18n::not_configured(locale).to_string(),
        GatewayError::Transport { status: Some(code), body } => format!(
            "{} ({}): {}",
            i18n::service_unreachable(locale),
            code,
            clip(body)
        ),
        GatewayError::Transport { status: None, body } => {
            format!("{}: {}", i18n::service_unreachable(locale), clip(body))
        }
        GatewayError::UpstreamFailure(reason) => {
            format!("{}: {}", i18n::service_failed(locale), clip(reason))
        }
        GatewayError::EmptyQuestion
        | GatewayError::QuestionInFlight
        | GatewayError::SessionNotFound(_) => i18n::request_rejected(locale).to_string(),
    };
    RenderedContent::new(format!(
        "<p class=\"genie-error\"><strong>{}:</strong> {}</p>",
        escape(i18n::error_prefix(locale)),
        text_markup(&detail)
    ))
}

/// Upstream bodies can be whole HTML error pages; keep only the head.
fn clip(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MAX_ERROR_DETAIL_CHARS {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
    out.push('…');
    out
}

fn empty_result(locale: Locale) -> RenderedContent {
    RenderedContent::new(format!(
        "<p class=\"genie-empty\">{}</p>",
        escape(i18n::no_results(locale))
    ))
}

fn render_one(attachment: &Attachment, locale: Locale) -> RenderedContent {
    match attachment {
        Attachment::Text { content } => RenderedContent::new(text_markup(content)),
        Attachment::Query { description, query } => {
            let mut out = RenderedContent::default();
            if let Some(description) = description {
                out.push_str(&format!(
                    "<p class=\"genie-note\"><em>{}</em></p>",
                    text_markup(description)
                ));
            }
            if let Some(query) = query {
                out.push_str(&format!(
                    "<pre class=\"genie-query\"><code>{}</code></pre>",
                    escape(query)
                ));
            }
            out
        }
        Attachment::Table { columns, rows } => render_table(columns, rows, locale),
    }
}

fn render_table(
    columns: &[Option<String>],
    rows: &[Vec<Option<String>>],
    locale: Locale,
) -> RenderedContent {
    let width = rows
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(columns.len());

    let mut html = String::from("<table class=\"genie-table\"><thead><tr>");
    for idx in 0..width {
        let label = columns
            .get(idx)
            .cloned()
            .flatten()
            .unwrap_or_else(|| idx.to_string());
        html.push_str(&format!("<th>{}</th>", escape(&label)));
    }
    html.push_str("</tr></thead><tbody>");

    for row in rows.iter().take(MAX_TABLE_ROWS) {
        html.push_str("<tr>");
        for idx in 0..width {
            let cell = row.get(idx).and_then(Option::as_deref).unwrap_or("");
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>");
    }

    if rows.len() > MAX_TABLE_ROWS {
        html.push_str(&format!(
            "<tr class=\"genie-table-more\"><td colspan=\"{}\">{}</td></tr>",
            width.max(1),
            escape(&i18n::more_rows(locale, rows.len() - MAX_TABLE_ROWS))
        ));
    }

    html.push_str("</tbody></table>");
    RenderedContent::new(html)
}

fn text_markup(text: &str) -> String {
    escape(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
