use serde_json::Value;

/// One unit of a completed answer, after it has been lifted out of the raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachment {
    Text {
        content: String,
    },
    Query {
        description: Option<String>,
        query: Option<String>,
    },
    /// Column names and cells are optional; the renderer fills the gaps.
    Table {
        columns: Vec<Option<String>>,
        rows: Vec<Vec<Option<String>>>,
    },
}

impl Attachment {
    pub fn text(content: impl Into<String>) -> Self {
        Attachment::Text {
            content: content.into(),
        }
    }

    /// Lifts every recognisable part of one raw attachment. A raw item that
    /// carries none of the known shapes, or only malformed ones, yields nothing.
    pub fn from_wire(raw: &Value) -> Vec<Attachment> {
        let mut parsed = Vec::new();
        if let Some(text) = raw.get("text") {
            match text.get("content").and_then(Value::as_str) {
                Some(content) => parsed.push(Attachment::text(content)),
                None => tracing::debug!("skipping text attachment without content"),
            }
        }
        if let Some(query) = raw.get("query") {
            if query.is_object() {
                parsed.push(Attachment::Query {
                    description: non_empty_str(query.get("description")),
                    query: non_empty_str(query.get("query")),
                });
            } else {
                tracing::debug!("skipping query attachment that is not an object");
            }
        }
        if let Some(table) = raw.get("table") {
            match parse_table(table) {
                Some(att) => parsed.push(att),
                None => tracing::debug!("skipping table attachment without rows"),
            }
        }
        parsed
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_table(table: &Value) -> Option<Attachment> {
    let raw_rows = table.get("rows")?.as_array()?;

    let columns: Vec<Option<String>> = table
        .get("columns")
        .and_then(Value::as_array)
        .map(|cols| cols.iter().map(column_name).collect())
        .unwrap_or_else(|| keys_of_first_object_row(raw_rows));

    let rows: Vec<Vec<Option<String>>> = raw_rows
        .iter()
        .filter_map(|row| match row {
            Value::Array(cells) => Some(cells.iter().map(cell_text).collect()),
            Value::Object(map) => Some(
                columns
                    .iter()
                    .map(|col| col.as_ref().and_then(|name| map.get(name)).and_then(cell_text))
                    .collect(),
            ),
            _ => None,
        })
        .collect();

    Some(Attachment::Table { columns, rows })
}

/// Without a `columns` list, keyed rows name their own columns.
fn keys_of_first_object_row(rows: &[Value]) -> Vec<Option<String>> {
    rows.iter()
        .find_map(Value::as_object)
        .map(|first| first.keys().cloned().map(Some).collect())
        .unwrap_or_default()
}

fn column_name(col: &Value) -> Option<String> {
    match col {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
