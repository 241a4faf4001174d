//! Output formatting for CLI commands.

use colored::Colorize;
use fieldlink_client::ApiResponse;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Self {
        match name {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No items found.".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", format_json(data, "[]")),
    }
}

/// Print a single item as JSON regardless of format.
pub fn print_single<T: Serialize>(data: &T) {
    println!("{}", format_json(data, "{}"));
}

/// Print the `data` of a backend response.
///
/// JSON mode prints the whole normalized response.
pub fn print_response(response: &ApiResponse, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_single(response),
        OutputFormat::Table => match render_value(&response.data) {
            Some(rendered) => println!("{}", rendered),
            None => println!("{}", "No data.".dimmed()),
        },
    }
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

/// Table text for a JSON value; `None` when there is nothing to show.
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) if items.iter().all(Value::is_object) => Some(rows_table(items)),
        Value::Array(items) => {
            let mut builder = Builder::default();
            for item in items {
                builder.push_record([cell(item)]);
            }
            Some(builder.build().to_string())
        }
        Value::Object(map) => {
            let mut builder = Builder::default();
            builder.push_record(["field".to_string(), "value".to_string()]);
            for (key, value) in map {
                builder.push_record([key.clone(), cell(value)]);
            }
            Some(builder.build().to_string())
        }
        other => Some(cell(other)),
    }
}

/// One row per object, one column per key in first-seen order.
fn rows_table(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key.as_str());
                }
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for item in items {
        builder.push_record(columns.iter().map(|c| item.get(*c).map(cell).unwrap_or_default()));
    }
    builder.build().to_string()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    let value = serde_json::to_value(data).unwrap_or_else(|_| serde_json::json!({}));
    let sorted = sort_json_value(value);
    serde_json::to_string_pretty(&sorted).unwrap_or_else(|_| fallback.to_string())
}

fn sort_json_value(value: Value) -> Value {
    match value {
        Value::Array(values) => Value::Array(values.into_iter().map(sort_json_value).collect()),
        Value::Object(entries) => {
            let mut pairs: Vec<_> = entries.into_iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let mut mapped = serde_json::Map::new();
            for (key, value) in pairs {
                mapped.insert(key, sort_json_value(value));
            }
            Value::Object(mapped)
        }
        other => other,
    }
}
