use colored::Colorize;
use serde_json::Value;

pub struct Formatter {
    format: OutputFormat,
    color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Line,
}

/// 一条命令的输出
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub documents: Vec<Value>,
    pub message: Option<String>,
}

impl Report {
    pub fn documents(documents: Vec<Value>) -> Self {
        Self {
            documents,
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            documents: vec![],
            message: Some(message.into()),
        }
    }
}

impl Formatter {
    pub fn new(format: &str, color: bool) -> Self {
        let format = match format.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonpretty" | "json-pretty" => OutputFormat::JsonPretty,
            "line" => OutputFormat::Line,
            _ => OutputFormat::Table,
        };

        Self { format, color }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn print(&self, report: &Report) {
        if report.documents.is_empty() {
            match &report.message {
                Some(msg) => println!("{}", msg),
                None => println!("{}", self.dim("No results.")),
            }
            return;
        }

        match self.format {
            OutputFormat::Table => print!("{}", self.render_table(&report.documents)),
            OutputFormat::Json => self.print_json(&report.documents, false),
            OutputFormat::JsonPretty => self.print_json(&report.documents, true),
            OutputFormat::Line => print!("{}", self.render_lines(&report.documents)),
        }
    }

    /// # Brief
    /// 渲染为表格
    ///
    /// 列为所有对象键的并集,`id` 列总在最前。
    pub fn render_table(&self, documents: &[Value]) -> String {
        let mut columns: Vec<String> = Vec::new();
        for doc in documents {
            if let Value::Object(map) = doc {
                for key in map.keys() {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        columns.sort();

        if columns.iter().any(|c| c == "id") {
            columns.retain(|c| c != "id");
            columns.insert(0, "id".to_string());
        }

        let rows: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| {
                columns
                    .iter()
                    .map(|col| doc.get(col).map(format_value).unwrap_or_default())
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let separator = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");

        // 先按纯文本补齐宽度再着色,避免转义序列影响对齐
        let header = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| {
                let cell = format!(" {:width$} ", c, width = w);
                if self.color {
                    cell.cyan().bold().to_string()
                } else {
                    cell
                }
            })
            .collect::<Vec<_>>()
            .join("|");

        let mut out = String::new();
        out.push_str(&format!("+{}+\n", separator));
        out.push_str(&format!("|{}|\n", header));
        out.push_str(&format!("+{}+\n", separator));
        for row in &rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!(" {:width$} ", cell, width = w))
                .collect::<Vec<_>>()
                .join("|");
            out.push_str(&format!("|{}|\n", line));
        }
        out.push_str(&format!("+{}+\n", separator));
        out
    }

    pub fn render_lines(&self, documents: &[Value]) -> String {
        let mut out = String::new();
        for (i, doc) in documents.iter().enumerate() {
            if i > 0 {
                out.push_str(&format!("{}\n", "-".repeat(40)));
            }
            if let Value::Object(map) = doc {
                for (key, value) in map {
                    let key = if self.color {
                        key.cyan().to_string()
                    } else {
                        key.clone()
                    };
                    out.push_str(&format!("{}: {}\n", key, format_value(value)));
                }
            }
        }
        out
    }

    fn print_json(&self, documents: &[Value], pretty: bool) {
        match render_json(documents, pretty) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                let prefix = if self.color {
                    "Error:".red().bold().to_string()
                } else {
                    "Error:".to_string()
                };
                eprintln!("{} failed to serialize output: {}", prefix, err);
            }
        }
    }

    fn dim(&self, msg: &str) -> String {
        if self.color {
            msg.dimmed().to_string()
        } else {
            msg.to_string()
        }
    }
}

/// 单个文档直接输出,多个文档输出为数组
fn render_json(documents: &[Value], pretty: bool) -> serde_json::Result<String> {
    match (documents, pretty) {
        ([single], true) => serde_json::to_string_pretty(single),
        ([single], false) => serde_json::to_string(single),
        (_, true) => serde_json::to_string_pretty(documents),
        (_, false) => serde_json::to_string(documents),
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let items: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_selection() {
        assert_eq!(Formatter::new("JSON", false).format(), OutputFormat::Json);
        assert_eq!(Formatter::new("json-pretty", false).format(), OutputFormat::JsonPretty);
        assert_eq!(Formatter::new("bogus", false).format(), OutputFormat::Table);
    }

    #[test]
    fn test_table_puts_id_first() {
        let formatter = Formatter::new("table", false);
        let table = formatter.render_table(&[
            json!({"slave": true, "id": "default"}),
            json!({"slave": null, "id": "analytics"}),
        ]);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "+-----------+-------+");
        assert_eq!(lines[1], "| id        | slave |");
        assert_eq!(lines[3], "| default   | true  |");
        assert_eq!(lines[4], "| analytics | -     |");
    }

    #[test]
    fn test_render_json() {
        let one = [json!({"id": "default"})];
        assert_eq!(render_json(&one, false).unwrap(), r#"{"id":"default"}"#);

        let two = [json!(1), json!(2)];
        assert_eq!(render_json(&two, false).unwrap(), "[1,2]");
        assert_eq!(render_json(&two, true).unwrap(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_lines() {
        let formatter = Formatter::new("line", false);
        let out = formatter.render_lines(&[json!({"a": 1}), json!({"a": [1, 2]})]);
        assert_eq!(out, format!("a: 1\n{}\na: [1, 2]\n", "-".repeat(40)));
    }
}
