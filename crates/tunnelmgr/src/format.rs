//! Output formatting strategies for tunnel inventory listings
//!
//! Rendering is pure: the same rows and format always yield the same
//! string. The format set is closed; an unknown identifier is rejected with
//! a typed error rather than falling back to a default.

use std::fmt;
use std::str::FromStr;

use tunnelmgr_common::{TunnelMgrError, TunnelMgrResult};

use crate::types::FieldValues;

/// The recognized output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Xml,
    Csv,
    Script,
    Table,
}

impl OutputFormat {
    /// Identifier as given on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Xml => "xml",
            OutputFormat::Csv => "csv",
            OutputFormat::Script => "script",
            OutputFormat::Table => "table",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = TunnelMgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            "xml" => Ok(OutputFormat::Xml),
            "csv" => Ok(OutputFormat::Csv),
            "script" => Ok(OutputFormat::Script),
            "table" => Ok(OutputFormat::Table),
            other => Err(TunnelMgrError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Renders rows in the format named by `format`, rejecting unknown names.
pub fn render_as(rows: &[FieldValues], format: &str) -> TunnelMgrResult<String> {
    Ok(render(rows, format.parse()?))
}

/// Renders rows in the given format.
pub fn render(rows: &[FieldValues], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => render_json(rows),
        OutputFormat::Yaml => render_yaml(rows),
        OutputFormat::Xml => render_xml(rows),
        OutputFormat::Csv => render_csv(rows),
        OutputFormat::Script => render_script(rows),
        OutputFormat::Table => render_table(rows),
    }
}

fn render_json(rows: &[FieldValues]) -> String {
    let array: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect()
        })
        .collect();
    serde_json::to_string_pretty(&array).expect("string maps always serialize")
}

fn render_yaml(rows: &[FieldValues]) -> String {
    let seq: Vec<serde_yaml::Mapping> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| {
                    (
                        serde_yaml::Value::String(k.clone()),
                        serde_yaml::Value::String(v.clone()),
                    )
                })
                .collect()
        })
        .collect();
    serde_yaml::to_string(&seq).expect("string mappings always serialize")
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn render_xml(rows: &[FieldValues]) -> String {
    let mut out = String::from("<TunnelInterfaces>");
    for row in rows {
        out.push_str("<Interface>");
        for (key, value) in row {
            out.push_str(&format!("<{key}>{}</{key}>", xml_escape(value)));
        }
        out.push_str("</Interface>");
    }
    out.push_str("</TunnelInterfaces>");
    out
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn render_csv(rows: &[FieldValues]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let header: Vec<String> = rows[0].iter().map(|(k, _)| csv_field(k)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for row in rows {
        let values: Vec<String> = row.iter().map(|(_, v)| csv_field(v)).collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}

fn render_script(rows: &[FieldValues]) -> String {
    rows.iter()
        .flat_map(|row| row.iter())
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_table(rows: &[FieldValues]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    // Column widths (widest of header/value) size the separator row; header
    // and value cells themselves render verbatim.
    let widths: Vec<usize> = rows[0]
        .iter()
        .enumerate()
        .map(|(i, (key, _))| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|(_, v)| v.len())
                .chain(std::iter::once(key.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header = rows[0]
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    let separator = widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut lines = vec![header, separator];
    for row in rows {
        lines.push(
            row.iter()
                .map(|(_, v)| v.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<FieldValues> {
        vec![vec![
            ("key1".to_string(), "value1".to_string()),
            ("key2".to_string(), "value2".to_string()),
        ]]
    }

    fn tunnel_rows() -> Vec<FieldValues> {
        vec![
            vec![
                ("ifname".to_string(), "vxlan1001".to_string()),
                ("vni".to_string(), "1001".to_string()),
                ("dst_port".to_string(), "4789".to_string()),
            ],
            vec![
                ("ifname".to_string(), "vxlan1002".to_string()),
                ("vni".to_string(), "1002".to_string()),
                ("dst_port".to_string(), "4789".to_string()),
            ],
        ]
    }

    #[test]
    fn test_json_round_trip() {
        let rendered = render(&sample_rows(), OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed[0]["key1"], "value1");
        assert_eq!(parsed[0]["key2"], "value2");
    }

    #[test]
    fn test_json_preserves_key_order() {
        let rendered = render(&tunnel_rows(), OutputFormat::Json);
        let ifname = rendered.find("ifname").unwrap();
        let vni = rendered.find("vni").unwrap();
        let dst_port = rendered.find("dst_port").unwrap();
        assert!(ifname < vni && vni < dst_port);
    }

    #[test]
    fn test_json_empty_is_empty_array() {
        assert_eq!(render(&[], OutputFormat::Json), "[]");
    }

    #[test]
    fn test_yaml_block_style() {
        let rendered = render(&sample_rows(), OutputFormat::Yaml);
        assert!(rendered.contains("- key1: value1"));
        assert!(rendered.contains("  key2: value2"));
    }

    #[test]
    fn test_xml_structure() {
        let rendered = render(&sample_rows(), OutputFormat::Xml);
        assert!(rendered.starts_with("<TunnelInterfaces>"));
        assert!(rendered.ends_with("</TunnelInterfaces>"));
        assert!(rendered.contains("<Interface><key1>value1</key1><key2>value2</key2></Interface>"));
    }

    #[test]
    fn test_xml_escapes_text() {
        let rows = vec![vec![("key1".to_string(), "a<b&c".to_string())]];
        let rendered = render(&rows, OutputFormat::Xml);
        assert!(rendered.contains("<key1>a&lt;b&amp;c</key1>"));
    }

    #[test]
    fn test_csv_round_trip() {
        let rendered = render(&sample_rows(), OutputFormat::Csv);
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("key1,key2"));
        assert_eq!(lines.next(), Some("value1,value2"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_empty_input_yields_empty_string() {
        assert_eq!(render(&[], OutputFormat::Csv), "");
    }

    #[test]
    fn test_csv_quotes_delimiters() {
        let rows = vec![vec![("key1".to_string(), "a,b".to_string())]];
        let rendered = render(&rows, OutputFormat::Csv);
        assert!(rendered.contains("\"a,b\""));
    }

    #[test]
    fn test_script_flattens_all_pairs() {
        let rendered = render(&tunnel_rows(), OutputFormat::Script);
        assert!(rendered.contains("ifname: vxlan1001"));
        assert!(rendered.contains("vni: 1002"));
        assert_eq!(rendered.matches(", ").count(), 5);
    }

    #[test]
    fn test_table_contains_header_and_rows() {
        let rendered = render(&sample_rows(), OutputFormat::Table);
        assert!(rendered.contains("key1 | key2"));
        assert!(rendered.contains("value1 | value2"));
    }

    #[test]
    fn test_table_separator_sized_to_widest_cell() {
        let rendered = render(&sample_rows(), OutputFormat::Table);
        // both columns are six wide ("value1"/"value2")
        assert!(rendered.contains("------+------"));
    }

    #[test]
    fn test_table_empty_input_yields_empty_string() {
        assert_eq!(render(&[], OutputFormat::Table), "");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = render_as(&sample_rows(), "invalid_format").unwrap_err();
        match err {
            TunnelMgrError::UnsupportedFormat { format } => {
                assert_eq!(format, "invalid_format");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_format_identifier_round_trip() {
        for name in ["json", "yaml", "xml", "csv", "script", "table"] {
            let format: OutputFormat = name.parse().unwrap();
            assert_eq!(format.as_str(), name);
        }
    }
}
