//! Renders a shaped [`Report`] to one of the four formats the CLI surface
//! names: table, JSON, YAML, markdown. This module owns the
//! *visual layout*; the Formatter Adapter in `rbac_atlas_core::format`
//! already did the data shaping.

use std::str::FromStr;

use rbac_atlas_core::format::Report;
use rbac_atlas_core::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<OutputFormat, String> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

pub fn render(report: &Report, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
        OutputFormat::Markdown => Ok(render_markdown(report)),
    }
}

fn pad(s: &str, width: usize) -> String {
    if s.len() >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - s.len()))
    }
}

fn render_table(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "source: {}  generated: {}\n\n",
        report.metadata.source, report.metadata.timestamp
    ));

    let headers = ["SERVICE ACCOUNT", "NAMESPACE", "ROLE", "RESOURCE", "VERBS", "RISK", "TAGS"];
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    let rows: Vec<[String; 7]> = report
        .permissions
        .iter()
        .map(|p| {
            [
                p.service_account.clone(),
                p.namespace.clone(),
                format!("{}/{}", p.role_type, p.role_name),
                if p.resource_name.is_empty() {
                    p.resource.clone()
                } else {
                    format!("{}[{}]", p.resource, p.resource_name)
                },
                p.verbs.join(","),
                p.risk_level.clone(),
                p.tags.join(","),
            ]
        })
        .collect();

    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> =
        headers.iter().enumerate().map(|(i, h)| pad(h, widths[i])).collect();
    out.push_str(&header_line.join("  "));
    out.push('\n');
    out.push_str(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.push('\n');

    for row in &rows {
        let line: Vec<String> = row.iter().enumerate().map(|(i, c)| pad(c, widths[i])).collect();
        out.push_str(&line.join("  "));
        out.push('\n');
    }

    out.push_str(&format!(
        "\n{} permission(s) across {} identit(y/ies), {} workload(s)\n",
        report.permissions.len(),
        report.identities.len(),
        report.workloads.len()
    ));

    out
}

fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("# RBAC Atlas report\n\n`{}`\n\n", report.metadata.source));
    out.push_str("| Service Account | Namespace | Role | Resource | Verbs | Risk | Tags | Rules |\n");
    out.push_str("|---|---|---|---|---|---|---|---|\n");
    for p in &report.permissions {
        let resource = if p.resource_name.is_empty() {
            p.resource.clone()
        } else {
            format!("{} [{}]", p.resource, p.resource_name)
        };
        let rule_links: Vec<String> =
            p.matched_rules.iter().map(|r| format!("[{}]({})", r.name, r.url)).collect();
        out.push_str(&format!(
            "| {} | {} | {}/{} | {} | {} | {} | {} | {} |\n",
            p.service_account,
            p.namespace,
            p.role_type,
            p.role_name,
            resource,
            p.verbs.join(", "),
            p.risk_level,
            p.tags.join(", "),
            rule_links.join(", "),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbac_atlas_core::model::result::Metadata;

    fn empty_report() -> Report {
        Report {
            metadata: Metadata {
                version: "0.1.0".to_string(),
                name: None,
                source: "test.yaml".to_string(),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
                chart: None,
            },
            identities: Vec::new(),
            permissions: Vec::new(),
            workloads: Vec::new(),
        }
    }

    #[test]
    fn parses_recognized_format_names_case_insensitively() {
        assert_eq!("TABLE".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("Json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn json_output_round_trips_through_serde_json() {
        let report = empty_report();
        let rendered = render(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["metadata"]["source"], "test.yaml");
    }

    #[test]
    fn table_output_includes_summary_line() {
        let report = empty_report();
        let rendered = render(&report, OutputFormat::Table).unwrap();
        assert!(rendered.contains("0 permission(s)"));
    }
}
