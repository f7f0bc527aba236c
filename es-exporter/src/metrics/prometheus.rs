//! Prometheus metrics exporter.
//!
//! Exports metrics in Prometheus text format.

use std::fmt::Write;
use std::sync::Arc;

use super::catalog::{MetricKind, NAMESPACE, UP_HELP, UP_NAME};
use super::cycle::Collector;
use super::registry::{MetricFamily, RegistrySnapshot};

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus metrics exporter.
pub struct PrometheusExporter {
    collector: Arc<Collector>,
    namespace: String,
}

impl PrometheusExporter {
    /// Create a new Prometheus exporter.
    pub fn new(collector: Arc<Collector>) -> Self {
        Self {
            collector,
            namespace: NAMESPACE.to_string(),
        }
    }

    /// Create a new Prometheus exporter with custom namespace.
    pub fn with_namespace(collector: Arc<Collector>, namespace: impl Into<String>) -> Self {
        Self {
            collector,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Run one collection cycle and export its result in Prometheus text format.
    pub async fn export(&self) -> String {
        let scrape = self.collector.collect().await;
        render(&self.namespace, &scrape.snapshot)
    }
}

/// Render a snapshot, followed by the availability series.
pub fn render(namespace: &str, snapshot: &RegistrySnapshot) -> String {
    let mut output = String::new();

    for family in &snapshot.families {
        write_family(&mut output, namespace, family);
    }

    let up = format!("{namespace}_{UP_NAME}");
    write_header(&mut output, &up, UP_HELP, MetricKind::Gauge);
    let _ = writeln!(output, "{} {}", up, if snapshot.up { 1 } else { 0 });

    output
}

fn write_family(output: &mut String, namespace: &str, family: &MetricFamily) {
    let descriptor = &family.descriptor;
    let full_name = format!("{}_{}", namespace, descriptor.name);
    write_header(output, &full_name, descriptor.help, descriptor.kind);

    for series in &family.series {
        let labels_str = descriptor
            .label_names
            .iter()
            .zip(&series.label_values)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
            .collect::<Vec<_>>()
            .join(",");

        let _ = writeln!(
            output,
            "{}{{{}}} {}",
            full_name,
            labels_str,
            format_value(series.value)
        );
    }
}

fn write_header(output: &mut String, full_name: &str, help: &str, kind: MetricKind) {
    let _ = writeln!(output, "# HELP {} {}", full_name, escape_help(help));
    let _ = writeln!(output, "# TYPE {} {}", full_name, kind);
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        if v.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        format!("{}", v)
    }
}
