//! Standalone HTML dashboard pages.
//!
//! A [`Report`] is a titled list of [`ReportSection`]s; each section holds
//! maud markup and inline plotly figures. Pages load plotly.js from its CDN.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::engine::{ComparisonRow, ModelReport};
use crate::evaluation::Provenance;
use crate::report::plots::{
    plot_confusion_matrix, plot_feature_importance, plot_history, plot_learning_curve,
    plot_risk_trend,
};
use crate::risk::PopulationStats;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem; color: #222; }
section { margin-bottom: 2.5rem; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ccc; padding: 4px 10px; text-align: right; }
th { background-color: #f5f5f5; }
.tag { font-size: 0.8em; padding: 1px 6px; border-radius: 4px; }
.tag.real { background-color: #d4edda; }
.tag.synthetic { background-color: #fff3cd; }
";

pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, markup: Markup) {
        self.content.push(markup);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        let div_id = format!(
            "{}-plot-{}",
            self.title.to_lowercase().replace(' ', "-"),
            self.content.len()
        );
        self.content
            .push(PreEscaped(plot.to_inline_html(Some(div_id.as_str()))));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.content {
                    div { (block) }
                }
            }
        }
    }
}

pub struct Report {
    title: String,
    generated: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            generated: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> String {
        let page = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    h1 { (self.title) }
                    p { "Generated " (self.generated) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        };
        page.into_string()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.render())
            .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))?;
        log::info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}

fn source_tag(source: Provenance) -> Markup {
    let (class, text) = match source {
        Provenance::Real => ("tag real", "computed"),
        Provenance::Synthetic => ("tag synthetic", "simulated"),
    };
    html! { span class=(class) { (text) } }
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Build the dashboard page for one model report, the model comparison and
/// (when a dataset is loaded) the population statistics.
pub fn build_dashboard(
    report: &ModelReport,
    comparison: &[ComparisonRow],
    stats: Option<&PopulationStats>,
) -> Report {
    let mut page = Report::new(&format!("{} Dashboard", report.info.name));

    /* Overview */
    {
        let mut section = ReportSection::new("Overview");
        let m = &report.metrics;
        section.add_content(html! {
            p { (report.info.description) }
            p { "Type: " (report.info.kind) " " (source_tag(report.sources.metrics)) }
            table {
                tr { th { "Accuracy" } th { "Precision" } th { "Recall" } th { "F1" } }
                tr { td { (pct(m.accuracy)) } td { (pct(m.precision)) } td { (pct(m.recall)) } td { (pct(m.f1)) } }
            }
        });
        section.add_plot(plot_history(&report.history, "Monthly Performance"));
        page.add_section(section);
    }

    /* Evaluation */
    {
        let mut section = ReportSection::new("Evaluation");
        section.add_content(html! {
            p { "Confusion matrix " (source_tag(report.sources.confusion_matrix)) }
        });
        section.add_plot(plot_confusion_matrix(&report.confusion_matrix, "Confusion Matrix"));
        section.add_content(html! {
            p { "Learning curve " (source_tag(report.sources.learning_curve)) }
        });
        section.add_plot(plot_learning_curve(&report.learning_curve, "Learning Curve"));
        match &report.feature_importance {
            Some(fi) => section.add_plot(plot_feature_importance(fi, "Feature Importance")),
            None => section.add_content(html! {
                p { "Feature importance is not available for this model." }
            }),
        }
        page.add_section(section);
    }

    /* Model comparison */
    {
        let mut section = ReportSection::new("Model Comparison");
        section.add_content(html! {
            table {
                tr { th { "Model" } th { "Accuracy" } th { "Latency (ms)" } }
                @for row in comparison {
                    tr {
                        td { (row.name) }
                        td { (pct(row.accuracy)) }
                        td { (format!("{:.0}", row.speed)) }
                    }
                }
            }
        });
        page.add_section(section);
    }

    /* Population */
    if let Some(stats) = stats {
        let mut section = ReportSection::new("Population");
        let dist = &stats.risk_distribution;
        section.add_content(html! {
            p { "Total patients: " (stats.total) ", at risk: " (stats.at_risk) }
            table {
                tr { th { "Low" } th { "Medium" } th { "High" } }
                tr { td { (dist.low) } td { (dist.medium) } td { (dist.high) } }
            }
        });
        section.add_plot(plot_risk_trend(&stats.monthly_trend, "Patient Risk Trend"));
        page.add_section(section);
    }

    page
}

pub fn render_dashboard(
    report: &ModelReport,
    comparison: &[ComparisonRow],
    stats: Option<&PopulationStats>,
) -> String {
    build_dashboard(report, comparison, stats).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::ReportEngine;
    use crate::registry::ModelRegistry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn synthetic_dashboard_renders_every_section() {
        let engine = ReportEngine::new(EngineConfig::default(), ModelRegistry::new(), None);
        let mut rng = StdRng::seed_from_u64(9);
        let report = engine.get_report_with("svc", &mut rng).unwrap();
        let comparison = engine.get_comparison_with(&mut rng);

        let html = render_dashboard(&report, &comparison, None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Support Vector"));
        assert!(html.contains("Model Comparison"));
        assert!(html.contains("simulated"));
        assert!(!html.contains("Total patients"));
    }

    #[test]
    fn saved_page_matches_rendered_page() {
        let engine = ReportEngine::new(EngineConfig::default(), ModelRegistry::new(), None);
        let mut rng = StdRng::seed_from_u64(3);
        let report = engine.get_report_with("logistic_regression", &mut rng).unwrap();
        let comparison = engine.get_comparison_with(&mut rng);
        let page = build_dashboard(&report, &comparison, None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.html");
        page.save_to_file(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), page.render());

        let missing_dir = dir.path().join("missing").join("dashboard.html");
        assert!(page.save_to_file(missing_dir).is_err());
    }
}
