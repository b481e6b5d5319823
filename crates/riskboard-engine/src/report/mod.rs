//! Plotly figures and HTML dashboard rendering for engine output.
pub mod html;
pub mod plots;

pub use html::{build_dashboard, render_dashboard, Report, ReportSection};
