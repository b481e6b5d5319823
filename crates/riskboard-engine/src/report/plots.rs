use plotly::common::{Mode, Orientation};
use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Bar, HeatMap, Plot, Scatter};

use crate::evaluation::{ConfusionMatrix, FeatureImportance, HistorySeries, LearningCurve};
use crate::risk::MonthlyTrend;

/// Heatmap of the confusion matrix, true labels on the y axis.
pub fn plot_confusion_matrix(cm: &ConfusionMatrix, title: &str) -> Plot {
    let labels: Vec<String> = if cm.labels().len() == cm.size() {
        cm.labels().to_vec()
    } else {
        (0..cm.size()).map(|i| i.to_string()).collect()
    };

    let trace = HeatMap::new(labels.clone(), labels, cm.rows().to_vec()).name("Count");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Predicted"))
            .y_axis(Axis::new().title("Actual")),
    );
    plot
}

pub fn plot_learning_curve(lc: &LearningCurve, title: &str) -> Plot {
    let sizes: Vec<f64> = lc.sizes.iter().map(|&s| s as f64).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(sizes.clone(), lc.train_scores.clone())
            .name("Training score")
            .mode(Mode::LinesMarkers),
    );
    plot.add_trace(
        Scatter::new(sizes, lc.val_scores.clone())
            .name("Validation score")
            .mode(Mode::LinesMarkers),
    );
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Training examples"))
            .y_axis(Axis::new().title("Accuracy")),
    );
    plot
}

/// Horizontal bars, most important feature on top.
pub fn plot_feature_importance(fi: &FeatureImportance, title: &str) -> Plot {
    let mut ranked = fi.ranked();
    // plotly draws the first category at the bottom
    ranked.reverse();
    let (labels, values): (Vec<String>, Vec<f64>) = ranked
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .unzip();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(values, labels)
            .orientation(Orientation::Horizontal)
            .name("Importance"),
    );
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Importance")),
    );
    plot
}

pub fn plot_risk_trend(trend: &MonthlyTrend, title: &str) -> Plot {
    let mut plot = Plot::new();
    for (name, values) in [
        ("Low", &trend.low),
        ("Medium", &trend.medium),
        ("High", &trend.high),
    ] {
        plot.add_trace(Bar::new(trend.labels.clone(), values.clone()).name(name));
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Stack)
            .x_axis(Axis::new().title("Month"))
            .y_axis(Axis::new().title("Patients")),
    );
    plot
}

pub fn plot_history(history: &HistorySeries, title: &str) -> Plot {
    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(history.labels.clone(), history.accuracy.clone())
            .name("Accuracy")
            .mode(Mode::LinesMarkers),
    );
    plot.add_trace(
        Scatter::new(history.labels.clone(), history.loss.clone())
            .name("Loss")
            .mode(Mode::Lines),
    );
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Month"))
            .y_axis(Axis::new().title("Score")),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_plot_carries_counts() {
        let cm = ConfusionMatrix::with_labels(vec!["0".into(), "1".into()], vec![vec![7, 1], vec![2, 9]]);
        let json = plot_confusion_matrix(&cm, "Confusion").to_json();
        assert!(json.contains("heatmap"));
        assert!(json.contains("Predicted"));
    }

    #[test]
    fn risk_trend_is_stacked() {
        let trend = MonthlyTrend {
            labels: vec!["Jan".into(), "Feb".into()],
            low: vec![5, 6],
            medium: vec![1, 2],
            high: vec![0, 3],
        };
        let json = plot_risk_trend(&trend, "Risk").to_json();
        assert!(json.contains("stack"));
        assert!(json.contains("Medium"));
    }
}
