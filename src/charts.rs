//! Progress chart rendering.
//!
//! The ledger hands over ordered `(label, value)` series; what becomes of
//! them is up to the [`ProgressChart`] chosen when the project is opened.

#[cfg(feature = "charts")]
use svg::Document;
#[cfg(feature = "charts")]
use svg::node::element::{Line, Rectangle, Text};

/// One bar chart: a title and its bars in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub title: String,
    pub points: Vec<(String, i64)>,
}

/// Renders a chart into a document, or declines to.
pub trait ProgressChart {
    /// File extension of the rendered document.
    fn extension(&self) -> &'static str;

    /// `None` means nothing should be written.
    fn render(&self, chart: &Chart) -> Option<String>;
}

/// Renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCharts;

impl ProgressChart for NoCharts {
    fn extension(&self) -> &'static str {
        ""
    }

    fn render(&self, _chart: &Chart) -> Option<String> {
        None
    }
}

/// Renders a standalone SVG bar chart with a value label on each bar and the
/// date label underneath.
#[cfg(feature = "charts")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgCharts;

#[cfg(feature = "charts")]
impl SvgCharts {
    const BAR_PITCH: i64 = 30;
    const BAR_WIDTH: i64 = 18;
    const MIN_WIDTH: i64 = 800;
    const PLOT_HEIGHT: i64 = 300;
    const TOP: i64 = 80;
    const LEFT: i64 = 60;
    const LABEL_SPACE: i64 = 100;
}

#[cfg(feature = "charts")]
impl ProgressChart for SvgCharts {
    fn extension(&self) -> &'static str {
        "svg"
    }

    fn render(&self, chart: &Chart) -> Option<String> {
        let bars = chart.points.len() as i64;
        let width = (Self::LEFT * 2 + bars * Self::BAR_PITCH).max(Self::MIN_WIDTH);
        let height = Self::TOP + Self::PLOT_HEIGHT + Self::LABEL_SPACE;

        let high = chart.points.iter().map(|(_, v)| *v).max().unwrap_or(0).max(0);
        let low = chart.points.iter().map(|(_, v)| *v).min().unwrap_or(0).min(0);
        let span = (high - low).max(1);
        let scale = |v: i64| v * Self::PLOT_HEIGHT / span;
        let baseline = Self::TOP + scale(high);
        let axis_mid = Self::TOP + Self::PLOT_HEIGHT / 2;

        let mut doc = Document::new()
            .set("viewBox", (0, 0, width, height))
            .set("width", width)
            .set("height", height)
            .set("font-family", "sans-serif")
            .set("font-size", 10)
            .add(
                Text::new(chart.title.clone())
                    .set("x", width / 2)
                    .set("y", 30)
                    .set("text-anchor", "middle")
                    .set("font-size", 16),
            )
            .add(
                Text::new("Word Count")
                    .set("x", 15)
                    .set("y", axis_mid)
                    .set("transform", format!("rotate(-90 15 {axis_mid})"))
                    .set("text-anchor", "middle"),
            )
            .add(
                Line::new()
                    .set("x1", Self::LEFT)
                    .set("y1", baseline)
                    .set("x2", width - Self::LEFT)
                    .set("y2", baseline)
                    .set("stroke", "#333"),
            );

        let label_y = Self::TOP + Self::PLOT_HEIGHT + 8;
        for (i, (label, value)) in chart.points.iter().enumerate() {
            let x = Self::LEFT + i as i64 * Self::BAR_PITCH + (Self::BAR_PITCH - Self::BAR_WIDTH) / 2;
            let bar = scale(*value);
            let (y, h) = if bar >= 0 {
                (baseline - bar, bar)
            } else {
                (baseline, -bar)
            };
            let cx = x + Self::BAR_WIDTH / 2;
            let value_y = y - 4;

            doc = doc
                .add(
                    Rectangle::new()
                        .set("x", x)
                        .set("y", y)
                        .set("width", Self::BAR_WIDTH)
                        .set("height", h)
                        .set("fill", "red"),
                )
                .add(
                    Text::new(value.to_string())
                        .set("x", cx)
                        .set("y", value_y)
                        .set("transform", format!("rotate(-90 {cx} {value_y})")),
                )
                .add(
                    Text::new(label.clone())
                        .set("x", cx)
                        .set("y", label_y)
                        .set("transform", format!("rotate(90 {cx} {label_y})")),
                );
        }

        Some(doc.to_string())
    }
}

/// The renderer this build ships with.
pub fn default_renderer() -> Box<dyn ProgressChart> {
    #[cfg(feature = "charts")]
    {
        Box::new(SvgCharts)
    }
    #[cfg(not(feature = "charts"))]
    {
        Box::new(NoCharts)
    }
}
