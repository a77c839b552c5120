//! HTML bar chart rendering.
//!
//! The chart page is a self-contained HTML document with an inline SVG: one
//! bar per asset in quote-set order, a linear price axis starting at zero,
//! and a `<title>` tooltip on each bar carrying the exact price.

use std::fmt::{self, Display, Formatter};

use axum::http::StatusCode;

use super::response::ErrorResponse;
use crate::domain::quotes::ChartSeries;

/// Chart heading.
pub const CHART_TITLE: &str = "Top 10 Crypto Prices";

/// X axis title.
pub const X_AXIS_TITLE: &str = "Crypto";

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 100.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 110.0;
const Y_TICKS: u32 = 5;
const BAR_FILL: &str = "#636efa";

/// Render the chart page for a series.
#[must_use]
pub fn render_chart_page(series: &ChartSeries) -> String {
    Page {
        title: CHART_TITLE,
        body: &BarChart { series },
    }
    .to_string()
}

/// Render an error page for a failed quote request.
#[must_use]
pub fn render_error_page(status: StatusCode, error: &ErrorResponse) -> String {
    Page {
        title: "Crypto prices unavailable",
        body: &ErrorNotice { status, error },
    }
    .to_string()
}

/// Y axis title for a currency, e.g. `Price (USD)`.
#[must_use]
pub fn y_axis_title(currency: &str) -> String {
    format!("Price ({})", currency.to_uppercase())
}

/// Escape text for use in HTML element content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Human-readable price: two decimals from 1 upward, up to eight
/// significant decimals below that.
#[must_use]
pub fn format_price(value: f64) -> String {
    if value.abs() >= 1.0 {
        return format!("{value:.2}");
    }
    let text = format!("{value:.8}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

// =============================================================================
// Page Layout
// =============================================================================

struct Page<'a> {
    title: &'a str,
    body: &'a dyn Display,
}

impl Display for Page<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let title = escape_html(self.title);
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(f, "<title>{title}</title>")?;
        writeln!(
            f,
            "<style>body{{font-family:sans-serif;margin:2rem;color:#2a3f5f}}\
             .bar:hover{{opacity:0.8}}</style>"
        )?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;
        write!(f, "{}", self.body)?;
        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

struct ErrorNotice<'a> {
    status: StatusCode,
    error: &'a ErrorResponse,
}

impl Display for ErrorNotice<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "<h1>{}</h1>", escape_html(CHART_TITLE))?;
        writeln!(
            f,
            "<p class=\"error\"><strong>{}</strong></p>",
            escape_html(&self.error.error)
        )?;
        if let Some(details) = &self.error.details {
            writeln!(f, "<p class=\"details\">{}</p>", escape_html(details))?;
        }
        writeln!(f, "<p class=\"status\">HTTP {}</p>", self.status.as_u16())
    }
}

// =============================================================================
// SVG Bar Chart
// =============================================================================

struct BarChart<'a> {
    series: &'a ChartSeries,
}

impl BarChart<'_> {
    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn plot_bottom() -> f64 {
        HEIGHT - MARGIN_BOTTOM
    }

    /// Top of the value axis; never zero so bars can always be scaled.
    fn axis_max(&self) -> f64 {
        let max = self.series.max_value();
        if max > 0.0 { max } else { 1.0 }
    }

    fn scale(&self, value: f64) -> f64 {
        (value.max(0.0) / self.axis_max()) * Self::plot_height()
    }

    fn write_axes(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let bottom = Self::plot_bottom();
        let right = WIDTH - MARGIN_RIGHT;
        writeln!(
            f,
            "<line x1=\"{MARGIN_LEFT:.1}\" y1=\"{MARGIN_TOP:.1}\" x2=\"{MARGIN_LEFT:.1}\" y2=\"{bottom:.1}\" stroke=\"#444\"/>"
        )?;
        writeln!(
            f,
            "<line x1=\"{MARGIN_LEFT:.1}\" y1=\"{bottom:.1}\" x2=\"{right:.1}\" y2=\"{bottom:.1}\" stroke=\"#444\"/>"
        )?;

        let axis_max = self.axis_max();
        for tick in 0..=Y_TICKS {
            let fraction = f64::from(tick) / f64::from(Y_TICKS);
            let y = bottom - fraction * Self::plot_height();
            let label_x = MARGIN_LEFT - 8.0;
            writeln!(
                f,
                "<line x1=\"{MARGIN_LEFT:.1}\" y1=\"{y:.1}\" x2=\"{right:.1}\" y2=\"{y:.1}\" stroke=\"#e5ecf6\"/>"
            )?;
            writeln!(
                f,
                "<text class=\"tick\" x=\"{label_x:.1}\" y=\"{y:.1}\" text-anchor=\"end\" dominant-baseline=\"middle\" font-size=\"11\">{}</text>",
                format_price(axis_max * fraction)
            )?;
        }

        let x_title_x = MARGIN_LEFT + Self::plot_width() / 2.0;
        let x_title_y = HEIGHT - 15.0;
        writeln!(
            f,
            "<text class=\"axis-title\" x=\"{x_title_x:.1}\" y=\"{x_title_y:.1}\" text-anchor=\"middle\" font-size=\"14\">{}</text>",
            escape_html(X_AXIS_TITLE)
        )?;
        let y_title_y = MARGIN_TOP + Self::plot_height() / 2.0;
        writeln!(
            f,
            "<text class=\"axis-title\" x=\"20\" y=\"{y_title_y:.1}\" text-anchor=\"middle\" font-size=\"14\" transform=\"rotate(-90 20 {y_title_y:.1})\">{}</text>",
            escape_html(&y_axis_title(&self.series.currency))
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn write_bars(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.series.is_empty() {
            let x = MARGIN_LEFT + Self::plot_width() / 2.0;
            let y = MARGIN_TOP + Self::plot_height() / 2.0;
            return writeln!(
                f,
                "<text x=\"{x:.1}\" y=\"{y:.1}\" text-anchor=\"middle\">No prices available</text>"
            );
        }

        let band = Self::plot_width() / self.series.len() as f64;
        let bar_width = band * 0.7;
        let bottom = Self::plot_bottom();

        for (index, (label, value)) in self
            .series
            .labels
            .iter()
            .zip(self.series.values.iter().copied())
            .enumerate()
        {
            let label = escape_html(label);
            let band_start = MARGIN_LEFT + band * index as f64;
            let x = band_start + (band - bar_width) / 2.0;
            let height = self.scale(value);
            let y = bottom - height;
            let center = band_start + band / 2.0;
            let label_y = bottom + 16.0;

            writeln!(
                f,
                "<rect class=\"bar\" data-asset=\"{label}\" x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_width:.1}\" height=\"{height:.1}\" fill=\"{BAR_FILL}\"><title>{label}: {}</title></rect>",
                format_price(value)
            )?;
            writeln!(
                f,
                "<text class=\"label\" x=\"{center:.1}\" y=\"{label_y:.1}\" text-anchor=\"end\" font-size=\"12\" transform=\"rotate(-35 {center:.1} {label_y:.1})\">{label}</text>"
            )?;
        }
        Ok(())
    }
}

impl Display for BarChart<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" role=\"img\" aria-label=\"{}\">",
            escape_html(CHART_TITLE)
        )?;
        let title_x = WIDTH / 2.0;
        writeln!(
            f,
            "<text class=\"chart-title\" x=\"{title_x:.1}\" y=\"35\" text-anchor=\"middle\" font-size=\"20\">{}</text>",
            escape_html(CHART_TITLE)
        )?;
        self.write_axes(f)?;
        self.write_bars(f)?;
        writeln!(f, "</svg>")
    }
}
