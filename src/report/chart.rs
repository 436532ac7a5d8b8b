//! Hand-built SVG charts of a month run.

use std::fmt::Write;

use crate::domain::month::{MonthPriceSummary, currency_symbol};
use crate::domain::run::RunResult;

const PANEL_W: f64 = 600.0;
const PANEL_H: f64 = 400.0;
const HEADER_H: f64 = 50.0;
const FOOTER_H: f64 = 30.0;
const MARGIN_L: f64 = 60.0;
const MARGIN_R: f64 = 20.0;
const MARGIN_T: f64 = 40.0;
const MARGIN_B: f64 = 60.0;

const GREEN: &str = "#2ecc71";
const BLUE: &str = "#3498db";
const RED: &str = "#e74c3c";
const GRAY: &str = "#95a5a6";
const PURPLE: &str = "#9b59b6";
const DEAL_GREEN: &str = "#27ae60";

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Plot area of one panel, with the y axis running from 0 to `y_max`.
struct Panel {
    x: f64,
    y: f64,
    n: usize,
    y_max: f64,
}

impl Panel {
    fn new(col: u32, row: u32, n: usize, y_max: u32) -> Self {
        Self {
            x: f64::from(col) * PANEL_W,
            y: HEADER_H + f64::from(row) * PANEL_H,
            n,
            y_max: nice_ceiling(y_max),
        }
    }

    fn plot_w(&self) -> f64 {
        PANEL_W - MARGIN_L - MARGIN_R
    }

    fn plot_h(&self) -> f64 {
        PANEL_H - MARGIN_T - MARGIN_B
    }

    fn band(&self) -> f64 {
        self.plot_w() / self.n.max(1) as f64
    }

    /// Horizontal center of the i-th category.
    fn cx(&self, i: usize) -> f64 {
        self.x + MARGIN_L + self.band() * (i as f64 + 0.5)
    }

    fn py(&self, value: u32) -> f64 {
        let bottom = self.y + MARGIN_T + self.plot_h();
        bottom - f64::from(value) / self.y_max * self.plot_h()
    }

    fn frame(&self, svg: &mut String, title: &str, y_label: &str, labels: &[&str]) {
        let left = self.x + MARGIN_L;
        let top = self.y + MARGIN_T;
        let bottom = top + self.plot_h();
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" class="panel-title" text-anchor="middle">{}</text>"#,
            self.x + PANEL_W / 2.0,
            self.y + 25.0,
            escape_xml(title)
        );
        for step in 0..=4 {
            let value = self.y_max * f64::from(step) / 4.0;
            let y = bottom - self.plot_h() * f64::from(step) / 4.0;
            let _ = write!(
                svg,
                r##"<line x1="{left:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/><text x="{:.1}" y="{:.1}" class="tick" text-anchor="end">{value:.0}</text>"##,
                left + self.plot_w(),
                left - 6.0,
                y + 4.0
            );
        }
        let _ = write!(
            svg,
            r##"<line x1="{left:.1}" y1="{bottom:.1}" x2="{:.1}" y2="{bottom:.1}" stroke="#333333"/>"##,
            left + self.plot_w()
        );
        for (i, label) in labels.iter().enumerate() {
            let x = self.cx(i);
            let y = bottom + 18.0;
            let _ = write!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" class="tick" text-anchor="end" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
                escape_xml(label)
            );
        }
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" class="axis" text-anchor="middle" transform="rotate(-90 {:.1} {:.1})">{}</text>"#,
            self.x + 16.0,
            top + self.plot_h() / 2.0,
            self.x + 16.0,
            top + self.plot_h() / 2.0,
            escape_xml(y_label)
        );
    }

    fn polyline(&self, svg: &mut String, values: &[u32], color: &str, dashed: bool) {
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| format!("{:.1},{:.1}", self.cx(i), self.py(v)))
            .collect();
        let dash = if dashed { r#" stroke-dasharray="6 4""# } else { "" };
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="2"{dash}/>"#,
            points.join(" ")
        );
        for (i, &v) in values.iter().enumerate() {
            let _ = write!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{color}"/>"#,
                self.cx(i),
                self.py(v)
            );
        }
    }

    fn bar(&self, svg: &mut String, i: usize, low: u32, high: u32, color: &str) {
        let width = self.band() * 0.7;
        let top = self.py(high);
        let _ = write!(
            svg,
            r##"<rect x="{:.1}" y="{top:.1}" width="{width:.1}" height="{:.1}" fill="{color}" stroke="#222222"/>"##,
            self.cx(i) - width / 2.0,
            (self.py(low) - top).max(0.0)
        );
    }

    fn value_label(&self, svg: &mut String, i: usize, value: u32, text: &str) {
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" class="value" text-anchor="middle">{}</text>"#,
            self.cx(i),
            self.py(value) - 8.0,
            escape_xml(text)
        );
    }
}

/// Round up to a multiple of a power-of-ten step so axis ticks stay readable.
fn nice_ceiling(value: u32) -> f64 {
    let padded = (f64::from(value) * 1.1).max(1.0);
    let magnitude = 10f64.powf(padded.log10().floor());
    let step = magnitude / 2.0;
    (padded / step).ceil() * step
}

/// Blue-to-red ramp over `n` categories.
fn ramp(i: usize, n: usize) -> String {
    let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(59.0, 180.0),
        lerp(76.0, 4.0),
        lerp(192.0, 38.0)
    )
}

fn open_svg(svg: &mut String, width: f64, height: f64) {
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width:.0}" height="{height:.0}" viewBox="0 0 {width:.0} {height:.0}" font-family="Arial, sans-serif">"#
    );
    svg.push_str(
        "<style>.title{font-size:20px;font-weight:bold}.panel-title{font-size:15px;font-weight:bold}\
         .tick{font-size:11px;fill:#444}.axis{font-size:12px;font-weight:bold}\
         .value{font-size:10px;font-weight:bold}.footer{font-size:11px;font-style:italic;fill:gray}</style>",
    );
    let _ = write!(svg, r#"<rect width="{width:.0}" height="{height:.0}" fill="white"/>"#);
}

/// Four panels: min/avg/max lines, average bars, min-max ranges with the
/// average marked, and flight counts. `None` when no month had flights.
pub fn price_trends_svg(run: &RunResult) -> Option<String> {
    let months: Vec<&MonthPriceSummary> = run.available_months().collect();
    if months.is_empty() {
        return None;
    }
    let n = months.len();
    let labels: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
    let averages: Vec<u32> = months.iter().map(|m| m.average).collect();
    let mins: Vec<u32> = months.iter().map(|m| m.min).collect();
    let maxs: Vec<u32> = months.iter().map(|m| m.max).collect();
    let counts: Vec<u32> = months
        .iter()
        .map(|m| u32::try_from(m.count).unwrap_or(u32::MAX))
        .collect();
    let top_price = maxs.iter().copied().max().unwrap_or(0);
    let currency = &months[0].currency;
    let symbol = currency_symbol(currency);

    let width = PANEL_W * 2.0;
    let height = HEADER_H + PANEL_H * 2.0 + FOOTER_H;
    let mut svg = String::new();
    open_svg(&mut svg, width, height);
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="32" class="title" text-anchor="middle">Flight Price Analysis: {}</text>"#,
        width / 2.0,
        escape_xml(&run.route())
    );

    // Trends: shaded min-max band under the three lines.
    let trends = Panel::new(0, 0, n, top_price);
    trends.frame(&mut svg, "Price Trends Over Time", &format!("Price ({currency})"), &labels);
    let band: Vec<String> = (0..n)
        .map(|i| format!("{:.1},{:.1}", trends.cx(i), trends.py(maxs[i])))
        .chain((0..n).rev().map(|i| format!("{:.1},{:.1}", trends.cx(i), trends.py(mins[i]))))
        .collect();
    let _ = write!(
        svg,
        r#"<polygon points="{}" fill="gray" fill-opacity="0.2"/>"#,
        band.join(" ")
    );
    trends.polyline(&mut svg, &mins, BLUE, true);
    trends.polyline(&mut svg, &maxs, RED, true);
    trends.polyline(&mut svg, &averages, GREEN, false);
    for (i, &avg) in averages.iter().enumerate() {
        trends.value_label(&mut svg, i, avg, &format!("{avg}{symbol}"));
    }

    let bars = Panel::new(1, 0, n, averages.iter().copied().max().unwrap_or(0));
    bars.frame(&mut svg, "Average Price by Month", &format!("Average Price ({currency})"), &labels);
    for (i, &avg) in averages.iter().enumerate() {
        bars.bar(&mut svg, i, 0, avg, &ramp(i, n));
        bars.value_label(&mut svg, i, avg, &format!("{avg}{symbol}"));
    }

    let ranges = Panel::new(0, 1, n, top_price);
    ranges.frame(&mut svg, "Price Range (Min-Max) with Average", &format!("Price ({currency})"), &labels);
    for i in 0..n {
        ranges.bar(&mut svg, i, mins[i], maxs[i], GRAY);
        let _ = write!(
            svg,
            r##"<circle cx="{:.1}" cy="{:.1}" r="6" fill="{RED}" stroke="#000000" stroke-width="1.5"/>"##,
            ranges.cx(i),
            ranges.py(averages[i])
        );
    }

    let availability = Panel::new(1, 1, n, counts.iter().copied().max().unwrap_or(0));
    availability.frame(&mut svg, "Flight Availability by Month", "Number of Flights", &labels);
    for (i, &count) in counts.iter().enumerate() {
        availability.bar(&mut svg, i, 0, count, PURPLE);
        availability.value_label(&mut svg, i, count, &count.to_string());
    }

    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" class="footer" text-anchor="middle">Data scraped on {} | Source: {} | {n} months analyzed</text></svg>"#,
        width / 2.0,
        height - 10.0,
        run.scrape_date.format("%Y-%m-%d %H:%M"),
        escape_xml(&run.metadata.source)
    );
    Some(svg)
}

/// Months as horizontal bars, cheapest first. The three cheapest are green,
/// the three dearest red.
pub fn best_deals_svg(run: &RunResult) -> Option<String> {
    let mut months: Vec<&MonthPriceSummary> = run.available_months().collect();
    if months.is_empty() {
        return None;
    }
    months.sort_by_key(|m| m.average);
    let n = months.len();
    let top = nice_ceiling(months.iter().map(|m| m.average).max().unwrap_or(0));
    let symbol = currency_symbol(&months[0].currency);

    let row_h = 36.0;
    let left = 90.0;
    let plot_w = 700.0;
    let width = left + plot_w + 160.0;
    let height = 90.0 + row_h * n as f64 + 50.0;

    let mut svg = String::new();
    open_svg(&mut svg, width, height);
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="32" class="title" text-anchor="middle">Best Deals: {}</text><text x="{:.1}" y="54" class="axis" text-anchor="middle">Sorted by Price</text>"#,
        width / 2.0,
        escape_xml(&run.route()),
        width / 2.0
    );

    for (i, m) in months.iter().enumerate() {
        let color = if i < 3 {
            DEAL_GREEN
        } else if i + 3 < n {
            GRAY
        } else {
            RED
        };
        let y = 80.0 + row_h * i as f64;
        let bar_w = f64::from(m.average) / top * plot_w;
        let mut label = format!("{}{symbol}", m.average);
        if i < 3 {
            label.push_str(" ★ BEST");
        }
        let _ = write!(
            svg,
            r##"<text x="{:.1}" y="{:.1}" class="tick" text-anchor="end">{}</text><rect x="{left:.1}" y="{y:.1}" width="{bar_w:.1}" height="{:.1}" fill="{color}" stroke="#000000"/><text x="{:.1}" y="{:.1}" class="value">{}</text>"##,
            left - 8.0,
            y + row_h * 0.55,
            escape_xml(&m.month),
            row_h * 0.75,
            left + bar_w + 6.0,
            y + row_h * 0.5,
            escape_xml(&label)
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" class="axis" text-anchor="middle">Average Price ({})</text></svg>"#,
        left + plot_w / 2.0,
        height - 15.0,
        escape_xml(&months[0].currency)
    );
    Some(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::month::MonthPriceSummary;
    use crate::domain::run::RunEntries;
    use crate::test_helpers::{make_month, make_month_run};

    fn sample() -> RunResult {
        make_month_run(vec![
            make_month("feb.", 120, 89, 180),
            make_month("mar.", 98, 75, 145),
            MonthPriceSummary::unavailable("apr."),
            make_month("may.", 165, 120, 210),
        ])
    }

    #[test]
    fn trends_chart_covers_available_months() {
        let svg = price_trends_svg(&sample()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("Madrid → Paris"));
        assert!(svg.contains("feb."));
        assert!(!svg.contains("apr."));
        assert!(svg.contains("3 months analyzed"));
        assert!(svg.contains("98€"));
    }

    #[test]
    fn best_deals_sorted_cheapest_first() {
        let svg = best_deals_svg(&sample()).unwrap();
        let mar = svg.find(">mar.<").unwrap();
        let feb = svg.find(">feb.<").unwrap();
        let may = svg.find(">may.<").unwrap();
        assert!(mar < feb && feb < may);
        assert_eq!(svg.matches("BEST").count(), 3);
    }

    #[test]
    fn no_available_month_means_no_chart() {
        let run = make_month_run(vec![MonthPriceSummary::unavailable("feb.")]);
        assert!(price_trends_svg(&run).is_none());
        assert!(best_deals_svg(&run).is_none());
    }

    #[test]
    fn value_labels_follow_currency() {
        let mut run = make_month_run(vec![make_month("feb.", 120, 89, 180)]);
        if let RunEntries::Months { months, .. } = &mut run.entries {
            months[0].currency = "GBP".into();
        }
        let trends = price_trends_svg(&run).unwrap();
        assert!(trends.contains("120£"));
        assert!(trends.contains("Price (GBP)"));
        assert!(!trends.contains('€'));
        assert!(best_deals_svg(&run).unwrap().contains("120£ ★ BEST"));
    }

    #[test]
    fn labels_are_escaped() {
        let mut run = sample();
        run.origin = "A&B".into();
        let svg = price_trends_svg(&run).unwrap();
        assert!(svg.contains("A&amp;B"));
    }

    #[test]
    fn axis_ceiling_is_round() {
        assert!((nice_ceiling(210) - 250.0).abs() < f64::EPSILON);
        assert!((nice_ceiling(0) - 1.0).abs() < f64::EPSILON);
    }
}
