//! Single-page temperature statistics report.

use chrono::NaiveDateTime;
use climate_common::BoundingBox;
use tracing::debug;

use crate::error::RenderResult;
use crate::pdf::{Align, DocumentInfo, Font, PageContent, PdfDocument, Rgb, A4};

pub const REPORT_TITLE: &str = "Temperature Analysis Report";

const MARGIN: f64 = 72.0;
const COLUMN_WIDTH: f64 = 200.0;
const ROW_HEIGHT: f64 = 24.0;

/// Summary figures shown in the statistics table, in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportFigures {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub std_dev: f64,
}

/// Everything printed on the report page.
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub start_date: String,
    pub end_date: String,
    pub bounds: BoundingBox,
    pub figures: ReportFigures,
    pub generated_at: NaiveDateTime,
}

impl ReportContent {
    /// Table rows as `(label, value)`, header excluded.
    pub fn table_rows(&self) -> [(&'static str, String); 4] {
        let f = &self.figures;
        [
            ("Mean Temperature", format!("{:.2}°C", f.mean)),
            ("Maximum Temperature", format!("{:.2}°C", f.max)),
            ("Minimum Temperature", format!("{:.2}°C", f.min)),
            ("Standard Deviation", format!("{:.2}°C", f.std_dev)),
        ]
    }
}

/// Lay out the report and serialize it as PDF bytes.
pub fn render_report(content: &ReportContent) -> RenderResult<Vec<u8>> {
    let (page_width, page_height) = A4;
    let mut page = PageContent::new();

    let mut y = page_height - MARGIN - 24.0;
    page.text(
        Font::HelveticaBold,
        24.0,
        page_width / 2.0,
        y,
        Align::Center,
        Rgb::BLACK,
        REPORT_TITLE,
    );

    y -= 48.0;
    page.text(
        Font::HelveticaBold,
        16.0,
        MARGIN,
        y,
        Align::Left,
        Rgb::BLACK,
        &format!("Date Range: {} to {}", content.start_date, content.end_date),
    );

    y -= 32.0;
    page.text(Font::HelveticaBold, 12.0, MARGIN, y, Align::Left, Rgb::BLACK, "Selected Area:");
    let bounds = &content.bounds;
    for line in [
        format!("Southwest: ({:.4}, {:.4})", bounds.min_lat, bounds.min_lon),
        format!("Northeast: ({:.4}, {:.4})", bounds.max_lat, bounds.max_lon),
    ] {
        y -= 18.0;
        page.text(Font::Helvetica, 12.0, MARGIN + 12.0, y, Align::Left, Rgb::BLACK, &line);
    }

    y -= 48.0;
    draw_statistics_table(&mut page, page_width, y, content);

    page.text(
        Font::Helvetica,
        9.0,
        page_width / 2.0,
        MARGIN / 2.0,
        Align::Center,
        Rgb::GREY,
        &format!("Generated {}", content.generated_at.format("%Y-%m-%d %H:%M:%S")),
    );

    let mut doc = PdfDocument::new(
        A4,
        DocumentInfo {
            title: REPORT_TITLE.to_string(),
            producer: "climate-api".to_string(),
            creation_date: Some(content.generated_at.format("%Y%m%d%H%M%S").to_string()),
        },
    );
    doc.add_page(page);
    let bytes = doc.to_bytes()?;

    debug!(bytes = bytes.len(), "Rendered PDF report");
    Ok(bytes)
}

/// Two-column table whose top edge is at `top`: shaded header, beige body,
/// centered cells, 1pt grid.
fn draw_statistics_table(page: &mut PageContent, page_width: f64, top: f64, content: &ReportContent) {
    let left = (page_width - 2.0 * COLUMN_WIDTH) / 2.0;
    let right = left + 2.0 * COLUMN_WIDTH;
    let rows = content.table_rows();
    let row_count = rows.len() + 1;
    let bottom = top - row_count as f64 * ROW_HEIGHT;

    page.fill_rect(left, top - ROW_HEIGHT, right - left, ROW_HEIGHT, Rgb::GREY);
    page.fill_rect(left, bottom, right - left, top - ROW_HEIGHT - bottom, Rgb::BEIGE);

    let centers = [left + COLUMN_WIDTH / 2.0, left + 1.5 * COLUMN_WIDTH];
    let baseline = |row: usize| top - (row as f64 + 1.0) * ROW_HEIGHT + 8.0;

    for (col, header) in ["Statistic", "Value"].iter().enumerate() {
        page.text(
            Font::HelveticaBold,
            12.0,
            centers[col],
            baseline(0),
            Align::Center,
            Rgb::WHITESMOKE,
            header,
        );
    }
    for (i, (label, value)) in rows.iter().enumerate() {
        page.text(Font::Helvetica, 11.0, centers[0], baseline(i + 1), Align::Center, Rgb::BLACK, label);
        page.text(Font::Helvetica, 11.0, centers[1], baseline(i + 1), Align::Center, Rgb::BLACK, value);
    }

    for r in 0..=row_count {
        let y = top - r as f64 * ROW_HEIGHT;
        page.line(left, y, right, y, 1.0, Rgb::BLACK);
    }
    for x in [left, left + COLUMN_WIDTH, right] {
        page.line(x, top, x, bottom, 1.0, Rgb::BLACK);
    }
}
