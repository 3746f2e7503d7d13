//! Paginated PDF report built with `lopdf`.
//!
//! US Letter pages, Helvetica text, one 20pt line per row starting under a bold
//! heading. A page break happens once the cursor falls below 150pt. The chart
//! goes at the bottom of the last page, or a placeholder line when the table
//! has nothing to plot.

use super::Table;
use super::chart::{self, Frame, text};
use crate::errors::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::warn;

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const REPORT_HEADING: &str = "Attendance Report";

const MARGIN: f32 = 50.0;
const ROW_HEIGHT: f32 = 20.0;
const COLUMN_WIDTH: f32 = 100.0;
const PAGE_BREAK_Y: f32 = 150.0;
const CHART_FRAME: Frame = Frame {
    x: MARGIN,
    y: MARGIN,
    width: 400.0,
    height: 200.0,
};
/// Space the chart and its title need above the bottom margin.
const CHART_CLEARANCE: f32 = CHART_FRAME.y + CHART_FRAME.height + 20.0;

fn draw_row(ops: &mut Vec<Operation>, cells: &[String], y: f32) {
    for (i, value) in cells.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = MARGIN + COLUMN_WIDTH * i as f32;
        text(ops, "F1", 10.0, x, y, value);
    }
}

/// Lays the table and chart out into per-page operation lists.
pub fn layout_pages(table: &Table, chart_title: &str) -> Vec<Vec<Operation>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages = Vec::new();
    let mut ops = Vec::new();
    let mut y = top;

    text(&mut ops, "F2", 14.0, MARGIN, y, REPORT_HEADING);
    y -= 30.0;

    draw_row(&mut ops, &table.columns, y);
    y -= ROW_HEIGHT;

    for row in &table.rows {
        draw_row(&mut ops, row, y);
        y -= ROW_HEIGHT;
        if y < PAGE_BREAK_Y {
            pages.push(std::mem::take(&mut ops));
            y = top;
        }
    }

    if y < CHART_CLEARANCE {
        pages.push(std::mem::take(&mut ops));
    }

    match chart::chart_for(table) {
        Ok(found) => ops.extend(chart::render(&found, chart_title, CHART_FRAME)),
        Err(reason) => {
            warn!(%reason, "Chart skipped");
            text(
                &mut ops,
                "F1",
                10.0,
                MARGIN,
                100.0,
                &format!("Chart could not be generated: {reason}"),
            );
        }
    }
    pages.push(ops);
    pages
}

/// Renders `table` as a PDF document.
pub fn write_pdf(table: &Table, chart_title: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in layout_pages(table, chart_title) {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(PAGE_WIDTH), Object::Real(PAGE_HEIGHT)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}
