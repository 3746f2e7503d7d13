//! Chart data for the PDF report and its vector rendering.
//!
//! A table with a `Status` column becomes a pie of status counts; otherwise an
//! `Attendance %` column becomes one bar per `Name`. Anything else is reported
//! as a reason string so the PDF can print a placeholder instead.

use super::Table;
use lopdf::{Object, StringFormat};
use lopdf::content::Operation;
use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};

pub const STATUS_COLUMN: &str = "Status";
pub const PERCENT_COLUMN: &str = "Attendance %";
pub const NAME_COLUMN: &str = "Name";

/// Slice colours, cycled.
const PALETTE: [(f32, f32, f32); 5] = [
    (0.25, 0.47, 0.85),
    (0.93, 0.49, 0.19),
    (0.36, 0.69, 0.35),
    (0.85, 0.25, 0.30),
    (0.58, 0.40, 0.74),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    /// (label, count), largest first
    Pie(Vec<(String, u32)>),
    /// (label, percentage)
    Bar(Vec<(String, f32)>),
}

/// Chooses and extracts the chart for a table.
pub fn chart_for(table: &Table) -> Result<Chart, String> {
    if let Some(statuses) = table.column(STATUS_COLUMN) {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for status in statuses {
            *counts.entry(status.to_string()).or_default() += 1;
        }
        if counts.is_empty() {
            return Err("no attendance data to plot".to_string());
        }
        let mut slices: Vec<(String, u32)> = counts.into_iter().collect();
        slices.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        return Ok(Chart::Pie(slices));
    }

    if let Some(percents) = table.column(PERCENT_COLUMN) {
        let names: Vec<&str> = table
            .column(NAME_COLUMN)
            .ok_or_else(|| format!("column '{NAME_COLUMN}' is missing"))?
            .collect();
        let mut bars = Vec::with_capacity(names.len());
        for (name, value) in names.into_iter().zip(percents) {
            let percent: f32 = value
                .parse()
                .map_err(|_| format!("'{value}' is not a percentage"))?;
            bars.push((name.to_string(), percent));
        }
        if bars.is_empty() {
            return Err("no attendance data to plot".to_string());
        }
        return Ok(Chart::Bar(bars));
    }

    Err(format!(
        "no '{STATUS_COLUMN}' or '{PERCENT_COLUMN}' column"
    ))
}

/// The area a chart is drawn into, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn fill_colour(ops: &mut Vec<Operation>, (r, g, b): (f32, f32, f32)) {
    ops.push(Operation::new("rg", vec![real(r), real(g), real(b)]));
}

/// WinAnsi code for the characters that sit in the 0x80-0x9F block.
const fn win_ansi_extra(c: char) -> Option<u8> {
    Some(match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    })
}

/// Encodes `value` for the standard fonts, which use `WinAnsiEncoding`.
///
/// Characters outside the code page become `?`.
pub(crate) fn win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match u32::from(c) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => win_ansi_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

pub(crate) fn text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), real(size)]));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(value), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn truncate(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(max.saturating_sub(1)).collect();
        short.push('.');
        short
    }
}

/// Appends a cubic Bezier approximation of the arc from `start` to `end` radians.
fn arc(ops: &mut Vec<Operation>, cx: f32, cy: f32, radius: f32, start: f32, end: f32) {
    let segments = ((end - start) / FRAC_PI_2).ceil().max(1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = segments as u32;
    let step = (end - start) / segments;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut angle = start;
    for _ in 0..count {
        let next = angle + step;
        let (s0, c0) = angle.sin_cos();
        let (s1, c1) = next.sin_cos();
        ops.push(Operation::new(
            "c",
            vec![
                real(cx + radius * (c0 - k * s0)),
                real(cy + radius * (s0 + k * c0)),
                real(cx + radius * (c1 + k * s1)),
                real(cy + radius * (s1 - k * c1)),
                real(cx + radius * c1),
                real(cy + radius * s1),
            ],
        ));
        angle = next;
    }
}

fn draw_pie(ops: &mut Vec<Operation>, slices: &[(String, u32)], frame: Frame) {
    let total: u32 = slices.iter().map(|(_, n)| n).sum();
    let radius = (frame.height / 2.0).min(frame.width / 4.0) - 5.0;
    let cx = frame.x + radius + 5.0;
    let cy = frame.y + frame.height / 2.0;

    // Clockwise from twelve o'clock.
    let mut angle = FRAC_PI_2;
    for (index, (label, count)) in slices.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let share = *count as f32 / total as f32;
        let colour = PALETTE[index % PALETTE.len()];

        fill_colour(ops, colour);
        if slices.len() == 1 {
            ops.push(Operation::new("m", vec![real(cx + radius), real(cy)]));
            arc(ops, cx, cy, radius, 0.0, 2.0 * PI);
        } else {
            let end = angle - share * 2.0 * PI;
            ops.push(Operation::new("m", vec![real(cx), real(cy)]));
            ops.push(Operation::new(
                "l",
                vec![real(cx + radius * end.cos()), real(cy + radius * end.sin())],
            ));
            arc(ops, cx, cy, radius, end, angle);
            angle = end;
        }
        ops.push(Operation::new("h", vec![]));
        ops.push(Operation::new("f", vec![]));

        // Legend
        let legend_x = frame.x + 2.0 * radius + 30.0;
        #[allow(clippy::cast_precision_loss)]
        let legend_y = frame.y + frame.height - 20.0 - 16.0 * index as f32;
        ops.push(Operation::new(
            "re",
            vec![real(legend_x), real(legend_y), real(10.0), real(10.0)],
        ));
        ops.push(Operation::new("f", vec![]));
        fill_colour(ops, (0.0, 0.0, 0.0));
        let caption = format!("{label}: {count} ({:.1}%)", share * 100.0);
        text(ops, "F1", 9.0, legend_x + 16.0, legend_y + 1.0, &caption);
    }
}

fn draw_bars(ops: &mut Vec<Operation>, bars: &[(String, f32)], frame: Frame) {
    let label_band = 24.0;
    let plot_x = frame.x + 30.0;
    let plot_y = frame.y + label_band;
    let plot_width = frame.width - 30.0;
    let plot_height = frame.height - label_band;

    // Axes and the 0/50/100 ticks.
    ops.push(Operation::new("G", vec![real(0.0)]));
    ops.push(Operation::new("w", vec![real(0.5)]));
    ops.push(Operation::new("m", vec![real(plot_x), real(plot_y + plot_height)]));
    ops.push(Operation::new("l", vec![real(plot_x), real(plot_y)]));
    ops.push(Operation::new("l", vec![real(plot_x + plot_width), real(plot_y)]));
    ops.push(Operation::new("S", vec![]));
    for tick in [0.0_f32, 50.0, 100.0] {
        let y = plot_y + plot_height * tick / 100.0;
        text(ops, "F1", 7.0, frame.x, y - 2.0, &format!("{tick:.0}"));
    }

    #[allow(clippy::cast_precision_loss)]
    let slot = plot_width / bars.len() as f32;
    let bar_width = (slot * 0.7).min(40.0);
    for (index, (label, percent)) in bars.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = plot_x + slot * index as f32 + (slot - bar_width) / 2.0;
        let height = plot_height * percent.clamp(0.0, 100.0) / 100.0;

        fill_colour(ops, PALETTE[0]);
        ops.push(Operation::new(
            "re",
            vec![real(x), real(plot_y), real(bar_width), real(height)],
        ));
        ops.push(Operation::new("f", vec![]));
        fill_colour(ops, (0.0, 0.0, 0.0));
        text(ops, "F1", 7.0, x, frame.y + 12.0, &truncate(label, 10));
    }
}

/// Drawing operations for `chart`, headed by `title`, inside `frame`.
pub fn render(chart: &Chart, title: &str, frame: Frame) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![])];
    fill_colour(&mut ops, (0.0, 0.0, 0.0));
    text(&mut ops, "F2", 11.0, frame.x, frame.y + frame.height + 8.0, title);
    match chart {
        Chart::Pie(slices) => draw_pie(&mut ops, slices, frame),
        Chart::Bar(bars) => {
            text(&mut ops, "F1", 8.0, frame.x, frame.y + frame.height - 4.0, "Percentage");
            let plot = Frame {
                height: frame.height - 12.0,
                ..frame
            };
            draw_bars(&mut ops, bars, plot);
        }
    }
    ops.push(Operation::new("Q", vec![]));
    ops
}
