// Titled sections of label/value rows.

use crate::canvas::{DrawOp, Stroke};
use crate::layout::{baseline, LayoutContext};
use crate::metrics::{sanitize, wrap_text, Font, WrappedLine};
use crate::record::PLACEHOLDER;
use crate::style::ReportStyle;

pub const TITLE_BAR_HEIGHT: f32 = 28.0;
pub const TITLE_BAR_GAP: f32 = 6.0;
pub const BOX_PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 16.0;
const ROW_GAP: f32 = 7.0;
const COLUMN_GAP: f32 = 20.0;
const LABEL_GAP: f32 = 6.0;
const SINGLE_LABEL_WIDTH: f32 = 140.0;

/// One labeled value. `None` is drawn as `N/A`.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub label: String,
    pub value: Option<String>,
}

impl Row {
    pub fn new(label: impl Into<String>, value: Option<String>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }

    fn value_text(&self) -> String {
        match &self.value {
            Some(v) if !v.trim().is_empty() => sanitize(v.trim()),
            _ => PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum SectionBody<'r> {
    Single(&'r [Row]),
    /// Two independent columns with their own y cursors.
    Split(&'r [Row], &'r [Row]),
}

struct Column<'r> {
    rows: &'r [Row],
    x: f32,
    label_width: f32,
    value_width: f32,
}

struct RowLayout {
    label: Vec<WrappedLine>,
    value: Vec<WrappedLine>,
    height: f32,
}

fn columns<'r>(body: SectionBody<'r>, left: f32, width: f32) -> Vec<Column<'r>> {
    let inner_left = left + BOX_PADDING;
    let inner_width = width - 2.0 * BOX_PADDING;
    match body {
        SectionBody::Single(rows) => {
            let label_width = SINGLE_LABEL_WIDTH.min(inner_width * 0.45);
            vec![Column {
                rows,
                x: inner_left,
                label_width,
                value_width: inner_width - label_width - LABEL_GAP,
            }]
        }
        SectionBody::Split(left_rows, right_rows) => {
            let column_width = (inner_width - COLUMN_GAP) / 2.0;
            let label_width = column_width * 0.42;
            let value_width = column_width - label_width - LABEL_GAP;
            vec![
                Column {
                    rows: left_rows,
                    x: inner_left,
                    label_width,
                    value_width,
                },
                Column {
                    rows: right_rows,
                    x: inner_left + column_width + COLUMN_GAP,
                    label_width,
                    value_width,
                },
            ]
        }
    }
}

fn layout_row(style: &ReportStyle, row: &Row, label_width: f32, value_width: f32) -> RowLayout {
    let t = &style.type_scale;
    let label = wrap_text(&sanitize(&row.label), Font::Regular, t.label, label_width);
    let value = wrap_text(&row.value_text(), Font::Bold, t.value, value_width);
    let height = (label.len() as f32 * t.line_height(t.label))
        .max(value.len() as f32 * t.line_height(t.value))
        + ROW_GAP;
    RowLayout {
        label,
        value,
        height,
    }
}

fn column_height(style: &ReportStyle, column: &Column) -> f32 {
    column
        .rows
        .iter()
        .map(|row| layout_row(style, row, column.label_width, column.value_width).height)
        .sum()
}

/// Height of the bordered row box alone.
pub fn measure_rows_box(style: &ReportStyle, body: SectionBody) -> f32 {
    let g = &style.geometry;
    let tallest = columns(body, g.content_left(), g.content_width())
        .iter()
        .map(|c| column_height(style, c))
        .fold(0.0_f32, f32::max);
    if tallest > 0.0 {
        tallest - ROW_GAP + 2.0 * BOX_PADDING
    } else {
        2.0 * BOX_PADDING
    }
}

/// Height of a titled section: title bar, gap, row box.
pub fn measure_section(style: &ReportStyle, body: SectionBody) -> f32 {
    TITLE_BAR_HEIGHT + TITLE_BAR_GAP + measure_rows_box(style, body)
}

/// Title bar at the cursor. The caller has already made room for it.
pub fn draw_title_bar(ctx: &mut LayoutContext, title: &str) -> f32 {
    let style = ctx.style();
    let p = &style.palette;
    let size = style.type_scale.section;
    let left = ctx.cursor().left();
    let width = ctx.cursor().width();
    let top = ctx.y();

    let page = ctx.page();
    page.push(DrawOp::Rect {
        x: left,
        y: top,
        width,
        height: TITLE_BAR_HEIGHT,
        fill: Some(p.card_background),
        stroke: Some(Stroke::new(p.border, 1.0)),
    });
    page.fill_rect(left, top, 4.0, TITLE_BAR_HEIGHT, p.accent);
    page.text(
        left + 14.0,
        top + TITLE_BAR_HEIGHT / 2.0 + size * 0.35,
        title,
        Font::Bold,
        size,
        p.primary,
    );
    ctx.advance(TITLE_BAR_HEIGHT + TITLE_BAR_GAP);
    ctx.y()
}

/// A box whose height is only known once its content has been drawn.
/// The box is inserted underneath that content when closed.
pub struct OpenBox {
    mark: usize,
    page_index: usize,
    top: f32,
}

impl OpenBox {
    pub fn open(ctx: &mut LayoutContext) -> Self {
        Self {
            page_index: ctx.cursor().page_index(),
            top: ctx.y(),
            mark: ctx.page().mark(),
        }
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    /// Close at `bottom` and move the cursor there.
    pub fn close(self, ctx: &mut LayoutContext, bottom: f32) {
        let p = &ctx.style().palette;
        let op = DrawOp::Rect {
            x: ctx.cursor().left(),
            y: self.top,
            width: ctx.cursor().width(),
            height: bottom - self.top,
            fill: Some(p.card_background),
            stroke: Some(Stroke::new(p.light_border, 1.0)),
        };
        // Content that spilled onto another page cannot be boxed.
        if ctx.cursor().page_index() == self.page_index {
            ctx.page().insert_at(self.mark, op);
        }
        ctx.move_to(bottom);
    }
}

/// Draw the bordered row box at the cursor; columns advance independently and the box
/// closes at the lower of the two. The caller has already made room for it.
pub fn draw_rows_box(ctx: &mut LayoutContext, body: SectionBody) -> f32 {
    let style = ctx.style();
    let t = &style.type_scale;
    let p = &style.palette;
    let left = ctx.cursor().left();
    let width = ctx.cursor().width();

    let frame = OpenBox::open(ctx);
    let top = frame.top() + BOX_PADDING;
    let mut column_bottoms = Vec::new();
    let mut any_rows = false;

    for column in columns(body, left, width) {
        let mut y = top;
        for row in column.rows {
            any_rows = true;
            let layout = layout_row(style, row, column.label_width, column.value_width);
            let page = ctx.page();
            for (i, line) in layout.label.iter().enumerate() {
                let line_top = y + i as f32 * t.line_height(t.label);
                page.text(column.x, baseline(line_top, t.label), &line.text, Font::Regular, t.label, p.label);
            }
            let value_x = column.x + column.label_width + LABEL_GAP;
            for (i, line) in layout.value.iter().enumerate() {
                let line_top = y + i as f32 * t.line_height(t.value);
                page.text(value_x, baseline(line_top, t.value), &line.text, Font::Bold, t.value, p.text);
            }
            y += layout.height;
        }
        column_bottoms.push(y);
    }

    let reconciled = column_bottoms.into_iter().fold(top, f32::max);
    let bottom = if any_rows {
        reconciled - ROW_GAP + BOX_PADDING
    } else {
        top + BOX_PADDING
    };
    frame.close(ctx, bottom);
    bottom
}

/// Title bar plus row box, kept together on one page.
pub fn draw_section(ctx: &mut LayoutContext, title: &str, body: SectionBody) -> f32 {
    let height = measure_section(ctx.style(), body);
    ctx.ensure_space(height);
    draw_title_bar(ctx, title);
    draw_rows_box(ctx, body);
    ctx.advance(SECTION_SPACING);
    ctx.y()
}

/// Row box without a title, used inside larger sections.
pub fn draw_rows(ctx: &mut LayoutContext, body: SectionBody) -> f32 {
    let height = measure_rows_box(ctx.style(), body);
    ctx.ensure_space(height);
    draw_rows_box(ctx, body);
    ctx.advance(BOX_PADDING);
    ctx.y()
}
