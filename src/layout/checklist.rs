// Check-mark lists and star ratings.

use std::f32::consts::PI;

use crate::canvas::{DrawOp, PageBuffer, Stroke};
use crate::layout::section::BOX_PADDING;
use crate::layout::{baseline, LayoutContext};
use crate::metrics::{sanitize, wrap_text, Font, WrappedLine};
use crate::style::{Rgb, TypeScale};

pub const CHECK_ROW_HEIGHT: f32 = 18.0;
pub const COLUMNS_PER_BAND: usize = 2;
const CHECK_BOX_SIZE: f32 = 10.0;
const CHECK_LABEL_GAP: f32 = 6.0;
const CHECKLIST_SPACING: f32 = 8.0;

pub const RATING_ROW_HEIGHT: f32 = 22.0;
const STAR_RADIUS: f32 = 6.5;
const STAR_INNER_RATIO: f32 = 0.4;
const STAR_SPACING: f32 = 17.0;
const STARS_OFFSET: f32 = 150.0;
pub const MAX_STARS: usize = 5;

/// Check mark glyph: filled square with a white tick.
fn draw_check_mark(page: &mut PageBuffer, x: f32, y: f32, color: Rgb) {
    let s = CHECK_BOX_SIZE;
    page.fill_rect(x, y, s, s, color);
    page.push(DrawOp::Path {
        points: vec![
            (x + 0.22 * s, y + 0.52 * s),
            (x + 0.42 * s, y + 0.74 * s),
            (x + 0.80 * s, y + 0.28 * s),
        ],
        stroke: Stroke::new(Rgb::WHITE, 1.4),
    });
}

/// Wrapped labels of one band and the height of each of its rows.
struct BandLayout {
    labels: Vec<Vec<WrappedLine>>,
    row_heights: Vec<f32>,
}

impl BandLayout {
    fn height(&self) -> f32 {
        self.row_heights.iter().sum()
    }
}

fn check_label_width(ctx: &LayoutContext) -> f32 {
    let column_width = (ctx.cursor().width() - 2.0 * BOX_PADDING) / COLUMNS_PER_BAND as f32;
    column_width - CHECK_BOX_SIZE - CHECK_LABEL_GAP - BOX_PADDING
}

/// A row is as tall as the longest wrapped label in it across both columns.
fn layout_band(band: &[String], rows: usize, t: &TypeScale, label_width: f32) -> BandLayout {
    let labels: Vec<Vec<WrappedLine>> = band
        .iter()
        .map(|item| wrap_text(&sanitize(item), Font::Regular, t.body, label_width))
        .collect();
    let mut row_heights = vec![CHECK_ROW_HEIGHT; band.len().min(rows)];
    for (i, lines) in labels.iter().enumerate() {
        let extra = lines.len().saturating_sub(1) as f32 * t.line_height(t.body);
        let row = &mut row_heights[i % rows];
        *row = row.max(CHECK_ROW_HEIGHT + extra);
    }
    BandLayout { labels, row_heights }
}

/// Height of the first band `draw_checklist` would place at the current width.
pub fn first_band_height(ctx: &LayoutContext, items: &[String], rows_per_column: usize) -> f32 {
    let rows = rows_per_column.max(1);
    let band = &items[..items.len().min(rows * COLUMNS_PER_BAND)];
    if band.is_empty() {
        return 0.0;
    }
    layout_band(band, rows, &ctx.style().type_scale, check_label_width(ctx)).height()
}

/// Draw `items` column-major, `rows_per_column` to a column, two columns per band.
/// Long labels wrap inside their column. Each band is kept on one page.
pub fn draw_checklist(ctx: &mut LayoutContext, items: &[String], rows_per_column: usize) -> f32 {
    if items.is_empty() {
        return ctx.y();
    }
    let style = ctx.style();
    let p = &style.palette;
    let t = &style.type_scale;
    let rows = rows_per_column.max(1);
    let left = ctx.cursor().left() + BOX_PADDING;
    let column_width = (ctx.cursor().width() - 2.0 * BOX_PADDING) / COLUMNS_PER_BAND as f32;
    let label_width = check_label_width(ctx);
    let line_height = t.line_height(t.body);

    for band in items.chunks(rows * COLUMNS_PER_BAND) {
        let layout = layout_band(band, rows, t, label_width);
        let top = ctx.ensure_space(layout.height());
        let page = ctx.page();
        for (i, lines) in layout.labels.iter().enumerate() {
            let column = i / rows;
            let row = i % rows;
            let x = left + column as f32 * column_width;
            let y = top + layout.row_heights[..row].iter().sum::<f32>();
            draw_check_mark(page, x, y + (CHECK_ROW_HEIGHT - CHECK_BOX_SIZE) / 2.0, p.success);
            let first_top = y + (CHECK_ROW_HEIGHT - t.body) / 2.0;
            for (n, line) in lines.iter().enumerate() {
                page.text(
                    x + CHECK_BOX_SIZE + CHECK_LABEL_GAP,
                    baseline(first_top + n as f32 * line_height, t.body),
                    &line.text,
                    Font::Regular,
                    t.body,
                    p.text,
                );
            }
        }
        ctx.advance(layout.height());
    }
    ctx.advance(CHECKLIST_SPACING);
    ctx.y()
}

/// Filled star count: whole points, plus one for a fractional part of one half or more.
pub fn filled_stars(score: f64) -> usize {
    if !score.is_finite() {
        return 0;
    }
    let score = score.clamp(0.0, MAX_STARS as f64);
    let whole = score.floor();
    let mut filled = whole as usize;
    if score - whole >= 0.5 {
        filled += 1;
    }
    filled.min(MAX_STARS)
}

/// `(4.5/5)`, `(4/5)` or `(N/A)`.
pub fn score_label(score: Option<f64>) -> String {
    match score.filter(|s| s.is_finite()) {
        Some(s) => {
            let s = s.clamp(0.0, MAX_STARS as f64);
            if s.fract() == 0.0 {
                format!("({:.0}/5)", s)
            } else {
                format!("({:.1}/5)", s)
            }
        }
        None => "(N/A)".to_string(),
    }
}

/// Five-pointed star outline, point up, as ten alternating outer/inner vertices.
pub fn star_points(cx: f32, cy: f32, outer: f32) -> Vec<(f32, f32)> {
    let inner = outer * STAR_INNER_RATIO;
    (0..10)
        .map(|i| {
            let angle = (i as f32 * 36.0 - 90.0) * PI / 180.0;
            let r = if i % 2 == 0 { outer } else { inner };
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect()
}

/// One rating row: category label, five stars, score label. `None` draws empty stars.
pub fn draw_rating(ctx: &mut LayoutContext, category: &str, score: Option<f64>) -> f32 {
    let style = ctx.style();
    let p = &style.palette;
    let t = &style.type_scale;
    let top = ctx.ensure_space(RATING_ROW_HEIGHT);
    let x = ctx.cursor().left() + BOX_PADDING;
    let filled = score.map(filled_stars).unwrap_or(0);
    let text_top = top + (RATING_ROW_HEIGHT - t.label) / 2.0;

    let page = ctx.page();
    page.text(x, baseline(text_top, t.label), category, Font::Bold, t.label, p.label);

    let cy = top + RATING_ROW_HEIGHT / 2.0;
    for i in 0..MAX_STARS {
        let cx = x + STARS_OFFSET + STAR_RADIUS + i as f32 * STAR_SPACING;
        let (fill, outline) = if i < filled {
            (p.star, p.star_outline)
        } else {
            (p.star_empty, p.star_empty_outline)
        };
        page.push(DrawOp::Polygon {
            points: star_points(cx, cy, STAR_RADIUS),
            fill: Some(fill),
            stroke: Some(Stroke::new(outline, 0.6)),
        });
    }

    let label_x = x + STARS_OFFSET + MAX_STARS as f32 * STAR_SPACING + 6.0;
    page.text(label_x, baseline(text_top, t.label), &score_label(score), Font::Regular, t.label, p.muted);

    ctx.advance(RATING_ROW_HEIGHT);
    ctx.y()
}
