// Flowing text inside a background box: measure first, then draw.

use crate::canvas::{DrawOp, Stroke};
use crate::layout::{baseline, LayoutContext};
use crate::metrics::{sanitize, wrap_text, Font, WrappedLine};
use crate::style::{Palette, ReportStyle, Rgb};

pub const TEXT_PADDING: f32 = 10.0;
pub const BLOCK_SPACING: f32 = 12.0;
const HEADING_GAP: f32 = 4.0;
pub const BADGE_HEIGHT: f32 = 34.0;

/// Box styling for a block of flowing text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBlock<'a> {
    pub heading: Option<&'a str>,
    pub fill: Rgb,
    pub stroke: Option<Rgb>,
    pub text_color: Rgb,
    pub heading_color: Rgb,
}

impl<'a> TextBlock<'a> {
    /// Grey note box.
    pub fn note(palette: &Palette, heading: &'a str) -> Self {
        Self {
            heading: Some(heading),
            fill: palette.note_background,
            stroke: Some(palette.light_border),
            text_color: palette.text,
            heading_color: palette.label,
        }
    }

    /// Plain card, no heading.
    pub fn card(palette: &Palette) -> Self {
        Self {
            heading: None,
            fill: palette.card_background,
            stroke: Some(palette.light_border),
            text_color: palette.text,
            heading_color: palette.label,
        }
    }

    /// White text on a solid colour (issues, recommendations).
    pub fn alert(fill: Rgb, heading: &'a str) -> Self {
        Self {
            heading: Some(heading),
            fill,
            stroke: None,
            text_color: Rgb::WHITE,
            heading_color: Rgb::WHITE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredText {
    pub lines: Vec<WrappedLine>,
    /// Box height including padding and heading.
    pub height: f32,
}

/// Text column width for a block spanning the full content width.
pub fn full_width_column(style: &ReportStyle) -> f32 {
    style.geometry.content_width() - 2.0 * TEXT_PADDING
}

/// Wrap `text` and compute the box height. `None` for blank text.
pub fn measure_flowing_text(
    style: &ReportStyle,
    block: &TextBlock,
    text: &str,
    column_width: f32,
) -> Option<MeasuredText> {
    let text = sanitize(text);
    if text.trim().is_empty() {
        return None;
    }
    let t = &style.type_scale;
    let lines = wrap_text(text.trim(), Font::Regular, t.body, column_width);
    let heading = if block.heading.is_some() {
        t.line_height(t.body) + HEADING_GAP
    } else {
        0.0
    };
    let height = 2.0 * TEXT_PADDING + heading + lines.len() as f32 * t.line_height(t.body);
    Some(MeasuredText { lines, height })
}

/// Draw a justified text block. Returns the vertical space consumed, 0 when skipped.
pub fn draw_flowing_text(
    ctx: &mut LayoutContext,
    block: &TextBlock,
    text: Option<&str>,
    column_width: f32,
) -> f32 {
    let style = ctx.style();
    let Some(measured) = text.and_then(|text| measure_flowing_text(style, block, text, column_width)) else {
        return 0.0;
    };
    let t = &style.type_scale;
    let line_height = t.line_height(t.body);

    let top = ctx.ensure_space(measured.height);
    let left = ctx.cursor().left();
    let page = ctx.page();
    page.push(DrawOp::Rect {
        x: left,
        y: top,
        width: column_width + 2.0 * TEXT_PADDING,
        height: measured.height,
        fill: Some(block.fill),
        stroke: block.stroke.map(|c| Stroke::new(c, 1.0)),
    });

    let x = left + TEXT_PADDING;
    let mut y = top + TEXT_PADDING;
    if let Some(heading) = block.heading {
        page.text(x, baseline(y, t.body), heading, Font::Bold, t.body, block.heading_color);
        y += line_height + HEADING_GAP;
    }
    for line in &measured.lines {
        let word_spacing = if line.ends_paragraph || line.gaps == 0 {
            0.0
        } else {
            (column_width - line.width) / line.gaps as f32
        };
        page.justified_text(
            x,
            baseline(y, t.body),
            &line.text,
            Font::Regular,
            t.body,
            block.text_color,
            word_spacing,
        );
        y += line_height;
    }

    ctx.move_to(top + measured.height);
    ctx.advance(BLOCK_SPACING);
    measured.height + BLOCK_SPACING
}

/// Single-line coloured badge, e.g. `Estimated Repair Cost: Rs. 12,000`.
pub fn draw_badge(ctx: &mut LayoutContext, label: &str, value: &str, fill: Rgb) -> f32 {
    let style = ctx.style();
    let t = &style.type_scale;
    let top = ctx.ensure_space(BADGE_HEIGHT);
    let left = ctx.cursor().left();
    let width = ctx.cursor().width();
    let text_top = top + (BADGE_HEIGHT - t.value) / 2.0;

    let page = ctx.page();
    page.fill_rect(left, top, width, BADGE_HEIGHT, fill);
    page.text(left + TEXT_PADDING, baseline(text_top, t.value), label, Font::Regular, t.value, Rgb::WHITE);
    page.text_right(
        left + width - TEXT_PADDING,
        baseline(text_top, t.value),
        value,
        Font::Bold,
        t.value,
        Rgb::WHITE,
    );
    ctx.advance(BADGE_HEIGHT + BLOCK_SPACING);
    ctx.y()
}
