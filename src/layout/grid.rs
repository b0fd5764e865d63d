// Captioned photo grid. Rows never split across pages and every cell is drawn,
// with a placeholder where the photo is missing or unreadable.

use log::warn;

use crate::canvas::{DrawOp, Stroke};
use crate::layout::{baseline, LayoutContext};
use crate::metrics::{truncate_to_width, Font};
use crate::photo::{decode_photo, fit_within};

pub const CELL_IMAGE_HEIGHT: f32 = 110.0;
pub const CAPTION_HEIGHT: f32 = 16.0;
pub const GRID_GAP: f32 = 15.0;
const CELL_PADDING: f32 = 4.0;
pub const NO_IMAGE: &str = "No Image";

/// One grid cell: caption plus photo bytes if any arrived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridItem<'a> {
    pub caption: &'a str,
    pub bytes: Option<&'a [u8]>,
}

impl<'a> GridItem<'a> {
    pub fn new(caption: &'a str, bytes: Option<&'a [u8]>) -> Self {
        Self { caption, bytes }
    }
}

/// Height reserved for one grid row, including the gap below it.
pub fn row_height() -> f32 {
    CELL_IMAGE_HEIGHT + CAPTION_HEIGHT + GRID_GAP
}

pub fn row_count(items: usize, columns: usize) -> usize {
    items.div_ceil(columns.max(1))
}

pub fn draw_image_grid(ctx: &mut LayoutContext, items: &[GridItem], columns: usize) -> f32 {
    if items.is_empty() {
        return ctx.y();
    }
    let columns = columns.max(1);
    let left = ctx.cursor().left();
    let cell_width = (ctx.cursor().width() - GRID_GAP * (columns - 1) as f32) / columns as f32;

    for row in items.chunks(columns) {
        let top = ctx.ensure_space(row_height());
        for (i, item) in row.iter().enumerate() {
            let x = left + i as f32 * (cell_width + GRID_GAP);
            draw_cell(ctx, item, x, top, cell_width);
        }
        ctx.advance(row_height());
    }
    ctx.y()
}

fn draw_cell(ctx: &mut LayoutContext, item: &GridItem, x: f32, top: f32, width: f32) {
    let style = ctx.style();
    let p = &style.palette;
    let t = &style.type_scale;

    let raster = match item.bytes {
        Some(bytes) => match decode_photo(bytes) {
            Ok(raster) => Some(raster),
            Err(e) => {
                warn!("photo '{}' unusable, drawing placeholder: {}", item.caption, e);
                None
            }
        },
        None => None,
    };

    match raster {
        Some(raster) => {
            let (w, h) = fit_within(
                raster.aspect_ratio(),
                width - 2.0 * CELL_PADDING,
                CELL_IMAGE_HEIGHT - 2.0 * CELL_PADDING,
            );
            let id = ctx.add_image(raster);
            let page = ctx.page();
            page.fill_rect(x, top, width, CELL_IMAGE_HEIGHT, p.card_background);
            page.push(DrawOp::Image {
                id,
                x: x + (width - w) / 2.0,
                y: top + (CELL_IMAGE_HEIGHT - h) / 2.0,
                width: w,
                height: h,
            });
            page.stroke_rect(x, top, width, CELL_IMAGE_HEIGHT, Stroke::new(p.light_border, 1.0));
        }
        None => {
            let page = ctx.page();
            page.push(DrawOp::Rect {
                x,
                y: top,
                width,
                height: CELL_IMAGE_HEIGHT,
                fill: Some(p.note_background),
                stroke: Some(Stroke::new(p.border, 1.0)),
            });
            page.text_centered(
                x + width / 2.0,
                top + CELL_IMAGE_HEIGHT / 2.0 + t.body * 0.35,
                NO_IMAGE,
                Font::Bold,
                t.body,
                p.muted,
            );
        }
    }

    let caption = truncate_to_width(item.caption, Font::Regular, t.small, width);
    ctx.page().text_centered(
        x + width / 2.0,
        baseline(top + CELL_IMAGE_HEIGHT + 3.0, t.small),
        &caption,
        Font::Regular,
        t.small,
        p.label,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support;
    use crate::style::ReportStyle;
    use ::image::{DynamicImage, ImageFormat, Rgb as Pixel, RgbImage};
    use std::io::Cursor;

    fn jpeg() -> Vec<u8> {
        let img = RgbImage::from_pixel(32, 24, Pixel([120, 30, 30]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    fn cell_tops(ops: &[DrawOp]) -> Vec<f32> {
        let mut tops: Vec<f32> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { y, height, .. } if *height == CELL_IMAGE_HEIGHT => Some(*y),
                _ => None,
            })
            .collect();
        tops.dedup();
        tops
    }

    #[test]
    fn absent_and_broken_photos_become_placeholders() {
        let style = ReportStyle::default();
        let frame = test_support::frame();
        let mut ctx = LayoutContext::new(&style, &frame, None);
        let good = jpeg();
        let items = [
            GridItem::new("Front Bumper", Some(good.as_slice())),
            GridItem::new("Bonnet", None),
            GridItem::new("Grille", Some(b"definitely not a jpeg".as_slice())),
        ];
        draw_image_grid(&mut ctx, &items, 3);
        let page = ctx.page();
        let placeholders = page.texts().filter(|t| *t == NO_IMAGE).count();
        assert_eq!(placeholders, 2);
        let images = page.ops.iter().filter(|op| matches!(op, DrawOp::Image { .. })).count();
        assert_eq!(images, 1);
        for caption in ["Front Bumper", "Bonnet", "Grille"] {
            assert!(page.contains_text(caption));
        }
    }

    #[test]
    fn rows_are_never_split_across_pages() {
        let style = ReportStyle::default();
        let frame = test_support::frame();
        let mut ctx = LayoutContext::new(&style, &frame, None);
        let captions: Vec<String> = (1..=18).map(|i| format!("Photo {}", i)).collect();
        let items: Vec<GridItem> = captions.iter().map(|c| GridItem::new(c, None)).collect();
        draw_image_grid(&mut ctx, &items, 3);

        let surface = ctx.finish();
        let bottom = style.geometry.content_bottom();
        let mut rows = 0;
        for page in &surface.pages {
            let tops = cell_tops(&page.ops);
            for top in &tops {
                assert!(top + CELL_IMAGE_HEIGHT + CAPTION_HEIGHT <= bottom + 0.01);
            }
            rows += tops.len();
        }
        assert_eq!(rows, row_count(18, 3));
        assert_eq!(rows, 6);
        assert!(surface.pages.len() >= 2);
    }

    #[test]
    fn single_column_grid_stacks_cells() {
        assert_eq!(row_count(5, 1), 5);
        assert_eq!(row_count(5, 0), 5);
        assert_eq!(row_count(7, 3), 3);
    }
}
