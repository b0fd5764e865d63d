// Report layout engine.
//
// Phase one: renderers draw into per-page buffers through a `LayoutContext`, which owns
// the cursor and starts pages (with their header band) on demand. Phase two: once the
// page count is known, `PageFrame::stamp_footers` adds the footer band to every page.

pub mod checklist;
pub mod cursor;
pub mod frame;
pub mod grid;
pub mod section;
pub mod text;

use log::debug;

use crate::canvas::{ImageId, PageBuffer, RasterImage, Surface};
use crate::style::ReportStyle;

pub use cursor::RenderCursor;
pub use frame::{FinishedPage, FooterStamp, PageFrame};

/// Baseline for a line of text whose top edge is at `top`.
pub(crate) fn baseline(top: f32, size: f32) -> f32 {
    top + size * 0.8
}

/// Mutable state of one generation: the cursor, the page being drawn, and every
/// page finished so far.
pub struct LayoutContext<'a> {
    style: &'a ReportStyle,
    frame: &'a PageFrame,
    cursor: RenderCursor,
    current: PageBuffer,
    surface: Surface,
    qr: Option<ImageId>,
}

impl<'a> LayoutContext<'a> {
    /// Open page one and draw its header band.
    pub fn new(style: &'a ReportStyle, frame: &'a PageFrame, qr: Option<RasterImage>) -> Self {
        let mut surface = Surface::default();
        let qr = qr.map(|image| surface.add_image(image));
        let mut ctx = Self {
            style,
            frame,
            cursor: RenderCursor::new(&style.geometry),
            current: PageBuffer::new(),
            surface,
            qr,
        };
        ctx.current = ctx.open_page(true);
        ctx
    }

    fn open_page(&self, first_page: bool) -> PageBuffer {
        let mut page = PageBuffer::new();
        let geometry = &self.style.geometry;
        if let Some(background) = self.style.palette.page_background {
            page.fill_rect(0.0, 0.0, geometry.width, geometry.height, background);
        }
        if first_page {
            self.frame.draw_first_header(&mut page, self.style, self.qr);
        } else {
            self.frame.draw_header(&mut page, self.style);
        }
        page
    }

    /// Make room for a block of `height`, starting a new page when it does not fit.
    /// Returns the y at which the block should be drawn.
    pub fn ensure_space(&mut self, height: f32) -> f32 {
        if self.cursor.needs_break(height) {
            let next = self.open_page(false);
            let done = std::mem::replace(&mut self.current, next);
            self.surface.pages.push(done);
            self.cursor.break_page();
            debug!(
                "page break before {:.1}pt block, now on page {}",
                height,
                self.cursor.page_index() + 1
            );
        }
        self.cursor.y()
    }

    pub fn style(&self) -> &'a ReportStyle {
        self.style
    }

    pub fn cursor(&self) -> &RenderCursor {
        &self.cursor
    }

    pub fn y(&self) -> f32 {
        self.cursor.y()
    }

    pub fn advance(&mut self, height: f32) {
        self.cursor.advance(height);
    }

    pub fn move_to(&mut self, y: f32) {
        self.cursor.move_to(y);
    }

    /// The page currently being drawn.
    pub fn page(&mut self) -> &mut PageBuffer {
        &mut self.current
    }

    pub fn add_image(&mut self, image: RasterImage) -> ImageId {
        self.surface.add_image(image)
    }

    pub fn page_count(&self) -> usize {
        self.surface.pages.len() + 1
    }

    /// End phase one. Consumes the context so nothing can be drawn afterwards.
    pub fn finish(mut self) -> Surface {
        self.surface.pages.push(self.current);
        self.surface
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_space_starts_a_page_with_a_header() {
        let style = ReportStyle::default();
        let frame = test_support::frame();
        let mut ctx = LayoutContext::new(&style, &frame, None);
        let first_top = ctx.y();

        assert_eq!(ctx.ensure_space(100.0), first_top);
        ctx.advance(600.0);
        let y = ctx.ensure_space(100.0);
        assert_eq!(y, style.geometry.content_top(false));
        assert_eq!(ctx.page_count(), 2);
        assert!(ctx.page().contains_text("MH04KD2255"));

        let surface = ctx.finish();
        assert_eq!(surface.pages.len(), 2);
        assert!(surface.pages[0].contains_text("Vehicle Inspection Report"));
    }

    #[test]
    fn oversized_block_on_fresh_page_does_not_loop() {
        let style = ReportStyle::default();
        let frame = test_support::frame();
        let mut ctx = LayoutContext::new(&style, &frame, None);
        ctx.advance(50.0);
        ctx.ensure_space(5000.0);
        ctx.ensure_space(5000.0);
        assert_eq!(ctx.page_count(), 2);
    }

    #[test]
    fn page_background_is_painted_first() {
        let style = ReportStyle::preset("vibrant").unwrap();
        let frame = test_support::frame();
        let mut ctx = LayoutContext::new(&style, &frame, None);
        let first = ctx.page().ops[0].clone();
        match first {
            crate::canvas::DrawOp::Rect { width, fill, .. } => {
                assert_eq!(width, style.geometry.width);
                assert_eq!(fill, style.palette.page_background);
            }
            other => panic!("expected background rect, got {:?}", other),
        }
    }
}
