// Vertical position on the current page.

use crate::style::PageGeometry;

/// Slack for float comparisons against page bounds.
const EPSILON: f32 = 0.01;

/// Page index plus vertical offset, in points from the top edge.
///
/// Pure state: the cursor decides whether a block fits, `LayoutContext` owns the
/// side effects of starting a page.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderCursor {
    page_index: usize,
    y: f32,
    first_top: f32,
    top: f32,
    bottom: f32,
    left: f32,
    right: f32,
}

impl RenderCursor {
    pub fn new(geometry: &PageGeometry) -> Self {
        let first_top = geometry.content_top(true);
        Self {
            page_index: 0,
            y: first_top,
            first_top,
            top: geometry.content_top(false),
            bottom: geometry.content_bottom(),
            left: geometry.content_left(),
            right: geometry.content_right(),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Content top of the current page.
    pub fn top(&self) -> f32 {
        if self.page_index == 0 {
            self.first_top
        } else {
            self.top
        }
    }

    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    pub fn left(&self) -> f32 {
        self.left
    }

    pub fn right(&self) -> f32 {
        self.right
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn remaining(&self) -> f32 {
        self.bottom - self.y
    }

    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.bottom + EPSILON
    }

    /// Nothing has been placed on the current page yet.
    pub fn at_page_top(&self) -> bool {
        self.y <= self.top() + EPSILON
    }

    /// A page break is due for a block of `height`. A block that does not fit even a
    /// fresh page is placed at the top of the current one rather than spilling again.
    pub fn needs_break(&self, height: f32) -> bool {
        !self.fits(height) && !self.at_page_top()
    }

    pub(crate) fn break_page(&mut self) {
        self.page_index += 1;
        self.y = self.top;
    }

    pub fn advance(&mut self, height: f32) {
        self.y += height;
    }

    /// Move down to `y`. Never moves up.
    pub fn move_to(&mut self, y: f32) {
        if y > self.y {
            self.y = y;
        }
    }
}
