// Device-independent drawing surface.
//
// Layout code never talks to the PDF library directly. It records draw operations per
// page in top-left-origin points; the `pdf` module replays them later. Keeping the
// recorded form around also lets tests inspect exactly what landed on which page.

use crate::metrics::{sanitize, text_width, Font};
use crate::style::Rgb;

/// Decoded RGB pixels ready for embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Packed RGB8, `width * height * 3` bytes.
    pub pixels: Vec<u8>,
    /// Smooth when scaled. Off for QR codes so modules stay crisp.
    pub interpolate: bool,
}

impl RasterImage {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Index into `Surface::images`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageId(pub usize);

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// A single line of text; `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
        color: Rgb,
        /// Extra space added to every inter-word gap (justified lines).
        word_spacing: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        stroke: Stroke,
    },
    /// Closed shape (stars, check marks).
    Polygon {
        points: Vec<(f32, f32)>,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    /// Polyline that is stroked but not closed.
    Path {
        points: Vec<(f32, f32)>,
        stroke: Stroke,
    },
    Image {
        id: ImageId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

impl Stroke {
    pub fn new(color: Rgb, width: f32) -> Self {
        Self { color, width }
    }
}

/// Everything drawn on one page, in painting order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageBuffer {
    pub ops: Vec<DrawOp>,
}

impl PageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    /// Record a line of text. Characters the built-in fonts cannot encode are replaced.
    pub fn text(&mut self, x: f32, y: f32, text: &str, font: Font, size: f32, color: Rgb) {
        self.justified_text(x, y, text, font, size, color, 0.0);
    }

    pub fn justified_text(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        font: Font,
        size: f32,
        color: Rgb,
        word_spacing: f32,
    ) {
        let text = sanitize(text);
        if text.trim().is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            x,
            y,
            text,
            font,
            size,
            color,
            word_spacing,
        });
    }

    /// Text horizontally centred on `center_x`.
    pub fn text_centered(&mut self, center_x: f32, y: f32, text: &str, font: Font, size: f32, color: Rgb) {
        let width = text_width(&sanitize(text), font, size);
        self.text(center_x - width / 2.0, y, text, font, size, color);
    }

    /// Text ending at `right_x`.
    pub fn text_right(&mut self, right_x: f32, y: f32, text: &str, font: Font, size: f32, color: Rgb) {
        let width = text_width(&sanitize(text), font, size);
        self.text(right_x - width, y, text, font, size, color);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: Some(color),
            stroke: None,
        });
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, stroke: Stroke) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: Some(stroke),
        });
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, stroke: Stroke) {
        self.ops.push(DrawOp::Line {
            from: (x1, y1),
            to: (x2, y2),
            stroke,
        });
    }

    /// Position to insert an op behind everything drawn after this point.
    pub fn mark(&self) -> usize {
        self.ops.len()
    }

    /// Insert `op` at a position taken earlier with [`mark`](Self::mark), so it paints
    /// underneath ops recorded since.
    pub fn insert_at(&mut self, mark: usize, op: DrawOp) {
        let mark = mark.min(self.ops.len());
        self.ops.insert(mark, op);
    }

    /// All text on the page in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// Pages plus the image table they reference.
#[derive(Clone, Debug, Default)]
pub struct Surface {
    pub pages: Vec<PageBuffer>,
    pub images: Vec<RasterImage>,
}

impl Surface {
    pub fn add_image(&mut self, image: RasterImage) -> ImageId {
        self.images.push(image);
        ImageId(self.images.len() - 1)
    }
}
