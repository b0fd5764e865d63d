// PDF serialisation of a sealed document with printpdf.
//
// Layout works in points from the top-left corner; printpdf wants millimetres from
// the bottom-left. Every coordinate goes through `Mapper`.

use std::io::BufWriter;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use crate::assembler::RenderedDocument;
use crate::canvas::{DrawOp, RasterImage, Stroke};
use crate::error::ReportError;
use crate::metrics::{text_width, Font};
use crate::style::Rgb;

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Converts top-left points to bottom-left millimetres.
#[derive(Clone, Copy)]
struct Mapper {
    page_height: f32,
}

impl Mapper {
    fn x(&self, x: f32) -> Mm {
        Mm(x * MM_PER_PT)
    }

    fn y(&self, y: f32) -> Mm {
        Mm((self.page_height - y) * MM_PER_PT)
    }

    fn point(&self, (x, y): (f32, f32)) -> Point {
        Point::new(self.x(x), self.y(y))
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
        }
    }
}

fn color(rgb: Rgb) -> Color {
    let (r, g, b) = rgb.unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

/// Serialise `document` into PDF bytes.
pub fn write_pdf(document: &RenderedDocument) -> Result<Vec<u8>, ReportError> {
    let geometry = document.geometry();
    let width = Mm(geometry.width * MM_PER_PT);
    let height = Mm(geometry.height * MM_PER_PT);
    let mapper = Mapper {
        page_height: geometry.height,
    };

    let (doc, page1, layer1) = PdfDocument::new(document.title(), width, height, "Layer 1");

    // Load built-in fonts
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::PdfError(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::PdfError(e.to_string()))?,
    };

    for (index, page) in document.pages().iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page_index, layer_index) = doc.add_page(width, height, "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };
        for op in page.ops() {
            draw_op(&layer, &fonts, mapper, document.images(), op)?;
        }
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| ReportError::PdfError(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ReportError::PdfError(e.to_string()))
}

fn draw_op(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    mapper: Mapper,
    images: &[RasterImage],
    op: &DrawOp,
) -> Result<(), ReportError> {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            font,
            size,
            color: c,
            word_spacing,
        } => {
            layer.set_fill_color(color(*c));
            if *word_spacing > 0.0 {
                draw_spaced_words(layer, fonts, mapper, *x, *y, text, *font, *size, *word_spacing);
            } else {
                layer.use_text(text.as_str(), *size, mapper.x(*x), mapper.y(*y), fonts.get(*font));
            }
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let corners = vec![
                (*x, *y),
                (*x + *width, *y),
                (*x + *width, *y + *height),
                (*x, *y + *height),
            ];
            draw_shape(layer, mapper, corners, *fill, *stroke);
        }
        DrawOp::Polygon {
            points,
            fill,
            stroke,
        } => draw_shape(layer, mapper, points.clone(), *fill, *stroke),
        DrawOp::Line { from, to, stroke } => {
            draw_path(layer, mapper, &[*from, *to], *stroke);
        }
        DrawOp::Path { points, stroke } => draw_path(layer, mapper, points, *stroke),
        DrawOp::Image {
            id,
            x,
            y,
            width,
            height,
        } => {
            let raster = images.get(id.0).ok_or_else(|| {
                ReportError::PdfError(format!("page references missing image {}", id.0))
            })?;
            embed_image(layer, mapper, raster, *x, *y + *height, *width);
        }
    }
    Ok(())
}

/// Justified line: words placed one by one with the extra gap added between them.
#[allow(clippy::too_many_arguments)]
fn draw_spaced_words(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    mapper: Mapper,
    x: f32,
    y: f32,
    text: &str,
    font: Font,
    size: f32,
    word_spacing: f32,
) {
    let space = text_width(" ", font, size);
    let mut cursor = x;
    for word in text.split(' ').filter(|w| !w.is_empty()) {
        layer.use_text(word, size, mapper.x(cursor), mapper.y(y), fonts.get(font));
        cursor += text_width(word, font, size) + space + word_spacing;
    }
}

fn draw_shape(
    layer: &PdfLayerReference,
    mapper: Mapper,
    points: Vec<(f32, f32)>,
    fill: Option<Rgb>,
    stroke: Option<Stroke>,
) {
    let mode = match (fill, stroke) {
        (Some(_), Some(_)) => PaintMode::FillStroke,
        (Some(_), None) => PaintMode::Fill,
        (None, Some(_)) => PaintMode::Stroke,
        (None, None) => return,
    };
    if let Some(fill) = fill {
        layer.set_fill_color(color(fill));
    }
    if let Some(stroke) = stroke {
        layer.set_outline_color(color(stroke.color));
        layer.set_outline_thickness(stroke.width);
    }
    let ring = points.into_iter().map(|p| (mapper.point(p), false)).collect();
    layer.add_polygon(Polygon {
        rings: vec![ring],
        mode,
        winding_order: WindingOrder::NonZero,
    });
}

fn draw_path(layer: &PdfLayerReference, mapper: Mapper, points: &[(f32, f32)], stroke: Stroke) {
    layer.set_outline_color(color(stroke.color));
    layer.set_outline_thickness(stroke.width);
    let points = points.iter().map(|p| (mapper.point(*p), false)).collect();
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

/// Place `raster` with its bottom-left corner at (`x`, `bottom`) and the given width.
fn embed_image(layer: &PdfLayerReference, mapper: Mapper, raster: &RasterImage, x: f32, bottom: f32, width: f32) {
    let image = Image::from(ImageXObject {
        width: Px(raster.width as usize),
        height: Px(raster.height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: raster.interpolate,
        image_data: raster.pixels.clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4)
    let width_mm = width * MM_PER_PT;
    let dpi = (raster.width as f32) / (width_mm / 25.4);

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mapper.x(x)),
            translate_y: Some(mapper.y(bottom)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{render, ReportMeta};
    use crate::config::ReportConfig;
    use crate::record::{FieldValue, InspectionRecord};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn writes_stars_check_marks_and_boxes() {
        let mut scores = BTreeMap::new();
        scores.insert("engine".to_string(), FieldValue::Number(3.5));
        let record = InspectionRecord::new()
            .with_field("registrationNumber", "MH04KD2255")
            .with_field("exteriorChecks", vec!["Paint good", "No dents"])
            .with_field("ratings", FieldValue::Map(scores));
        let meta = ReportMeta::new("INS-20261019-ABCDEF12", NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        let doc = render(&record, &ReportConfig::default(), &meta).unwrap();
        assert!(doc
            .pages()
            .iter()
            .flat_map(|p| p.ops())
            .any(|op| matches!(op, DrawOp::Polygon { .. })));

        let bytes = write_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn maps_top_left_points_to_bottom_left_millimetres() {
        let mapper = Mapper { page_height: 720.0 };
        assert!((mapper.x(72.0).0 - 25.4).abs() < 0.001);
        assert!((mapper.y(0.0).0 - 254.0).abs() < 0.001);
        assert!(mapper.y(720.0).0.abs() < 0.001);
    }
}
