use crate::canvas::{Canvas, helvetica_text_width};
use crate::constants::{BEZIER_CIRCLE_FACTOR, pt_to_mm};
use crate::layout::Rect;
use crate::options::CutLineColor;
use crate::types::{Result, SheetError};
use printpdf::*;
use std::collections::HashMap;

/// [`Canvas`] backed by a printpdf document
pub struct PdfCanvas {
    doc: PdfDocument,
    page_width: f32,
    page_height: f32,
    ops: Vec<Op>,
    /// Embedded images by id, with their pixel size
    images: HashMap<String, (XObjectId, usize, usize)>,
}

impl PdfCanvas {
    pub fn new() -> Self {
        Self {
            doc: PdfDocument::new("Proxy Sheets"),
            page_width: 0.0,
            page_height: 0.0,
            ops: Vec::new(),
            images: HashMap::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.doc.pages.len()
    }

    fn embed_image(&mut self, image_id: &str, bytes: &[u8]) -> Result<(XObjectId, usize, usize)> {
        if let Some(entry) = self.images.get(image_id) {
            return Ok(entry.clone());
        }

        let mut warnings = Vec::new();
        let image = RawImage::decode_from_bytes(bytes, &mut warnings)
            .map_err(|e| SheetError::Image(format!("Failed to decode {}: {}", image_id, e)))?;
        let entry = (self.doc.add_image(&image), image.width, image.height);
        self.images.insert(image_id.to_string(), entry.clone());
        Ok(entry)
    }
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}

fn color(c: CutLineColor) -> Color {
    let (r, g, b) = c.to_unit_rgb();
    Color::Rgb(Rgb {
        r,
        g,
        b,
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> Point {
    Point { x: Pt(x), y: Pt(y) }
}

fn line_point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: point(x, y),
        bezier: false,
    }
}

fn control_point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: point(x, y),
        bezier: true,
    }
}

/// Outline of a rounded rectangle: straight edges joined by quarter-circle
/// Bezier corners, counter-clockwise from the bottom edge.
fn rounded_rect(rect: Rect, radius: f32) -> Vec<LinePoint> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
    let k = r * BEZIER_CIRCLE_FACTOR;
    let (left, bottom, right, top) = (rect.x, rect.y, rect.right(), rect.top());

    vec![
        line_point(left + r, bottom),
        line_point(right - r, bottom),
        control_point(right - r + k, bottom),
        control_point(right, bottom + r - k),
        line_point(right, bottom + r),
        line_point(right, top - r),
        control_point(right, top - r + k),
        control_point(right - r + k, top),
        line_point(right - r, top),
        line_point(left + r, top),
        control_point(left + r - k, top),
        control_point(left, top - r + k),
        line_point(left, top - r),
        line_point(left, bottom + r),
        control_point(left, bottom + r - k),
        control_point(left + r - k, bottom),
        line_point(left + r, bottom),
    ]
}

impl Canvas for PdfCanvas {
    fn begin_document(&mut self, title: &str, page_width: f32, page_height: f32) {
        self.doc = PdfDocument::new(title);
        self.page_width = page_width;
        self.page_height = page_height;
        self.ops.clear();
        self.images.clear();
    }

    fn draw_image(
        &mut self,
        image_id: &str,
        bytes: &[u8],
        rect: Rect,
        corner_radius: f32,
    ) -> Result<()> {
        let (id, width_px, height_px) = self.embed_image(image_id, bytes)?;
        if width_px == 0 || height_px == 0 {
            return Err(SheetError::Image(format!("{} has no pixels", image_id)));
        }

        // Fit inside the cell keeping the aspect ratio, centered
        let scale = (rect.width / width_px as f32).min(rect.height / height_px as f32);
        let drawn_width = width_px as f32 * scale;
        let drawn_height = height_px as f32 * scale;
        let x = rect.x + (rect.width - drawn_width) / 2.0;
        let y = rect.y + (rect.height - drawn_height) / 2.0;

        self.ops.push(Op::SaveGraphicsState);
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing {
                    points: rounded_rect(rect, corner_radius),
                }],
                mode: PaintMode::Clip,
                winding_order: WindingOrder::NonZero,
            },
        });
        // At 72 dpi one pixel is one point before scaling
        self.ops.push(Op::UseXobject {
            id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(72.0),
                ..Default::default()
            },
        });
        self.ops.push(Op::RestoreGraphicsState);
        Ok(())
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), c: CutLineColor, thickness: f32) {
        self.ops.push(Op::SetOutlineColor { col: color(c) });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(thickness) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: vec![line_point(from.0, from.1), line_point(to.0, to.1)],
                is_closed: false,
            },
        });
    }

    fn draw_text_left(&mut self, text: &str, x: f32, y: f32, font_size: f32, c: CutLineColor) {
        self.ops.push(Op::SetFillColor { col: color(c) });
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor { pos: point(x, y) });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            font: BuiltinFont::Helvetica,
            size: Pt(font_size),
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font: BuiltinFont::Helvetica,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn draw_text_right(&mut self, text: &str, x: f32, y: f32, font_size: f32, c: CutLineColor) {
        let width = helvetica_text_width(text, font_size);
        self.draw_text_left(text, x - width, y, font_size, c);
    }

    fn show_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.doc.pages.push(PdfPage::new(
            Mm(pt_to_mm(self.page_width)),
            Mm(pt_to_mm(self.page_height)),
            ops,
        ));
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        if !self.ops.is_empty() {
            self.show_page();
        }
        if self.doc.pages.is_empty() {
            return Err(SheetError::Pdf("Document has no pages".to_string()));
        }

        let mut warnings = Vec::new();
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        for warning in &warnings {
            log::debug!("printpdf: {:?}", warning);
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_rect_is_closed() {
        let points = rounded_rect(Rect::new(10.0, 20.0, 100.0, 200.0), 5.0);
        let first = &points[0];
        let last = &points[points.len() - 1];
        assert_eq!(first.p.x, last.p.x);
        assert_eq!(first.p.y, last.p.y);
        assert_eq!(points.iter().filter(|p| p.bezier).count(), 8);
    }

    #[test]
    fn test_radius_is_clamped() {
        let points = rounded_rect(Rect::new(0.0, 0.0, 4.0, 4.0), 10.0);
        assert!(points.iter().all(|p| p.p.x.0 >= 0.0 && p.p.x.0 <= 4.0));
    }

    #[test]
    fn test_pages_are_counted() {
        let mut canvas = PdfCanvas::new();
        canvas.begin_document("Test", 612.0, 792.0);
        canvas.draw_line((0.0, 0.0), (0.0, 792.0), CutLineColor::BLACK, 0.5);
        canvas.show_page();
        canvas.draw_text_right("1 / 2", 500.0, 20.0, 10.0, CutLineColor::BLACK);
        canvas.show_page();
        assert_eq!(canvas.page_count(), 2);

        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_empty_document_is_an_error() {
        let mut canvas = PdfCanvas::new();
        canvas.begin_document("Empty", 612.0, 792.0);
        assert!(canvas.finish().is_err());
    }
}
