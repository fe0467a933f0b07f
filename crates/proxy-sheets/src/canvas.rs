//! Drawing backend abstraction
//!
//! The assembler speaks to a [`Canvas`]; [`crate::pdf::PdfCanvas`] is the
//! printpdf implementation. Coordinates are points, origin bottom-left.

use crate::layout::Rect;
use crate::options::CutLineColor;
use crate::types::Result;

pub trait Canvas {
    /// Start a document; every page has the given size
    fn begin_document(&mut self, title: &str, page_width: f32, page_height: f32);

    /// Draw an image scaled to fit `rect`, clipped to a rounded rectangle
    /// equal to `rect`. `image_id` identifies `bytes` so backends can embed a
    /// repeated image once.
    fn draw_image(
        &mut self,
        image_id: &str,
        bytes: &[u8],
        rect: Rect,
        corner_radius: f32,
    ) -> Result<()>;

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: CutLineColor, thickness: f32);

    /// Text with its baseline starting at (x, y)
    fn draw_text_left(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: CutLineColor);

    /// Text with its baseline ending at (x, y)
    fn draw_text_right(&mut self, text: &str, x: f32, y: f32, font_size: f32, color: CutLineColor);

    /// Finish the current page and start a new one
    fn show_page(&mut self);

    /// Serialize the finished document
    fn finish(&mut self) -> Result<Vec<u8>>;
}

/// Advance widths of Helvetica for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width used for characters outside the table
const HELVETICA_FALLBACK_WIDTH: u16 = 556;

/// Width of `text` set in Helvetica at `font_size` points
pub fn helvetica_text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|ch| {
            let code = ch as u32;
            if (32..=126).contains(&code) {
                HELVETICA_WIDTHS[(code - 32) as usize] as u32
            } else {
                HELVETICA_FALLBACK_WIDTH as u32
            }
        })
        .sum();
    units as f32 / 1000.0 * font_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        assert_eq!(helvetica_text_width("", 10.0), 0.0);
        // "1 / 2" = 556 + 278 + 278 + 278 + 556
        assert!((helvetica_text_width("1 / 2", 10.0) - 19.46).abs() < 1e-3);
        assert!(helvetica_text_width("W", 10.0) > helvetica_text_width("i", 10.0));
    }
}
