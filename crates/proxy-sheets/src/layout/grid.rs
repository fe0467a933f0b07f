//! Sheet geometry
//!
//! Page-level constants derived once from a [`SheetOptions`]: the centered
//! grid origin, cell bounds, cut guides and footer anchors.

use crate::constants::{FOOTER_BELOW_GRID_MM, FOOTER_INSET_MM, mm_to_pt};
use crate::options::SheetOptions;

use super::{CutLine, GridPosition, Rect};

/// Geometry shared by every page of a document, in points
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub rows: usize,
    pub cols: usize,
    pub card_width: f32,
    pub card_height: f32,
    pub corner_radius: f32,
    /// Gap between neighbouring cards
    pub padding: f32,
    /// Page area inside the margins
    pub usable_width: f32,
    pub usable_height: f32,
    /// Grid size including inner padding
    pub grid_width: f32,
    pub grid_height: f32,
    /// Left edge of the grid
    pub grid_left: f32,
    /// Top edge of the grid
    pub grid_top: f32,
    /// Footer baseline
    pub footer_y: f32,
    pub footer_left_x: f32,
    pub footer_right_x: f32,
}

impl SheetGeometry {
    /// Compute the geometry for a configuration. The grid is centered inside
    /// the margins on both axes.
    pub fn new(options: &SheetOptions) -> Self {
        let page_width = mm_to_pt(options.page_width_mm);
        let page_height = mm_to_pt(options.page_height_mm);
        let margin_top = mm_to_pt(options.margin_top_mm);
        let margin_left = mm_to_pt(options.margin_left_mm);

        let card_width = mm_to_pt(options.card_width_mm);
        let card_height = mm_to_pt(options.card_height_mm);
        let padding = mm_to_pt(options.padding_mm);
        let rows = options.rows;
        let cols = options.columns;

        let usable_width = page_width - margin_left - mm_to_pt(options.margin_right_mm);
        let usable_height = page_height - margin_top - mm_to_pt(options.margin_bottom_mm);

        let grid_width = cols as f32 * card_width + cols.saturating_sub(1) as f32 * padding;
        let grid_height = rows as f32 * card_height + rows.saturating_sub(1) as f32 * padding;

        let grid_left = margin_left + (usable_width - grid_width) / 2.0;
        let grid_top = page_height - margin_top - (usable_height - grid_height) / 2.0;

        let footer_inset = mm_to_pt(FOOTER_INSET_MM);

        Self {
            page_width,
            page_height,
            rows,
            cols,
            card_width,
            card_height,
            corner_radius: mm_to_pt(options.corner_radius_mm),
            padding,
            usable_width,
            usable_height,
            grid_width,
            grid_height,
            grid_left,
            grid_top,
            footer_y: grid_top - grid_height - mm_to_pt(FOOTER_BELOW_GRID_MM),
            footer_left_x: grid_left + footer_inset,
            footer_right_x: grid_left + grid_width - footer_inset,
        }
    }

    pub fn cards_per_page(&self) -> usize {
        self.rows * self.cols
    }

    /// Bounds of the card at `pos`. Row 0 is the top row.
    pub fn cell_bounds(&self, pos: GridPosition) -> Rect {
        let x = self.grid_left + pos.col as f32 * (self.card_width + self.padding);
        let y = self.grid_top
            - (pos.row + 1) as f32 * self.card_height
            - pos.row as f32 * self.padding;
        Rect::new(x, y, self.card_width, self.card_height)
    }

    /// Cut guides: a full-height vertical line at the left and right edge of
    /// every column, and a full-width horizontal line at the top and bottom
    /// edge of every row.
    pub fn cut_lines(&self) -> Vec<CutLine> {
        let mut lines = Vec::with_capacity(2 * (self.rows + self.cols));

        for col in 0..self.cols {
            let cell = self.cell_bounds(GridPosition::new(0, col));
            for x in [cell.x, cell.right()] {
                lines.push(CutLine {
                    from: (x, 0.0),
                    to: (x, self.page_height),
                });
            }
        }

        for row in 0..self.rows {
            let cell = self.cell_bounds(GridPosition::new(row, 0));
            for y in [cell.y, cell.top()] {
                lines.push(CutLine {
                    from: (0.0, y),
                    to: (self.page_width, y),
                });
            }
        }

        lines
    }
}

// =============================================================================
// Tests
// =============================================================================
