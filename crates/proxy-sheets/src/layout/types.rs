//! Layout data types for proxy sheets
//!
//! These types sit between pagination and drawing: everything a canvas needs
//! to render a page, in points with the origin at the bottom-left corner.

use crate::cache::CacheKey;

/// Which physical side of the printed sheet a page is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetSide {
    /// Page of a single-sided document
    Single,
    /// Front of a duplex sheet (printed first)
    Front,
    /// Back of a duplex sheet, columns mirrored
    Back,
}

/// Position within the grid (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    /// Row index (0 = top row)
    pub row: usize,
    /// Column index (0 = leftmost column)
    pub col: usize,
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major position of a slot index
    pub fn from_slot(slot: usize, cols: usize) -> Self {
        Self {
            row: slot / cols,
            col: slot % cols,
        }
    }

    /// Row-major slot index of this position
    pub fn slot(self, cols: usize) -> usize {
        self.row * cols + self.col
    }

    /// The position this cell lands on after the sheet is flipped about its
    /// vertical axis: same row, column reversed.
    pub fn mirrored(self, cols: usize) -> Self {
        Self {
            row: self.row,
            col: cols - 1 - self.col,
        }
    }
}

/// A rectangular area in points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (bottom edge)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge x coordinate
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge y coordinate
    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// Image drawn in a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotImage {
    /// A cached card image
    Cached(CacheKey),
    /// The configured default back
    DefaultBack,
}

/// One grid cell on a page
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPlacement {
    /// Where the cell is on this page
    pub position: GridPosition,
    pub rect: Rect,
    /// Index into the laid-out card sequence (None = empty cell)
    pub card_index: Option<usize>,
    /// What to draw (None = leave the cell blank)
    pub image: Option<SlotImage>,
}

/// A straight cut guide from edge to edge of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutLine {
    pub from: (f32, f32),
    pub to: (f32, f32),
}

impl CutLine {
    pub fn is_vertical(&self) -> bool {
        self.from.0 == self.to.0
    }
}

/// Footer text below the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    /// Left-anchored label
    pub label: String,
    pub label_x: f32,
    /// Right-anchored `page / total`
    pub page_label: String,
    pub page_label_x: f32,
    /// Baseline
    pub y: f32,
}

/// Everything drawn on one output page
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// 1-based page number
    pub number: usize,
    pub total: usize,
    pub side: SheetSide,
    /// Drawn first, so card images overlay them
    pub cut_lines: Vec<CutLine>,
    /// Every grid cell in row-major order of this page's positions
    pub slots: Vec<SlotPlacement>,
    pub footer: Footer,
}

impl PageLayout {
    pub fn filled_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.card_index.is_some()).count()
    }

    /// The slot at `position` on this page
    pub fn slot_at(&self, position: GridPosition) -> Option<&SlotPlacement> {
        self.slots.iter().find(|s| s.position == position)
    }
}
