//! Shared constants for proxy sheet generation
//!
//! This module centralizes the fixed sheet geometry, footer metrics and
//! image acquisition defaults.

use std::time::Duration;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Page and Card Dimensions
// =============================================================================

/// US Letter page width (mm)
pub const PAGE_WIDTH_MM: f32 = 215.9;

/// US Letter page height (mm)
pub const PAGE_HEIGHT_MM: f32 = 279.4;

pub const TOP_MARGIN_MM: f32 = 3.18;
pub const BOTTOM_MARGIN_MM: f32 = 3.18;
pub const LEFT_MARGIN_MM: f32 = 6.35;
pub const RIGHT_MARGIN_MM: f32 = 6.35;

/// Trading card width (mm)
pub const CARD_WIDTH_MM: f32 = 63.0;

/// Trading card height (mm)
pub const CARD_HEIGHT_MM: f32 = 88.0;

/// Radius of the rounded clip applied to every card image (mm)
pub const CORNER_RADIUS_MM: f32 = 2.0;

/// Grid dimensions. The sheet layout is fixed at 3×3.
pub const GRID_ROWS: usize = 3;
pub const GRID_COLS: usize = 3;

// =============================================================================
// Cut Lines and Footer
// =============================================================================

pub const DEFAULT_CUT_LINE_THICKNESS_MM: f32 = 0.2;

/// Footer font size (points, Helvetica)
pub const FOOTER_FONT_SIZE: f32 = 10.0;

/// Horizontal inset of the footer text from the grid edges (mm)
pub const FOOTER_INSET_MM: f32 = 1.0;

/// Distance of the footer baseline below the grid (mm)
pub const FOOTER_BELOW_GRID_MM: f32 = 3.5;

/// Appended to the footer label on back pages
pub const BACK_PAGE_FOOTER_SUFFIX: &str = " (Backs)";

/// Appended to the footer label of the double-faced document in smart mode
pub const DFC_FOOTER_SUFFIX: &str = " (DFC)";

/// Control point factor for approximating quarter circles with Bezier curves.
/// 4 * (sqrt(2) - 1) / 3 ≈ 0.552284749831
pub const BEZIER_CIRCLE_FACTOR: f32 = 0.552284749831;

// =============================================================================
// Image Acquisition
// =============================================================================

pub const SCRYFALL_API_BASE: &str = "https://api.scryfall.com";

/// Image version requested from the image source
pub const DEFAULT_IMAGE_VERSION: &str = "png";

/// Minimum spacing between outbound image requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Number of image fetches in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after the image source answers "too many requests"
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(5);

/// Total attempts for one image, including rate-limited retries
pub const DEFAULT_MAX_ATTEMPTS: usize = 5;

/// Fetch progress is reported every this many completions
pub const PROGRESS_EVERY: usize = 5;

/// Longest normalized card name kept in a cache filename (characters)
pub const MAX_SAFE_NAME_LEN: usize = 100;

/// Size the default back image is normalized to (pixels)
pub const DEFAULT_BACK_SIZE_PX: (u32, u32) = (750, 1050);

// =============================================================================
// Catalogs and Jobs
// =============================================================================

pub const ARCHIDEKT_API_BASE: &str = "https://archidekt.com/api";

pub const UNKNOWN_DECK_NAME: &str = "Unknown Deck";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

pub const DECK_LIST_FILE: &str = "deck_list.csv";
pub const DFC_MANIFEST_FILE: &str = "DFC_Manifest.txt";
pub const COMBINED_DFC_BASE: &str = "Combined_Double_Sided_Cards";
pub const COMBINED_DFC_FOOTER: &str = "Combined Double-Sided Cards (All Decks)";

/// Name the combined document goes by in failure reports
pub const COMBINED_DFC_LABEL: &str = "Combined Double-Sided Cards";

/// File suffix of a deck's single-faced document in a smart batch
pub const BATCH_STANDARD_SUFFIX: &str = "Standard_Cards";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_pt_roundtrip() {
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-4);
        assert!((pt_to_mm(72.0) - 25.4).abs() < 1e-4);
    }
}
