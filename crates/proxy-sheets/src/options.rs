use crate::constants::*;
use crate::types::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// RGB stroke/fill color parsed from `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CutLineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl CutLineColor {
    pub const BLACK: CutLineColor = CutLineColor { r: 0, g: 0, b: 0 };

    /// Components scaled to 0.0..=1.0
    pub fn to_unit_rgb(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl Default for CutLineColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for CutLineColor {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        let invalid = || SheetError::Config(format!("Invalid color '{}', expected #rrggbb", s));
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: component(0..2)?,
            g: component(2..4)?,
            b: component(4..6)?,
        })
    }
}

impl TryFrom<String> for CutLineColor {
    type Error = SheetError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CutLineColor> for String {
    fn from(color: CutLineColor) -> Self {
        color.to_string()
    }
}

impl std::fmt::Display for CutLineColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Which documents a deck produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Every card, single-sided
    #[default]
    Single,
    /// Every card, duplex
    Double,
    /// One single-sided and one duplex document with every card
    Both,
    /// Single-faced cards single-sided, double-faced cards duplex
    Smart,
}

impl SplitPolicy {
    pub fn name(self) -> &'static str {
        match self {
            SplitPolicy::Single => "single",
            SplitPolicy::Double => "double",
            SplitPolicy::Both => "both",
            SplitPolicy::Smart => "smart",
        }
    }

    /// Duplex flags to run for the non-smart policies, in output order
    pub fn duplex_runs(self) -> &'static [bool] {
        match self {
            SplitPolicy::Single => &[false],
            SplitPolicy::Double => &[true],
            SplitPolicy::Both => &[false, true],
            SplitPolicy::Smart => &[],
        }
    }
}

impl FromStr for SplitPolicy {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(SplitPolicy::Single),
            "double" => Ok(SplitPolicy::Double),
            "both" => Ok(SplitPolicy::Both),
            "smart" => Ok(SplitPolicy::Smart),
            other => Err(SheetError::Config(format!("Unknown format '{}'", other))),
        }
    }
}

/// Sheet configuration, immutable for one compositor run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub card_width_mm: f32,
    pub card_height_mm: f32,
    pub corner_radius_mm: f32,
    pub rows: usize,
    pub columns: usize,
    /// Gap between neighbouring cards, both directions
    pub padding_mm: f32,
    pub cut_line_color: CutLineColor,
    pub cut_line_thickness_mm: f32,
    /// Left footer label. When absent the document name is used.
    pub footer_text: Option<String>,
    pub footer_font_size_pt: f32,
    pub duplex: bool,
    /// Image drawn on back slots whose true back is unavailable
    #[serde(skip)]
    pub default_back: Option<Vec<u8>>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            page_width_mm: PAGE_WIDTH_MM,
            page_height_mm: PAGE_HEIGHT_MM,
            margin_top_mm: TOP_MARGIN_MM,
            margin_bottom_mm: BOTTOM_MARGIN_MM,
            margin_left_mm: LEFT_MARGIN_MM,
            margin_right_mm: RIGHT_MARGIN_MM,
            card_width_mm: CARD_WIDTH_MM,
            card_height_mm: CARD_HEIGHT_MM,
            corner_radius_mm: CORNER_RADIUS_MM,
            rows: GRID_ROWS,
            columns: GRID_COLS,
            padding_mm: 0.0,
            cut_line_color: CutLineColor::BLACK,
            cut_line_thickness_mm: DEFAULT_CUT_LINE_THICKNESS_MM,
            footer_text: None,
            footer_font_size_pt: FOOTER_FONT_SIZE,
            duplex: false,
            default_back: None,
        }
    }
}

impl SheetOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| SheetError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SheetError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn cards_per_page(&self) -> usize {
        self.rows * self.columns
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.rows != GRID_ROWS || self.columns != GRID_COLS {
            return Err(SheetError::Config(format!(
                "Grid must be {}x{}, got {}x{}",
                GRID_ROWS, GRID_COLS, self.rows, self.columns
            )));
        }

        if self.card_width_mm <= 0.0 || self.card_height_mm <= 0.0 {
            return Err(SheetError::Config(
                "Card dimensions must be positive".to_string(),
            ));
        }

        if self.padding_mm < 0.0 {
            return Err(SheetError::Config(
                "Padding must not be negative".to_string(),
            ));
        }

        if self.cut_line_thickness_mm <= 0.0 {
            return Err(SheetError::Config(
                "Cut line thickness must be positive".to_string(),
            ));
        }

        let usable_width =
            self.page_width_mm - self.margin_left_mm - self.margin_right_mm;
        let usable_height =
            self.page_height_mm - self.margin_top_mm - self.margin_bottom_mm;
        let grid_width = self.columns as f32 * self.card_width_mm
            + (self.columns - 1) as f32 * self.padding_mm;
        let grid_height = self.rows as f32 * self.card_height_mm
            + (self.rows - 1) as f32 * self.padding_mm;

        if grid_width > usable_width || grid_height > usable_height {
            return Err(SheetError::Config(format!(
                "A {:.1}x{:.1}mm grid does not fit the {:.1}x{:.1}mm printable area",
                grid_width, grid_height, usable_width, usable_height
            )));
        }

        Ok(())
    }
}

/// Image acquisition settings
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub api_base: String,
    pub image_version: String,
    pub min_interval: Duration,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub rate_limit_cooldown: Duration,
    pub max_attempts: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            api_base: SCRYFALL_API_BASE.to_string(),
            image_version: DEFAULT_IMAGE_VERSION.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl FetchOptions {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SheetError::Config(
                "Fetch concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(SheetError::Config(
                "At least one fetch attempt is required".to_string(),
            ));
        }
        Ok(())
    }
}
