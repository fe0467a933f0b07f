//! Pagination
//!
//! Cards fill pages in input order, row-major. In duplex mode every front
//! page is followed by its back page, which holds the same cards with the
//! columns mirrored so that each back lands behind its front once the sheet
//! is flipped about its vertical axis.

use crate::cache::CacheKey;
use crate::constants::BACK_PAGE_FOOTER_SUFFIX;
use crate::types::{Card, Face};
use std::collections::HashSet;

use super::{Footer, GridPosition, PageLayout, SheetGeometry, SheetSide, SlotImage, SlotPlacement};

/// Number of pages for `card_count` cards
pub fn page_count(card_count: usize, cards_per_page: usize, duplex: bool) -> usize {
    if cards_per_page == 0 {
        return 0;
    }
    let sheets = card_count.div_ceil(cards_per_page);
    if duplex { sheets * 2 } else { sheets }
}

/// What the image cache holds when layout runs
#[derive(Debug, Clone, Copy)]
pub struct ImageAvailability<'a> {
    pub cached: &'a HashSet<CacheKey>,
    pub has_default_back: bool,
}

impl ImageAvailability<'_> {
    fn front(&self, card: &Card) -> Option<SlotImage> {
        let key = CacheKey::for_card(card, Face::Front);
        self.cached.contains(&key).then_some(SlotImage::Cached(key))
    }

    /// True back if cached, else the default back if configured, else nothing
    fn back(&self, card: &Card) -> Option<SlotImage> {
        let key = CacheKey::for_card(card, Face::Back);
        if self.cached.contains(&key) {
            Some(SlotImage::Cached(key))
        } else if self.has_default_back {
            Some(SlotImage::DefaultBack)
        } else {
            None
        }
    }
}

/// Lay out `cards` into pages.
///
/// `footer_text` is the left footer label; back pages append
/// [`BACK_PAGE_FOOTER_SUFFIX`].
pub fn paginate(
    cards: &[Card],
    geometry: &SheetGeometry,
    footer_text: &str,
    duplex: bool,
    images: ImageAvailability<'_>,
) -> Vec<PageLayout> {
    let per_page = geometry.cards_per_page();
    let total = page_count(cards.len(), per_page, duplex);
    let cut_lines = geometry.cut_lines();
    let mut pages = Vec::with_capacity(total);

    for (sheet, chunk) in cards.chunks(per_page.max(1)).enumerate() {
        let first_index = sheet * per_page;

        let front_side = if duplex { SheetSide::Front } else { SheetSide::Single };
        let front_slots = (0..per_page)
            .map(|slot| {
                let position = GridPosition::from_slot(slot, geometry.cols);
                let card = chunk.get(slot);
                SlotPlacement {
                    position,
                    rect: geometry.cell_bounds(position),
                    card_index: card.map(|_| first_index + slot),
                    image: card.and_then(|c| images.front(c)),
                }
            })
            .collect();

        let number = pages.len() + 1;
        pages.push(PageLayout {
            number,
            total,
            side: front_side,
            cut_lines: cut_lines.clone(),
            slots: front_slots,
            footer: footer(geometry, footer_text.to_string(), number, total),
        });

        if !duplex {
            continue;
        }

        // Back slot (r, c) holds the card from front slot (r, cols - 1 - c)
        let back_slots = (0..per_page)
            .map(|slot| {
                let position = GridPosition::from_slot(slot, geometry.cols);
                let front_slot = position.mirrored(geometry.cols).slot(geometry.cols);
                let card = chunk.get(front_slot);
                SlotPlacement {
                    position,
                    rect: geometry.cell_bounds(position),
                    card_index: card.map(|_| first_index + front_slot),
                    image: card.and_then(|c| images.back(c)),
                }
            })
            .collect();

        let number = pages.len() + 1;
        pages.push(PageLayout {
            number,
            total,
            side: SheetSide::Back,
            cut_lines: cut_lines.clone(),
            slots: back_slots,
            footer: footer(
                geometry,
                format!("{}{}", footer_text, BACK_PAGE_FOOTER_SUFFIX),
                number,
                total,
            ),
        });
    }

    pages
}

fn footer(geometry: &SheetGeometry, label: String, number: usize, total: usize) -> Footer {
    Footer {
        label,
        label_x: geometry.footer_left_x,
        page_label: format!("{} / {}", number, total),
        page_label_x: geometry.footer_right_x,
        y: geometry.footer_y,
    }
}

// =============================================================================
// Tests
// =============================================================================
