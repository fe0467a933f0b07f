//! Sheet assembler
//!
//! Makes sure every image a document needs is cached, lays the cards out and
//! replays each page onto a [`Canvas`].

use crate::cache::CacheKey;
use crate::canvas::Canvas;
use crate::constants::mm_to_pt;
use crate::layout::{ImageAvailability, PageLayout, SheetGeometry, SlotImage, paginate};
use crate::options::SheetOptions;
use crate::pdf::PdfCanvas;
use crate::pipeline::ImagePipeline;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::types::{Card, Face, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Id under which the default back is embedded
const DEFAULT_BACK_IMAGE_ID: &str = "default_back";

/// A document written by the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub path: PathBuf,
    pub pages: usize,
}

/// Build the document for `cards` as a PDF at `output_path`.
pub async fn assemble_pdf(
    pipeline: &ImagePipeline,
    cards: &[Card],
    options: &SheetOptions,
    output_path: impl AsRef<Path>,
) -> Result<Option<AssembledDocument>> {
    assemble(pipeline, cards, options, PdfCanvas::new, output_path).await
}

/// Build the document for `cards` and write the finished bytes to
/// `output_path`.
///
/// `make_canvas` runs on the blocking render thread. An empty card list
/// produces no document and returns `Ok(None)`.
pub async fn assemble<C, F>(
    pipeline: &ImagePipeline,
    cards: &[Card],
    options: &SheetOptions,
    make_canvas: F,
    output_path: impl AsRef<Path>,
) -> Result<Option<AssembledDocument>>
where
    C: Canvas,
    F: FnOnce() -> C + Send + 'static,
{
    options.validate()?;
    let output_path = output_path.as_ref().to_owned();

    if cards.is_empty() {
        log::debug!("No cards for {}, skipping", output_path.display());
        return Ok(None);
    }

    let progress = pipeline.progress().clone();
    progress.send(ProgressUpdate::DocumentStarted {
        name: document_name(&output_path),
    });

    pipeline.ensure_all(cards, Face::Front).await?;
    if options.duplex {
        pipeline.ensure_all(cards, Face::Back).await?;
    }

    let images = load_images(pipeline, cards, options.duplex).await?;
    let cached: HashSet<CacheKey> = images.keys().cloned().collect();

    let footer_text = options
        .footer_text
        .clone()
        .unwrap_or_else(|| default_footer_text(&output_path));
    let geometry = SheetGeometry::new(options);
    let pages = paginate(
        cards,
        &geometry,
        &footer_text,
        options.duplex,
        ImageAvailability {
            cached: &cached,
            has_default_back: options.default_back.is_some(),
        },
    );
    let page_count = pages.len();

    let options = options.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        render(make_canvas(), &footer_text, &geometry, &pages, &options, &images, &progress)
    })
    .await??;

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output_path, bytes).await?;

    pipeline.progress().send(ProgressUpdate::DocumentComplete {
        path: output_path.clone(),
        pages: page_count,
    });

    Ok(Some(AssembledDocument {
        path: output_path,
        pages: page_count,
    }))
}

/// Read every cached image the document can use
async fn load_images(
    pipeline: &ImagePipeline,
    cards: &[Card],
    duplex: bool,
) -> Result<HashMap<CacheKey, Vec<u8>>> {
    let faces: &[Face] = if duplex {
        &[Face::Front, Face::Back]
    } else {
        &[Face::Front]
    };

    let mut images = HashMap::new();
    for card in cards {
        for &face in faces {
            let key = CacheKey::for_card(card, face);
            if images.contains_key(&key) {
                continue;
            }
            if let Some(bytes) = pipeline.store().get(&key).await? {
                images.insert(key, bytes);
            }
        }
    }
    Ok(images)
}

fn render<C: Canvas>(
    mut canvas: C,
    title: &str,
    geometry: &SheetGeometry,
    pages: &[PageLayout],
    options: &SheetOptions,
    images: &HashMap<CacheKey, Vec<u8>>,
    progress: &ProgressSink,
) -> Result<Vec<u8>> {
    canvas.begin_document(title, geometry.page_width, geometry.page_height);

    for page in pages {
        progress.send(ProgressUpdate::Page {
            current: page.number,
            total: page.total,
            side: page.side,
        });
        draw_page(&mut canvas, page, geometry, options, images);
    }

    canvas.finish()
}

fn draw_page<C: Canvas>(
    canvas: &mut C,
    page: &PageLayout,
    geometry: &SheetGeometry,
    options: &SheetOptions,
    images: &HashMap<CacheKey, Vec<u8>>,
) {
    let color = options.cut_line_color;
    let thickness = mm_to_pt(options.cut_line_thickness_mm);

    // Cut lines go down first; the rounded card clips leave them visible at the corners
    for line in &page.cut_lines {
        canvas.draw_line(line.from, line.to, color, thickness);
    }

    for slot in &page.slots {
        let Some(image) = &slot.image else {
            continue;
        };
        let (image_id, bytes) = match image {
            SlotImage::Cached(key) => (key.as_str(), images.get(key).map(Vec::as_slice)),
            SlotImage::DefaultBack => (DEFAULT_BACK_IMAGE_ID, options.default_back.as_deref()),
        };
        let Some(bytes) = bytes else {
            continue;
        };
        if let Err(e) = canvas.draw_image(image_id, bytes, slot.rect, geometry.corner_radius) {
            log::warn!("Error drawing {}: {}", image_id, e);
        }
    }

    let footer = &page.footer;
    canvas.draw_text_left(
        &footer.label,
        footer.label_x,
        footer.y,
        options.footer_font_size_pt,
        color,
    );
    canvas.draw_text_right(
        &footer.page_label,
        footer.page_label_x,
        footer.y,
        options.footer_font_size_pt,
        color,
    );

    canvas.show_page();
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Footer label derived from the file name: `My_Deck_Standard.pdf` becomes
/// `My Deck Standard`
fn default_footer_text(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_footer_text() {
        assert_eq!(
            default_footer_text(Path::new("out/My_Deck_Standard.pdf")),
            "My Deck Standard"
        );
        assert_eq!(document_name(Path::new("out/deck.pdf")), "deck.pdf");
    }
}
