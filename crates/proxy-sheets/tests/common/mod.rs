//! Shared test doubles: a scripted image source, a canvas that records what
//! it is asked to draw, and in-memory catalogs.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use proxy_sheets::*;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const API_BASE: &str = "http://images.test";

/// A small valid PNG
pub fn png_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 8, image::Rgb([200, 40, 40])));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn card(name: &str, id: &str) -> Card {
    Card::new(name, "tst", id).with_identifier(id)
}

pub fn cards(prefix: &str, n: usize) -> Vec<Card> {
    (0..n)
        .map(|i| card(&format!("{} {}", prefix, i), &format!("{}-{}", prefix.to_lowercase(), i)))
        .collect()
}

pub fn fetch_options() -> FetchOptions {
    FetchOptions {
        api_base: API_BASE.to_string(),
        min_interval: Duration::ZERO,
        rate_limit_cooldown: Duration::from_millis(1),
        ..Default::default()
    }
}

pub fn url(card: &Card, face: Face) -> String {
    image_url(card, face, &fetch_options()).unwrap()
}

// =============================================================================
// Image source
// =============================================================================

/// Answers from a per-URL script. Unscripted fronts succeed; unscripted
/// backs answer 422 unless `all_backs_exist` is set.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<HashMap<String, VecDeque<std::result::Result<FetchResponse, String>>>>,
    calls: Mutex<Vec<String>>,
    all_backs_exist: bool,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_all_backs() -> Self {
        Self {
            all_backs_exist: true,
            ..Default::default()
        }
    }

    pub fn respond(&self, url: &str, status: u16) {
        let body = if (200..300).contains(&status) {
            png_bytes()
        } else {
            Vec::new()
        };
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Ok(FetchResponse { status, body }));
    }

    pub fn fail(&self, url: &str) {
        self.script
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(Err("operation timed out".to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl ImageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchResponse, String> {
        self.calls.lock().unwrap().push(url.to_string());
        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());
        if let Some(response) = scripted {
            return response;
        }

        let is_back = url.ends_with("&face=back");
        if is_back && !self.all_backs_exist {
            Ok(FetchResponse {
                status: 422,
                body: Vec::new(),
            })
        } else {
            Ok(FetchResponse {
                status: 200,
                body: png_bytes(),
            })
        }
    }
}

pub fn pipeline_with(
    fetcher: Arc<ScriptedFetcher>,
    store: Arc<dyn CacheStore>,
) -> ImagePipeline {
    ImagePipeline::new(
        store,
        fetcher,
        Arc::new(RateLimiter::new(Duration::ZERO)),
        fetch_options(),
    )
}

pub fn pipeline(fetcher: Arc<ScriptedFetcher>) -> (ImagePipeline, Arc<MemoryCacheStore>) {
    let store = Arc::new(MemoryCacheStore::new());
    (pipeline_with(fetcher, store.clone()), store)
}

// =============================================================================
// Canvas
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Begin { title: String },
    Image { id: String, rect: layout::Rect },
    Line,
    TextLeft { text: String },
    TextRight { text: String },
    ShowPage,
}

/// Canvas that records every call; clones share the record
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    calls: Arc<Mutex<Vec<DrawCall>>>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas constructor for [`assemble`]; the built canvas records into `self`
    pub fn factory(&self) -> impl FnOnce() -> RecordingCanvas + Send + 'static {
        let canvas = self.clone();
        move || canvas
    }

    pub fn calls(&self) -> Vec<DrawCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls grouped per page, each page ending at its `ShowPage`
    pub fn pages(&self) -> Vec<Vec<DrawCall>> {
        let mut pages = Vec::new();
        let mut current = Vec::new();
        for call in self.calls() {
            match call {
                DrawCall::Begin { .. } => {}
                DrawCall::ShowPage => pages.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
        pages
    }

    fn record(&self, call: DrawCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Image ids drawn on a page, in draw order
pub fn images_on(page: &[DrawCall]) -> Vec<String> {
    page.iter()
        .filter_map(|call| match call {
            DrawCall::Image { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect()
}

pub fn texts_on(page: &[DrawCall]) -> Vec<String> {
    page.iter()
        .filter_map(|call| match call {
            DrawCall::TextLeft { text } | DrawCall::TextRight { text } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

impl Canvas for RecordingCanvas {
    fn begin_document(&mut self, title: &str, _page_width: f32, _page_height: f32) {
        self.record(DrawCall::Begin {
            title: title.to_string(),
        });
    }

    fn draw_image(
        &mut self,
        image_id: &str,
        _bytes: &[u8],
        rect: layout::Rect,
        _corner_radius: f32,
    ) -> proxy_sheets::Result<()> {
        self.record(DrawCall::Image {
            id: image_id.to_string(),
            rect,
        });
        Ok(())
    }

    fn draw_line(&mut self, _from: (f32, f32), _to: (f32, f32), _color: CutLineColor, _thickness: f32) {
        self.record(DrawCall::Line);
    }

    fn draw_text_left(&mut self, text: &str, _x: f32, _y: f32, _size: f32, _color: CutLineColor) {
        self.record(DrawCall::TextLeft {
            text: text.to_string(),
        });
    }

    fn draw_text_right(&mut self, text: &str, _x: f32, _y: f32, _size: f32, _color: CutLineColor) {
        self.record(DrawCall::TextRight {
            text: text.to_string(),
        });
    }

    fn show_page(&mut self) {
        self.record(DrawCall::ShowPage);
    }

    fn finish(&mut self) -> proxy_sheets::Result<Vec<u8>> {
        Ok(b"%PDF-recorded".to_vec())
    }
}

// =============================================================================
// Catalogs
// =============================================================================

pub struct StaticCatalog {
    pub deck: Deck,
}

#[async_trait]
impl CatalogProvider for StaticCatalog {
    fn describe(&self) -> String {
        "static deck".to_string()
    }

    async fn load(&self) -> proxy_sheets::Result<Deck> {
        Ok(self.deck.clone())
    }
}

pub struct FailingCatalog;

#[async_trait]
impl CatalogProvider for FailingCatalog {
    fn describe(&self) -> String {
        "unreachable deck".to_string()
    }

    async fn load(&self) -> proxy_sheets::Result<Deck> {
        Err(SheetError::Catalog("Failed to fetch deck 999 (Status 404)".to_string()))
    }
}

pub fn deck_entry(name: &str, author: &str, cards: Vec<Card>) -> DeckEntry {
    DeckEntry {
        provider: Arc::new(StaticCatalog {
            deck: Deck {
                cards,
                metadata: DeckMetadata {
                    name: Some(name.to_string()),
                    author: Some(author.to_string()),
                },
            },
        }),
        custom_name: None,
    }
}

pub fn pdf_page_count(path: &std::path::Path) -> usize {
    lopdf::Document::load(path).unwrap().get_pages().len()
}
