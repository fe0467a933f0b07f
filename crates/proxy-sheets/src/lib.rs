pub mod assemble;
pub mod cache;
pub mod canvas;
pub mod catalog;
pub mod classify;
pub mod constants;
mod default_back;
pub mod fetch;
pub mod job;
pub mod layout;
mod options;
pub mod pdf;
pub mod pipeline;
mod progress;
mod rate_limiter;
mod types;

pub use assemble::{AssembledDocument, assemble, assemble_pdf};
pub use cache::{CacheKey, CacheStore, FsCacheStore, MemoryCacheStore, normalize_name};
pub use canvas::Canvas;
pub use catalog::{
    ArchidektCatalog, BatchLine, BoardFilter, CatalogProvider, CsvCatalog, DeckSource,
    parse_batch_file, read_batch_file, write_deck_list,
};
pub use classify::{FaceSplit, classify};
pub use default_back::load_default_back;
pub use fetch::{FetchResponse, ImageFetcher, ScryfallFetcher, image_url};
pub use job::{DeckEntry, JobReport, JobRequest, apply_split_policy, run_batch, run_deck};
pub use options::*;
pub use pdf::PdfCanvas;
pub use pipeline::{BatchSummary, FetchOutcome, ImagePipeline};
pub use progress::{ProgressSink, ProgressUpdate};
pub use rate_limiter::RateLimiter;
pub use types::*;
