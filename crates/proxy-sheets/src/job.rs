//! Job orchestration
//!
//! Applies a [`SplitPolicy`] to a deck, runs single-deck and batch jobs and
//! writes the side files (deck list, DFC manifest) next to the documents.

use crate::assemble::assemble_pdf;
use crate::catalog::{CatalogProvider, write_deck_list};
use crate::classify::classify;
use crate::constants::{
    BATCH_STANDARD_SUFFIX, COMBINED_DFC_BASE, COMBINED_DFC_FOOTER, COMBINED_DFC_LABEL,
    DECK_LIST_FILE, DFC_FOOTER_SUFFIX, DFC_MANIFEST_FILE,
};
use crate::options::{SheetOptions, SplitPolicy};
use crate::pipeline::ImagePipeline;
use crate::progress::ProgressUpdate;
use crate::types::{Card, Deck, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Settings shared by every deck of a job
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub output_dir: PathBuf,
    pub split: SplitPolicy,
    /// Sheet settings; `default_back` is applied according to the split policy
    pub sheet: SheetOptions,
    /// Delete images downloaded during this job once it finishes
    pub purge_new: bool,
}

/// A deck queued in a batch
#[derive(Clone)]
pub struct DeckEntry {
    pub provider: Arc<dyn CatalogProvider>,
    pub custom_name: Option<String>,
}

/// What a job produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobReport {
    pub documents: Vec<PathBuf>,
    /// (deck, error message) for every deck that failed
    pub failed_decks: Vec<(String, String)>,
}

/// Where one split-policy run writes its documents
#[derive(Debug, Clone)]
pub struct DocumentTarget<'a> {
    pub dir: &'a Path,
    /// File name prefix, `{base}_Standard.pdf` / `{base}_DoubleSided.pdf`
    pub base: &'a str,
    pub footer: &'a str,
}

impl DocumentTarget<'_> {
    fn path(&self, duplex: bool) -> PathBuf {
        self.named(if duplex { "DoubleSided" } else { "Standard" })
    }

    fn named(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.pdf", self.base, suffix))
    }
}

/// Deck name used for folders and footers: custom name, else the catalog's
/// name, else `Deck_{number}`
pub fn resolve_deck_name(deck: &Deck, custom_name: Option<&str>, number: usize) -> String {
    custom_name
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .or_else(|| deck.metadata.name.clone())
        .unwrap_or_else(|| format!("Deck_{}", number))
}

pub fn footer_text(name: &str, author: Option<&str>) -> String {
    match author {
        Some(author) if !author.is_empty() => format!("{} - {}", name, author),
        _ => name.to_string(),
    }
}

/// File-system friendly form of a deck name
pub fn deck_folder_name(name: &str) -> String {
    name.replace([' ', '/', '\\'], "_")
}

fn run_options(sheet: &SheetOptions, footer: &str, duplex: bool, with_default_back: bool) -> SheetOptions {
    SheetOptions {
        footer_text: Some(footer.to_string()),
        duplex,
        default_back: if with_default_back {
            sheet.default_back.clone()
        } else {
            None
        },
        ..sheet.clone()
    }
}

/// Produce the documents `split` asks for. Returns the paths written, in
/// order; an empty bucket writes nothing.
///
/// `smart` runs single-faced cards single-sided without a default back and
/// double-faced cards duplex with the default back. The other policies pass
/// the default back to every run.
pub async fn apply_split_policy(
    pipeline: &ImagePipeline,
    cards: &[Card],
    split: SplitPolicy,
    sheet: &SheetOptions,
    target: &DocumentTarget<'_>,
) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    if split == SplitPolicy::Smart {
        let faces = classify(pipeline, cards).await?;

        let options = run_options(sheet, target.footer, false, false);
        if let Some(doc) =
            assemble_pdf(pipeline, &faces.single_faced, &options, target.path(false)).await?
        {
            documents.push(doc.path);
        }

        let footer = format!("{}{}", target.footer, DFC_FOOTER_SUFFIX);
        let options = run_options(sheet, &footer, true, true);
        if let Some(doc) =
            assemble_pdf(pipeline, &faces.double_faced, &options, target.path(true)).await?
        {
            documents.push(doc.path);
        }
        return Ok(documents);
    }

    for &duplex in split.duplex_runs() {
        let options = run_options(sheet, target.footer, duplex, true);
        if let Some(doc) = assemble_pdf(pipeline, cards, &options, target.path(duplex)).await? {
            documents.push(doc.path);
        }
    }
    Ok(documents)
}

/// Run a single deck: deck folder under `request.output_dir`, deck list and
/// every document the split policy asks for.
pub async fn run_deck(
    pipeline: &ImagePipeline,
    deck: &Deck,
    custom_name: Option<&str>,
    request: &JobRequest,
) -> Result<JobReport> {
    request.sheet.validate()?;
    let progress = pipeline.progress();

    let name = resolve_deck_name(deck, custom_name, 1);
    progress.message(format!("Processing deck: {}", name));
    progress.message(format!("Format: {}", request.split.name()));

    let mut report = JobReport::default();
    if deck.cards.is_empty() {
        log::warn!("Deck {} has no cards", name);
    } else {
        let folder = request.output_dir.join(deck_folder_name(&name));
        tokio::fs::create_dir_all(&folder).await?;
        write_deck_list(&deck.cards, folder.join(DECK_LIST_FILE)).await?;

        let base = deck_folder_name(&name);
        let footer = footer_text(&name, deck.metadata.author.as_deref());
        let target = DocumentTarget {
            dir: &folder,
            base: &base,
            footer: &footer,
        };
        report.documents =
            apply_split_policy(pipeline, &deck.cards, request.split, &request.sheet, &target)
                .await?;
    }

    finish_job(pipeline, request, &report).await?;
    Ok(report)
}

/// Run every deck of a batch into `{output_dir}/Batch_{timestamp}`.
///
/// A deck that fails to load or render is reported and skipped. In smart mode
/// the double-faced cards of all decks go into one combined duplex document
/// with a manifest listing which deck each came from.
pub async fn run_batch(
    pipeline: &ImagePipeline,
    decks: &[DeckEntry],
    request: &JobRequest,
) -> Result<JobReport> {
    request.sheet.validate()?;
    let progress = pipeline.progress();

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let batch_dir = request.output_dir.join(format!("Batch_{}", timestamp));
    tokio::fs::create_dir_all(&batch_dir).await?;
    progress.message(format!("Found {} decks in batch file.", decks.len()));

    let mut report = JobReport::default();
    let mut double_faced: Vec<(String, Vec<Card>)> = Vec::new();

    for (index, entry) in decks.iter().enumerate() {
        progress.message(format!(
            "--- Processing Deck {}/{} ---",
            index + 1,
            decks.len()
        ));
        let label = entry
            .custom_name
            .clone()
            .unwrap_or_else(|| entry.provider.describe());

        match run_batch_deck(pipeline, entry, index + 1, &batch_dir, request).await {
            Ok(output) => {
                report.documents.extend(output.documents);
                if let Some(dfcs) = output.double_faced {
                    double_faced.push(dfcs);
                }
            }
            Err(e) => {
                progress.send(ProgressUpdate::DeckFailed {
                    deck: label.clone(),
                    message: e.to_string(),
                });
                report.failed_decks.push((label, e.to_string()));
            }
        }
    }

    if request.split == SplitPolicy::Smart && !double_faced.is_empty() {
        progress.message("--- Generating Combined Double-Sided PDF ---");
        match write_combined_dfc(pipeline, &batch_dir, &double_faced, request).await {
            Ok(Some(path)) => report.documents.push(path),
            Ok(None) => {}
            Err(e) => {
                progress.send(ProgressUpdate::DeckFailed {
                    deck: COMBINED_DFC_LABEL.to_string(),
                    message: e.to_string(),
                });
                report
                    .failed_decks
                    .push((COMBINED_DFC_LABEL.to_string(), e.to_string()));
            }
        }
    }

    finish_job(pipeline, request, &report).await?;
    Ok(report)
}

struct BatchDeckOutput {
    documents: Vec<PathBuf>,
    /// Deck name and its double-faced cards, set in smart mode
    double_faced: Option<(String, Vec<Card>)>,
}

async fn run_batch_deck(
    pipeline: &ImagePipeline,
    entry: &DeckEntry,
    number: usize,
    batch_dir: &Path,
    request: &JobRequest,
) -> Result<BatchDeckOutput> {
    let deck = entry.provider.load().await?;
    let name = resolve_deck_name(&deck, entry.custom_name.as_deref(), number);

    if deck.cards.is_empty() {
        log::warn!("Deck {} has no cards, skipping", name);
        return Ok(BatchDeckOutput {
            documents: Vec::new(),
            double_faced: None,
        });
    }
    pipeline.progress().message(format!("Deck: {}", name));

    let base = deck_folder_name(&name);
    let folder = batch_dir.join(&base);
    tokio::fs::create_dir_all(&folder).await?;
    write_deck_list(&deck.cards, folder.join(DECK_LIST_FILE)).await?;

    let footer = footer_text(&name, deck.metadata.author.as_deref());
    let target = DocumentTarget {
        dir: &folder,
        base: &base,
        footer: &footer,
    };

    if request.split != SplitPolicy::Smart {
        let documents =
            apply_split_policy(pipeline, &deck.cards, request.split, &request.sheet, &target)
                .await?;
        return Ok(BatchDeckOutput {
            documents,
            double_faced: None,
        });
    }

    // Smart: single-faced cards stay with the deck, double-faced ones are
    // collected for the combined document
    let faces = classify(pipeline, &deck.cards).await?;
    let options = run_options(&request.sheet, &footer, false, false);
    let path = target.named(BATCH_STANDARD_SUFFIX);
    let documents = assemble_pdf(pipeline, &faces.single_faced, &options, path)
        .await?
        .map(|doc| vec![doc.path])
        .unwrap_or_default();

    let double_faced = (!faces.double_faced.is_empty()).then(|| (name, faces.double_faced));
    Ok(BatchDeckOutput {
        documents,
        double_faced,
    })
}

/// Manifest and combined duplex document for the double-faced cards of a
/// smart batch
async fn write_combined_dfc(
    pipeline: &ImagePipeline,
    batch_dir: &Path,
    double_faced: &[(String, Vec<Card>)],
    request: &JobRequest,
) -> Result<Option<PathBuf>> {
    tokio::fs::write(
        batch_dir.join(DFC_MANIFEST_FILE),
        format_dfc_manifest(double_faced),
    )
    .await?;

    let cards: Vec<Card> = double_faced
        .iter()
        .flat_map(|(_, cards)| cards.iter().cloned())
        .collect();
    let options = run_options(&request.sheet, COMBINED_DFC_FOOTER, true, true);
    let path = batch_dir.join(format!("{}.pdf", COMBINED_DFC_BASE));
    let doc = assemble_pdf(pipeline, &cards, &options, path).await?;
    Ok(doc.map(|doc| doc.path))
}

/// Manifest of double-faced cards per deck, decks in batch order and cards
/// sorted by name
pub fn format_dfc_manifest(decks: &[(String, Vec<Card>)]) -> String {
    let mut out = String::from("--- Manifest of Double-Faced Cards ---\n\n");
    for (deck, cards) in decks {
        let mut names: Vec<&str> = cards.iter().map(|card| card.name.as_str()).collect();
        names.sort_unstable();
        out.push_str(&format!("=== {} ===\n", deck));
        for name in names {
            out.push_str(&format!("- {}\n", name));
        }
        out.push('\n');
    }
    out
}

async fn finish_job(pipeline: &ImagePipeline, request: &JobRequest, report: &JobReport) -> Result<()> {
    if request.purge_new {
        let purged = pipeline.purge_downloaded().await?;
        if purged > 0 {
            pipeline
                .progress()
                .message(format!("Purged {} newly downloaded files", purged));
        }
    }

    pipeline.progress().send(ProgressUpdate::JobComplete {
        documents: report.documents.len(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeckMetadata;

    #[test]
    fn test_resolve_deck_name() {
        let mut deck = Deck::default();
        assert_eq!(resolve_deck_name(&deck, None, 3), "Deck_3");

        deck.metadata = DeckMetadata {
            name: Some("Elves".to_string()),
            author: None,
        };
        assert_eq!(resolve_deck_name(&deck, None, 3), "Elves");
        assert_eq!(resolve_deck_name(&deck, Some("Mine"), 3), "Mine");
        assert_eq!(resolve_deck_name(&deck, Some("  "), 3), "Elves");
    }

    #[test]
    fn test_footer_and_folder_names() {
        assert_eq!(footer_text("Elves", Some("sam")), "Elves - sam");
        assert_eq!(footer_text("Elves", None), "Elves");
        assert_eq!(deck_folder_name("Elves / Goblins deck"), "Elves___Goblins_deck");
    }

    #[test]
    fn test_run_options_controls_default_back() {
        let sheet = SheetOptions {
            default_back: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        let with_back = run_options(&sheet, "Deck", true, true);
        assert!(with_back.duplex);
        assert_eq!(with_back.footer_text.as_deref(), Some("Deck"));
        assert_eq!(with_back.default_back, Some(vec![1, 2, 3]));

        let without_back = run_options(&sheet, "Deck", false, false);
        assert_eq!(without_back.default_back, None);
    }

    #[test]
    fn test_document_target_paths() {
        let target = DocumentTarget {
            dir: Path::new("out"),
            base: "Elves",
            footer: "Elves",
        };
        assert_eq!(target.path(false), Path::new("out/Elves_Standard.pdf"));
        assert_eq!(target.path(true), Path::new("out/Elves_DoubleSided.pdf"));
        assert_eq!(
            target.named(BATCH_STANDARD_SUFFIX),
            Path::new("out/Elves_Standard_Cards.pdf")
        );
    }

    #[test]
    fn test_dfc_manifest() {
        let decks = vec![
            (
                "Werewolves".to_string(),
                vec![
                    Card::new("Tovolar", "mid", "1"),
                    Card::new("Arlinn", "mid", "2"),
                ],
            ),
            ("Spirits".to_string(), vec![Card::new("Brutal Cathar", "mid", "3")]),
        ];
        assert_eq!(
            format_dfc_manifest(&decks),
            "--- Manifest of Double-Faced Cards ---\n\n\
             === Werewolves ===\n- Arlinn\n- Tovolar\n\n\
             === Spirits ===\n- Brutal Cathar\n\n"
        );
    }
}
