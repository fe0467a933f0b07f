//! Progress reporting
//!
//! Updates are human-readable status lines delivered over an optional
//! channel. Every update is also written to the `log` facade.

use crate::layout::SheetSide;
use crate::types::Face;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    Message(String),
    /// A fetch batch started; `total` is the number of distinct images
    FetchStarted { face: Face, total: usize },
    Fetch {
        face: Face,
        completed: usize,
        total: usize,
    },
    Classified {
        single_faced: usize,
        double_faced: usize,
    },
    DocumentStarted { name: String },
    Page {
        current: usize,
        total: usize,
        side: SheetSide,
    },
    DocumentComplete { path: PathBuf, pages: usize },
    DeckFailed { deck: String, message: String },
    JobComplete { documents: usize },
}

fn fetch_label(face: Face) -> &'static str {
    match face {
        Face::Front => "Downloading fronts",
        Face::Back => "Downloading backs",
    }
}

impl std::fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressUpdate::Message(message) => f.write_str(message),
            ProgressUpdate::FetchStarted { face, total } => {
                write!(f, "{}: Checking {} images...", fetch_label(*face), total)
            }
            ProgressUpdate::Fetch {
                face,
                completed,
                total,
            } => write!(f, "{}: {}/{}", fetch_label(*face), completed, total),
            ProgressUpdate::Classified {
                single_faced,
                double_faced,
            } => write!(
                f,
                "Single-faced cards: {}, double-faced cards: {}",
                single_faced, double_faced
            ),
            ProgressUpdate::DocumentStarted { name } => write!(f, "Building PDF: {}...", name),
            ProgressUpdate::Page {
                current,
                total,
                side,
            } => match side {
                SheetSide::Single => write!(f, "Generating page {}/{}...", current, total),
                SheetSide::Front => write!(f, "Generating page {}/{} (Fronts)...", current, total),
                SheetSide::Back => write!(f, "Generating page {}/{} (Backs)...", current, total),
            },
            ProgressUpdate::DocumentComplete { path, pages } => {
                write!(f, "Saved {} ({} pages)", path.display(), pages)
            }
            ProgressUpdate::DeckFailed { deck, message } => {
                write!(f, "Error processing deck {}: {}", deck, message)
            }
            ProgressUpdate::JobComplete { documents } => {
                write!(f, "Job complete! Generated {} files.", documents)
            }
        }
    }
}

/// Where progress updates go. Cloning shares the same channel.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressUpdate>>,
}

impl ProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink that only logs
    pub fn silent() -> Self {
        Self { tx: None }
    }

    /// Create a sink together with the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, update: ProgressUpdate) {
        match &update {
            ProgressUpdate::DeckFailed { .. } => log::error!("{}", update),
            _ => log::info!("{}", update),
        }
        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is listening any more
            let _ = tx.send(update);
        }
    }

    pub fn message(&self, message: impl Into<String>) {
        self.send(ProgressUpdate::Message(message.into()));
    }
}
