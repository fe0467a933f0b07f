use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Image error: {0}")]
    Image(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Cannot build {face} image URL without an identifier for {name}")]
    MissingIdentifier { name: String, face: Face },
    #[error("Catalog error: {0}")]
    Catalog(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// Which printable face of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
}

impl Face {
    pub fn is_back(self) -> bool {
        matches!(self, Face::Back)
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
        }
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One physical card. A deck holding four copies of a card contains four
/// equal `Card` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Card {
    /// Source image identifier (a Scryfall id)
    pub identifier: Option<String>,
    pub language: String,
    pub name: String,
    pub set_code: String,
    pub collector_number: String,
}

impl Card {
    pub fn new(
        name: impl Into<String>,
        set_code: impl Into<String>,
        collector_number: impl Into<String>,
    ) -> Self {
        Self {
            identifier: None,
            language: "en".to_string(),
            name: name.into(),
            set_code: set_code.into(),
            collector_number: collector_number.into(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

/// Sort cards for display and export: case-insensitive by name.
/// The sort is stable, so equal names keep their relative order.
pub fn sort_by_name(cards: &mut [Card]) {
    cards.sort_by_key(|card| card.name.to_lowercase());
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckMetadata {
    pub name: Option<String>,
    pub author: Option<String>,
}

/// A resolved card catalog: the ordered, quantity-expanded card list plus metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    pub cards: Vec<Card>,
    pub metadata: DeckMetadata,
}
