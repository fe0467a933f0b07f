//! Card catalog providers
//!
//! A provider turns a deck source (a CSV deck list or an Archidekt deck) into
//! an ordered, quantity-expanded card list plus deck metadata.

use crate::constants::{ARCHIDEKT_API_BASE, UNKNOWN_AUTHOR, UNKNOWN_DECK_NAME};
use crate::types::{Card, Deck, DeckMetadata, Result, SheetError, sort_by_name};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Where the deck comes from, for messages
    fn describe(&self) -> String;

    async fn load(&self) -> Result<Deck>;
}

/// Which optional Archidekt boards to include
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardFilter {
    pub include_maybeboard: bool,
    pub include_sideboard: bool,
}

// =============================================================================
// CSV deck lists
// =============================================================================

#[derive(Debug, Deserialize)]
struct DeckListRow {
    count: u32,
    name: String,
    #[serde(default)]
    set_code: String,
    #[serde(default)]
    collector_number: String,
    #[serde(default)]
    scryfall_id: Option<String>,
    #[serde(default)]
    lang: Option<String>,
}

/// Deck list CSV with a `scryfall_id,count,lang,name,set_code,collector_number`
/// header, columns in any order
#[derive(Debug, Clone)]
pub struct CsvCatalog {
    path: PathBuf,
}

impl CsvCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogProvider for CsvCatalog {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Deck> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let cards = tokio::task::spawn_blocking(move || parse_deck_list(&contents)).await??;
        Ok(Deck {
            cards,
            metadata: DeckMetadata::default(),
        })
    }
}

/// Parse deck list CSV text into expanded, name-sorted cards
pub fn parse_deck_list(contents: &str) -> Result<Vec<Card>> {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let mut cards = Vec::new();

    for result in reader.deserialize() {
        let row: DeckListRow = result?;
        let mut card = Card::new(
            row.name.trim_matches('"'),
            row.set_code,
            row.collector_number,
        );
        card.identifier = row.scryfall_id.filter(|id| !id.is_empty());
        if let Some(lang) = row.lang.filter(|lang| !lang.is_empty()) {
            card.language = lang;
        }
        for _ in 0..row.count {
            cards.push(card.clone());
        }
    }

    sort_by_name(&mut cards);
    Ok(cards)
}

/// Write `cards` as a deck list, collapsing equal cards back into counts.
/// The output can be loaded again with [`CsvCatalog`].
pub async fn write_deck_list(cards: &[Card], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    let cards = cards.to_vec();

    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
        let mut grouped: Vec<(Card, usize)> = Vec::new();
        for card in cards {
            match grouped.iter_mut().find(|(seen, _)| *seen == card) {
                Some((_, count)) => *count += 1,
                None => grouped.push((card, 1)),
            }
        }
        grouped.sort_by_key(|(card, _)| card.name.to_lowercase());

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "scryfall_id",
            "count",
            "lang",
            "name",
            "set_code",
            "collector_number",
        ])?;
        for (card, count) in &grouped {
            let count = count.to_string();
            writer.write_record([
                card.identifier.as_deref().unwrap_or(""),
                count.as_str(),
                card.language.as_str(),
                card.name.as_str(),
                card.set_code.as_str(),
                card.collector_number.as_str(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| SheetError::Io(e.into_error()))
    })
    .await??;

    tokio::fs::write(&path, bytes).await?;
    Ok(())
}

// =============================================================================
// Archidekt
// =============================================================================

#[derive(Debug, Deserialize)]
struct ArchidektDeck {
    name: Option<String>,
    owner: Option<ArchidektOwner>,
    cards: Option<Vec<ArchidektEntry>>,
}

#[derive(Debug, Deserialize)]
struct ArchidektOwner {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArchidektEntry {
    #[serde(default)]
    categories: Option<Vec<String>>,
    quantity: Option<u32>,
    #[serde(default)]
    card: ArchidektCard,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchidektCard {
    #[serde(default)]
    oracle_card: ArchidektOracle,
    #[serde(default)]
    edition: ArchidektEdition,
    collector_number: Option<String>,
    uid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArchidektOracle {
    name: Option<String>,
    lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ArchidektEdition {
    editioncode: Option<String>,
}

/// A deck hosted on Archidekt
#[derive(Debug, Clone)]
pub struct ArchidektCatalog {
    client: reqwest::Client,
    api_base: String,
    deck_id: String,
    boards: BoardFilter,
}

impl ArchidektCatalog {
    pub fn new(client: reqwest::Client, deck_id: impl Into<String>, boards: BoardFilter) -> Self {
        Self {
            client,
            api_base: ARCHIDEKT_API_BASE.to_string(),
            deck_id: deck_id.into(),
            boards,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn deck_id(&self) -> &str {
        &self.deck_id
    }
}

#[async_trait]
impl CatalogProvider for ArchidektCatalog {
    fn describe(&self) -> String {
        format!("Archidekt deck {}", self.deck_id)
    }

    async fn load(&self) -> Result<Deck> {
        let url = format!(
            "{}/decks/{}/",
            self.api_base.trim_end_matches('/'),
            self.deck_id
        );
        log::debug!("Fetching deck {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SheetError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SheetError::Catalog(format!(
                "Failed to fetch deck {} (Status {})",
                self.deck_id,
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SheetError::Http(e.to_string()))?;
        parse_archidekt_deck(&body, self.boards)
            .map_err(|e| SheetError::Catalog(format!("Deck {}: {}", self.deck_id, e)))
    }
}

/// Convert an Archidekt deck JSON document into a [`Deck`]
pub fn parse_archidekt_deck(json: &str, boards: BoardFilter) -> Result<Deck> {
    let deck: ArchidektDeck = serde_json::from_str(json)?;
    let entries = deck
        .cards
        .ok_or_else(|| SheetError::Catalog("Unexpected API response: no cards".to_string()))?;

    let mut cards = Vec::new();
    for entry in entries {
        let categories = entry.categories.unwrap_or_default();
        let in_category = |name: &str| categories.iter().any(|c| c == name);
        if in_category("Maybeboard") && !boards.include_maybeboard {
            continue;
        }
        if in_category("Sideboard") && !boards.include_sideboard {
            continue;
        }

        let ArchidektCard {
            oracle_card,
            edition,
            collector_number,
            uid,
        } = entry.card;
        let Some(name) = oracle_card.name.filter(|n| !n.is_empty()) else {
            continue;
        };

        let mut card = Card::new(
            name,
            edition.editioncode.unwrap_or_default().to_lowercase(),
            collector_number.unwrap_or_default(),
        );
        card.identifier = uid.filter(|id| !id.is_empty());
        if let Some(lang) = oracle_card.lang {
            card.language = lang;
        }

        for _ in 0..entry.quantity.unwrap_or(1) {
            cards.push(card.clone());
        }
    }

    if cards.is_empty() {
        log::warn!("No cards found in deck {}", deck.name.as_deref().unwrap_or("?"));
    }
    sort_by_name(&mut cards);

    Ok(Deck {
        cards,
        metadata: DeckMetadata {
            name: Some(deck.name.unwrap_or_else(|| UNKNOWN_DECK_NAME.to_string())),
            author: Some(
                deck.owner
                    .and_then(|owner| owner.username)
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            ),
        },
    })
}

// =============================================================================
// Deck sources
// =============================================================================

/// A deck reference as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckSource {
    Csv(PathBuf),
    Archidekt { deck_id: String },
}

impl DeckSource {
    /// `http…` inputs must be Archidekt deck URLs; anything else is a CSV path
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if !input.starts_with("http") {
            return Ok(DeckSource::Csv(PathBuf::from(input)));
        }

        archidekt_deck_id(input)
            .map(|deck_id| DeckSource::Archidekt { deck_id })
            .ok_or_else(|| SheetError::Catalog(format!("Invalid Archidekt URL: {}", input)))
    }

    pub fn into_provider(
        self,
        client: &reqwest::Client,
        boards: BoardFilter,
    ) -> Arc<dyn CatalogProvider> {
        match self {
            DeckSource::Csv(path) => Arc::new(CsvCatalog::new(path)),
            DeckSource::Archidekt { deck_id } => {
                Arc::new(ArchidektCatalog::new(client.clone(), deck_id, boards))
            }
        }
    }
}

/// The numeric id following `/decks/` in a URL
fn archidekt_deck_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/decks/")?;
    let id: String = rest.chars().take_while(char::is_ascii_digit).collect();
    (!id.is_empty()).then_some(id)
}

/// One line of a batch file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchLine {
    pub source: String,
    pub custom_name: Option<String>,
}

/// Parse batch file text: one `source | optional name` per line. Blank lines
/// and lines starting with `#` are skipped.
pub fn parse_batch_file(text: &str) -> Vec<BatchLine> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split('|');
            let source = parts.next()?.trim();
            let custom_name = parts
                .next()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            (!source.is_empty()).then(|| BatchLine {
                source: source.to_string(),
                custom_name,
            })
        })
        .collect()
}

pub async fn read_batch_file(path: impl AsRef<Path>) -> Result<Vec<BatchLine>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_batch_file(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARCHIDEKT_JSON: &str = r#"{
        "name": "Spirit Squadron",
        "owner": { "username": "deckbuilder" },
        "cards": [
            {
                "categories": ["Commander"],
                "quantity": 1,
                "card": {
                    "uid": "aaa",
                    "collectorNumber": "12",
                    "edition": { "editioncode": "NEO" },
                    "oracleCard": { "name": "Zephyr Spirit", "lang": "en" }
                }
            },
            {
                "categories": null,
                "quantity": 3,
                "card": {
                    "uid": "bbb",
                    "collectorNumber": "274",
                    "edition": { "editioncode": "M21" },
                    "oracleCard": { "name": "Island" }
                }
            },
            {
                "categories": ["Maybeboard"],
                "quantity": 1,
                "card": {
                    "uid": "ccc",
                    "edition": { "editioncode": "ONE" },
                    "oracleCard": { "name": "Maybe Card" }
                }
            },
            {
                "categories": ["Sideboard"],
                "quantity": 2,
                "card": {
                    "uid": "ddd",
                    "edition": { "editioncode": "ONE" },
                    "oracleCard": { "name": "Side Card" }
                }
            },
            {
                "quantity": 1,
                "card": { "uid": "eee", "oracleCard": {} }
            }
        ]
    }"#;

    #[test]
    fn test_parse_archidekt_deck() {
        let deck = parse_archidekt_deck(ARCHIDEKT_JSON, BoardFilter::default()).unwrap();

        let names: Vec<_> = deck.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Island", "Island", "Island", "Zephyr Spirit"]);
        assert_eq!(deck.cards[0].set_code, "m21");
        assert_eq!(deck.cards[0].identifier.as_deref(), Some("bbb"));
        assert_eq!(deck.cards[3].collector_number, "12");
        assert_eq!(deck.metadata.name.as_deref(), Some("Spirit Squadron"));
        assert_eq!(deck.metadata.author.as_deref(), Some("deckbuilder"));
    }

    #[test]
    fn test_archidekt_boards_can_be_included() {
        let boards = BoardFilter {
            include_maybeboard: true,
            include_sideboard: true,
        };
        let deck = parse_archidekt_deck(ARCHIDEKT_JSON, boards).unwrap();
        assert_eq!(deck.cards.len(), 7);
    }

    #[test]
    fn test_archidekt_defaults_and_errors() {
        let deck = parse_archidekt_deck(r#"{ "cards": [] }"#, BoardFilter::default()).unwrap();
        assert_eq!(deck.metadata.name.as_deref(), Some(UNKNOWN_DECK_NAME));
        assert_eq!(deck.metadata.author.as_deref(), Some(UNKNOWN_AUTHOR));

        let missing = parse_archidekt_deck(r#"{ "name": "x" }"#, BoardFilter::default());
        assert!(matches!(missing, Err(SheetError::Catalog(_))));
    }

    #[test]
    fn test_parse_deck_list() {
        let csv = "count,name,set_code,collector_number,scryfall_id,lang\n\
                   2,\"\"\"Quoted\"\" Card\",neo,5,id-1,en\n\
                   1,Anger,m21,1,id-2,\n";
        let cards = parse_deck_list(csv).unwrap();

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].name, "Anger");
        assert_eq!(cards[0].language, "en");
        assert_eq!(cards[1].name, "Quoted\" Card");
        assert_eq!(cards[1].identifier.as_deref(), Some("id-1"));
    }

    #[test]
    fn test_deck_list_columns_in_any_order() {
        let csv = "scryfall_id,count,lang,name,set_code,collector_number\n\
                   id-9,1,ja,Forest,m21,274\n";
        let cards = parse_deck_list(csv).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].language, "ja");
        assert_eq!(cards[0].collector_number, "274");
    }

    #[tokio::test]
    async fn test_deck_list_round_trips_through_csv_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck_list.csv");
        let mut cards = vec![Card::new("Island", "m21", "274").with_identifier("i"); 4];
        cards.push(Card::new("Anger", "m21", "1").with_identifier("a"));

        write_deck_list(&cards, &path).await.unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.starts_with("scryfall_id,count,lang,name,set_code,collector_number"));
        assert!(text.contains("i,4,en,Island,m21,274"));

        let deck = CsvCatalog::new(&path).load().await.unwrap();
        assert_eq!(deck.cards.len(), 5);
        assert_eq!(deck.cards[0].name, "Anger");
        assert_eq!(deck.metadata, DeckMetadata::default());
    }

    #[test]
    fn test_deck_source_parse() {
        assert_eq!(
            DeckSource::parse("https://archidekt.com/decks/123456/my_deck").unwrap(),
            DeckSource::Archidekt {
                deck_id: "123456".to_string()
            }
        );
        assert_eq!(
            DeckSource::parse("decks/list.csv").unwrap(),
            DeckSource::Csv(PathBuf::from("decks/list.csv"))
        );
        assert!(DeckSource::parse("https://example.com/nothing").is_err());
    }

    #[test]
    fn test_parse_batch_file() {
        let text = "# my decks\n\
                    https://archidekt.com/decks/1/a | First Deck\n\
                    \n\
                    https://archidekt.com/decks/2/b\n\
                    https://archidekt.com/decks/3/c |  \n";
        let lines = parse_batch_file(text);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].custom_name.as_deref(), Some("First Deck"));
        assert_eq!(lines[1].source, "https://archidekt.com/decks/2/b");
        assert_eq!(lines[1].custom_name, None);
        assert_eq!(lines[2].custom_name, None);
    }
}
