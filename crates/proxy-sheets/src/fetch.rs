//! Network access to the card image source

use crate::options::FetchOptions;
use crate::types::{Card, Face, Result, SheetError};
use async_trait::async_trait;
use std::time::Duration;

/// The status the image source uses for "this face does not exist"
pub const STATUS_UNPROCESSABLE: u16 = 422;

pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Build the image URL for one face of a card.
///
/// Fails when the card carries no identifier, which means the catalog data
/// is malformed.
pub fn image_url(card: &Card, face: Face, options: &FetchOptions) -> Result<String> {
    let identifier = card
        .identifier
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| SheetError::MissingIdentifier {
            name: card.name.clone(),
            face,
        })?;

    let mut url = format!(
        "{}/cards/{}?format=image&version={}",
        options.api_base.trim_end_matches('/'),
        identifier,
        options.image_version
    );
    if face.is_back() {
        url.push_str("&face=back");
    }
    Ok(url)
}

/// Raw answer from the image source
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues a single GET for an image URL.
///
/// `Err` is a transport failure (connection, timeout, body read); any HTTP
/// status, success or not, comes back as `Ok`.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchResponse, String>;
}

/// HTTP fetcher for the Scryfall image endpoint
#[derive(Debug, Clone)]
pub struct ScryfallFetcher {
    client: reqwest::Client,
}

impl ScryfallFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("proxy-sheets/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SheetError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// The underlying client, for other requests that should share its settings
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl ImageFetcher for ScryfallFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchResponse, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_url() {
        let card = Card::new("Forest", "m21", "274").with_identifier("abc-123");
        let url = image_url(&card, Face::Front, &FetchOptions::default()).unwrap();
        assert_eq!(
            url,
            "https://api.scryfall.com/cards/abc-123?format=image&version=png"
        );
    }

    #[test]
    fn test_back_url_has_face_parameter() {
        let card = Card::new("Forest", "m21", "274").with_identifier("abc-123");
        let url = image_url(&card, Face::Back, &FetchOptions::default()).unwrap();
        assert!(url.ends_with("&face=back"));
    }

    #[test]
    fn test_missing_identifier() {
        let card = Card::new("Forest", "m21", "274");
        let result = image_url(&card, Face::Front, &FetchOptions::default());
        match result {
            Err(SheetError::MissingIdentifier { name, face }) => {
                assert_eq!(name, "Forest");
                assert_eq!(face, Face::Front);
            }
            _ => panic!("Expected MissingIdentifier error"),
        }
    }
}
