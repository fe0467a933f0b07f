use crate::constants::DEFAULT_BACK_SIZE_PX;
use crate::types::{Result, SheetError};
use image::ImageFormat;
use image::imageops::FilterType;
use std::io::Cursor;
use std::path::Path;

/// Load the default-back image, resized to card proportions and re-encoded as
/// PNG. Bytes that cannot be decoded are passed through unchanged.
pub async fn load_default_back(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref().to_owned();

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SheetError::Config(format!(
                "Default back image not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let normalized = tokio::task::spawn_blocking(move || match normalize(&bytes) {
        Ok(png) => png,
        Err(e) => {
            log::warn!("Could not resize default back image, using it as is: {}", e);
            bytes
        }
    })
    .await?;

    Ok(normalized)
}

fn normalize(bytes: &[u8]) -> Result<Vec<u8>> {
    let (width, height) = DEFAULT_BACK_SIZE_PX;
    let image = image::load_from_memory(bytes).map_err(|e| SheetError::Image(e.to_string()))?;
    let resized = image.resize_exact(width, height, FilterType::Lanczos3);

    let mut png = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| SheetError::Image(e.to_string()))?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_default_back_is_resized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("back.png");
        tokio::fs::write(&path, png(30, 40)).await.unwrap();

        let bytes = load_default_back(&path).await.unwrap();
        let image = image::load_from_memory(&bytes).unwrap();

        assert_eq!(image.dimensions(), DEFAULT_BACK_SIZE_PX);
    }

    #[tokio::test]
    async fn test_undecodable_back_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("back.png");
        tokio::fs::write(&path, b"not an image").await.unwrap();

        let bytes = load_default_back(&path).await.unwrap();

        assert_eq!(bytes, b"not an image");
    }

    #[tokio::test]
    async fn test_missing_back_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_default_back(dir.path().join("missing.png")).await;
        assert!(matches!(result, Err(SheetError::Config(_))));
    }
}
