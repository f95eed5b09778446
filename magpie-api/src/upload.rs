use chrono::Utc;
use rand::Rng;
use std::path::Path;
use thiserror::Error;

use magpie_store::app_config::UploadsConfig;

pub const SCREENSHOT_FIELD: &str = "paymentScreenshot";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files are allowed, got `{0}`")]
    NotAnImage(String),
    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// `paymentScreenshot-<millis>-<9 digits><ext>`, keeping the client's
/// extension.
pub fn screenshot_file_name(original: Option<&str>) -> String {
    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    let suffix: u32 = rand::thread_rng().gen_range(100_000_000..1_000_000_000);
    format!(
        "{}-{}-{}{}",
        SCREENSHOT_FIELD,
        Utc::now().timestamp_millis(),
        suffix,
        ext
    )
}

pub fn check_screenshot(config: &UploadsConfig, content_type: Option<&str>, len: usize) -> Result<(), UploadError> {
    let content_type = content_type.unwrap_or_default();
    if !content_type.starts_with("image/") {
        return Err(UploadError::NotAnImage(content_type.to_string()));
    }
    if len > config.max_bytes {
        return Err(UploadError::TooLarge {
            limit: config.max_bytes,
        });
    }
    Ok(())
}

/// Stores a payment screenshot and returns its public path.
pub async fn store_screenshot(
    config: &UploadsConfig,
    original_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, UploadError> {
    check_screenshot(config, content_type, bytes.len())?;

    let file_name = screenshot_file_name(original_name);
    tokio::fs::create_dir_all(&config.dir).await?;
    tokio::fs::write(config.dir.join(&file_name), bytes).await?;

    tracing::info!("Stored payment screenshot {} ({} bytes)", file_name, bytes.len());
    Ok(public_path(config, &file_name))
}

/// Best effort removal of a screenshot whose submission was rejected.
pub async fn discard_screenshot(config: &UploadsConfig, public: &str) {
    let Some(file_name) = public.rsplit('/').next() else {
        return;
    };
    if let Err(err) = tokio::fs::remove_file(config.dir.join(file_name)).await {
        tracing::warn!("Could not remove rejected screenshot {}: {}", file_name, err);
    }
}

fn public_path(config: &UploadsConfig, file_name: &str) -> String {
    format!("{}/{}", config.public_prefix.trim_end_matches('/'), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &Path) -> UploadsConfig {
        UploadsConfig {
            dir: dir.to_path_buf(),
            max_bytes: 16,
            public_prefix: "/uploads/".into(),
        }
    }

    #[test]
    fn test_file_name_shape() {
        let name = screenshot_file_name(Some("receipt.PNG"));
        assert!(name.starts_with("paymentScreenshot-"));
        assert!(name.ends_with(".png"));
        let parts: Vec<&str> = name.trim_end_matches(".png").split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 9);

        assert!(!screenshot_file_name(None).contains('.'));
    }

    #[tokio::test]
    async fn test_store_and_reject() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let url = store_screenshot(&config, Some("proof.jpg"), Some("image/jpeg"), b"jpegbytes")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/paymentScreenshot-"));
        let stored = dir.path().join(url.trim_start_matches("/uploads/"));
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"jpegbytes");

        let err = store_screenshot(&config, Some("notes.txt"), Some("text/plain"), b"hi")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotAnImage(_)));

        let err = store_screenshot(&config, Some("big.png"), Some("image/png"), &[0u8; 17])
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { limit: 16 }));

        discard_screenshot(&config, &url).await;
        assert!(!stored.exists());
    }
}
