use super::extract::ImageReference;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresenterError {
    #[error("download failed: {0}")]
    Http(String),
    #[error("invalid data URI: {0}")]
    Decode(String),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What came out of exporting a batch of references. A failed
/// reference never aborts the rest.
#[derive(Debug, Default)]
pub struct ExportOutcome {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(ImageReference, String)>,
}

/// Resolve one reference to raw image bytes: embedded data URIs are
/// decoded locally, anything else is fetched over HTTP.
pub async fn fetch_reference_bytes(reference: &ImageReference) -> Result<Vec<u8>, PresenterError> {
    if reference.is_data_uri() {
        return decode_data_uri(reference.as_str());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PresenterError::Http(e.to_string()))?;

    let response = client
        .get(reference.as_str())
        .send()
        .await
        .map_err(|e| PresenterError::Http(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PresenterError::Http(format!(
            "status {} fetching {}",
            response.status(),
            reference
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PresenterError::Http(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Download every reference into `out_dir` as `design_<n>.png`,
/// logging and skipping the ones that fail.
pub async fn export_references(
    references: &[ImageReference],
    out_dir: &Path,
) -> Result<ExportOutcome, PresenterError> {
    std::fs::create_dir_all(out_dir)?;

    let fetches = futures::future::join_all(references.iter().map(fetch_reference_bytes)).await;

    let mut outcome = ExportOutcome::default();
    for (index, (reference, fetched)) in references.iter().zip(fetches).enumerate() {
        match fetched {
            Ok(bytes) => {
                let path = out_dir.join(format!("design_{}.png", index + 1));
                std::fs::write(&path, bytes)?;
                log::info!("Saved {}", path.display());
                outcome.saved.push(path);
            }
            Err(e) => {
                log::error!("Skipping image {}: {}", index + 1, e);
                outcome.failed.push((reference.clone(), e.to_string()));
            }
        }
    }
    Ok(outcome)
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>, PresenterError> {
    let payload = uri
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| PresenterError::Decode("missing base64 payload".into()))?;

    BASE64
        .decode(payload)
        .map_err(|e| PresenterError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_uri(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    #[tokio::test]
    async fn data_uris_decode_locally() {
        let reference = ImageReference(data_uri(b"fake png bytes"));
        let bytes = fetch_reference_bytes(&reference).await.unwrap();
        assert_eq!(bytes, b"fake png bytes");
    }

    #[tokio::test]
    async fn malformed_data_uri_is_a_decode_error() {
        let reference = ImageReference("data:image/png,not-base64".into());
        let err = fetch_reference_bytes(&reference).await.unwrap_err();
        assert!(matches!(err, PresenterError::Decode(_)));
    }

    #[tokio::test]
    async fn export_isolates_per_reference_failures() {
        let dir = tempfile::tempdir().unwrap();
        let references = vec![
            ImageReference(data_uri(b"first")),
            ImageReference("data:image/png,broken".into()),
            ImageReference(data_uri(b"third")),
        ];

        let outcome = export_references(&references, dir.path()).await.unwrap();

        assert_eq!(outcome.saved.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(
            std::fs::read(dir.path().join("design_1.png")).unwrap(),
            b"first"
        );
        assert_eq!(
            std::fs::read(dir.path().join("design_3.png")).unwrap(),
            b"third"
        );
        assert!(!dir.path().join("design_2.png").exists());
    }
}
