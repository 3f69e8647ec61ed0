use super::client::ApiClient;
use super::types::ProcessedResult;
use crate::encode::TempImage;
use anyhow::{Context, Result};
use reqwest::multipart;

const UPLOAD_PATH: &str = "/upload";

/// Post one captured image to the decoding service.
///
/// The body is multipart form data with a single `file` field. Any failure
/// (connect error, non-2xx status, undecodable body) is logged here and
/// propagated; there is no partial result.
pub async fn upload_image(client: &ApiClient, image: &TempImage) -> Result<ProcessedResult> {
    tracing::info!("Uploading {} ({} bytes)", image.name, image.bytes.len());

    let part = multipart::Part::bytes(image.bytes.clone())
        .file_name(image.name.clone())
        .mime_str("image/jpeg")
        .context("Failed to build image form part")?;
    let form = multipart::Form::new().part("file", part);

    let result = send(client, form).await;
    if let Err(e) = &result {
        tracing::error!("Error uploading image: {:#}", e);
    }
    result
}

async fn send(client: &ApiClient, form: multipart::Form) -> Result<ProcessedResult> {
    let response = client
        .post_multipart(UPLOAD_PATH, form)
        .await?
        .error_for_status()
        .context("Decoding service rejected the upload")?;

    let result = response
        .json::<ProcessedResult>()
        .await
        .context("Failed to decode service response")?;

    tracing::info!(
        "Upload processed: found={}, {} barcode(s)",
        result.found,
        result.barcodes.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::CredentialProvider;
    use crate::api::testserver;
    use std::sync::Arc;
    use std::time::Duration;

    struct NoToken;

    impl CredentialProvider for NoToken {
        fn token(&self) -> Option<String> {
            None
        }
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(10), Arc::new(NoToken)).unwrap()
    }

    fn staged_image() -> TempImage {
        TempImage {
            name: "barcode-capture-1700000000000-1.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
        }
    }

    #[tokio::test]
    async fn decodes_successful_response() {
        let body = r#"{
            "message": "ok",
            "processed_image": "aGVsbG8=",
            "barcodes": [{"type": "EAN13", "data": "012345678905"}],
            "found": true
        }"#;
        let (base_url, request_rx) = testserver::serve_once("200 OK", body).await;

        let result = upload_image(&client(&base_url), &staged_image())
            .await
            .unwrap();
        assert!(result.found);
        assert_eq!(result.barcodes[0].kind, "EAN13");
        assert_eq!(result.barcodes[0].data, "012345678905");

        // One multipart file field carrying the staged JPEG
        let request = request_rx.await.unwrap();
        assert!(request.contains("name=\"file\""));
        assert!(request.contains("barcode-capture-1700000000000-1.jpg"));
        assert!(request.to_lowercase().contains("content-type: image/jpeg"));
    }

    #[tokio::test]
    async fn not_found_response_is_success_not_error() {
        let (base_url, _rx) =
            testserver::serve_once("200 OK", r#"{"found": false, "barcodes": []}"#).await;

        let result = upload_image(&client(&base_url), &staged_image())
            .await
            .unwrap();
        assert!(!result.found);
        assert!(result.barcodes.is_empty());
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let (base_url, _rx) =
            testserver::serve_once("500 Internal Server Error", r#"{"detail": "boom"}"#).await;

        assert!(upload_image(&client(&base_url), &staged_image()).await.is_err());
    }

    #[tokio::test]
    async fn malformed_body_propagates() {
        let (base_url, _rx) = testserver::serve_once("200 OK", "not json").await;

        assert!(upload_image(&client(&base_url), &staged_image()).await.is_err());
    }
}
