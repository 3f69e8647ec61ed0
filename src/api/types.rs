use serde::{Deserialize, Serialize};

/// One decoded barcode as reported by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: String,
}

/// Response body of the decoding service for one uploaded image
///
/// Fields are passed through as received; the `found == false` response omits
/// the annotated image, so everything defaults rather than failing to parse.
/// Barcode order is the service-reported order and entries need not be unique.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessedResult {
    #[serde(default)]
    pub message: String,
    /// Base64-encoded annotated JPEG
    #[serde(default)]
    pub processed_image: String,
    #[serde(default)]
    pub barcodes: Vec<BarcodeInfo>,
    #[serde(default)]
    pub found: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_response() {
        let body = r#"{
            "message": "ok",
            "processed_image": "aGVsbG8=",
            "barcodes": [{"type": "EAN13", "data": "012345678905"}],
            "found": true
        }"#;

        let result: ProcessedResult = serde_json::from_str(body).unwrap();
        assert!(result.found);
        assert_eq!(result.message, "ok");
        assert_eq!(result.barcodes.len(), 1);
        assert_eq!(result.barcodes[0].kind, "EAN13");
        assert_eq!(result.barcodes[0].data, "012345678905");
    }

    #[test]
    fn parses_not_found_response_with_missing_fields() {
        let result: ProcessedResult =
            serde_json::from_str(r#"{"found": false, "barcodes": []}"#).unwrap();
        assert!(!result.found);
        assert!(result.barcodes.is_empty());
        assert!(result.message.is_empty());
        assert!(result.processed_image.is_empty());
    }

    #[test]
    fn preserves_barcode_order_and_duplicates() {
        let body = r#"{
            "found": true,
            "barcodes": [
                {"type": "QRCODE", "data": "x"},
                {"type": "EAN13", "data": "012345678905"},
                {"type": "QRCODE", "data": "x"}
            ]
        }"#;

        let result: ProcessedResult = serde_json::from_str(body).unwrap();
        let kinds: Vec<&str> = result.barcodes.iter().map(|b| b.kind.as_str()).collect();
        assert_eq!(kinds, ["QRCODE", "EAN13", "QRCODE"]);
        assert_eq!(result.barcodes[0], result.barcodes[2]);
    }
}
