//! JSON shapes exchanged with the aggregation endpoint.

use crate::error::{Error, Result};
use crate::report::types::ReportRow;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct AggResponse {
    data: Vec<WireRow>,
}

#[derive(Debug, Deserialize)]
struct WireRow {
    key: Value,
    #[serde(alias = "doc_count")]
    count: u64,
}

fn key_to_string(key: Value) -> String {
    match key {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decodes `{"data": [{"key": .., "count": ..}, ..]}` keeping backend order.
pub fn decode_rows(body: &[u8]) -> Result<Vec<ReportRow>> {
    let response: AggResponse =
        serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(response
        .data
        .into_iter()
        .map(|row| ReportRow {
            key: key_to_string(row.key),
            count: row.count,
        })
        .collect())
}

/// Best-effort reason from an error body.
///
/// Looks at `error.root_cause[0].reason`, then `error.reason`, then a plain
/// `error` or `message` string. Falls back to the raw text, or `unknown`.
pub fn error_reason(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        let error = &value["error"];
        let candidates = [
            &error["root_cause"][0]["reason"],
            &error["reason"],
            error,
            &value["message"],
        ];
        for candidate in candidates {
            if let Some(reason) = candidate.as_str().filter(|s| !s.is_empty()) {
                return reason.to_string();
            }
        }
        return "unknown".to_string();
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "unknown".to_string()
    } else {
        text.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_preserves_order() {
        let body = br#"{"data":[{"key":"a.com","count":5},{"key":"b.com","count":3}]}"#;
        let rows = decode_rows(body).unwrap();
        assert_eq!(
            rows,
            vec![ReportRow::new("a.com", 5), ReportRow::new("b.com", 3)]
        );
    }

    #[test]
    fn test_decode_non_string_keys_and_doc_count() {
        let body = br#"{"data":[{"key":443,"doc_count":7},{"key":null,"count":1}]}"#;
        let rows = decode_rows(body).unwrap();
        assert_eq!(rows[0], ReportRow::new("443", 7));
        assert_eq!(rows[1], ReportRow::new("", 1));
    }

    #[test]
    fn test_decode_rejects_missing_data() {
        assert!(matches!(decode_rows(b"{}"), Err(Error::Decode(_))));
        assert!(matches!(
            decode_rows(br#"{"data":[{"key":"x","count":-1}]}"#),
            Err(Error::Decode(_))
        ));
        assert!(matches!(decode_rows(b"<html>"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_error_reason_variants() {
        let es = br#"{"error":{"root_cause":[{"type":"x","reason":"no such index"}],"reason":"outer"},"status":404}"#;
        assert_eq!(error_reason(es), "no such index");

        assert_eq!(error_reason(br#"{"error":{"reason":"outer"}}"#), "outer");
        assert_eq!(error_reason(br#"{"error":"bad field"}"#), "bad field");
        assert_eq!(error_reason(br#"{"message":"denied"}"#), "denied");
        assert_eq!(error_reason(br#"{"status":500}"#), "unknown");
        assert_eq!(error_reason(b"  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_reason(b""), "unknown");
    }
}
