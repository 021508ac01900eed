//! JSON responses for the control endpoint.

use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use tiny_http::{Header, Request, Response, StatusCode};

use crate::build::BatchReport;

const JSON: &str = "application/json";

pub fn respond_json<T: Serialize>(request: Request, status: u16, body: &T) -> Result<()> {
    let body = serde_json::to_vec(body)?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(json_header());
    request.respond(response)?;
    Ok(())
}

pub fn respond_accepted(request: Request) -> Result<()> {
    respond_json(request, 202, &json!({ "accepted": true }))
}

pub fn respond_error(request: Request, status: u16, message: &str) -> Result<()> {
    respond_json(request, status, &json!({ "error": message }))
}

pub fn respond_unavailable(request: Request) -> Result<()> {
    respond_error(request, 503, "shutting down")
}

/// Serializable view of a batch.
pub fn report_body(report: &BatchReport) -> serde_json::Value {
    json!({
        "built": report.built,
        "installed": report.installed,
        "retained": report.retained,
        "retired": report.retired,
        "failed": report
            .failed
            .iter()
            .map(|(source, error)| json!({ "source": source, "error": error }))
            .collect::<Vec<_>>(),
        "aborted": report
            .aborted
            .iter()
            .map(|(source, glyphs)| json!({ "source": source, "glyphs": glyphs }))
            .collect::<Vec<_>>(),
        "summary": report.summary(),
    })
}

fn json_header() -> Header {
    // Static ASCII: cannot fail.
    Header::from_bytes("Content-Type", JSON).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceId;
    use std::path::PathBuf;

    #[test]
    fn test_report_body() {
        let id = SourceId::from_normalized(PathBuf::from("/fonts/Fam.designspace"));
        let report = BatchReport {
            built: vec![SourceId::from_normalized(PathBuf::from("/fonts/A.ufo"))],
            installed: 1,
            aborted: vec![(id, vec!["a".into()])],
            ..BatchReport::default()
        };

        let body = report_body(&report);
        assert_eq!(body["built"][0], "/fonts/A.ufo");
        assert_eq!(body["installed"], 1);
        assert_eq!(body["aborted"][0]["source"], "/fonts/Fam.designspace");
        assert_eq!(body["aborted"][0]["glyphs"][0], "a");
        assert!(body["failed"].as_array().unwrap().is_empty());
    }
}
