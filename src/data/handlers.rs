use axum::{
    body::Bytes,
    extract::{Query, State},
    http::HeaderMap,
    response::Html,
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::data::query::TableQuery;
use crate::error::AppError;
use crate::http::request::is_json;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::storage::DataRecord;
use crate::views::{no_data_page, table_page};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
    pub total: usize,
}

/// Accept only a JSON array whose elements are all objects.
pub fn parse_records(headers: &HeaderMap, body: &[u8]) -> Result<Vec<DataRecord>, AppError> {
    if !is_json(headers) {
        return Err(AppError::Validation("request body must be JSON".into()));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid JSON: {}", e)))?;

    let Value::Array(items) = value else {
        return Err(AppError::Validation("payload must be a list of objects".into()));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(record) => Ok(record),
            _ => Err(AppError::Validation("payload must be a list of objects".into())),
        })
        .collect()
}

/// POST /data - replace the whole record set.
pub async fn ingest(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, AppError> {
    let records = parse_records(&headers, &body)?;
    let total = state.records.replace_all(records).await?;

    tracing::info!(total, "Record set replaced");
    metrics::record_ingest(total);

    Ok(Json(IngestResponse {
        message: "data replaced",
        total,
    }))
}

/// GET / - render the stored records, searched, filtered and sorted per the query string.
pub async fn show_table(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    if !state.records.has_any().await? {
        return Ok(Html(no_data_page(&user.username)));
    }
    let records = state.records.read_all().await?;
    let query = TableQuery::from_pairs(pairs);
    Ok(Html(table_page(&records, &query, &user.username)))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn reason(result: Result<Vec<DataRecord>, AppError>) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn test_accepts_list_of_objects() {
        let records = parse_records(&json_headers(), br#"[{"name":"Ana","age":25},{}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Ana");
        assert!(parse_records(&json_headers(), b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        for body in [&br#"{"name":"Ana"}"#[..], b"[1,2]", br#"[{"a":1},"x"]"#, b"null"] {
            assert_eq!(reason(parse_records(&json_headers(), body)), "payload must be a list of objects");
        }
        assert!(reason(parse_records(&json_headers(), b"[{")).starts_with("invalid JSON"));
    }

    #[test]
    fn test_requires_json_content_type() {
        assert_eq!(
            reason(parse_records(&HeaderMap::new(), b"[]")),
            "request body must be JSON"
        );
    }
}
