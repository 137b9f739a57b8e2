use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One stored embedding, as returned by a get call. Fields the server did not
/// return (or returned null for) are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: String,
    pub embeddings: Option<Vec<f64>>,
    pub metadata: Option<HashMap<String, String>>,
    pub document: Option<String>,
}

/// Result of one submitted query vector: parallel arrays indexed by result
/// rank. Index `i` across ids/embeddings/metadatas/documents/distances refers
/// to the same matched item. A field the server returned as null for the
/// whole query is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<String>,
    pub embeddings: Option<Vec<Vec<f64>>>,
    pub metadatas: Option<Vec<HashMap<String, String>>>,
    pub documents: Option<Vec<String>>,
    pub distances: Option<Vec<f64>>,
}

/// Identity of the authenticated caller, from `/auth/identity`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserIdentity {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub tenant: String,
    #[serde(default)]
    pub databases: Vec<String>,
}

/// Body of an add/update/upsert call. `metadatas`/`documents` are omitted
/// entirely when empty so the server never sees a misleading empty array
/// where "absent" is meant.
#[derive(Debug, Serialize)]
pub(crate) struct EmbeddingsPayload {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadatas: Vec<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetPayload {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Value>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletePayload {
    pub ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Value>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryPayload {
    pub query_embeddings: Vec<Vec<f64>>,
    pub n_results: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Value>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_metadata: Option<Value>,
}

fn field_entry<'a>(response: &'a Value, field: &str, index: usize) -> Option<&'a Value> {
    let entry = response.get(field)?.as_array()?.get(index)?;
    if entry.is_null() {
        return None;
    }
    Some(entry)
}

pub(crate) fn string_map(value: &Value) -> HashMap<String, String> {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

/// Reshapes a get response's parallel arrays into one record per id.
pub(crate) fn embedding_records_from_response(response: &Value) -> Vec<EmbeddingRecord> {
    let ids = match response.get("ids").and_then(Value::as_array) {
        Some(ids) => ids,
        None => return Vec::new(),
    };

    ids.iter()
        .enumerate()
        .map(|(i, id)| EmbeddingRecord {
            id: id.as_str().unwrap_or_default().to_string(),
            embeddings: field_entry(response, "embeddings", i)
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            metadata: field_entry(response, "metadatas", i).map(string_map),
            document: field_entry(response, "documents", i)
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect()
}

/// Transposes a query response (one array-of-arrays per field, outer index =
/// query index) into one `QueryResult` per query. A top-level null field is
/// absent for the whole query; inner nulls become the field's zero value to
/// keep the parallel arrays aligned.
pub(crate) fn query_results_from_response(response: &Value) -> Vec<QueryResult> {
    let ids = match response.get("ids").and_then(Value::as_array) {
        Some(ids) => ids,
        None => return Vec::new(),
    };

    ids.iter()
        .enumerate()
        .map(|(i, query_ids)| QueryResult {
            ids: query_ids
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .map(|id| id.as_str().unwrap_or_default().to_string())
                        .collect()
                })
                .unwrap_or_default(),
            embeddings: field_entry(response, "embeddings", i)
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            metadatas: field_entry(response, "metadatas", i)
                .and_then(Value::as_array)
                .map(|entries| entries.iter().map(string_map).collect()),
            documents: field_entry(response, "documents", i)
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|d| d.as_str().unwrap_or_default().to_string())
                        .collect()
                }),
            distances: field_entry(response, "distances", i)
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|d| d.as_f64().unwrap_or_default())
                        .collect()
                }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn embeddings_payload_omits_empty_optional_arrays() {
        let payload = EmbeddingsPayload {
            ids: vec!["ID1".into()],
            embeddings: vec![vec![1.0, 2.0]],
            metadatas: Vec::new(),
            documents: Vec::new(),
        };
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body, json!({ "ids": ["ID1"], "embeddings": [[1.0, 2.0]] }));
    }

    #[test]
    fn query_payload_uses_exact_wire_field_names() {
        let payload = QueryPayload {
            query_embeddings: vec![vec![1.0]],
            n_results: 5,
            include: vec!["documents".into()],
            where_document: Some(json!({"$contains": "hello"})),
            where_metadata: Some(json!({"key": "value"})),
        };
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body,
            json!({
                "query_embeddings": [[1.0]],
                "n_results": 5,
                "include": ["documents"],
                "where_document": {"$contains": "hello"},
                "where": {"key": "value"},
            })
        );
    }

    #[test]
    fn get_response_with_null_fields_yields_absent_fields() {
        let response = json!({
            "ids": ["ID1", "ID2", "ID3"],
            "embeddings": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]],
            "metadatas": null,
            "documents": null,
        });
        let records = embedding_records_from_response(&response);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "ID1");
        assert_eq!(records[1].embeddings, Some(vec![4.0, 5.0, 6.0]));
        assert_eq!(records[2].metadata, None);
        assert_eq!(records[2].document, None);
    }

    #[test]
    fn get_response_with_inner_nulls_skips_only_those_entries() {
        let response = json!({
            "ids": ["ID1", "ID2"],
            "embeddings": null,
            "metadatas": [{ "k": "v" }, null],
            "documents": [null, "doc2"],
        });
        let records = embedding_records_from_response(&response);
        assert_eq!(
            records[0].metadata,
            Some(HashMap::from([("k".to_string(), "v".to_string())]))
        );
        assert_eq!(records[0].document, None);
        assert_eq!(records[1].metadata, None);
        assert_eq!(records[1].document, Some("doc2".to_string()));
    }

    #[test]
    fn query_response_is_transposed_per_query() {
        let response = json!({
            "ids": [["A", "B"], ["C"]],
            "embeddings": null,
            "metadatas": [[{ "k": "v" }, null], [null]],
            "documents": [["doc-a", null], null],
            "distances": [[0.1, 0.4], [0.9]],
        });
        let results = query_results_from_response(&response);
        assert_eq!(results.len(), 2);

        assert_eq!(results[0].ids, vec!["A", "B"]);
        assert_eq!(results[0].embeddings, None);
        assert_eq!(
            results[0].metadatas,
            Some(vec![
                HashMap::from([("k".to_string(), "v".to_string())]),
                HashMap::new(),
            ])
        );
        assert_eq!(
            results[0].documents,
            Some(vec!["doc-a".to_string(), String::new()])
        );
        assert_eq!(results[0].distances, Some(vec![0.1, 0.4]));

        assert_eq!(results[1].ids, vec!["C"]);
        assert_eq!(results[1].documents, None);
    }
}
