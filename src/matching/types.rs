//! Request and response types for item matching.
//!
//! [`CandidateItem`] is what callers send, [`ScoredMatch`] is what the ranker
//! produces, and [`MatchResponse`] is the wire shape returned to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque candidate identifier. Callers use both numeric and string ids;
/// numbers keep whatever JSON form they arrived in (`7`, `7.0`, `2^64 - 1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&ItemId> for Value {
    fn from(id: &ItemId) -> Self {
        match id {
            ItemId::Number(n) => Value::Number(n.clone()),
            ItemId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A candidate the query is compared against.
///
/// The embedding input is the `text` field, or `name` when there is no
/// `text`. The object is kept exactly as the caller sent it and serializes
/// back unchanged, so `{id, name, category, ...}` round-trips key for key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Map<String, Value>")]
pub struct CandidateItem {
    pub id: ItemId,
    pub text: String,
    raw: serde_json::Map<String, Value>,
}

impl CandidateItem {
    pub fn new(id: impl Into<ItemId>, text: impl Into<String>) -> Self {
        let id = id.into();
        let text = text.into();
        let mut raw = serde_json::Map::new();
        raw.insert("id".into(), Value::from(&id));
        raw.insert("text".into(), Value::String(text.clone()));
        Self { id, text, raw }
    }

    /// A field of the item as sent, e.g. `item.field("category")`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

impl TryFrom<serde_json::Map<String, Value>> for CandidateItem {
    type Error = String;

    fn try_from(raw: serde_json::Map<String, Value>) -> Result<Self, Self::Error> {
        let id = match raw.get("id") {
            Some(Value::Number(n)) => ItemId::Number(n.clone()),
            Some(Value::String(s)) => ItemId::Text(s.clone()),
            Some(other) => {
                return Err(format!("item id must be a number or string, got {other}"))
            }
            None => return Err("item is missing `id`".into()),
        };
        let text = match raw.get("text").or_else(|| raw.get("name")) {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(format!("item {id}: `text`/`name` must be a string")),
            None => return Err(format!("item {id} needs a `text` or `name` field")),
        };
        Ok(Self { id, text, raw })
    }
}

impl Serialize for CandidateItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// One free-text query against an ordered list of candidates.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub query: String,
    pub items: Vec<CandidateItem>,
    /// When present, the response also carries the top-K ranked list.
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl MatchRequest {
    pub fn new(query: impl Into<String>, items: Vec<CandidateItem>) -> Self {
        Self {
            query: query.into(),
            items,
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
}

/// A candidate position paired with its similarity to the query.
///
/// `score` is cosine similarity in `[-1.0, 1.0]`, or `f64::NEG_INFINITY` for a
/// zero-norm candidate (see [`crate::matching::rank`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMatch {
    /// Position of the candidate in the input sequence.
    pub index: usize,
    pub score: f64,
    /// Zero-based position in the ranked output.
    pub rank: usize,
}

impl ScoredMatch {
    pub fn is_scored(&self) -> bool {
        self.score.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub item: CandidateItem,
    pub score: f64,
    pub rank: usize,
}

/// Wire response for the "find best match" operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResponse {
    #[serde(rename = "match")]
    pub best: CandidateItem,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<RankedItem>>,
    /// Ids of candidates whose embedding had zero norm and could not be scored.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unscored: Vec<ItemId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_with_name_round_trips_unchanged() {
        let json = serde_json::json!({
            "id": 7,
            "name": "Cataract Surgery",
            "category": "Ophthalmology"
        });
        let item: CandidateItem = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(item.id, ItemId::from(7i64));
        assert_eq!(item.text, "Cataract Surgery");
        assert_eq!(item.field("category").unwrap(), "Ophthalmology");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back, json);
        assert!(back.get("text").is_none());
    }

    #[test]
    fn text_wins_over_name_when_both_present() {
        let json = serde_json::json!({
            "id": 1,
            "name": "Appendectomy",
            "text": "Removal of the appendix"
        });
        let item: CandidateItem = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(item.text, "Removal of the appendix");
        assert_eq!(serde_json::to_value(&item).unwrap(), json);
    }

    #[test]
    fn missing_text_and_name_is_rejected() {
        let err = serde_json::from_str::<CandidateItem>(r#"{"id": 1, "category": "Surgery"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("`text` or `name`"));
    }

    #[test]
    fn string_ids_are_supported() {
        let item: CandidateItem =
            serde_json::from_str(r#"{"id": "proc-12", "text": "MRI"}"#).unwrap();
        assert_eq!(item.id, ItemId::from("proc-12"));
        assert_eq!(item.id.to_string(), "proc-12");
    }

    #[test]
    fn float_and_large_unsigned_ids_are_supported() {
        let item: CandidateItem =
            serde_json::from_str(r#"{"id": 1.0, "text": "MRI"}"#).unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap()["id"], 1.0);

        let item: CandidateItem =
            serde_json::from_str(r#"{"id": 18446744073709551615, "text": "MRI"}"#).unwrap();
        assert_eq!(item.id.to_string(), "18446744073709551615");
    }

    #[test]
    fn constructed_item_serializes_id_and_text() {
        let back = serde_json::to_value(CandidateItem::new(3i64, "Hip Replacement")).unwrap();
        assert_eq!(back, serde_json::json!({"id": 3, "text": "Hip Replacement"}));
    }

    #[test]
    fn response_omits_optional_sections() {
        let response = MatchResponse {
            best: CandidateItem::new(1i64, "Hip Replacement"),
            score: 0.5,
            matches: None,
            unscored: vec![],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["match"]["id"], 1);
        assert!(json.get("matches").is_none());
        assert!(json.get("unscored").is_none());
    }
}
