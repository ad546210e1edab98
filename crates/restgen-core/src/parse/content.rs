//! Request bodies, responses and the media-type maps they share.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::reference::RefOr;
use super::schema::SchemaOrRef;

pub type Content = IndexMap<String, MediaType>;

/// The payload description for one media type. Encoding and examples are
/// carried through untouched; generation only reads the schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: Content,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: Content,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, serde_json::Value>,
}

pub type RequestBodyOrRef = RefOr<RequestBody>;
pub type ResponseOrRef = RefOr<Response>;

/// The media type generation binds to: `application/json` when offered,
/// then any other JSON flavour (`application/problem+json`, ...), then
/// whatever is declared first.
pub fn preferred_media_type(content: &Content) -> Option<(&str, &MediaType)> {
    let is_json = |mt: &str| {
        let essence = mt.split(';').next().unwrap_or(mt).trim();
        essence.ends_with("/json") || essence.ends_with("+json")
    };
    content
        .get_key_value("application/json")
        .or_else(|| content.iter().find(|(mt, _)| is_json(mt)))
        .or_else(|| content.first())
        .map(|(mt, media)| (mt.as_str(), media))
}

/// Every schema declared under a content map, in media-type order.
pub fn content_schemas(content: &Content) -> impl Iterator<Item = (&str, &SchemaOrRef)> {
    content
        .iter()
        .filter_map(|(mt, media)| media.schema.as_ref().map(|s| (mt.as_str(), s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(types: &[&str]) -> Content {
        types.iter().map(|t| (t.to_string(), MediaType::default())).collect()
    }

    #[test]
    fn json_is_preferred_over_declaration_order() {
        let c = content(&["text/plain", "application/problem+json", "application/json"]);
        assert_eq!(preferred_media_type(&c).map(|(mt, _)| mt), Some("application/json"));

        let c = content(&["text/csv", "application/problem+json; charset=utf-8"]);
        assert_eq!(
            preferred_media_type(&c).map(|(mt, _)| mt),
            Some("application/problem+json; charset=utf-8")
        );

        let c = content(&["image/png", "text/plain"]);
        assert_eq!(preferred_media_type(&c).map(|(mt, _)| mt), Some("image/png"));
        assert!(preferred_media_type(&Content::new()).is_none());
    }

    #[test]
    fn optional_body_omits_required_flag() {
        let yaml = serde_yaml_ng::to_string(&RequestBody::default()).unwrap();
        assert!(!yaml.contains("required"));
    }
}
