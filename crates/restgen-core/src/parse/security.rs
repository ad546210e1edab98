use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The `type` of a security scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeKind {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
    #[serde(rename = "mutualTLS")]
    MutualTls,
}

/// A declared security scheme. Generation only needs the scheme names, so
/// the type-specific keywords (`scheme`, `in`, `flows`, ...) are kept as
/// raw values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub kind: SchemeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub settings: IndexMap<String, serde_json::Value>,
}

/// Scheme name to required scopes. An empty map means "no authentication".
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Scheme names referenced by a list of security requirements, in order,
/// without duplicates.
pub fn requirement_scheme_names(requirements: &[SecurityRequirement]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in requirements.iter().flat_map(IndexMap::keys) {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// `true` when the requirement list demands authentication. An empty list,
/// or a list holding only `{}`, opts out.
pub fn requires_authentication(requirements: &[SecurityRequirement]) -> bool {
    requirements.iter().any(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_keywords_are_kept() {
        let scheme: SecurityScheme =
            serde_yaml_ng::from_str("type: http\nscheme: Bearer\nbearerFormat: JWT\n").unwrap();
        assert_eq!(scheme.kind, SchemeKind::Http);
        assert_eq!(scheme.settings["bearerFormat"], "JWT");

        let scheme: SecurityScheme = serde_yaml_ng::from_str(
            "type: oauth2\nflows:\n  clientCredentials:\n    tokenUrl: https://auth.example/token\n    scopes: {}\n",
        )
        .unwrap();
        assert_eq!(scheme.kind, SchemeKind::OAuth2);
        assert!(scheme.settings.contains_key("flows"));
    }

    #[test]
    fn empty_requirement_opts_out() {
        let anonymous = vec![SecurityRequirement::new()];
        assert!(!requires_authentication(&anonymous));

        let mut bearer = SecurityRequirement::new();
        bearer.insert("bearer".into(), Vec::new());
        let mut key = SecurityRequirement::new();
        key.insert("apiKey".into(), Vec::new());
        key.insert("bearer".into(), Vec::new());
        let both = vec![bearer, key];
        assert!(requires_authentication(&both));
        assert_eq!(requirement_scheme_names(&both), vec!["bearer", "apiKey"]);
    }
}
