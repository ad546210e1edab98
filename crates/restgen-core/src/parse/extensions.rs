use indexmap::IndexMap;

/// Vendor extension fields (`x-*`) and any other keys the model does not
/// name explicitly.
pub type Extensions = IndexMap<String, serde_json::Value>;

pub const AUTHENTICATION_REQUIRED: &str = "x-authentication-required";
pub const AUTHORIZE_ROLES: &str = "x-authorize-roles";
pub const AUTHENTICATION_SCHEMES: &str = "x-authentication-schemes";
pub const RATE_LIMIT_POLICY: &str = "x-ratelimit-policy";
pub const CACHE_POLICY: &str = "x-cache-policy";

/// Typed accessors over an extension map.
pub trait ExtensionsExt {
    fn flag(&self, key: &str) -> Option<bool>;
    fn string(&self, key: &str) -> Option<&str>;
    /// A list of strings. Accepts a YAML sequence or a comma-separated
    /// string; blank entries are dropped.
    fn string_list(&self, key: &str) -> Vec<String>;
    /// Only the `x-` prefixed entries, in declaration order.
    fn vendor_entries(&self) -> Vec<(&str, &serde_json::Value)>;
}

impl ExtensionsExt for Extensions {
    fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn string(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str().filter(|s| !s.trim().is_empty())
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(serde_json::Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn vendor_entries(&self) -> Vec<(&str, &serde_json::Value)> {
        self.iter()
            .filter(|(k, _)| k.starts_with("x-"))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_from_sequence_or_csv() {
        let mut ext = Extensions::new();
        ext.insert(AUTHORIZE_ROLES.into(), json!(["admin", " operator ", ""]));
        ext.insert(AUTHENTICATION_SCHEMES.into(), json!("Bearer, ApiKey"));
        assert_eq!(ext.string_list(AUTHORIZE_ROLES), vec!["admin", "operator"]);
        assert_eq!(ext.string_list(AUTHENTICATION_SCHEMES), vec!["Bearer", "ApiKey"]);
        assert!(ext.string_list(RATE_LIMIT_POLICY).is_empty());
    }

    #[test]
    fn flag_accepts_string_booleans() {
        let mut ext = Extensions::new();
        ext.insert(AUTHENTICATION_REQUIRED.into(), json!("true"));
        assert_eq!(ext.flag(AUTHENTICATION_REQUIRED), Some(true));
        assert_eq!(ext.flag(CACHE_POLICY), None);
    }
}
