use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One `servers` entry. The URL may contain `{variable}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Server {
    /// The URL with each declared variable replaced by its default.
    /// Undeclared placeholders stay as written.
    pub fn substituted_url(&self) -> String {
        self.variables
            .iter()
            .fold(self.url.clone(), |url, (name, var)| {
                url.replace(&format!("{{{name}}}"), &var.default)
            })
    }

    /// Placeholder names in the URL template, in order of appearance. An
    /// unclosed `{` ends the scan.
    pub fn template_variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.url.as_str();
        while let Some((_, open)) = rest.split_once('{') {
            let Some((name, after)) = open.split_once('}') else {
                break;
            };
            names.push(name);
            rest = after;
        }
        names
    }
}
