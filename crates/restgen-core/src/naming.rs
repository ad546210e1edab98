use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};

use crate::ir::NormalizedName;
use crate::parse::operation::HttpMethod;

/// PascalCase and camelCase forms of an arbitrary name. Runs of
/// punctuation become word breaks; an empty result becomes `unnamed`.
pub fn normalize_name(name: &str) -> NormalizedName {
    let words = identifier_words(name);
    NormalizedName {
        original: name.to_string(),
        pascal_case: words.to_pascal_case(),
        camel_case: words.to_lower_camel_case(),
    }
}

fn identifier_words(name: &str) -> String {
    let joined = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if joined.is_empty() { "unnamed".to_string() } else { joined }
}

/// The casing convention an identifier follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    /// `getPets`, also a single lowercase word such as `pets`.
    Camel,
    /// `GetPets`
    Pascal,
    /// `get_pets`
    Snake,
    /// `get-pets`
    Kebab,
    /// `GET_PETS`, also a single uppercase word such as `PETS`.
    UpperSnake,
    /// Anything else (`get_Pets`, `Get-pets`, digits first, ...).
    Mixed,
}

impl Casing {
    pub fn describe(&self) -> &'static str {
        match self {
            Casing::Camel => "camelCase",
            Casing::Pascal => "PascalCase",
            Casing::Snake => "snake_case",
            Casing::Kebab => "kebab-case",
            Casing::UpperSnake => "UPPER_SNAKE_CASE",
            Casing::Mixed => "mixed casing",
        }
    }
}

/// Classify an identifier's casing.
pub fn detect_casing(name: &str) -> Casing {
    let Some(first) = name.chars().next() else {
        return Casing::Mixed;
    };
    if !first.is_ascii_alphabetic() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Casing::Mixed;
    }
    let has_dash = name.contains('-');
    let has_underscore = name.contains('_');
    let has_upper = name.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = name.chars().any(|c| c.is_ascii_lowercase());

    match (has_dash, has_underscore) {
        (true, true) => Casing::Mixed,
        (true, false) if !has_upper && segments_nonempty(name, '-') => Casing::Kebab,
        (true, false) => Casing::Mixed,
        (false, true) if !has_upper && segments_nonempty(name, '_') => Casing::Snake,
        (false, true) if !has_lower && segments_nonempty(name, '_') => Casing::UpperSnake,
        (false, true) => Casing::Mixed,
        (false, false) if first.is_ascii_lowercase() => Casing::Camel,
        (false, false) if !has_lower && name.len() > 1 => Casing::UpperSnake,
        (false, false) => Casing::Pascal,
    }
}

fn segments_nonempty(name: &str, sep: char) -> bool {
    name.split(sep).all(|s| !s.is_empty())
}

pub fn is_camel_case(name: &str) -> bool {
    detect_casing(name) == Casing::Camel
}

pub fn is_pascal_case(name: &str) -> bool {
    detect_casing(name) == Casing::Pascal
}

/// Split an identifier of any casing into lowercase words.
pub fn split_words(name: &str) -> Vec<String> {
    name.to_snake_case()
        .split('_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Operation name for a route without an `operationId`: a verb picked
/// from the method, then the literal path segments in PascalCase. A route
/// ending in a `{param}` addresses one item, so its last resource is
/// singular: `GET /users/{id}` is `getUser`, `GET /users` is `listUsers`.
pub fn route_to_name(method: HttpMethod, path: &str) -> String {
    let is_template = |s: &str| s.starts_with('{') && s.ends_with('}');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let single = segments.last().is_some_and(|s| is_template(s));
    let resources: Vec<&str> = segments.into_iter().filter(|s| !is_template(s)).collect();

    let mut name = match method {
        HttpMethod::Get if single => "get",
        HttpMethod::Get => "list",
        HttpMethod::Post => "create",
        HttpMethod::Put => "update",
        other => other.key(),
    }
    .to_string();
    for (index, resource) in resources.iter().enumerate() {
        if single && index + 1 == resources.len() {
            name.push_str(&singularize(resource).to_pascal_case());
        } else {
            name.push_str(&resource.to_pascal_case());
        }
    }
    name
}

/// Nouns that read the same in singular and plural, or that name a
/// single resource regardless of shape.
const UNCOUNTABLE: &[&str] = &[
    "data",
    "info",
    "information",
    "metadata",
    "status",
    "health",
    "news",
    "series",
    "species",
    "equipment",
    "feedback",
    "media",
    "inventory",
    "config",
    "configuration",
    "settings",
    "me",
    "auth",
];

/// Irregular `(singular, plural)` pairs.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("criterion", "criteria"),
    ("index", "indices"),
    ("analysis", "analyses"),
];

/// English plural heuristic. `None` when the word is uncountable or too
/// short to judge.
pub fn is_plural(word: &str) -> Option<bool> {
    let lower = word.to_ascii_lowercase();
    if lower.len() < 3 || UNCOUNTABLE.contains(&lower.as_str()) {
        return None;
    }
    if IRREGULAR.iter().any(|(_, p)| *p == lower) {
        return Some(true);
    }
    if IRREGULAR.iter().any(|(s, _)| *s == lower) {
        return Some(false);
    }
    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return Some(false);
    }
    Some(lower.ends_with('s'))
}

/// Naive singularization, preserving the leading capital.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some((singular, _)) = IRREGULAR.iter().find(|(_, p)| *p == lower) {
        return match_capital(word, singular);
    }
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        return format!("{stem}y");
    }
    if ["ses", "xes", "zes"].iter().any(|suffix| word.ends_with(suffix)) {
        return word[..word.len() - 2].to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() && !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Naive pluralization, preserving the leading capital.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some((_, plural)) = IRREGULAR.iter().find(|(s, _)| *s == lower) {
        return match_capital(word, plural);
    }
    let vowel_before_y = word
        .chars()
        .rev()
        .nth(1)
        .is_some_and(|c| "aeiouAEIOU".contains(c));
    if word.ends_with('y') && !vowel_before_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

fn match_capital(original: &str, replacement: &str) -> String {
    if original.starts_with(|c: char| c.is_ascii_uppercase()) {
        replacement.to_pascal_case()
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_detection() {
        assert_eq!(detect_casing("getPets"), Casing::Camel);
        assert_eq!(detect_casing("pets"), Casing::Camel);
        assert_eq!(detect_casing("get-pets"), Casing::Kebab);
        assert_eq!(detect_casing("GetPets"), Casing::Pascal);
        assert_eq!(detect_casing("get_pets"), Casing::Snake);
        assert_eq!(detect_casing("GET_PETS"), Casing::UpperSnake);
        assert_eq!(detect_casing("GETPETS"), Casing::UpperSnake);
        assert_eq!(detect_casing("get_Pets"), Casing::Mixed);
        assert_eq!(detect_casing("1pets"), Casing::Mixed);
        assert_eq!(detect_casing("get--pets"), Casing::Mixed);
    }

    #[test]
    fn normalized_variants() {
        let n = normalize_name("pet-store");
        assert_eq!(n.pascal_case, "PetStore");
        assert_eq!(n.camel_case, "petStore");
        assert_eq!(normalize_name("order items").pascal_case, "OrderItems");
        assert_eq!(normalize_name("--").camel_case, "unnamed");
    }

    #[test]
    fn plural_heuristic() {
        assert_eq!(is_plural("pets"), Some(true));
        assert_eq!(is_plural("Pet"), Some(false));
        assert_eq!(is_plural("address"), Some(false));
        assert_eq!(is_plural("people"), Some(true));
        assert_eq!(is_plural("status"), None);
        assert_eq!(is_plural("health"), None);
    }

    #[test]
    fn singular_plural_round() {
        assert_eq!(singularize("Categories"), "Category");
        assert_eq!(singularize("Boxes"), "Box");
        assert_eq!(singularize("People"), "Person");
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("Key"), "Keys");
        assert_eq!(pluralize("Box"), "Boxes");
        assert_eq!(pluralize("Pet"), "Pets");
    }

    #[test]
    fn route_names() {
        assert_eq!(route_to_name(HttpMethod::Get, "/users"), "listUsers");
        assert_eq!(route_to_name(HttpMethod::Get, "/users/{userId}"), "getUser");
        assert_eq!(route_to_name(HttpMethod::Delete, "/users/{userId}"), "deleteUser");
        assert_eq!(route_to_name(HttpMethod::Post, "/"), "create");
        assert_eq!(
            route_to_name(HttpMethod::Get, "/users/{userId}/messages/{messageId}"),
            "getUsersMessage"
        );
    }

    #[test]
    fn words() {
        assert_eq!(split_words("getPetById"), vec!["get", "pet", "by", "id"]);
        assert_eq!(split_words("list-user-posts"), vec!["list", "user", "posts"]);
    }
}
