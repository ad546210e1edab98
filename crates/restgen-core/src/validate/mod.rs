pub mod rules;
pub mod walk;

use log::debug;

use crate::config::ValidationStrategy;
use crate::diagnostics::Diagnostic;
use crate::parse::spec::OpenApiSpec;

/// Everything a rule may look at. Rules only read from it.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub document: &'a OpenApiSpec,
    pub parser_diagnostics: &'a [Diagnostic],
}

/// When a rule runs. `Structural` rules run under `Standard` and
/// `Strict`; `Style` rules only under `Strict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleTier {
    Structural,
    Style,
}

impl RuleTier {
    pub fn enabled_by(&self, strategy: ValidationStrategy) -> bool {
        match (strategy, self) {
            (ValidationStrategy::None, _) => false,
            (ValidationStrategy::Standard, RuleTier::Structural) => true,
            (ValidationStrategy::Standard, RuleTier::Style) => false,
            (ValidationStrategy::Strict, _) => true,
        }
    }
}

/// A registered rule: a stable code and a pure check over the document.
#[derive(Clone, Copy)]
pub struct Rule {
    pub code: &'static str,
    pub tier: RuleTier,
    pub summary: &'static str,
    pub check: fn(&RuleContext<'_>) -> Vec<Diagnostic>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("code", &self.code)
            .field("tier", &self.tier)
            .finish()
    }
}

/// The full rule catalog.
pub fn catalog() -> &'static [Rule] {
    rules::CATALOG
}

/// Rules that run under `strategy`, in catalog order.
pub fn rules_for(strategy: ValidationStrategy) -> impl Iterator<Item = &'static Rule> {
    catalog().iter().filter(move |r| r.tier.enabled_by(strategy))
}

/// Run every rule enabled by `strategy` and concatenate their findings.
///
/// `parser_diagnostics` are passed through unchanged (with `source_path`
/// attached) under `Standard` and `Strict`. Findings without a file are
/// attributed to `source_path`.
pub fn validate(
    strategy: ValidationStrategy,
    document: &OpenApiSpec,
    parser_diagnostics: &[Diagnostic],
    source_path: Option<&str>,
) -> Vec<Diagnostic> {
    let ctx = RuleContext {
        document,
        parser_diagnostics,
    };
    let mut out = Vec::new();
    for rule in rules_for(strategy) {
        let found = (rule.check)(&ctx);
        if !found.is_empty() {
            debug!("rule {} reported {} finding(s)", rule.code, found.len());
        }
        out.extend(found);
    }
    if let Some(path) = source_path {
        for d in &mut out {
            if d.location.file.is_none() {
                *d = d.clone().in_file(path);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;
    use std::collections::BTreeSet;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: Pets, version: "1" }
paths:
  /pets:
    get:
      operationId: GetPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Missing'
"##;

    fn codes(diags: &[Diagnostic]) -> BTreeSet<String> {
        diags.iter().map(|d| d.code.clone()).collect()
    }

    #[test]
    fn none_reports_nothing() {
        let doc = from_yaml(DOC).unwrap();
        assert!(validate(ValidationStrategy::None, &doc, &[], None).is_empty());
    }

    #[test]
    fn strategies_are_monotonic() {
        let doc = from_yaml(DOC).unwrap();
        let standard = codes(&validate(ValidationStrategy::Standard, &doc, &[], None));
        let strict = codes(&validate(ValidationStrategy::Strict, &doc, &[], None));
        assert!(standard.contains("SCH001"));
        assert!(!standard.contains("NAM001"));
        assert!(strict.contains("NAM001"));
        assert!(standard.is_subset(&strict));
    }

    #[test]
    fn parser_diagnostics_pass_through_with_file() {
        let doc = OpenApiSpec::default();
        let parsed = vec![Diagnostic::error("PAR001", "malformed document")];
        let out = validate(ValidationStrategy::Standard, &doc, &parsed, Some(r"specs\api.yaml"));
        let passed = out.iter().find(|d| d.code == "PAR001").unwrap();
        assert_eq!(passed.location.file.as_deref(), Some("specs/api.yaml"));
    }

    #[test]
    fn catalog_codes_are_unique() {
        let mut seen = BTreeSet::new();
        for rule in catalog() {
            assert!(seen.insert(rule.code), "duplicate rule code {}", rule.code);
        }
    }
}
