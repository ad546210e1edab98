use std::collections::BTreeSet;

use restgen_core::config::ValidationStrategy;
use restgen_core::diagnostics::Diagnostic;
use restgen_core::parse::{self, ParseCache};
use restgen_core::validate::validate;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

fn strict(yaml: &str) -> Vec<Diagnostic> {
    let doc = parse::from_yaml(yaml).expect("fixture parses");
    validate(ValidationStrategy::Strict, &doc, &[], None)
}

fn with_code<'a>(diagnostics: &'a [Diagnostic], code: &str) -> Vec<&'a Diagnostic> {
    diagnostics.iter().filter(|d| d.code == code).collect()
}

fn keyed(diagnostics: &[Diagnostic]) -> BTreeSet<(String, String, String)> {
    diagnostics
        .iter()
        .map(|d| (d.code.clone(), d.location.to_string(), d.message.clone()))
        .collect()
}

#[test]
fn stricter_strategies_only_add_findings() {
    let dangling = PETSTORE.replace(
        "items: { $ref: '#/components/schemas/Order' }",
        "items: { $ref: '#/components/schemas/Missing' }",
    );
    for text in [PETSTORE, dangling.as_str()] {
        let parsed = ParseCache::new().parse(text);
        let doc = parsed.document.as_ref().expect("fixture parses");
        let run = |strategy| keyed(&validate(strategy, doc, &parsed.diagnostics, Some("petstore.yaml")));

        let none = run(ValidationStrategy::None);
        let standard = run(ValidationStrategy::Standard);
        let strict = run(ValidationStrategy::Strict);
        assert!(none.is_empty());
        assert!(standard.is_subset(&strict));
        assert!(strict.len() > standard.len());
    }
}

#[test]
fn dangling_reference_is_a_structural_error() {
    let text = PETSTORE.replace(
        "items: { $ref: '#/components/schemas/Order' }",
        "items: { $ref: '#/components/schemas/Missing' }",
    );
    let doc = parse::from_yaml(&text).unwrap();
    let found = validate(ValidationStrategy::Standard, &doc, &[], Some("petstore.yaml"));
    let sch001 = with_code(&found, "SCH001");
    assert_eq!(sch001.len(), 1);
    assert!(sch001[0].message.contains("Missing"));
    assert_eq!(sch001[0].location.file.as_deref(), Some("petstore.yaml"));
}

#[test]
fn plural_operation_returning_an_object() {
    let found = strict(
        r##"
openapi: 3.0.3
info: { title: Pets, version: "1" }
paths:
  /pets:
    get:
      operationId: getPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Pet' }
components:
  schemas:
    Pet:
      title: Pet
      type: object
      properties:
        name: { type: string }
"##,
    );
    let opr008 = with_code(&found, "OPR008");
    assert_eq!(opr008.len(), 1);
    assert!(opr008[0].message.contains("getPets"));
    assert!(with_code(&found, "OPR009").is_empty());
}

#[test]
fn undeclared_path_placeholder() {
    let found = strict(
        r##"
openapi: 3.0.3
info: { title: Pets, version: "1" }
paths:
  /pets/{petId}:
    get:
      operationId: getPet
      responses:
        "200": { description: ok }
"##,
    );
    let opr010 = with_code(&found, "OPR010");
    assert_eq!(opr010.len(), 1);
    assert!(opr010[0].message.contains("petId"));
}

#[test]
fn forbidden_without_authorization() {
    let found = strict(
        r##"
openapi: 3.0.3
info: { title: Pets, version: "1" }
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: { type: string }
        "403": { description: forbidden }
"##,
    );
    assert_eq!(with_code(&found, "OPR015").len(), 1);
}

#[test]
fn public_operation_under_secured_root() {
    let found = strict(
        r##"
openapi: 3.0.3
info: { title: Pets, version: "1" }
security:
  - bearer: []
paths:
  /health:
    get:
      operationId: getHealth
      security: []
      responses:
        "200": { description: ok }
        "401": { description: unauthorized }
        "403": { description: forbidden }
components:
  securitySchemes:
    bearer: { type: http, scheme: bearer }
"##,
    );
    assert_eq!(with_code(&found, "OPR014").len(), 1);
    assert_eq!(with_code(&found, "OPR015").len(), 1);
}

#[test]
fn petstore_style_findings() {
    let found = strict(PETSTORE);
    assert!(found.iter().all(|d| !d.is_error()), "{found:#?}");
    let nam001 = with_code(&found, "NAM001");
    assert_eq!(nam001.len(), 1);
    assert_eq!(nam001[0].suggestions, vec!["listOrders"]);
    assert_eq!(with_code(&found, "NAM002").len(), 1);
    assert_eq!(with_code(&found, "NAM003").len(), 1);
    assert_eq!(with_code(&found, "OPR003").len(), 1);
}
