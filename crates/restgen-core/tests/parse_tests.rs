use std::sync::Arc;

use restgen_core::parse::{self, PARSE_SYNTAX, PARSE_UNSUPPORTED_VERSION, ParseCache};
use restgen_core::source::SpecificationFile;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");

#[test]
fn parse_petstore_yaml() {
    let spec = parse::from_yaml(PETSTORE).expect("should parse petstore");
    assert_eq!(spec.info.title, "Pet Store");
    assert_eq!(spec.info.version, "1.0.0");
    assert_eq!(spec.paths.len(), 5);
    assert_eq!(spec.operation_count(), 7);
    assert_eq!(spec.schema_count(), 8);
    assert!(spec.schema("Pet").is_some());
}

#[test]
fn same_text_returns_the_same_instance() {
    let cache = ParseCache::new();
    let a = cache.parse(PETSTORE);
    let b = cache.parse(PETSTORE);
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 1);

    let x = SpecificationFile::new("specs/one.yaml", PETSTORE, &cache);
    let y = SpecificationFile::new("specs\\two.yaml", PETSTORE, &cache);
    assert!(Arc::ptr_eq(x.document().unwrap(), y.document().unwrap()));
    assert_eq!(y.path(), "specs/two.yaml");
}

#[test]
fn clearing_produces_an_equal_but_distinct_instance() {
    let cache = ParseCache::new();
    let before = cache.parse(PETSTORE);
    cache.clear();
    assert!(cache.is_empty());
    let after = cache.parse(PETSTORE);
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before, after);
}

#[test]
fn malformed_input_becomes_diagnostics() {
    let cache = ParseCache::new();

    let broken = cache.parse("openapi: [unclosed");
    assert!(broken.document.is_none());
    assert_eq!(broken.diagnostics[0].code, PARSE_SYNTAX);
    assert!(broken.diagnostics[0].location.file.is_none());

    let old = cache.parse("openapi: 2.0\ninfo: { title: Old, version: '1' }\npaths: {}\n");
    assert!(old.document.is_none());
    assert_eq!(old.diagnostics[0].code, PARSE_UNSUPPORTED_VERSION);

    let file = SpecificationFile::new("legacy/swagger.yaml", "openapi: [unclosed", &cache);
    assert_eq!(
        file.diagnostics()[0].location.file.as_deref(),
        Some("legacy/swagger.yaml")
    );
}
