use crate::diagnostics::Diagnostic;
use crate::parse::extensions::{
    AUTHENTICATION_REQUIRED, AUTHENTICATION_SCHEMES, AUTHORIZE_ROLES, Extensions, ExtensionsExt,
};
use crate::parse::operation::{Operation, PathItem};
use crate::parse::security::{SecurityRequirement, requires_authentication};
use crate::parse::spec::OpenApiSpec;
use crate::validate::RuleContext;

pub const UNDECLARED_ROLE: &str = "SEC001";
pub const ROLE_CASING: &str = "SEC002";
pub const UNDECLARED_SCHEME: &str = "SEC003";
pub const SCHEME_CASING: &str = "SEC004";
pub const UNDEFINED_SECURITY_SCHEME: &str = "SEC005";
pub const ROLES_WITHOUT_AUTHENTICATION: &str = "SEC006";

/// The security requirements in force for an operation: its own list when
/// present (even if empty), the document's otherwise.
fn effective_security<'a>(doc: &'a OpenApiSpec, op: &'a Operation) -> &'a [SecurityRequirement] {
    op.security
        .as_deref()
        .or(doc.security.as_deref())
        .unwrap_or(&[])
}

fn declares_access(ext: &Extensions) -> bool {
    !ext.string_list(AUTHORIZE_ROLES).is_empty() || !ext.string_list(AUTHENTICATION_SCHEMES).is_empty()
}

/// Whether anything on the operation's ancestry asks for an
/// authenticated caller.
pub(crate) fn is_authenticated(doc: &OpenApiSpec, item: &PathItem, op: &Operation) -> bool {
    let scopes = [&doc.extensions, &item.extensions, &op.extensions];
    requires_authentication(effective_security(doc, op))
        || scopes.iter().any(|ext| ext.flag(AUTHENTICATION_REQUIRED) == Some(true))
        || scopes.iter().any(|ext| declares_access(ext))
}

/// Whether the operation's ancestry restricts who may call it.
pub(crate) fn is_authorized(doc: &OpenApiSpec, item: &PathItem, op: &Operation) -> bool {
    declares_access(&op.extensions)
        || declares_access(&item.extensions)
        || declares_access(&doc.extensions)
        || requires_authentication(effective_security(doc, op))
}

/// A value used somewhere below the root, with the pointer it was read at.
struct Usage {
    value: String,
    pointer: String,
}

fn usages(doc: &OpenApiSpec, key: &str) -> Vec<Usage> {
    let mut out = Vec::new();
    let mut collect = |ext: &Extensions, pointer: String| {
        for value in ext.string_list(key) {
            out.push(Usage {
                value,
                pointer: format!("{pointer}.{key}"),
            });
        }
    };
    for (path, item) in &doc.paths {
        collect(&item.extensions, format!("paths.{path}"));
        for (method, op) in item.operations() {
            collect(&op.extensions, format!("paths.{path}.{}", method.key()));
        }
    }
    out
}

fn declared_schemes(doc: &OpenApiSpec) -> Vec<String> {
    let mut declared = doc.extensions.string_list(AUTHENTICATION_SCHEMES);
    if let Some(components) = &doc.components {
        declared.extend(components.security_schemes.keys().cloned());
    }
    declared
}

enum Match<'a> {
    Exact,
    Casing(&'a str),
    Missing,
}

fn lookup<'a>(declared: &'a [String], value: &str) -> Match<'a> {
    if declared.iter().any(|d| d == value) {
        return Match::Exact;
    }
    match declared.iter().find(|d| d.eq_ignore_ascii_case(value)) {
        Some(d) => Match::Casing(d),
        None => Match::Missing,
    }
}

pub fn undeclared_role(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let declared = ctx.document.extensions.string_list(AUTHORIZE_ROLES);
    usages(ctx.document, AUTHORIZE_ROLES)
        .into_iter()
        .filter(|u| matches!(lookup(&declared, &u.value), Match::Missing))
        .map(|u| {
            Diagnostic::error(
                UNDECLARED_ROLE,
                format!("role '{}' is not declared in the root {AUTHORIZE_ROLES}", u.value),
            )
            .at(u.pointer)
        })
        .collect()
}

pub fn role_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let declared = ctx.document.extensions.string_list(AUTHORIZE_ROLES);
    usages(ctx.document, AUTHORIZE_ROLES)
        .into_iter()
        .filter_map(|u| match lookup(&declared, &u.value) {
            Match::Casing(spelling) => Some(
                Diagnostic::warning(
                    ROLE_CASING,
                    format!("role '{}' is declared as '{spelling}'", u.value),
                )
                .at(u.pointer)
                .with_suggestion(spelling),
            ),
            _ => None,
        })
        .collect()
}

pub fn undeclared_scheme(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let declared = declared_schemes(ctx.document);
    usages(ctx.document, AUTHENTICATION_SCHEMES)
        .into_iter()
        .filter(|u| matches!(lookup(&declared, &u.value), Match::Missing))
        .map(|u| {
            Diagnostic::error(
                UNDECLARED_SCHEME,
                format!("authentication scheme '{}' is not declared", u.value),
            )
            .at(u.pointer)
        })
        .collect()
}

pub fn scheme_casing(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let declared = declared_schemes(ctx.document);
    usages(ctx.document, AUTHENTICATION_SCHEMES)
        .into_iter()
        .filter_map(|u| match lookup(&declared, &u.value) {
            Match::Casing(spelling) => Some(
                Diagnostic::warning(
                    SCHEME_CASING,
                    format!("authentication scheme '{}' is declared as '{spelling}'", u.value),
                )
                .at(u.pointer)
                .with_suggestion(spelling),
            ),
            _ => None,
        })
        .collect()
}

pub fn undefined_security_scheme(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let defined: Vec<&String> = doc
        .components
        .as_ref()
        .map(|c| c.security_schemes.keys().collect())
        .unwrap_or_default();
    let mut out = Vec::new();
    let mut check = |requirements: &[SecurityRequirement], pointer: String| {
        for name in requirements.iter().flat_map(|r| r.keys()) {
            if defined.contains(&name) {
                continue;
            }
            let mut d = Diagnostic::error(
                UNDEFINED_SECURITY_SCHEME,
                format!("security requirement names undefined scheme '{name}'"),
            )
            .at(pointer.clone());
            if let Some(close) = defined.iter().find(|d| d.eq_ignore_ascii_case(name)) {
                d = d.with_suggestion(close.as_str());
            }
            out.push(d);
        }
    };
    if let Some(root) = &doc.security {
        check(root, "security".to_string());
    }
    for entry in doc.operations() {
        if let Some(reqs) = &entry.operation.security {
            check(reqs, format!("{}.security", entry.pointer()));
        }
    }
    out
}

pub fn roles_without_authentication(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    let mut out = Vec::new();
    let mut check = |ext: &Extensions, pointer: String| {
        if ext.flag(AUTHENTICATION_REQUIRED) == Some(false)
            && !ext.string_list(AUTHORIZE_ROLES).is_empty()
        {
            out.push(
                Diagnostic::warning(
                    ROLES_WITHOUT_AUTHENTICATION,
                    format!("roles are set but {AUTHENTICATION_REQUIRED} is false"),
                )
                .at(pointer),
            );
        }
    };
    check(&doc.extensions, "$".to_string());
    for (path, item) in &doc.paths {
        check(&item.extensions, format!("paths.{path}"));
        for (method, op) in item.operations() {
            check(&op.extensions, format!("paths.{path}.{}", method.key()));
        }
    }
    out
}
