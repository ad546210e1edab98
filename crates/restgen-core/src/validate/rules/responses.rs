use crate::diagnostics::Diagnostic;
use crate::naming::split_words;
use crate::parse::extensions::{ExtensionsExt, RATE_LIMIT_POLICY};
use crate::parse::operation::{HttpMethod, effective_parameters, path_template_params};
use crate::parse::spec::OperationEntry;
use crate::validate::RuleContext;

use super::security::{is_authenticated, is_authorized};

pub const BAD_REQUEST_WITHOUT_INPUT: &str = "OPR013";
pub const UNAUTHORIZED_WITHOUT_AUTH: &str = "OPR014";
pub const FORBIDDEN_WITHOUT_AUTHZ: &str = "OPR015";
pub const NOT_FOUND_ON_CREATE: &str = "OPR016";
pub const CONFLICT_ON_READ: &str = "OPR017";
pub const TOO_MANY_WITHOUT_POLICY: &str = "OPR018";
pub const NO_SUCCESS_RESPONSE: &str = "OPR019";

const CREATE_VERBS: &[&str] = &["create", "add", "register"];

/// One warning per operation declaring `status` for which `applies` holds.
fn flag_status(
    ctx: &RuleContext<'_>,
    status: &str,
    code: &'static str,
    applies: impl Fn(&OperationEntry<'_>) -> bool,
    message: impl Fn(&OperationEntry<'_>) -> String,
) -> Vec<Diagnostic> {
    ctx.document
        .operations()
        .filter(|e| e.operation.has_response(status) && applies(e))
        .map(|e| {
            Diagnostic::warning(code, message(&e))
                .at(format!("{}.responses.{status}", e.pointer()))
        })
        .collect()
}

pub fn bad_request_without_input(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    flag_status(
        ctx,
        "400",
        BAD_REQUEST_WITHOUT_INPUT,
        |e| {
            effective_parameters(e.path_item, e.operation).is_empty()
                && e.operation.request_body.is_none()
        },
        |e| format!("{} declares 400 but takes no parameters or body", e.display_name()),
    )
}

pub fn unauthorized_without_auth(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    flag_status(
        ctx,
        "401",
        UNAUTHORIZED_WITHOUT_AUTH,
        |e| !is_authenticated(doc, e.path_item, e.operation),
        |e| {
            format!(
                "{} declares 401 but nothing requires authentication",
                e.display_name()
            )
        },
    )
}

pub fn forbidden_without_authz(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    flag_status(
        ctx,
        "403",
        FORBIDDEN_WITHOUT_AUTHZ,
        |e| !is_authorized(doc, e.path_item, e.operation),
        |e| {
            format!(
                "{} declares 403 but no roles, schemes or security requirements apply",
                e.display_name()
            )
        },
    )
}

/// A create endpoint on a collection path has nothing to look up.
pub fn not_found_on_create(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    flag_status(
        ctx,
        "404",
        NOT_FOUND_ON_CREATE,
        |e| {
            e.method == HttpMethod::Post
                && path_template_params(e.path).is_empty()
                && e.operation.operation_id.as_deref().is_some_and(|id| {
                    split_words(id)
                        .first()
                        .is_some_and(|w| CREATE_VERBS.contains(&w.as_str()))
                })
        },
        |e| format!("{} creates a resource but declares 404", e.display_name()),
    )
}

pub fn conflict_on_read(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    flag_status(
        ctx,
        "409",
        CONFLICT_ON_READ,
        |e| !e.method.is_mutating(),
        |e| format!("{} is a {} and should not return 409", e.display_name(), e.method),
    )
}

pub fn too_many_without_policy(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let doc = ctx.document;
    flag_status(
        ctx,
        "429",
        TOO_MANY_WITHOUT_POLICY,
        |e| {
            [&e.operation.extensions, &e.path_item.extensions, &doc.extensions]
                .iter()
                .all(|ext| ext.string(RATE_LIMIT_POLICY).is_none())
        },
        |e| format!("{} declares 429 but has no {RATE_LIMIT_POLICY}", e.display_name()),
    )
}

pub fn no_success_response(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.document
        .operations()
        .filter(|e| e.operation.success_statuses().is_empty())
        .map(|e| {
            Diagnostic::warning(
                NO_SUCCESS_RESPONSE,
                format!("{} declares no 2xx response", e.display_name()),
            )
            .at(format!("{}.responses", e.pointer()))
        })
        .collect()
}
