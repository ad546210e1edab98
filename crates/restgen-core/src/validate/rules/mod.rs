//! The rule catalog. Each rule is a plain function registered once in
//! [`CATALOG`]; adding a rule never touches another rule.

pub mod naming;
pub mod operations;
pub mod references;
pub mod responses;
pub mod schemas;
pub mod security;
pub mod servers;
pub mod webhooks;

use super::{Rule, RuleTier};

use crate::parse::operation::{Operation, PathItem, effective_parameters};
use crate::parse::parameter::Parameter;
use crate::parse::spec::OpenApiSpec;

macro_rules! rule {
    ($code:expr, $tier:ident, $summary:expr, $check:path) => {
        Rule {
            code: $code,
            tier: RuleTier::$tier,
            summary: $summary,
            check: $check,
        }
    };
}

pub static CATALOG: &[Rule] = &[
    // Structural
    rule!(references::PARSER, Structural, "parser findings", references::parser_passthrough),
    rule!(references::MISSING_METADATA, Structural, "base metadata present", references::missing_metadata),
    rule!(references::UNRESOLVED_REF, Structural, "every $ref resolves", references::unresolved_refs),
    // Naming
    rule!(naming::OPERATION_ID_CASING, Style, "operationId casing", naming::operation_id_casing),
    rule!(naming::SCHEMA_NAME_CASING, Style, "schema name casing", naming::schema_name_casing),
    rule!(naming::PROPERTY_NAME_CASING, Style, "property name casing", naming::property_name_casing),
    rule!(naming::PARAMETER_NAME_CASING, Style, "parameter name casing", naming::parameter_name_casing),
    // Operations
    rule!(operations::MISSING_OPERATION_ID, Style, "operationId present", operations::missing_operation_id),
    rule!(operations::DUPLICATE_OPERATION_ID, Style, "operationId unique", operations::duplicate_operation_id),
    rule!(operations::GET_PREFIX, Style, "GET verb prefix", operations::get_prefix),
    rule!(operations::POST_PREFIX, Style, "POST verb prefix", operations::post_prefix),
    rule!(operations::PUT_PREFIX, Style, "PUT verb prefix", operations::put_prefix),
    rule!(operations::PATCH_PREFIX, Style, "PATCH verb prefix", operations::patch_prefix),
    rule!(operations::DELETE_PREFIX, Style, "DELETE verb prefix", operations::delete_prefix),
    rule!(operations::PLURAL_RETURNS_OBJECT, Style, "plural name returns a collection", operations::plural_returns_object),
    rule!(operations::SINGULAR_RETURNS_ARRAY, Style, "singular name returns one item", operations::singular_returns_array),
    rule!(operations::UNDECLARED_PATH_PARAM, Style, "path placeholders declared", operations::undeclared_path_params),
    rule!(operations::UNUSED_PATH_PARAM, Style, "path parameters used", operations::unused_path_params),
    rule!(operations::OPTIONAL_PATH_PARAM, Style, "path parameters required", operations::optional_path_params),
    // Responses
    rule!(responses::BAD_REQUEST_WITHOUT_INPUT, Style, "400 needs input", responses::bad_request_without_input),
    rule!(responses::UNAUTHORIZED_WITHOUT_AUTH, Style, "401 needs authentication", responses::unauthorized_without_auth),
    rule!(responses::FORBIDDEN_WITHOUT_AUTHZ, Style, "403 needs authorization", responses::forbidden_without_authz),
    rule!(responses::NOT_FOUND_ON_CREATE, Style, "404 on create", responses::not_found_on_create),
    rule!(responses::CONFLICT_ON_READ, Style, "409 on read", responses::conflict_on_read),
    rule!(responses::TOO_MANY_WITHOUT_POLICY, Style, "429 needs a rate-limit policy", responses::too_many_without_policy),
    rule!(responses::NO_SUCCESS_RESPONSE, Style, "2xx response present", responses::no_success_response),
    // Schemas
    rule!(schemas::MISSING_TITLE, Style, "object and array schemas titled", schemas::missing_title),
    rule!(schemas::TITLE_CASING, Style, "title starts uppercase", schemas::title_casing),
    rule!(schemas::INLINE_PROPERTY_OBJECT, Style, "no inline object properties", schemas::inline_property_object),
    rule!(schemas::INLINE_ITEMS_OBJECT, Style, "no inline object array items", schemas::inline_items_object),
    rule!(schemas::REF_SIBLINGS, Style, "$ref without siblings", schemas::ref_siblings),
    rule!(schemas::CONST_KEYWORD, Style, "const unsupported", schemas::const_keyword),
    rule!(schemas::UNEVALUATED_PROPERTIES, Style, "unevaluatedProperties unsupported", schemas::unevaluated_properties),
    rule!(schemas::ARRAY_WITHOUT_ITEMS, Style, "arrays declare items", schemas::array_without_items),
    rule!(schemas::UNDECLARED_REQUIRED, Style, "required properties declared", schemas::undeclared_required),
    rule!(schemas::INLINE_BODY_OBJECT, Style, "no inline body objects", schemas::inline_body_object),
    // Security
    rule!(security::UNDECLARED_ROLE, Style, "roles declared", security::undeclared_role),
    rule!(security::ROLE_CASING, Style, "role casing", security::role_casing),
    rule!(security::UNDECLARED_SCHEME, Style, "schemes declared", security::undeclared_scheme),
    rule!(security::SCHEME_CASING, Style, "scheme casing", security::scheme_casing),
    rule!(security::UNDEFINED_SECURITY_SCHEME, Style, "security requirements resolve", security::undefined_security_scheme),
    rule!(security::ROLES_WITHOUT_AUTHENTICATION, Style, "roles need authentication", security::roles_without_authentication),
    // Servers and webhooks
    rule!(servers::MALFORMED_URL, Style, "server URLs well formed", servers::malformed_url),
    rule!(webhooks::EMPTY_WEBHOOK, Style, "webhooks declare operations", webhooks::empty_webhook),
    rule!(webhooks::MISSING_OPERATION_ID, Style, "webhook operationId present", webhooks::missing_operation_id),
    rule!(webhooks::MISSING_REQUEST_BODY, Style, "webhook request body present", webhooks::missing_request_body),
];

/// Path-level and operation parameters merged and resolved. Unresolvable
/// references are skipped; `SCH001` reports them.
pub(crate) fn resolved_parameters<'a>(
    doc: &'a OpenApiSpec,
    item: &'a PathItem,
    op: &'a Operation,
) -> Vec<&'a Parameter> {
    effective_parameters(item, op)
        .into_iter()
        .filter_map(|p| doc.resolve(p))
        .collect()
}
