pub mod client;
pub mod endpoints;
pub mod handlers;
pub mod models;
pub mod project;

use std::collections::HashSet;

use minijinja::Environment;
use restgen_core::ir::{GenerationUnit, IrOperation};
use restgen_core::parse::operation::HttpMethod;
use restgen_core::parse::parameter::ParameterLocation;
use serde::Serialize;

use crate::error::CsharpError;
use crate::type_mapper::{TypeMapper, escape_identifier};

const TEMPLATES: &[(&str, &str)] = &[
    ("model.cs.j2", include_str!("../../templates/model.cs.j2")),
    ("operation.cs.j2", include_str!("../../templates/operation.cs.j2")),
    ("endpoints.cs.j2", include_str!("../../templates/endpoints.cs.j2")),
    ("handler.cs.j2", include_str!("../../templates/handler.cs.j2")),
    ("client.cs.j2", include_str!("../../templates/client.cs.j2")),
    ("request.cs.j2", include_str!("../../templates/request.cs.j2")),
    ("send.cs.j2", include_str!("../../templates/send.cs.j2")),
    ("format.cs.j2", include_str!("../../templates/format.cs.j2")),
    ("api_extensions.cs.j2", include_str!("../../templates/api_extensions.cs.j2")),
    ("client_extensions.cs.j2", include_str!("../../templates/client_extensions.cs.j2")),
    ("exception_handler.cs.j2", include_str!("../../templates/exception_handler.cs.j2")),
    ("validation_filter.cs.j2", include_str!("../../templates/validation_filter.cs.j2")),
];

/// Template environment shared by every emitter.
pub fn environment() -> Result<Environment<'static>, CsharpError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("xml_doc", xml_doc);
    env.add_filter("literal", string_literal);
    for (name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

pub(crate) fn render(
    env: &Environment<'_>,
    name: &str,
    ctx: minijinja::Value,
) -> Result<String, CsharpError> {
    Ok(env.get_template(name)?.render(ctx)?)
}

/// Collapse text onto one line and escape it for an XML doc comment.
fn xml_doc(value: String) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for a regular C# string literal.
pub(crate) fn string_literal(value: String) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Framework type spellings for one unit. Qualified when a schema would
/// shadow them.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FrameworkNames {
    pub task: String,
    pub cancellation_token: String,
    pub iresult: String,
    pub http_context: String,
    pub typed_results: String,
}

impl FrameworkNames {
    pub(crate) fn for_unit(unit: &GenerationUnit) -> Self {
        let r = &unit.registry;
        Self {
            task: r.builtin_reference("Task"),
            cancellation_token: r.builtin_reference("CancellationToken"),
            iresult: r.builtin_reference("IResult"),
            http_context: r.builtin_reference("HttpContext"),
            typed_results: r.builtin_reference("TypedResults"),
        }
    }
}

/// Folder prefix of a unit's files, with a trailing slash unless empty.
pub(crate) fn unit_prefix(unit: &GenerationUnit) -> String {
    match unit.directory() {
        dir if dir.is_empty() => dir,
        dir => format!("{dir}/"),
    }
}

/// Hands out member names, appending `2`, `3`, ... on repeats and
/// avoiding the enclosing type's name.
pub(crate) struct MemberNames {
    type_name: String,
    taken: HashSet<String>,
}

impl MemberNames {
    pub(crate) fn within(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            taken: HashSet::from([type_name.to_string()]),
        }
    }

    pub(crate) fn claim(&mut self, wanted: &str) -> String {
        let base = match wanted {
            "" => "Value".to_string(),
            w if w.starts_with(|c: char| c.is_ascii_digit()) => format!("_{w}"),
            w => w.to_string(),
        };
        let stem = if base == self.type_name {
            format!("{base}Value")
        } else {
            base
        };
        let mut candidate = stem.clone();
        let mut n = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{stem}{n}");
            n += 1;
        }
        candidate
    }
}

/// Response factory method name and fixed status code.
pub(crate) fn response_factory(status: &str) -> (String, Option<u16>) {
    let status = status.to_ascii_uppercase();
    if status == "DEFAULT" {
        return ("Default".to_string(), None);
    }
    if let Some(class) = status.strip_suffix("XX") {
        let name = match class {
            "1" => "Informational",
            "2" => "Success",
            "3" => "Redirection",
            "4" => "ClientError",
            _ => "ServerError",
        };
        return (name.to_string(), None);
    }
    let Ok(code) = status.parse::<u16>() else {
        return (format!("Status{status}"), None);
    };
    let name = match code {
        200 => "Ok",
        201 => "Created",
        202 => "Accepted",
        204 => "NoContent",
        301 => "MovedPermanently",
        302 => "Found",
        304 => "NotModified",
        400 => "BadRequest",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "NotFound",
        405 => "MethodNotAllowed",
        409 => "Conflict",
        410 => "Gone",
        412 => "PreconditionFailed",
        415 => "UnsupportedMediaType",
        422 => "UnprocessableEntity",
        429 => "TooManyRequests",
        500 => "InternalServerError",
        501 => "NotImplemented",
        502 => "BadGateway",
        503 => "ServiceUnavailable",
        504 => "GatewayTimeout",
        other => return (format!("Status{other}"), Some(other)),
    };
    (name.to_string(), Some(code))
}

/// An operation as every C# template sees it.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OperationView {
    pub name: String,
    pub operation_id: String,
    pub method: &'static str,
    /// `MapGet` and friends; `None` for verbs mapped through `MapMethods`.
    pub map_method: Option<&'static str>,
    /// `HttpMethod.Get` and friends for the client.
    pub http_method: String,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub interface: String,
    pub handler: String,
    pub parameters_type: String,
    pub result_type: String,
    pub parameters: Vec<ParameterView>,
    pub has_cookies: bool,
    pub body: Option<BodyView>,
    pub responses: Vec<ResponseView>,
    /// Body type of the first success response.
    pub success_type: Option<String>,
    pub success_binary: bool,
    pub auth: AuthView,
    pub rate_limit: Option<String>,
    pub cache_policy: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ParameterView {
    pub property: String,
    pub argument: String,
    pub original_name: String,
    pub location: &'static str,
    /// Binding attribute for the parameters record; `None` for cookies.
    pub binding: Option<&'static str>,
    pub type_name: String,
    pub required: bool,
    pub collection: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BodyView {
    pub property: String,
    pub type_name: String,
    pub required: bool,
    pub content_type: String,
    pub binary: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ResponseView {
    pub status: String,
    pub description: String,
    pub factory: String,
    pub code: Option<u16>,
    pub body_type: Option<String>,
    pub binary: bool,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct AuthView {
    pub required: bool,
    pub allow_anonymous: bool,
    pub roles: Option<String>,
    pub schemes: Option<String>,
}

fn map_method(method: HttpMethod) -> Option<&'static str> {
    match method {
        HttpMethod::Get => Some("MapGet"),
        HttpMethod::Post => Some("MapPost"),
        HttpMethod::Put => Some("MapPut"),
        HttpMethod::Delete => Some("MapDelete"),
        HttpMethod::Patch => Some("MapPatch"),
        _ => None,
    }
}

fn location_order(location: ParameterLocation) -> u8 {
    match location {
        ParameterLocation::Path => 0,
        ParameterLocation::Query => 1,
        ParameterLocation::Header => 2,
        ParameterLocation::Cookie => 3,
    }
}

pub(crate) fn operation_view(
    op: &IrOperation,
    mapper: &TypeMapper<'_>,
    handler_suffix: &str,
) -> Result<OperationView, CsharpError> {
    let name = op.name.pascal_case.clone();
    let parameters_type = format!("{name}Parameters");
    let mut members = MemberNames::within(&parameters_type);
    members.claim("HttpContext");

    let mut ordered: Vec<_> = op.parameters.iter().collect();
    ordered.sort_by_key(|p| location_order(p.location));
    let mut parameters = Vec::with_capacity(ordered.len());
    for p in ordered {
        let (location, binding) = match p.location {
            ParameterLocation::Path => ("route", Some("FromRoute")),
            ParameterLocation::Query => ("query", Some("FromQuery")),
            ParameterLocation::Header => ("header", Some("FromHeader")),
            ParameterLocation::Cookie => ("cookie", None),
        };
        let required = p.required && !p.nullable;
        parameters.push(ParameterView {
            property: members.claim(&p.name.pascal_case),
            argument: escape_identifier(&p.name.camel_case),
            original_name: p.original_name.clone(),
            location,
            binding,
            type_name: mapper.map_parameter(&p.param_type, !required)?,
            required,
            collection: mapper.is_collection(&p.param_type),
            description: p.description.clone(),
        });
    }
    dedupe_arguments(&mut parameters);

    let body = match &op.request_body {
        Some(b) => Some(BodyView {
            property: members.claim("Body"),
            type_name: mapper.map_optional(&b.body_type, !b.required)?,
            required: b.required,
            content_type: b.content_type.clone(),
            binary: mapper.is_binary(&b.body_type),
            description: b.description.clone(),
        }),
        None => None,
    };

    let result_type = format!("{name}Result");
    let mut factories = MemberNames::within(&result_type);
    factories.claim("WithStatus");
    factories.claim("ExecuteAsync");
    let mut responses = Vec::with_capacity(op.responses.len());
    for r in &op.responses {
        let (factory, code) = response_factory(&r.status);
        let body_type = r.body_type.as_ref().map(|t| mapper.map(t)).transpose()?;
        responses.push(ResponseView {
            status: r.status.clone(),
            description: r.description.clone(),
            factory: factories.claim(&factory),
            code,
            body_type,
            binary: r.body_type.as_ref().is_some_and(|t| mapper.is_binary(t)),
            content_type: r.content_type.clone(),
        });
    }

    let success = op.success_response().and_then(|r| r.body_type.as_ref());
    let success_type = success.map(|t| mapper.map(t)).transpose()?;

    let join = |items: &[String]| (!items.is_empty()).then(|| items.join(","));
    Ok(OperationView {
        operation_id: op.operation_id.clone().unwrap_or_else(|| op.name.camel_case.clone()),
        method: op.method.as_str(),
        map_method: map_method(op.method),
        http_method: format!("HttpMethod.{}", heck::AsUpperCamelCase(op.method.key())),
        path: op.path.clone(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        deprecated: op.deprecated,
        interface: format!("I{name}{handler_suffix}"),
        handler: format!("{name}{handler_suffix}"),
        parameters_type,
        result_type,
        has_cookies: parameters.iter().any(|p| p.location == "cookie"),
        parameters,
        body,
        responses,
        success_binary: success.is_some_and(|t| mapper.is_binary(t)),
        success_type,
        auth: AuthView {
            required: op.auth.required,
            allow_anonymous: op.auth.allow_anonymous,
            roles: join(&op.auth.roles),
            schemes: join(&op.auth.schemes),
        },
        rate_limit: op.rate_limit.clone(),
        cache_policy: op.cache_policy.clone(),
        name,
    })
}

/// Method arguments must be unique and must not clash with the ones every
/// client method carries.
fn dedupe_arguments(parameters: &mut [ParameterView]) {
    let mut taken: HashSet<String> = ["body", "cancellationToken", "request", "response", "url", "query"]
        .into_iter()
        .map(str::to_string)
        .collect();
    for p in parameters.iter_mut() {
        let mut candidate = p.argument.clone();
        let mut n = 2;
        while !taken.insert(candidate.clone()) {
            candidate = format!("{}{n}", p.argument.trim_start_matches('@'));
            n += 1;
        }
        p.argument = candidate;
    }
}
