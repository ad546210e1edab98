use crate::error::GenerateError;
use crate::naming::{normalize_name, route_to_name};
use crate::parse::extensions::{
    AUTHENTICATION_REQUIRED, AUTHENTICATION_SCHEMES, AUTHORIZE_ROLES, CACHE_POLICY, Extensions,
    ExtensionsExt, RATE_LIMIT_POLICY,
};
use crate::parse::content::{RequestBodyOrRef, ResponseOrRef, preferred_media_type};
use crate::parse::operation::{HttpMethod, Operation, PathItem, effective_parameters};
use crate::parse::parameter::{ParameterLocation, ParameterOrRef};
use crate::parse::reference::RefOr;
use crate::parse::security::{requirement_scheme_names, requires_authentication};
use crate::parse::spec::OpenApiSpec;

use super::schemas::{IrType, is_nullable, to_ir_type};
use super::types::NormalizedName;

/// A fully resolved API operation.
#[derive(Debug, Clone)]
pub struct IrOperation {
    pub name: NormalizedName,
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub path: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<IrParameter>,
    pub request_body: Option<IrRequestBody>,
    pub responses: Vec<IrResponse>,
    pub deprecated: bool,
    pub auth: IrAuth,
    pub rate_limit: Option<String>,
    pub cache_policy: Option<String>,
}

impl IrOperation {
    /// The first declared `2xx` response.
    pub fn success_response(&self) -> Option<&IrResponse> {
        self.responses.iter().find(|r| r.status.starts_with('2'))
    }

    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &IrParameter> {
        self.parameters.iter().filter(move |p| p.location == location)
    }

    /// Every type the operation's signature mentions.
    pub fn signature_types(&self) -> Vec<&IrType> {
        self.parameters
            .iter()
            .map(|p| &p.param_type)
            .chain(self.request_body.as_ref().map(|b| &b.body_type))
            .chain(self.responses.iter().filter_map(|r| r.body_type.as_ref()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct IrParameter {
    pub name: NormalizedName,
    pub original_name: String,
    pub location: ParameterLocation,
    pub param_type: IrType,
    pub required: bool,
    pub nullable: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IrRequestBody {
    pub body_type: IrType,
    pub required: bool,
    pub content_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IrResponse {
    /// Status pattern as declared (`200`, `4XX`, `default`).
    pub status: String,
    pub description: String,
    pub body_type: Option<IrType>,
    pub content_type: Option<String>,
}

/// Access requirements collected from the operation, its path item and
/// the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrAuth {
    pub required: bool,
    /// Explicit opt-out: `x-authentication-required: false` or `security: []`.
    pub allow_anonymous: bool,
    pub roles: Vec<String>,
    pub schemes: Vec<String>,
}

/// Build the IR for one operation.
pub fn to_ir_operation(
    doc: &OpenApiSpec,
    path: &str,
    method: HttpMethod,
    item: &PathItem,
    op: &Operation,
) -> Result<IrOperation, GenerateError> {
    let raw_name = op
        .operation_id
        .clone()
        .unwrap_or_else(|| route_to_name(method, path));

    let parameters = effective_parameters(item, op)
        .into_iter()
        .map(|p| to_ir_parameter(doc, p))
        .collect::<Result<Vec<_>, _>>()?;

    let request_body = match &op.request_body {
        None => None,
        Some(body) => Some(to_ir_request_body(doc, body)?),
    };

    let responses = op
        .responses
        .iter()
        .map(|(status, response)| to_ir_response(doc, status, response))
        .collect::<Result<Vec<_>, _>>()?;

    let scopes = [&op.extensions, &item.extensions, &doc.extensions];
    Ok(IrOperation {
        name: normalize_name(&raw_name),
        operation_id: op.operation_id.clone(),
        method,
        path: path.to_string(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        parameters,
        request_body,
        responses,
        deprecated: op.is_deprecated(),
        auth: resolve_auth(doc, item, op),
        rate_limit: nearest_string(&scopes, RATE_LIMIT_POLICY),
        cache_policy: nearest_string(&scopes, CACHE_POLICY),
    })
}

fn nearest_string(scopes: &[&Extensions], key: &str) -> Option<String> {
    scopes.iter().find_map(|ext| ext.string(key)).map(str::to_string)
}

/// Roles and schemes come from the operation, else its path item. The
/// root lists only declare what is valid.
fn resolve_auth(doc: &OpenApiSpec, item: &PathItem, op: &Operation) -> IrAuth {
    let nearest_list = |key: &str| {
        let own = op.extensions.string_list(key);
        if own.is_empty() { item.extensions.string_list(key) } else { own }
    };
    let roles = nearest_list(AUTHORIZE_ROLES);
    let mut schemes = nearest_list(AUTHENTICATION_SCHEMES);

    let security = op.security.as_deref().or(doc.security.as_deref()).unwrap_or(&[]);
    if schemes.is_empty() {
        schemes = requirement_scheme_names(security);
    }
    let flag = [&op.extensions, &item.extensions, &doc.extensions]
        .iter()
        .find_map(|ext| ext.flag(AUTHENTICATION_REQUIRED));
    let opted_out = op.security.as_deref().is_some_and(|s| !requires_authentication(s));

    let required = match flag {
        Some(explicit) => explicit,
        None => !opted_out && (requires_authentication(security) || !roles.is_empty() || !schemes.is_empty()),
    };
    IrAuth {
        required,
        allow_anonymous: flag == Some(false) || opted_out,
        roles,
        schemes,
    }
}

fn to_ir_parameter(doc: &OpenApiSpec, param: &ParameterOrRef) -> Result<IrParameter, GenerateError> {
    let p = doc.resolve(param).ok_or_else(|| unresolved(param))?;
    let schema = p.effective_schema();
    Ok(IrParameter {
        name: normalize_name(&p.name),
        original_name: p.name.clone(),
        location: p.location,
        param_type: schema.map_or(IrType::String, to_ir_type),
        required: p.is_required(),
        nullable: schema.is_some_and(is_nullable),
        description: p.description.clone(),
    })
}

fn unresolved<T>(node: &RefOr<T>) -> GenerateError {
    match node.as_ref_target() {
        Some(target) => GenerateError::UnknownSchema(target.to_string()),
        None => GenerateError::Other("reference chain does not end in a definition".to_string()),
    }
}

fn to_ir_request_body(doc: &OpenApiSpec, body: &RequestBodyOrRef) -> Result<IrRequestBody, GenerateError> {
    let resolved = doc.resolve(body).ok_or_else(|| unresolved(body))?;
    let (content_type, body_type) = match preferred_media_type(&resolved.content) {
        Some((mt, media)) => (
            mt.to_string(),
            media.schema.as_ref().map_or(IrType::Any, to_ir_type),
        ),
        None => ("application/json".to_string(), IrType::Any),
    };
    Ok(IrRequestBody {
        body_type,
        required: resolved.required,
        content_type,
        description: resolved.description.clone(),
    })
}

fn to_ir_response(
    doc: &OpenApiSpec,
    status: &str,
    response: &ResponseOrRef,
) -> Result<IrResponse, GenerateError> {
    let resolved = doc.resolve(response).ok_or_else(|| unresolved(response))?;
    let picked = preferred_media_type(&resolved.content);
    Ok(IrResponse {
        status: status.to_string(),
        description: resolved.description.clone(),
        body_type: picked.and_then(|(_, m)| m.schema.as_ref()).map(to_ir_type),
        content_type: picked.map(|(mt, _)| mt.to_string()),
    })
}
