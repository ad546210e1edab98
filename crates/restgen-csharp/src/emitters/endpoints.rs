use minijinja::{Environment, context};
use restgen_core::GeneratedFile;
use restgen_core::ir::GenerationUnit;
use restgen_core::pipeline::Features;

use super::{FrameworkNames, OperationView, render, string_literal, unit_prefix};
use crate::error::CsharpError;

/// Emit `Operations/{Op}.cs` per operation: the bound parameters record,
/// the result type and the handler interface.
pub fn emit_operations(
    env: &Environment<'_>,
    unit: &GenerationUnit,
    operations: &[OperationView],
) -> Result<Vec<GeneratedFile>, CsharpError> {
    let prefix = unit_prefix(unit);
    let names = FrameworkNames::for_unit(unit);
    let imports = unit.registry.imported_namespaces();
    operations
        .iter()
        .map(|op| {
            let content = render(
                env,
                "operation.cs.j2",
                context! {
                    namespace => &unit.namespace,
                    imports => &imports,
                    op => op,
                    task => &names.task,
                    cancellation_token => &names.cancellation_token,
                    iresult => &names.iresult,
                    http_context => &names.http_context,
                    typed_results => &names.typed_results,
                },
            )?;
            Ok(GeneratedFile::generated(format!("{prefix}Operations/{}.cs", op.name), content))
        })
        .collect()
}

/// Name of the static class mapping a unit's routes.
pub fn endpoints_class(unit: &GenerationUnit) -> String {
    format!("{}Endpoints", unit.label())
}

/// Emit `{Label}Endpoints.cs` with one `Map{Label}Endpoints` extension
/// registering every route of the unit.
pub fn emit_endpoints(
    env: &Environment<'_>,
    unit: &GenerationUnit,
    operations: &[OperationView],
    features: Features,
) -> Result<GeneratedFile, CsharpError> {
    let names = FrameworkNames::for_unit(unit);
    let ops: Vec<minijinja::Value> = operations
        .iter()
        .map(|op| {
            context! {
                name => &op.name,
                method => op.method,
                map_method => op.map_method,
                path => &op.path,
                parameters_type => &op.parameters_type,
                interface => &op.interface,
                chain => endpoint_chain(op, features),
            }
        })
        .collect();
    let class_name = endpoints_class(unit);
    let content = render(
        env,
        "endpoints.cs.j2",
        context! {
            namespace => &unit.namespace,
            imports => unit.registry.imported_namespaces(),
            class_name => &class_name,
            label => unit.label(),
            operations => ops,
            cancellation_token => &names.cancellation_token,
        },
    )?;
    Ok(GeneratedFile::generated(
        format!("{}{class_name}.cs", unit_prefix(unit)),
        content,
    ))
}

/// The builder calls following `MapGet(...)` and friends.
fn endpoint_chain(op: &OperationView, features: Features) -> Vec<String> {
    let quoted = |s: &str| format!("\"{}\"", string_literal(s.to_string()));
    let mut chain = vec![format!(".WithName({})", quoted(&op.name))];
    if !op.tags.is_empty() {
        let tags: Vec<String> = op.tags.iter().map(|t| quoted(t)).collect();
        chain.push(format!(".WithTags({})", tags.join(", ")));
    }
    if let Some(summary) = &op.summary {
        chain.push(format!(".WithSummary({})", quoted(summary)));
    }
    if let Some(description) = &op.description {
        chain.push(format!(".WithDescription({})", quoted(description)));
    }
    for r in &op.responses {
        let Some(code) = r.code else { continue };
        match (&r.body_type, r.binary) {
            (Some(_), true) => {
                let content_type = r.content_type.as_deref().unwrap_or("application/octet-stream");
                chain.push(format!(".Produces<byte[]>({code}, {})", quoted(content_type)));
            }
            (Some(body), false) => chain.push(format!(".Produces<{body}>({code})")),
            (None, _) => chain.push(format!(".Produces({code})")),
        }
    }
    if op.auth.allow_anonymous {
        chain.push(".AllowAnonymous()".to_string());
    } else if op.auth.required {
        let mut data = Vec::new();
        if let Some(roles) = &op.auth.roles {
            data.push(format!("Roles = {}", quoted(roles)));
        }
        if let Some(schemes) = &op.auth.schemes {
            data.push(format!("AuthenticationSchemes = {}", quoted(schemes)));
        }
        if data.is_empty() {
            chain.push(".RequireAuthorization()".to_string());
        } else {
            chain.push(format!(
                ".RequireAuthorization(new AuthorizeAttribute {{ {} }})",
                data.join(", ")
            ));
        }
    }
    if let Some(policy) = &op.rate_limit {
        chain.push(format!(".RequireRateLimiting({})", quoted(policy)));
    }
    if let Some(policy) = &op.cache_policy {
        chain.push(format!(".CacheOutput({})", quoted(policy)));
    }
    if features.validation_filter {
        chain.push(format!(
            ".AddEndpointFilter<ValidationFilter<{}>>()",
            op.parameters_type
        ));
    }
    if features.minimal_api_package {
        chain.push(".WithOpenApi()".to_string());
    }
    chain
}
