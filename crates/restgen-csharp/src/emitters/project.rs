//! Project-wide files: dependency injection wiring and the optional
//! cross-cutting pieces switched on by the marker.

use minijinja::{Environment, context};
use restgen_core::GeneratedFile;
use restgen_core::config::GenerationMode;
use restgen_core::ir::GenerationUnit;
use restgen_core::pipeline::GenerationContext;
use serde::Serialize;

use super::client::client_class;
use super::endpoints::endpoints_class;
use super::render;
use crate::error::CsharpError;

#[derive(Debug, Serialize)]
struct Registration {
    interface: String,
    /// `None` when the host has no implementation yet.
    implementation: Option<String>,
}

#[derive(Debug, Serialize)]
struct EndpointGroup {
    class_name: String,
    label: String,
}

fn root_namespace(ctx: &GenerationContext<'_>) -> String {
    format!("{}.Generated", ctx.project)
}

/// `GeneratedApiExtensions.cs` plus the exception handler and validation
/// filter when those features are on.
pub fn emit_server_project(
    env: &Environment<'_>,
    ctx: &GenerationContext<'_>,
    units: &[GenerationUnit],
) -> Result<Vec<GeneratedFile>, CsharpError> {
    let namespace = root_namespace(ctx);
    let suffix = ctx.config.handler_suffix();
    let mut handlers = Vec::new();
    let mut groups = Vec::new();
    for unit in units.iter().filter(|u| !u.operations.is_empty()) {
        groups.push(EndpointGroup {
            class_name: format!("global::{}.{}", unit.namespace, endpoints_class(unit)),
            label: unit.label().to_string(),
        });
        for op in &unit.operations {
            let name = format!("{}{suffix}", op.name.pascal_case);
            handlers.push(Registration {
                interface: format!("global::{}.I{name}", unit.namespace),
                implementation: ctx
                    .summary
                    .handler(&name)
                    .map(|h| format!("global::{}.{}", h.namespace, h.name)),
            });
        }
    }
    let validators: Vec<String> = if ctx.features.validation_filter {
        ctx.summary.validators.iter().map(|v| format!("global::{v}")).collect()
    } else {
        Vec::new()
    };

    let mut files = vec![GeneratedFile::generated(
        "GeneratedApiExtensions.cs",
        render(
            env,
            "api_extensions.cs.j2",
            context! {
                namespace => &namespace,
                handlers => handlers,
                validators => validators,
                endpoint_groups => groups,
                global_error_handler => ctx.features.global_error_handler,
            },
        )?,
    )];
    if ctx.features.global_error_handler {
        files.push(GeneratedFile::generated(
            "GlobalExceptionHandler.cs",
            render(env, "exception_handler.cs.j2", context! { namespace => &namespace })?,
        ));
    }
    if ctx.features.validation_filter {
        files.push(GeneratedFile::generated(
            "ValidationFilter.cs",
            render(env, "validation_filter.cs.j2", context! { namespace => &namespace })?,
        ));
    }
    Ok(files)
}

/// `GeneratedClientExtensions.cs`: registers the typed clients, or one
/// named client when requests are sent per operation.
pub fn emit_client_project(
    env: &Environment<'_>,
    ctx: &GenerationContext<'_>,
    units: &[GenerationUnit],
) -> Result<Vec<GeneratedFile>, CsharpError> {
    let clients: Vec<String> = match ctx.config.generation_mode {
        GenerationMode::TypedClient => units
            .iter()
            .filter(|u| !u.operations.is_empty())
            .map(|u| format!("global::{}.{}", u.namespace, client_class(u)))
            .collect(),
        GenerationMode::EndpointPerOperation => Vec::new(),
    };
    // Client routes are relative, so the base must end in '/' to keep its path.
    let default_base_address = ctx.document.servers.first().map(|s| {
        let mut url = s.substituted_url();
        if !url.ends_with('/') {
            url.push('/');
        }
        url
    });
    let content = render(
        env,
        "client_extensions.cs.j2",
        context! {
            namespace => root_namespace(ctx),
            clients => clients,
            client_name => ctx.project,
            default_base_address => default_base_address,
        },
    )?;
    Ok(vec![GeneratedFile::generated("GeneratedClientExtensions.cs", content)])
}
