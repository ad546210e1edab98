use minijinja::{Environment, context};
use restgen_core::GeneratedFile;
use restgen_core::ir::GenerationUnit;
use serde::Serialize;

use super::{FrameworkNames, OperationView, ParameterView, render, unit_prefix};
use crate::error::CsharpError;

#[derive(Debug, Serialize)]
struct ClientMethod<'a> {
    op: &'a OperationView,
    arguments: String,
    returns: String,
    /// Interpolated string expression of the relative request URL.
    route: String,
    query: Vec<&'a ParameterView>,
    headers: Vec<&'a ParameterView>,
    cookies: Vec<&'a ParameterView>,
}

/// Name of the typed client class of a unit.
pub fn client_class(unit: &GenerationUnit) -> String {
    format!("{}Client", unit.label())
}

/// Emit `{Label}Client.cs`: one typed client with an async method per
/// operation.
pub fn emit_typed_client(
    env: &Environment<'_>,
    unit: &GenerationUnit,
    operations: &[OperationView],
) -> Result<GeneratedFile, CsharpError> {
    let names = FrameworkNames::for_unit(unit);
    let methods: Vec<ClientMethod<'_>> = operations.iter().map(|op| client_method(op, &names)).collect();
    let class_name = client_class(unit);
    let content = render(
        env,
        "client.cs.j2",
        context! {
            namespace => &unit.namespace,
            imports => unit.registry.imported_namespaces(),
            label => unit.label(),
            class_name => &class_name,
            methods => methods,
            http_client => "_httpClient",
        },
    )?;
    Ok(GeneratedFile::generated(
        format!("{}{class_name}.cs", unit_prefix(unit)),
        content,
    ))
}

/// Emit `Requests/{Op}Request.cs`: one static sender per operation that
/// takes the `HttpClient` as an argument.
pub fn emit_requests(
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
                "request.cs.j2",
                context! {
                    namespace => &unit.namespace,
                    imports => &imports,
                    m => client_method(op, &names),
                    http_client => "httpClient",
                },
            )?;
            Ok(GeneratedFile::generated(format!("{prefix}Requests/{}Request.cs", op.name), content))
        })
        .collect()
}

fn client_method<'a>(op: &'a OperationView, names: &FrameworkNames) -> ClientMethod<'a> {
    let by_location = |location: &str| -> Vec<&'a ParameterView> {
        op.parameters.iter().filter(|p| p.location == location).collect()
    };

    let mut required = Vec::new();
    let mut optional = Vec::new();
    for p in &op.parameters {
        if p.location == "route" || p.required {
            required.push(format!("{} {}", p.type_name, p.argument));
        } else {
            optional.push(format!("{} {} = null", p.type_name, p.argument));
        }
    }
    if let Some(body) = &op.body {
        if body.required {
            // Bodies come right after the route values.
            let routes = op.parameters.iter().filter(|p| p.location == "route").count();
            required.insert(routes, format!("{} body", body.type_name));
        } else {
            optional.insert(0, format!("{} body = null", body.type_name));
        }
    }
    let mut arguments = required;
    arguments.extend(optional);
    arguments.push(format!("{} cancellationToken = default", names.cancellation_token));

    let returns = if op.success_binary {
        format!("{}<byte[]>", names.task)
    } else if let Some(ty) = &op.success_type {
        format!("{}<{ty}?>", names.task)
    } else {
        names.task.clone()
    };

    ClientMethod {
        route: client_route(&op.path, &op.parameters),
        query: by_location("query"),
        headers: by_location("header"),
        cookies: by_location("cookie"),
        arguments: arguments.join(", "),
        returns,
        op,
    }
}

/// Relative request URL as a C# interpolated string, with every path
/// placeholder escaped through `Uri.EscapeDataString`.
fn client_route(path: &str, parameters: &[ParameterView]) -> String {
    let mut out = String::from("$\"");
    let mut rest = path.trim_start_matches('/');
    while let Some(start) = rest.find('{') {
        push_literal(&mut out, &rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            rest = &rest[start..];
            break;
        };
        let name = &after[..end];
        match parameters
            .iter()
            .find(|p| p.location == "route" && p.original_name == name)
        {
            Some(p) => {
                out.push_str("{global::System.Uri.EscapeDataString(Format(");
                out.push_str(&p.argument);
                out.push_str("))}");
            }
            None => push_literal(&mut out, &format!("{{{name}}}")),
        }
        rest = &after[end + 1..];
    }
    push_literal(&mut out, rest);
    out.push('"');
    out
}

fn push_literal(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_param(name: &str, argument: &str) -> ParameterView {
        ParameterView {
            property: name.to_string(),
            argument: argument.to_string(),
            original_name: name.to_string(),
            location: "route",
            binding: Some("FromRoute"),
            type_name: "long".to_string(),
            required: true,
            collection: false,
            description: None,
        }
    }

    #[test]
    fn routes_interpolate_declared_placeholders() {
        let params = vec![route_param("petId", "petId")];
        assert_eq!(
            client_route("/pets/{petId}/photos", &params),
            "$\"pets/{global::System.Uri.EscapeDataString(Format(petId))}/photos\""
        );
        assert_eq!(client_route("/health", &[]), "$\"health\"");
        // Undeclared placeholders stay literal.
        assert_eq!(client_route("/a/{b}", &[]), "$\"a/{{b}}\"");
    }
}
