use log::debug;
use minijinja::{Environment, context};
use restgen_core::GeneratedFile;
use restgen_core::ir::GenerationUnit;
use restgen_core::pipeline::CompilationSummary;
use restgen_core::pipeline::signature::ExpectedSignature;

use super::{FrameworkNames, OperationView, render, unit_prefix};
use crate::error::CsharpError;

/// The `HandleAsync` signature every handler of `op` must declare.
pub fn expected_signature(op: &OperationView, names: &FrameworkNames) -> ExpectedSignature {
    ExpectedSignature {
        method: "HandleAsync".to_string(),
        result_type: op.result_type.clone(),
        parameters: format!(
            "{} parameters, {} cancellationToken",
            op.parameters_type, names.cancellation_token
        ),
        qualify_task: names.task != "Task",
    }
}

/// Emit one editable handler scaffold per operation. Operations already
/// implemented elsewhere in the host are skipped; scaffolds this target
/// created earlier are still emitted so their signature is reconciled.
pub fn emit_handlers(
    env: &Environment<'_>,
    unit: &GenerationUnit,
    operations: &[OperationView],
    summary: &CompilationSummary,
) -> Result<Vec<GeneratedFile>, CsharpError> {
    let prefix = unit_prefix(unit);
    let names = FrameworkNames::for_unit(unit);
    let mut imports = vec!["System.Threading".to_string(), "System.Threading.Tasks".to_string()];
    imports.extend(unit.registry.imported_namespaces());

    let mut files = Vec::with_capacity(operations.len());
    for op in operations {
        if let Some(existing) = summary.handler(&op.handler)
            && existing.namespace != unit.namespace
        {
            debug!("{} is implemented in {}; no scaffold", op.handler, existing.namespace);
            continue;
        }
        let content = render(
            env,
            "handler.cs.j2",
            context! {
                namespace => &unit.namespace,
                imports => &imports,
                op => op,
                task => &names.task,
                cancellation_token => &names.cancellation_token,
            },
        )?;
        files.push(GeneratedFile::scaffold(
            format!("{prefix}Handlers/{}.cs", op.handler),
            content,
            expected_signature(op, &names),
        ));
    }
    Ok(files)
}
