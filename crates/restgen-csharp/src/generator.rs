use std::collections::HashMap;

use minijinja::Environment;
use restgen_core::config::{GenerationMode, Target};
use restgen_core::error::GenerateError;
use restgen_core::ir::{GenerationUnit, IrType};
use restgen_core::pipeline::GenerationContext;
use restgen_core::{CodeGenerator, GeneratedFile};

use crate::emitters::{self, OperationView, client, endpoints, handlers, models, project};
use crate::error::CsharpError;
use crate::type_mapper::{TypeMapper, collect_aliases};

/// What every emitter of one unit shares.
struct UnitScope {
    env: Environment<'static>,
    aliases: HashMap<String, IrType>,
}

impl UnitScope {
    fn new(ctx: &GenerationContext<'_>) -> Result<Self, CsharpError> {
        Ok(Self {
            env: emitters::environment()?,
            aliases: collect_aliases(ctx.document),
        })
    }

    fn mapper<'a>(&'a self, unit: &'a GenerationUnit) -> TypeMapper<'a> {
        TypeMapper::new(&unit.registry, &self.aliases)
    }

    fn operations(
        &self,
        unit: &GenerationUnit,
        ctx: &GenerationContext<'_>,
    ) -> Result<Vec<OperationView>, CsharpError> {
        let mapper = self.mapper(unit);
        unit.operations
            .iter()
            .map(|op| emitters::operation_view(op, &mapper, ctx.config.handler_suffix()))
            .collect()
    }
}

/// Models, parameter and result records, handler interfaces and endpoint
/// registrations for an ASP.NET Core minimal API.
pub struct CsharpServerGenerator;

impl CodeGenerator for CsharpServerGenerator {
    fn target(&self) -> Target {
        Target::Server
    }

    fn generate_unit(
        &self,
        unit: &GenerationUnit,
        ctx: &GenerationContext<'_>,
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let scope = UnitScope::new(ctx)?;
        let mut files = models::emit_models(
            &scope.env,
            unit,
            &scope.mapper(unit),
            ctx.config.generate_partial_models,
        )?;
        let operations = scope.operations(unit, ctx)?;
        if !operations.is_empty() {
            files.extend(endpoints::emit_operations(&scope.env, unit, &operations)?);
            files.push(endpoints::emit_endpoints(&scope.env, unit, &operations, ctx.features)?);
        }
        Ok(files)
    }

    fn generate_shared(
        &self,
        ctx: &GenerationContext<'_>,
        units: &[GenerationUnit],
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let env = emitters::environment()?;
        Ok(project::emit_server_project(&env, ctx, units)?)
    }
}

/// Editable handler classes, created once and then only kept in step with
/// the interface signature.
pub struct CsharpHandlersGenerator;

impl CodeGenerator for CsharpHandlersGenerator {
    fn target(&self) -> Target {
        Target::Handlers
    }

    fn generate_unit(
        &self,
        unit: &GenerationUnit,
        ctx: &GenerationContext<'_>,
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let scope = UnitScope::new(ctx)?;
        let operations = scope.operations(unit, ctx)?;
        Ok(handlers::emit_handlers(&scope.env, unit, &operations, ctx.summary)?)
    }
}

/// Models plus typed HTTP clients.
pub struct CsharpClientGenerator;

impl CodeGenerator for CsharpClientGenerator {
    fn target(&self) -> Target {
        Target::Client
    }

    fn generate_unit(
        &self,
        unit: &GenerationUnit,
        ctx: &GenerationContext<'_>,
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let scope = UnitScope::new(ctx)?;
        let mut files = models::emit_models(
            &scope.env,
            unit,
            &scope.mapper(unit),
            ctx.config.generate_partial_models,
        )?;
        let operations = scope.operations(unit, ctx)?;
        if !operations.is_empty() {
            match ctx.config.generation_mode {
                GenerationMode::TypedClient => {
                    files.push(client::emit_typed_client(&scope.env, unit, &operations)?)
                }
                GenerationMode::EndpointPerOperation => {
                    files.extend(client::emit_requests(&scope.env, unit, &operations)?)
                }
            }
        }
        Ok(files)
    }

    fn generate_shared(
        &self,
        ctx: &GenerationContext<'_>,
        units: &[GenerationUnit],
    ) -> Result<Vec<GeneratedFile>, GenerateError> {
        let env = emitters::environment()?;
        Ok(project::emit_client_project(&env, ctx, units)?)
    }
}

/// The generator for a target.
pub fn generator_for(target: Target) -> Box<dyn CodeGenerator> {
    match target {
        Target::Server => Box::new(CsharpServerGenerator),
        Target::Handlers => Box::new(CsharpHandlersGenerator),
        Target::Client => Box::new(CsharpClientGenerator),
    }
}
