//! C# backend: ASP.NET Core minimal API servers, handler scaffolds and
//! typed HTTP clients.

pub(crate) mod emitters;
pub mod error;
pub mod generator;
pub mod type_mapper;

pub use error::CsharpError;
pub use generator::{CsharpClientGenerator, CsharpHandlersGenerator, CsharpServerGenerator, generator_for};
