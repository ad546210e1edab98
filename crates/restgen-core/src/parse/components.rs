use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::content::{RequestBody, RequestBodyOrRef, Response, ResponseOrRef};
use super::extensions::Extensions;
use super::parameter::{Parameter, ParameterOrRef};
use super::reference::RefOr;
use super::schema::SchemaOrRef;
use super::security::SecurityScheme;

/// The reusable definitions of a document (`components`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ResponseOrRef>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,

    /// Sections generation never reads (`headers`, `examples`, `links`,
    /// `callbacks`, `pathItems`) plus vendor extensions, kept verbatim.
    #[serde(flatten)]
    pub other: Extensions,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.parameters.is_empty()
            && self.request_bodies.is_empty()
            && self.responses.is_empty()
            && self.security_schemes.is_empty()
            && self.other.is_empty()
    }
}

/// A definition that can live under `#/components/{SECTION}/`.
pub trait ComponentKind: Sized {
    const SECTION: &'static str;

    fn registry(components: &Components) -> &IndexMap<String, RefOr<Self>>;
}

impl ComponentKind for Parameter {
    const SECTION: &'static str = "parameters";

    fn registry(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.parameters
    }
}

impl ComponentKind for RequestBody {
    const SECTION: &'static str = "requestBodies";

    fn registry(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.request_bodies
    }
}

impl ComponentKind for Response {
    const SECTION: &'static str = "responses";

    fn registry(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        &components.responses
    }
}
