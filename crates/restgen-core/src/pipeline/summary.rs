use serde::{Deserialize, Serialize};

/// An existing handler implementation found in the host project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    pub name: String,
    pub namespace: String,
}

impl HandlerDescriptor {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

/// What generation needs to know about the project it generates into.
/// The command line scans a source tree; tests supply fixed answers.
pub trait HostEnvironment {
    /// Whether the minimal API framework package is referenced.
    fn has_framework_reference(&self) -> bool;
    fn handlers(&self) -> Vec<HandlerDescriptor>;
    /// Fully qualified names of request validator implementations.
    fn validators(&self) -> Vec<String>;
    /// Namespaces that declare handler interfaces.
    fn interface_namespaces(&self) -> Vec<String>;
}

/// A normalized snapshot of the host. Lists are sorted and deduplicated,
/// so two summaries of the same facts compare equal however they were
/// gathered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilationSummary {
    pub has_framework_reference: bool,
    pub handlers: Vec<HandlerDescriptor>,
    pub validators: Vec<String>,
    pub interface_namespaces: Vec<String>,
}

impl CompilationSummary {
    pub fn new(
        has_framework_reference: bool,
        handlers: impl IntoIterator<Item = HandlerDescriptor>,
        validators: impl IntoIterator<Item = String>,
        interface_namespaces: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            has_framework_reference,
            handlers: sorted(handlers),
            validators: sorted(validators),
            interface_namespaces: sorted(interface_namespaces),
        }
    }

    pub fn from_host(host: &dyn HostEnvironment) -> Self {
        Self::new(
            host.has_framework_reference(),
            host.handlers(),
            host.validators(),
            host.interface_namespaces(),
        )
    }

    pub fn has_validators(&self) -> bool {
        !self.validators.is_empty()
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.handlers.iter().find(|h| h.name == name)
    }
}

fn sorted<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = items.into_iter().collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<HandlerDescriptor>);

    impl HostEnvironment for Fixed {
        fn has_framework_reference(&self) -> bool {
            true
        }
        fn handlers(&self) -> Vec<HandlerDescriptor> {
            self.0.clone()
        }
        fn validators(&self) -> Vec<String> {
            vec!["Api.PetValidator".into(), "Api.OrderValidator".into(), "Api.PetValidator".into()]
        }
        fn interface_namespaces(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[test]
    fn host_reduction_is_normalized() {
        let a = CompilationSummary::from_host(&Fixed(vec![
            HandlerDescriptor::new("GetPetHandler", "Api"),
            HandlerDescriptor::new("AddPetHandler", "Api"),
        ]));
        let b = CompilationSummary::from_host(&Fixed(vec![
            HandlerDescriptor::new("AddPetHandler", "Api"),
            HandlerDescriptor::new("GetPetHandler", "Api"),
        ]));
        assert_eq!(a, b);
        assert_eq!(a.validators, vec!["Api.OrderValidator", "Api.PetValidator"]);
        assert_eq!(a.handler("GetPetHandler").map(|h| h.namespace.as_str()), Some("Api"));
    }
}
