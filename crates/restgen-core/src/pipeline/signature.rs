//! Keeping user-owned handler files in step with the generated interface.
//!
//! Only the handler method's signature is touched. Bodies, usings and any
//! other members stay as the user wrote them.

use std::time::{Duration, Instant};

use log::warn;
use regex::RegexBuilder;

/// Sources larger than this are left alone.
pub const MAX_SOURCE_BYTES: usize = 512 * 1024;
/// Time allowed for locating the signature.
pub const MATCH_BUDGET: Duration = Duration::from_millis(250);

const QUALIFIED_TASK: &str = "System.Threading.Tasks.Task";

/// The signature a handler implementation must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSignature {
    pub method: String,
    /// Type argument of the returned task.
    pub result_type: String,
    /// Parameter list without parentheses.
    pub parameters: String,
    /// A schema shadows `Task`, so the short name would not resolve.
    pub qualify_task: bool,
}

impl ExpectedSignature {
    fn render(&self, is_async: bool, task: &str) -> String {
        format!(
            "{}{task}<{}> {}({})",
            if is_async { "async " } else { "" },
            self.result_type,
            self.method,
            self.parameters
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    /// The new file content.
    Rewritten(String),
    Unchanged,
    /// No method with the expected name was found.
    NoMatch,
    Skipped(String),
}

/// Rewrite the first declaration of `expected.method` in `source` so it
/// matches `expected`. An existing `async` modifier and a fully qualified
/// `System.Threading.Tasks.Task` spelling are preserved.
pub fn reconcile_signature(source: &str, expected: &ExpectedSignature) -> SignatureOutcome {
    if source.len() > MAX_SOURCE_BYTES {
        return SignatureOutcome::Skipped(format!(
            "source is {} bytes, above the {MAX_SOURCE_BYTES} byte limit",
            source.len()
        ));
    }
    let started = Instant::now();
    let pattern = format!(
        r"(?P<async>\basync\s+)?(?P<task>(?:global::)?(?:System\.Threading\.Tasks\.)?(?:Value)?Task)\s*(?:<(?P<result>[^()]*?)>)?\s+{}\s*\((?P<params>[^)]*)\)",
        regex::escape(&expected.method)
    );
    let re = match RegexBuilder::new(&pattern).size_limit(1 << 20).build() {
        Ok(re) => re,
        Err(e) => return SignatureOutcome::Skipped(format!("invalid signature pattern: {e}")),
    };
    let found = re.captures(source);
    if started.elapsed() > MATCH_BUDGET {
        warn!("signature match for {} exceeded {MATCH_BUDGET:?}", expected.method);
        return SignatureOutcome::Skipped(format!("matching exceeded {MATCH_BUDGET:?}"));
    }
    let Some(caps) = found else {
        return SignatureOutcome::NoMatch;
    };
    let Some(whole) = caps.get(0) else {
        return SignatureOutcome::NoMatch;
    };

    let existing_task = caps.name("task").map_or("Task", |m| m.as_str());
    let task = if existing_task.contains(QUALIFIED_TASK) || expected.qualify_task {
        if existing_task.starts_with("global::") {
            format!("global::{QUALIFIED_TASK}")
        } else {
            QUALIFIED_TASK.to_string()
        }
    } else {
        "Task".to_string()
    };
    let rendered = expected.render(caps.name("async").is_some(), &task);
    if rendered == whole.as_str() {
        return SignatureOutcome::Unchanged;
    }

    let mut out = String::with_capacity(source.len() + rendered.len());
    out.push_str(&source[..whole.start()]);
    out.push_str(&rendered);
    out.push_str(&source[whole.end()..]);
    SignatureOutcome::Rewritten(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> ExpectedSignature {
        ExpectedSignature {
            method: "HandleAsync".into(),
            result_type: "GetPetResult".into(),
            parameters: "GetPetParameters parameters, CancellationToken cancellationToken".into(),
            qualify_task: false,
        }
    }

    const HANDLER: &str = r#"namespace Shop.Pets;

public sealed class GetPetHandler : IGetPetHandler
{
    public async Task<GetPetResult> HandleAsync(GetPetParameters parameters, CancellationToken cancellationToken)
    {
        await Task.Yield();
        return GetPetResult.NotFound();
    }
}
"#;

    #[test]
    fn matching_signature_is_unchanged() {
        assert_eq!(reconcile_signature(HANDLER, &expected()), SignatureOutcome::Unchanged);
    }

    #[test]
    fn rewrites_only_the_signature() {
        let old = HANDLER.replace(
            "GetPetParameters parameters, CancellationToken cancellationToken",
            "GetPetParameters parameters",
        );
        let SignatureOutcome::Rewritten(new) = reconcile_signature(&old, &expected()) else {
            panic!("expected a rewrite");
        };
        assert_eq!(new, HANDLER);
    }

    #[test]
    fn keeps_qualified_task_and_missing_async() {
        let src = "public System.Threading.Tasks.Task<OldResult> HandleAsync(OldParameters p) => throw null;";
        let SignatureOutcome::Rewritten(new) = reconcile_signature(src, &expected()) else {
            panic!("expected a rewrite");
        };
        assert_eq!(
            new,
            "public System.Threading.Tasks.Task<GetPetResult> HandleAsync(GetPetParameters parameters, CancellationToken cancellationToken) => throw null;"
        );
    }

    #[test]
    fn qualifies_task_when_shadowed() {
        let mut sig = expected();
        sig.qualify_task = true;
        let SignatureOutcome::Rewritten(new) = reconcile_signature(HANDLER, &sig) else {
            panic!("expected a rewrite");
        };
        assert!(new.contains("public async System.Threading.Tasks.Task<GetPetResult> HandleAsync("));
    }

    #[test]
    fn no_match_and_size_limit() {
        assert_eq!(
            reconcile_signature("class Empty {}", &expected()),
            SignatureOutcome::NoMatch
        );
        let huge = " ".repeat(MAX_SOURCE_BYTES + 1);
        assert!(matches!(
            reconcile_signature(&huge, &expected()),
            SignatureOutcome::Skipped(_)
        ));
    }
}
