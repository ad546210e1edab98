use url::Url;

use crate::diagnostics::Diagnostic;
use crate::parse::server::Server;
use crate::validate::RuleContext;

pub const MALFORMED_URL: &str = "SRV001";

pub fn malformed_url(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (index, server) in ctx.document.servers.iter().enumerate() {
        let pointer = format!("servers.{index}.url");
        for name in server.template_variables() {
            if !server.variables.contains_key(name) {
                out.push(
                    Diagnostic::warning(
                        MALFORMED_URL,
                        format!(
                            "server URL '{}' uses variable '{name}' which is not declared",
                            server.url
                        ),
                    )
                    .at(pointer.clone())
                    .with_suggestion(format!("variables:\n  {name}:\n    default: ''")),
                );
            }
        }
        if let Err(reason) = check_url(server) {
            out.push(
                Diagnostic::warning(
                    MALFORMED_URL,
                    format!("server URL '{}' is malformed: {reason}", server.url),
                )
                .at(pointer),
            );
        }
    }
    out
}

/// A relative path, or an absolute http(s) URL with a host once the
/// declared variables are substituted.
fn check_url(server: &Server) -> Result<(), String> {
    let url = server.substituted_url();
    if url.starts_with('/') {
        return Ok(());
    }
    if url.contains('{') {
        // Undeclared variables are reported separately.
        return Ok(());
    }
    let parsed = Url::parse(&url).map_err(|e| e.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", parsed.scheme()));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err("missing host".to_string());
    }
    Ok(())
}
