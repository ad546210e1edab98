use crate::diagnostics::Diagnostic;
use crate::validate::RuleContext;

pub const EMPTY_WEBHOOK: &str = "WBH001";
pub const MISSING_OPERATION_ID: &str = "WBH002";
pub const MISSING_REQUEST_BODY: &str = "WBH003";

pub fn empty_webhook(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.document
        .webhooks
        .iter()
        .filter(|(_, item)| item.operation_count() == 0)
        .map(|(name, _)| {
            Diagnostic::warning(EMPTY_WEBHOOK, format!("webhook '{name}' declares no operations"))
                .at(format!("webhooks.{name}"))
        })
        .collect()
}

pub fn missing_operation_id(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.document
        .webhook_operations()
        .filter(|e| e.operation.operation_id.is_none())
        .map(|e| {
            Diagnostic::error(
                MISSING_OPERATION_ID,
                format!("webhook '{}' {} operation has no operationId", e.path, e.method),
            )
            .at(format!("webhooks.{}.{}", e.path, e.method.key()))
        })
        .collect()
}

pub fn missing_request_body(ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
    ctx.document
        .webhook_operations()
        .filter(|e| e.operation.request_body.is_none())
        .map(|e| {
            Diagnostic::warning(
                MISSING_REQUEST_BODY,
                format!("webhook '{}' {} operation has no request body", e.path, e.method),
            )
            .at(format!("webhooks.{}.{}", e.path, e.method.key()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::from_yaml;

    #[test]
    fn webhook_shape() {
        let doc = from_yaml(
            r##"
openapi: 3.1.0
info: { title: T, version: "1" }
webhooks:
  petAdopted:
    post:
      operationId: onPetAdopted
      requestBody:
        content:
          application/json:
            schema: { type: object }
      responses: { "200": { description: ok } }
  petLost:
    post:
      responses: { "200": { description: ok } }
  placeholder: {}
"##,
        )
        .unwrap();
        let ctx = RuleContext {
            document: &doc,
            parser_diagnostics: &[],
        };
        let empty = empty_webhook(&ctx);
        assert_eq!(empty.len(), 1);
        assert!(empty[0].message.contains("placeholder"));

        let ids = missing_operation_id(&ctx);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].location.pointer.as_deref(), Some("webhooks.petLost.post"));

        assert_eq!(missing_request_body(&ctx).len(), 1);
    }
}
