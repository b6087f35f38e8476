//! # Gateway Wire Types
//!
//! ## Request Bodies
//! ```text
//! MB WAY      { chave, valor: "29.90", id, alias: "912345678", descricao }
//! Multibanco  { chave, valor: "29.90", id, descricao }
//! ```
//! `id` is our client reference (the Payment id).
//!
//! ## Reply
//! ```text
//! { estado: "ok" | ..., referencia, id, entidade?, mensagem? }
//! ```
//! Decoded once, here, into [`GatewayOutcome`]; callers never look at
//! `estado` strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use stockflow_core::Money;

use crate::error::{GatewayError, GatewayResult};

// =============================================================================
// Requests
// =============================================================================

/// A push payment the payer approves in their banking app.
#[derive(Debug, Clone, PartialEq)]
pub struct PushPaymentRequest {
    pub amount: Money,
    /// Our Payment id, echoed back by the gateway.
    pub client_reference: String,
    /// Normalized 9-digit phone.
    pub phone: String,
    pub description: String,
}

/// A voucher (entity + reference) paid at an ATM or home banking.
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherPaymentRequest {
    pub amount: Money,
    pub client_reference: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PushBody<'a> {
    pub chave: &'a str,
    pub valor: String,
    pub id: &'a str,
    pub alias: &'a str,
    pub descricao: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct VoucherBody<'a> {
    pub chave: &'a str,
    pub valor: String,
    pub id: &'a str,
    pub descricao: &'a str,
}

// =============================================================================
// Replies
// =============================================================================

/// What the gateway decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Accepted {
        reference: String,
        /// The gateway's own id; webhooks refer to this.
        id: String,
        /// Multibanco entity code (vouchers only).
        entity: Option<String>,
    },
    Rejected {
        message: String,
    },
}

/// Decoded outcome plus the raw body, kept for audit.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub outcome: GatewayOutcome,
    pub raw: Value,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    estado: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    referencia: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    entidade: Option<String>,
    #[serde(default)]
    mensagem: Option<String>,
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl GatewayReply {
    /// Decodes a reply body.
    ///
    /// `estado == "ok"` is an acceptance and must carry a reference and an
    /// id; anything else is a rejection with the gateway's message.
    pub fn decode(raw: Value) -> GatewayResult<Self> {
        let reply: RawReply =
            serde_json::from_value(raw.clone()).map_err(|e| GatewayError::Decode(e.to_string()))?;

        let accepted = reply
            .estado
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("ok"));

        let outcome = if accepted {
            match (reply.referencia, reply.id) {
                (Some(reference), Some(id)) => GatewayOutcome::Accepted {
                    reference,
                    id,
                    entity: reply.entidade,
                },
                _ => {
                    return Err(GatewayError::Decode(
                        "accepted reply without referencia/id".to_string(),
                    ))
                }
            }
        } else {
            GatewayOutcome::Rejected {
                message: reply
                    .mensagem
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| {
                        format!(
                            "payment rejected (estado: {})",
                            reply.estado.as_deref().unwrap_or("missing")
                        )
                    }),
            }
        };

        Ok(GatewayReply { outcome, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_accepted_voucher() {
        let reply = GatewayReply::decode(json!({
            "estado": "ok",
            "referencia": 123456789,
            "id": "eupago123",
            "entidade": "11249"
        }))
        .unwrap();

        assert_eq!(
            reply.outcome,
            GatewayOutcome::Accepted {
                reference: "123456789".to_string(),
                id: "eupago123".to_string(),
                entity: Some("11249".to_string()),
            }
        );
        assert_eq!(reply.raw["entidade"], "11249");
    }

    #[test]
    fn test_decode_rejected() {
        let reply = GatewayReply::decode(json!({"estado": "erro", "mensagem": "Alias inválido"})).unwrap();
        assert_eq!(
            reply.outcome,
            GatewayOutcome::Rejected {
                message: "Alias inválido".to_string()
            }
        );

        let reply = GatewayReply::decode(json!({})).unwrap();
        assert!(matches!(reply.outcome, GatewayOutcome::Rejected { .. }));
    }

    #[test]
    fn test_accepted_without_reference_is_decode_error() {
        let result = GatewayReply::decode(json!({"estado": "ok", "id": "x"}));
        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }

    #[test]
    fn test_push_body_field_names() {
        let body = PushBody {
            chave: "key",
            valor: Money::from_cents(2990).to_decimal_string(),
            id: "pay-1",
            alias: "912345678",
            descricao: "Plano Pro",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, json!({
            "chave": "key",
            "valor": "29.90",
            "id": "pay-1",
            "alias": "912345678",
            "descricao": "Plano Pro"
        }));
    }
}
