//! # Bearer Token认证策略
//!
//! 校验 HS256 签名的 JWT。密钥、issuer、audience 来自提供商 metadata：
//!
//! ```json
//! { "secret": "...", "issuer": "shop", "audience": "store-api", "subject_claim": "sub" }
//! ```

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde_json::Value;

use super::traits::{AuthStrategy, payload_str};
use crate::auth::types::{StrategyContext, VerificationOutcome};
use crate::error::{AuthModuleError, Result};
use crate::identity::ActorRef;
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

const DEFAULT_SUBJECT_CLAIM: &str = "sub";

/// Bearer Token认证策略
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerTokenStrategy {
    /// 时钟偏差容忍（秒）
    leeway: u64,
}

impl BearerTokenStrategy {
    #[must_use]
    pub const fn new() -> Self {
        Self { leeway: 30 }
    }

    #[must_use]
    pub const fn with_leeway(leeway: u64) -> Self {
        Self { leeway }
    }

    fn validation(&self, config: &Value) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        if let Some(issuer) = config.get("issuer").and_then(Value::as_str) {
            validation.set_issuer(&[issuer]);
        }
        match config.get("audience").and_then(Value::as_str) {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

#[async_trait]
impl AuthStrategy for BearerTokenStrategy {
    fn name(&self) -> &'static str {
        "jwt"
    }

    async fn verify(&self, ctx: StrategyContext<'_>, payload: &Value) -> Result<VerificationOutcome> {
        self.validate_config(ctx.config)
            .map_err(|e| AuthModuleError::configuration(format!("{}: {e}", ctx.provider)))?;
        let secret = ctx
            .config
            .get("secret")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let Some(token) = payload_str(payload, "token").or_else(|| payload_str(payload, "access_token"))
        else {
            return Ok(VerificationOutcome::rejected("Bearer token is required"));
        };

        let claims = match decode::<Value>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation(ctx.config),
        ) {
            Ok(data) => data.claims,
            Err(e) => {
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Strategy,
                    "jwt_rejected",
                    &format!("Token rejected for {}: {e}", ctx.provider)
                );
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "Token has expired",
                    ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                        "Token was issued for another audience"
                    }
                    _ => "Invalid token",
                };
                return Ok(VerificationOutcome::rejected(reason));
            }
        };

        let subject_claim = ctx
            .config
            .get("subject_claim")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SUBJECT_CLAIM);
        let Some(subject) = claims.get(subject_claim).and_then(Value::as_str) else {
            return Ok(VerificationOutcome::rejected("Token has no subject"));
        };

        let actor = match (
            claims.get("actor_type").and_then(Value::as_str),
            claims.get("actor_id").and_then(Value::as_str),
        ) {
            (Some(actor_type), Some(actor_id)) => Some(ActorRef::new(actor_type, actor_id)),
            _ => None,
        };

        Ok(VerificationOutcome::Verified {
            external_subject: subject.to_string(),
            actor,
            metadata: claims.get("iss").map(|iss| serde_json::json!({ "iss": iss })),
        })
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        match config.get("secret").and_then(Value::as_str) {
            Some(secret) if !secret.is_empty() => Ok(()),
            _ => Err(AuthModuleError::configuration(
                "jwt strategy requires a non-empty \"secret\" in provider metadata",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn token(claims: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn exp_in(seconds: i64) -> i64 {
        chrono::Utc::now().timestamp() + seconds
    }

    #[tokio::test]
    async fn test_valid_token_is_verified() {
        let config = json!({ "secret": "s3cret", "issuer": "shop" });
        let ctx = StrategyContext { provider: "api", config: &config };
        let jwt = token(
            &json!({ "sub": "user-42", "iss": "shop", "exp": exp_in(600),
                     "actor_type": "user", "actor_id": "usr_42" }),
            "s3cret",
        );

        let outcome = BearerTokenStrategy::new()
            .verify(ctx, &json!({ "token": jwt }))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            VerificationOutcome::Verified {
                external_subject: "user-42".to_string(),
                actor: Some(ActorRef::new("user", "usr_42")),
                metadata: Some(json!({ "iss": "shop" })),
            }
        );
    }

    #[tokio::test]
    async fn test_wrong_signature_and_expiry_are_rejected() {
        let config = json!({ "secret": "s3cret" });
        let ctx = StrategyContext { provider: "api", config: &config };
        let strategy = BearerTokenStrategy::with_leeway(0);

        let forged = token(&json!({ "sub": "x", "exp": exp_in(600) }), "other");
        let outcome = strategy.verify(ctx, &json!({ "token": forged })).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::rejected("Invalid token"));

        let expired = token(&json!({ "sub": "x", "exp": exp_in(-600) }), "s3cret");
        let outcome = strategy.verify(ctx, &json!({ "token": expired })).await.unwrap();
        assert_eq!(outcome, VerificationOutcome::rejected("Token has expired"));
    }

    #[tokio::test]
    async fn test_missing_secret_is_configuration_error() {
        let config = json!({});
        let ctx = StrategyContext { provider: "api", config: &config };
        let err = BearerTokenStrategy::new()
            .verify(ctx, &json!({ "token": "abc" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthModuleError::Configuration { .. }));
    }
}
