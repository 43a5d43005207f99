//! # 重定向式 OAuth 认证策略
//!
//! 第一步返回 `Deferred`，continuation 中包含授权地址和 state；
//! 回调时携带 `code` + `state` 再次认证，由 [`CodeExchange`] 换取外部标识。
//!
//! 提供商 metadata：
//!
//! ```json
//! { "authorize_url": "https://idp/authorize", "client_id": "...",
//!   "redirect_uri": "https://shop/callback", "scope": "openid email" }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

use super::traits::{AuthStrategy, payload_str};
use crate::auth::types::{StrategyContext, VerificationOutcome};
use crate::error::{AuthModuleError, Result};
use crate::identity::ActorRef;
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// 授权码换取到的外部身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangedIdentity {
    pub subject: String,
    pub actor: Option<ActorRef>,
    pub metadata: Option<Value>,
}

/// 授权码交换
///
/// 返回 `None` 表示身份提供方拒绝了授权码。
#[async_trait]
pub trait CodeExchange: Send + Sync {
    async fn exchange(
        &self,
        ctx: StrategyContext<'_>,
        code: &str,
    ) -> Result<Option<ExchangedIdentity>>;
}

#[derive(Debug, Clone)]
struct PendingAuthorization {
    provider: String,
    issued_at: Instant,
}

/// 重定向式 OAuth 认证策略
pub struct OAuthRedirectStrategy {
    exchange: Arc<dyn CodeExchange>,
    pending: DashMap<String, PendingAuthorization>,
    state_ttl: Duration,
}

impl OAuthRedirectStrategy {
    #[must_use]
    pub fn new(exchange: Arc<dyn CodeExchange>) -> Self {
        Self {
            exchange,
            pending: DashMap::new(),
            state_ttl: DEFAULT_STATE_TTL,
        }
    }

    #[must_use]
    pub const fn with_state_ttl(mut self, state_ttl: Duration) -> Self {
        self.state_ttl = state_ttl;
        self
    }

    /// 当前未完成的授权数量
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn begin(&self, ctx: StrategyContext<'_>) -> Result<VerificationOutcome> {
        let config = ctx.config;
        let authorize_url = config_str(config, "authorize_url")?;
        let client_id = config_str(config, "client_id")?;
        let redirect_uri = config_str(config, "redirect_uri")?;

        let mut location = Url::parse(authorize_url).map_err(|e| {
            AuthModuleError::configuration_with_source(format!("无效的授权URL: {authorize_url}"), e)
        })?;

        let state = Uuid::new_v4().to_string();
        let mut params = vec![
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", redirect_uri),
            ("state", state.as_str()),
        ];
        if let Some(scope) = config.get("scope").and_then(Value::as_str) {
            params.push(("scope", scope));
        }
        location.query_pairs_mut().extend_pairs(params);

        self.purge_expired();
        self.pending.insert(
            state.clone(),
            PendingAuthorization {
                provider: ctx.provider.to_string(),
                issued_at: Instant::now(),
            },
        );

        Ok(VerificationOutcome::Deferred {
            continuation: json!({ "location": location.to_string(), "state": state }),
        })
    }

    async fn complete(
        &self,
        ctx: StrategyContext<'_>,
        code: &str,
        state: &str,
    ) -> Result<VerificationOutcome> {
        let valid_state = self.pending.remove(state).is_some_and(|(_, pending)| {
            pending.provider == ctx.provider && pending.issued_at.elapsed() <= self.state_ttl
        });
        if !valid_state {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Strategy,
                "oauth_state_rejected",
                &format!("Unknown or expired state for {}", ctx.provider)
            );
            return Ok(VerificationOutcome::rejected("Invalid or expired state"));
        }

        match self.exchange.exchange(ctx, code).await? {
            Some(identity) => Ok(VerificationOutcome::Verified {
                external_subject: identity.subject,
                actor: identity.actor,
                metadata: identity.metadata,
            }),
            None => Ok(VerificationOutcome::rejected("Authorization code was not accepted")),
        }
    }

    fn purge_expired(&self) {
        let ttl = self.state_ttl;
        self.pending.retain(|_, pending| pending.issued_at.elapsed() <= ttl);
    }
}

#[async_trait]
impl AuthStrategy for OAuthRedirectStrategy {
    fn name(&self) -> &'static str {
        "oauth_redirect"
    }

    async fn verify(&self, ctx: StrategyContext<'_>, payload: &Value) -> Result<VerificationOutcome> {
        match (payload_str(payload, "code"), payload_str(payload, "state")) {
            (Some(code), Some(state)) => self.complete(ctx, code, state).await,
            (Some(_), None) => Ok(VerificationOutcome::rejected("State is required")),
            _ => self.begin(ctx),
        }
    }

    fn validate_config(&self, config: &Value) -> Result<()> {
        for key in ["authorize_url", "client_id", "redirect_uri"] {
            config_str(config, key)?;
        }
        Ok(())
    }
}

fn config_str<'a>(config: &'a Value, key: &str) -> Result<&'a str> {
    payload_str(config, key).ok_or_else(|| {
        AuthModuleError::configuration(format!("oauth strategy requires \"{key}\" in provider metadata"))
    })
}
