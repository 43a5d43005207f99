//! # 认证分发引擎
//!
//! 一次认证：提供商存在且激活 → 绑定策略 → 带超时执行 → 成功后解析身份。
//! 策略返回的 `Rejected`/`Deferred` 原样透传，不做重试。

use std::time::Duration;

use serde_json::Value;

use super::strategy_manager::StrategyRegistry;
use super::types::{AuthenticationOutcome, AuthenticationRequest, StrategyContext, VerificationOutcome};
use crate::catalog::AuthProviderService;
use crate::error::{AuthModuleError, Result};
use crate::identity::IdentityResolver;
use crate::{
    ldebug, lerror, linfo,
    logging::{LogComponent, LogStage},
    lwarn,
};

/// 认证分发引擎
#[derive(Clone)]
pub struct AuthDispatcher {
    catalog: AuthProviderService,
    registry: StrategyRegistry,
    identities: IdentityResolver,
    default_timeout: Duration,
}

impl AuthDispatcher {
    #[must_use]
    pub const fn new(
        catalog: AuthProviderService,
        registry: StrategyRegistry,
        identities: IdentityResolver,
        default_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            registry,
            identities,
            default_timeout,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// 认证入口
    pub async fn authenticate(
        &self,
        provider: &str,
        request: AuthenticationRequest,
    ) -> Result<AuthenticationOutcome> {
        if provider.is_empty() {
            return Err(AuthModuleError::validation("authProvider - provider must be defined"));
        }

        let record = self.catalog.find_provider(provider).await?.ok_or_else(|| {
            AuthModuleError::not_found(format!("AuthProvider with provider: {provider} was not found"))
        })?;

        if !record.is_active {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Dispatch,
                "provider_inactive",
                &format!("Authentication attempted against inactive provider {provider}")
            );
            return Err(AuthModuleError::ProviderInactive {
                provider: provider.to_string(),
            });
        }

        let Some(strategy) = self.registry.resolve(provider) else {
            lerror!(
                "system",
                LogStage::Authentication,
                LogComponent::Dispatch,
                "strategy_unbound",
                &format!("Provider {provider} is in the catalog but has no bound strategy")
            );
            return Err(AuthModuleError::configuration(format!(
                "No authentication strategy bound to provider: {provider}"
            )));
        };

        let config = record.metadata.unwrap_or(Value::Null);
        let ctx = StrategyContext {
            provider,
            config: &config,
        };
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::Dispatch,
            "strategy_invoke",
            &format!("Dispatching {provider} to strategy {}", strategy.name()),
            timeout_ms = duration_ms(timeout)
        );

        let outcome = tokio::time::timeout(timeout, strategy.verify(ctx, &request.payload))
            .await
            .map_err(|_| {
                lwarn!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Dispatch,
                    "strategy_timeout",
                    &format!("Strategy {} timed out for {provider}", strategy.name())
                );
                AuthModuleError::StrategyTimeout {
                    provider: provider.to_string(),
                    timeout_ms: duration_ms(timeout),
                }
            })?
            .inspect_err(|e| {
                lerror!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Dispatch,
                    "strategy_failed",
                    &format!("Strategy {} failed for {provider}: {e}", strategy.name())
                );
            })?;

        match outcome {
            VerificationOutcome::Verified {
                external_subject,
                actor,
                metadata,
            } => {
                let actor_hint = request.actor_hint.or(actor);
                let resolved = self
                    .identities
                    .resolve(provider, &external_subject, actor_hint.as_ref(), metadata)
                    .await?;
                linfo!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Dispatch,
                    "authenticated",
                    &format!("Authenticated {external_subject} via {provider}"),
                    identity_id = %resolved.identity.id,
                    is_new = resolved.is_new
                );
                Ok(AuthenticationOutcome::Authenticated {
                    identity: resolved.identity,
                    is_new: resolved.is_new,
                })
            }
            VerificationOutcome::Rejected { reason } => {
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Dispatch,
                    "credentials_rejected",
                    &format!("{provider} rejected credentials: {reason}")
                );
                Ok(AuthenticationOutcome::Rejected { reason })
            }
            VerificationOutcome::Deferred { continuation } => {
                Ok(AuthenticationOutcome::Deferred { continuation })
            }
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ActorRef;
    use crate::testing::{StaticStrategy, create_test_module, test_auth_settings};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_strategy_failure_is_server_error() {
        let registry = StrategyRegistry::builder()
            .bind("manual", Arc::new(StaticStrategy::failing()))
            .build();
        let service = create_test_module(registry, test_auth_settings()).await.unwrap();

        let err = service
            .authenticate("manual", AuthenticationRequest::new(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthModuleError::Strategy { .. }));
        assert_eq!(err.category(), crate::error::ErrorCategory::Server);
    }

    #[tokio::test]
    async fn test_default_timeout_applies() {
        let strategy = Arc::new(StaticStrategy::verifying("late").with_delay(Duration::from_secs(5)));
        let registry = StrategyRegistry::builder().bind("store", strategy.clone()).build();
        let settings = crate::config::AuthSettings {
            strategy_timeout_ms: 20,
            ..test_auth_settings()
        };
        let service = create_test_module(registry, settings).await.unwrap();

        let err = service
            .authenticate(
                "store",
                AuthenticationRequest::new(json!({})).with_actor(ActorRef::new("user", "u")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthModuleError::StrategyTimeout { timeout_ms: 20, .. }));
        assert_eq!(strategy.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_actor_overrides_strategy_actor() {
        let registry = StrategyRegistry::builder()
            .bind(
                "admin",
                Arc::new(StaticStrategy::new(VerificationOutcome::Verified {
                    external_subject: "sub".to_string(),
                    actor: Some(ActorRef::new("user", "from_strategy")),
                    metadata: None,
                })),
            )
            .build();
        let service = create_test_module(registry, test_auth_settings()).await.unwrap();

        let outcome = service
            .authenticate(
                "admin",
                AuthenticationRequest::new(json!({})).with_actor(ActorRef::new("user", "from_request")),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome.identity().map(|identity| identity.actor.actor_id.as_str()),
            Some("from_request")
        );
    }
}
