//! # 认证模块服务
//!
//! 对外的统一入口：组合目录、注册表、身份解析器和分发引擎。
//! 所有依赖在构造时显式传入，不使用全局单例。

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::{AuthDispatcher, AuthenticationOutcome, AuthenticationRequest, StrategyRegistry};
use crate::catalog::{
    AuthProvider, AuthProviderDto, AuthProviderService, CreateAuthProviderInput, ProviderFilter,
    ProviderFindConfig, UpdateAuthProviderInput,
};
use crate::config::{AppConfig, AuthSettings, SeedProvider};
use crate::database::{init_database, run_migrations};
use crate::error::{Context, Result};
use crate::identity::{AuthIdentity, IdentityFilter, IdentityFindConfig, IdentityResolver};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

/// 认证模块服务
#[derive(Clone)]
pub struct AuthModuleService {
    catalog: AuthProviderService,
    identities: IdentityResolver,
    dispatcher: AuthDispatcher,
}

impl AuthModuleService {
    /// 使用已有连接构建服务
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, registry: StrategyRegistry, settings: &AuthSettings) -> Self {
        let catalog = AuthProviderService::new(db.clone(), settings.on_provider_delete);
        let identities = IdentityResolver::new(db);
        let dispatcher = AuthDispatcher::new(
            catalog.clone(),
            registry,
            identities.clone(),
            settings.strategy_timeout(),
        );
        Self {
            catalog,
            identities,
            dispatcher,
        }
    }

    /// 连接数据库、执行迁移、写入种子提供商
    pub async fn bootstrap(config: &AppConfig, registry: StrategyRegistry) -> Result<Self> {
        let db = init_database(&config.database).await?;
        run_migrations(&db).await.context("数据库迁移失败")?;

        let service = Self::new(Arc::new(db), registry, &config.auth);
        service.seed_providers(&config.auth.providers).await?;

        let unbound: Vec<&str> = config
            .auth
            .providers
            .iter()
            .map(|seed| seed.provider.as_str())
            .filter(|code| !service.dispatcher.registry().is_bound(code))
            .collect();
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "bootstrap",
            "Auth module ready",
            bound = ?service.dispatcher.registry().bound_providers(),
            unbound_seeds = ?unbound
        );
        Ok(service)
    }

    /// 写入种子提供商（幂等）
    pub async fn seed_providers(&self, seeds: &[SeedProvider]) -> Result<usize> {
        self.catalog.ensure_seed_providers(seeds).await
    }

    pub async fn list_auth_providers(
        &self,
        filter: &ProviderFilter,
        config: &ProviderFindConfig,
    ) -> Result<Vec<AuthProviderDto>> {
        self.catalog.list(filter, config).await
    }

    pub async fn list_and_count_auth_providers(
        &self,
        filter: &ProviderFilter,
        config: &ProviderFindConfig,
    ) -> Result<(Vec<AuthProviderDto>, u64)> {
        self.catalog.list_and_count(filter, config).await
    }

    pub async fn retrieve_auth_provider(
        &self,
        provider: Option<&str>,
        config: &ProviderFindConfig,
    ) -> Result<AuthProviderDto> {
        self.catalog.retrieve(provider, config).await
    }

    pub async fn create_auth_provider(
        &self,
        records: Vec<CreateAuthProviderInput>,
    ) -> Result<Vec<AuthProvider>> {
        self.catalog.create(records).await
    }

    pub async fn update_auth_provider(
        &self,
        records: Vec<UpdateAuthProviderInput>,
    ) -> Result<Vec<AuthProvider>> {
        self.catalog.update(records).await
    }

    pub async fn delete_auth_providers(&self, providers: &[String]) -> Result<()> {
        self.catalog.delete(providers).await
    }

    /// 认证入口，见 [`AuthDispatcher::authenticate`]
    pub async fn authenticate(
        &self,
        provider: &str,
        request: AuthenticationRequest,
    ) -> Result<AuthenticationOutcome> {
        self.dispatcher.authenticate(provider, request).await
    }

    pub async fn retrieve_auth_identity(&self, id: &str) -> Result<AuthIdentity> {
        self.identities.retrieve(id).await
    }

    pub async fn list_auth_identities(
        &self,
        filter: &IdentityFilter,
        config: &IdentityFindConfig,
    ) -> Result<Vec<AuthIdentity>> {
        self.identities.list(filter, config).await
    }

    pub async fn delete_auth_identities(&self, ids: &[String]) -> Result<u64> {
        self.identities.delete(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::VerificationOutcome;
    use crate::identity::ActorRef;
    use crate::testing::{StaticStrategy, create_test_module, test_auth_settings};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_seeded_catalog_end_to_end() {
        let service = create_test_module(StrategyRegistry::default(), test_auth_settings())
            .await
            .unwrap();
        let all = ProviderFindConfig::default();

        let providers = service
            .list_auth_providers(&ProviderFilter::default(), &all)
            .await
            .unwrap();
        assert_eq!(providers.len(), 4);

        let active: Vec<_> = service
            .list_auth_providers(&ProviderFilter::active(true), &all)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.provider)
            .collect();
        assert_eq!(active, vec!["manual", "store", "admin"]);

        let (_, count) = service
            .list_and_count_auth_providers(&ProviderFilter::default(), &all)
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_authenticate_then_manage_identity() {
        let registry = StrategyRegistry::builder()
            .bind(
                "manual",
                Arc::new(StaticStrategy::new(VerificationOutcome::Verified {
                    external_subject: "ops@example.com".to_string(),
                    actor: Some(ActorRef::new("user", "usr_ops")),
                    metadata: Some(json!({ "source": "manual" })),
                })),
            )
            .build();
        let service = create_test_module(registry, test_auth_settings()).await.unwrap();

        let outcome = service
            .authenticate("manual", AuthenticationRequest::new(json!({})))
            .await
            .unwrap();
        let identity = outcome.identity().unwrap().clone();
        assert!(matches!(outcome, AuthenticationOutcome::Authenticated { is_new: true, .. }));

        let fetched = service.retrieve_auth_identity(&identity.id).await.unwrap();
        assert_eq!(fetched, identity);

        let linked = service
            .list_auth_identities(
                &IdentityFilter::providers(["manual"]),
                &IdentityFindConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(linked.len(), 1);

        assert_eq!(service.delete_auth_identities(&[identity.id]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_jwt_binding_from_config() {
        use crate::auth::StrategyDependencies;
        use crate::config::StrategyKind;
        use crate::testing::jwt_seed_provider;
        use jsonwebtoken::{EncodingKey, Header, encode};

        let mut settings = test_auth_settings();
        settings.providers.push(jwt_seed_provider("api", "s3cret"));
        settings.bindings.insert("api".to_string(), StrategyKind::Jwt);
        let registry =
            StrategyRegistry::from_bindings(&settings.bindings, &StrategyDependencies::default());
        let service = create_test_module(registry, settings).await.unwrap();

        let token = encode(
            &Header::default(),
            &json!({ "sub": "svc-1", "exp": chrono::Utc::now().timestamp() + 600 }),
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();
        let outcome = service
            .authenticate(
                "api",
                AuthenticationRequest::new(json!({ "token": token }))
                    .with_actor(ActorRef::new("service", "svc_1")),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome.identity().map(|identity| identity.external_subject.as_str()),
            Some("svc-1")
        );
    }
}
