//! # 认证策略注册表
//!
//! provider code 到策略实例的映射，启动时构建，之后只读

use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::strategies::{
    AuthStrategy, BearerTokenStrategy, CredentialStore, EmailPassStrategy, InMemoryCredentialStore,
};
use crate::config::{AuthSettings, StrategyKind};
use crate::error::Result;
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};

/// 由配置构建策略时需要的外部依赖
#[derive(Clone, Default)]
pub struct StrategyDependencies {
    /// 邮箱密码策略使用的凭据存储
    pub credential_store: Option<Arc<dyn CredentialStore>>,
}

impl StrategyDependencies {
    /// 按配置构建依赖：存在邮箱密码绑定时，用配置中的账号创建内存凭据存储
    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let needs_store = settings
            .bindings
            .values()
            .any(|kind| *kind == StrategyKind::EmailPass);
        if !needs_store {
            return Ok(Self::default());
        }

        let store = InMemoryCredentialStore::from_seeds(&settings.credentials, settings.bcrypt_cost)?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Registry,
            "credential_store",
            &format!("Loaded {} credentials for emailpass bindings", store.len())
        );
        Ok(Self {
            credential_store: Some(Arc::new(store)),
        })
    }
}

/// 认证策略注册表
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn AuthStrategy>>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// 按配置中的绑定关系构建
    ///
    /// 缺少依赖的绑定会被跳过并记录日志，分发时表现为未绑定策略。
    #[must_use]
    pub fn from_bindings(
        bindings: &HashMap<String, StrategyKind>,
        deps: &StrategyDependencies,
    ) -> Self {
        let mut builder = Self::builder();
        for (provider, kind) in bindings {
            let strategy: Arc<dyn AuthStrategy> = match kind {
                StrategyKind::Jwt => Arc::new(BearerTokenStrategy::new()),
                StrategyKind::EmailPass => match &deps.credential_store {
                    Some(store) => Arc::new(EmailPassStrategy::new(store.clone())),
                    None => {
                        crate::lwarn!(
                            "system",
                            LogStage::Startup,
                            LogComponent::Registry,
                            "skip_binding",
                            &format!("No credential store available, {provider} left unbound")
                        );
                        continue;
                    }
                },
            };
            builder = builder.bind(provider.clone(), strategy);
        }
        builder.build()
    }

    /// 查找 provider 绑定的策略
    #[must_use]
    pub fn resolve(&self, provider: &str) -> Option<Arc<dyn AuthStrategy>> {
        self.strategies.get(provider).cloned()
    }

    #[must_use]
    pub fn is_bound(&self, provider: &str) -> bool {
        self.strategies.contains_key(provider)
    }

    /// 已绑定的 provider code（排序后）
    #[must_use]
    pub fn bound_providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = self.strategies.keys().cloned().collect();
        providers.sort();
        providers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// 注册表构建器
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    strategies: HashMap<String, Arc<dyn AuthStrategy>>,
}

impl StrategyRegistryBuilder {
    /// 绑定策略；同一 provider 重复绑定时后者覆盖前者
    #[must_use]
    pub fn bind(mut self, provider: impl Into<String>, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.strategies.insert(provider.into(), strategy);
        self
    }

    #[must_use]
    pub fn build(self) -> StrategyRegistry {
        let registry = StrategyRegistry {
            strategies: self.strategies,
        };
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Registry,
            "registry_built",
            &format!("Strategy registry built with {} bindings", registry.len()),
            providers = ?registry.bound_providers()
        );
        registry
    }
}
