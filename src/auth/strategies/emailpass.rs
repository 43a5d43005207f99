//! # 邮箱密码认证策略
//!
//! 密码以 bcrypt 哈希保存在 [`CredentialStore`] 中，哈希校验在阻塞线程池执行

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::traits::{AuthStrategy, payload_str};
use crate::auth::types::{StrategyContext, VerificationOutcome};
use crate::config::CredentialSeed;
use crate::configuration_error;
use crate::error::{AuthModuleError, Result};
use crate::identity::ActorRef;
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

const STRATEGY_NAME: &str = "emailpass";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// 已保存的凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub password_hash: String,
    /// 凭据所属主体（可选）
    pub actor: Option<ActorRef>,
}

/// 凭据存储
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 按规范化后的邮箱查找凭据
    async fn find(&self, email: &str) -> Result<Option<StoredCredential>>;
}

/// 基于内存的凭据存储
pub struct InMemoryCredentialStore {
    credentials: DashMap<String, StoredCredential>,
    cost: u32,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl InMemoryCredentialStore {
    /// `cost` 为 bcrypt 计算强度
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self {
            credentials: DashMap::new(),
            cost,
        }
    }

    /// 注册或覆盖一个账号
    pub fn register(&self, email: &str, password: &str, actor: Option<ActorRef>) -> Result<()> {
        let password_hash = bcrypt::hash(password, self.cost).map_err(|e| {
            AuthModuleError::strategy_with_source(STRATEGY_NAME, "密码哈希失败", e)
        })?;
        self.credentials.insert(
            normalize_email(email),
            StoredCredential {
                password_hash,
                actor,
            },
        );
        Ok(())
    }

    /// 直接保存已有的 bcrypt 哈希
    pub fn insert_hashed(&self, email: &str, password_hash: impl Into<String>, actor: Option<ActorRef>) {
        self.credentials.insert(
            normalize_email(email),
            StoredCredential {
                password_hash: password_hash.into(),
                actor,
            },
        );
    }

    /// 按配置中的账号构建
    pub fn from_seeds(seeds: &[CredentialSeed], cost: u32) -> Result<Self> {
        let store = Self::new(cost);
        for seed in seeds {
            let actor = seed
                .actor_type
                .as_ref()
                .zip(seed.actor_id.as_ref())
                .map(|(actor_type, actor_id)| ActorRef::new(actor_type.clone(), actor_id.clone()));
            match (&seed.password_hash, &seed.password) {
                (Some(hash), _) => store.insert_hashed(&seed.email, hash.clone(), actor),
                (None, Some(password)) => store.register(&seed.email, password, actor)?,
                (None, None) => {
                    return Err(configuration_error!(
                        "凭据 {} 缺少 password 或 password_hash",
                        seed.email
                    ));
                }
            }
        }
        Ok(store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find(&self, email: &str) -> Result<Option<StoredCredential>> {
        Ok(self.credentials.get(email).map(|entry| entry.value().clone()))
    }
}

/// 邮箱密码认证策略
///
/// 载荷：`{"email": "...", "password": "..."}`；外部标识为小写邮箱。
pub struct EmailPassStrategy {
    store: Arc<dyn CredentialStore>,
}

impl EmailPassStrategy {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuthStrategy for EmailPassStrategy {
    fn name(&self) -> &'static str {
        STRATEGY_NAME
    }

    async fn verify(&self, ctx: StrategyContext<'_>, payload: &Value) -> Result<VerificationOutcome> {
        let (Some(email), Some(password)) =
            (payload_str(payload, "email"), payload_str(payload, "password"))
        else {
            return Ok(VerificationOutcome::rejected("Email and password are required"));
        };

        let email = normalize_email(email);
        let Some(credential) = self.store.find(&email).await? else {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Strategy,
                "emailpass_unknown_account",
                &format!("No credential registered for {email} under {}", ctx.provider)
            );
            return Ok(VerificationOutcome::rejected(INVALID_CREDENTIALS));
        };

        let password = password.to_string();
        let hash = credential.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthModuleError::strategy_with_source(ctx.provider, "密码校验任务失败", e))?
            .map_err(|e| AuthModuleError::strategy_with_source(ctx.provider, "密码哈希格式无效", e))?;

        if !matches {
            return Ok(VerificationOutcome::rejected(INVALID_CREDENTIALS));
        }

        Ok(VerificationOutcome::Verified {
            external_subject: email,
            actor: credential.actor,
            metadata: None,
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
