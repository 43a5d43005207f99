//! # 认证类型定义
//!
//! 策略校验结果与一次认证请求的输入输出

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{ActorRef, AuthIdentity};

/// 传给策略的提供商上下文
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    /// 提供商 code
    pub provider: &'a str,
    /// 提供商 metadata，作为策略配置；未配置时为 `Value::Null`
    pub config: &'a Value,
}

/// 策略校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// 凭据有效
    Verified {
        /// 提供商侧的唯一标识
        external_subject: String,
        /// 策略建议关联的主体（请求中显式给出的主体优先）
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor: Option<ActorRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<Value>,
    },
    /// 凭据无效，属于正常的否定结果
    Rejected { reason: String },
    /// 多步流程（例如重定向），continuation 的结构由策略决定
    Deferred { continuation: Value },
}

impl VerificationOutcome {
    pub fn verified(external_subject: impl Into<String>) -> Self {
        Self::Verified {
            external_subject: external_subject.into(),
            actor: None,
            metadata: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// 一次认证请求
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthenticationRequest {
    /// 交给策略的凭据载荷
    pub payload: Value,
    /// 首次关联时使用的主体；对已存在的身份用于一致性校验
    pub actor_hint: Option<ActorRef>,
    /// 覆盖默认的策略超时
    pub timeout: Option<Duration>,
}

impl AuthenticationRequest {
    #[must_use]
    pub const fn new(payload: Value) -> Self {
        Self {
            payload,
            actor_hint: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_actor(mut self, actor: ActorRef) -> Self {
        self.actor_hint = Some(actor);
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 认证结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    /// 认证成功并完成身份解析
    Authenticated {
        identity: AuthIdentity,
        /// 是否首次关联
        is_new: bool,
    },
    Rejected { reason: String },
    Deferred { continuation: Value },
}

impl AuthenticationOutcome {
    /// 成功时返回身份
    #[must_use]
    pub const fn identity(&self) -> Option<&AuthIdentity> {
        match self {
            Self::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }
}
