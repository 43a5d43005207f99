//! # 认证策略特质
//!
//! 定义所有认证策略必须实现的基础接口

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::types::{StrategyContext, VerificationOutcome};
use crate::error::Result;

/// 认证策略接口
///
/// 凭据无效应返回 [`VerificationOutcome::Rejected`]；`Err` 只用于系统故障
/// （外部服务不可用、配置缺失等）。
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// 策略名称，用于日志
    fn name(&self) -> &'static str;

    /// 校验凭据
    async fn verify(&self, ctx: StrategyContext<'_>, payload: &Value) -> Result<VerificationOutcome>;

    /// 验证提供商 metadata 是否满足该策略的配置要求
    fn validate_config(&self, _config: &Value) -> Result<()> {
        Ok(())
    }
}

/// 从载荷中读取非空字符串字段
pub(crate) fn payload_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}
