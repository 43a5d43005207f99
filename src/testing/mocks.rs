//! # 测试 Mock 对象

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{AuthStrategy, StrategyContext, VerificationOutcome};
use crate::error::{AuthModuleError, Result};

/// 返回固定结果的策略，记录调用次数
pub struct StaticStrategy {
    outcome: VerificationOutcome,
    delay: Option<Duration>,
    fail: bool,
    calls: AtomicUsize,
}

impl StaticStrategy {
    #[must_use]
    pub const fn new(outcome: VerificationOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// 总是返回 `Verified`
    #[must_use]
    pub fn verifying(external_subject: &str) -> Self {
        Self::new(VerificationOutcome::verified(external_subject))
    }

    /// 返回系统错误而不是结果
    #[must_use]
    pub fn failing() -> Self {
        let mut strategy = Self::new(VerificationOutcome::rejected("unused"));
        strategy.fail = true;
        strategy
    }

    /// 返回结果前等待
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthStrategy for StaticStrategy {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn verify(&self, ctx: StrategyContext<'_>, _payload: &Value) -> Result<VerificationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(AuthModuleError::strategy(ctx.provider, "identity provider unavailable"));
        }
        Ok(self.outcome.clone())
    }
}
