//! # 认证模块
//!
//! 策略接口、策略注册表和认证分发

pub mod dispatch;
pub mod strategies;
pub mod strategy_manager;
pub mod types;

pub use dispatch::AuthDispatcher;
pub use strategies::AuthStrategy;
pub use strategy_manager::{StrategyDependencies, StrategyRegistry, StrategyRegistryBuilder};
pub use types::{AuthenticationOutcome, AuthenticationRequest, StrategyContext, VerificationOutcome};
