//! # 日志配置模块
//!
//! 提供结构化日志宏（`linfo!`/`lwarn!`/`lerror!`/`ldebug!`）和日志系统初始化

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 进程启动、迁移、种子数据
    Startup,
    /// 管理端操作（目录增删改查）
    Admin,
    /// 认证分发
    Authentication,
    /// 身份解析
    IdentityResolution,
    /// 数据库访问
    Db,
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Startup => "startup",
            Self::Admin => "admin",
            Self::Authentication => "authentication",
            Self::IdentityResolution => "identity_resolution",
            Self::Db => "db",
        };
        f.write_str(value)
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 主程序 / CLI
    Main,
    /// 数据库与迁移
    Database,
    /// 提供商目录
    Catalog,
    /// 策略注册表
    Registry,
    /// 分发引擎
    Dispatch,
    /// 身份解析器
    Identity,
    /// 具体认证策略
    Strategy,
    /// 配置加载
    Config,
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Main => "main",
            Self::Database => "database",
            Self::Catalog => "catalog",
            Self::Registry => "registry",
            Self::Dispatch => "dispatch",
            Self::Identity => "identity",
            Self::Strategy => "strategy",
            Self::Config => "config",
        };
        f.write_str(value)
    }
}

/// 结构化 info 日志
///
/// 参数依次为：请求ID、阶段、组件、操作名、消息，之后可以追加 tracing 字段。
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($field)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($field)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($field)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($field:tt)+)?) => {
        tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($field)+,)?
            "{}",
            $message
        )
    };
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先；否则使用传入级别，并默认关闭 SQLx 查询日志。
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let default_filter = format!("{level},auth_module=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn");

    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    // 测试或嵌入场景下可能已经安装过全局 subscriber
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed, skipping");
    }
}
