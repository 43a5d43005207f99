//! # Auth Module Library
//!
//! 认证提供商目录与凭据解析引擎：
//!
//! - [`catalog`]：提供商记录的增删改查
//! - [`auth`]：策略接口、注册表与认证分发
//! - [`identity`]：外部凭据到内部主体的关联
//! - [`query`]：通用过滤、排序、分页与投影

pub mod auth;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod identity;
pub mod logging;
pub mod query;
pub mod service;
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AuthModuleError, Result};
pub use service::AuthModuleService;
