//! # 身份解析模块
//!
//! 将已验证的外部凭据关联到稳定的内部主体

pub mod resolver;
pub mod types;

pub use resolver::IdentityResolver;
pub use types::{
    ActorRef, AuthIdentity, IdentityField, IdentityFilter, IdentityFindConfig, ResolvedIdentity,
};
