//! # 认证身份实体定义
//!
//! 外部凭据与内部主体（actor）之间的持久化关联

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 认证身份实体
///
/// `(provider, entity_id)` 上有唯一索引，同一外部凭据在同一提供商下只能关联一个主体。
/// `provider` 只是引用，不建立外键，删除策略由认证模块显式处理。
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_identities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub provider: String,
    /// 提供商侧的唯一标识（邮箱、OAuth subject 等）
    pub entity_id: String,
    pub actor_type: String,
    pub actor_id: String,
    pub metadata: Option<String>, // JSON 字符串
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
