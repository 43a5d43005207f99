//! # 查询与过滤引擎
//!
//! 与认证语义无关的通用查询构建：集合/等值过滤、排序、分页和字段投影。
//! 任何实现了 [`QueryField`] 的实体都可以复用。

mod config;
mod filter;
mod projection;

pub use config::{FindConfig, SortOrder};
pub use filter::{FilterClause, build_condition};
pub use projection::project;

use sea_orm::{EntityTrait, QueryFilter, Select};

/// 可查询字段：字段枚举与实体列、对外 JSON 键之间的映射
pub trait QueryField: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// 字段所属实体
    type Entity: EntityTrait;

    /// 对应的数据库列
    fn column(self) -> <Self::Entity as EntityTrait>::Column;

    /// 对外记录中的键名
    fn key(self) -> &'static str;

    /// 未指定排序时使用的稳定排序列（通常是插入顺序）
    fn default_order_column() -> <Self::Entity as EntityTrait>::Column;
}

/// 将过滤条件和查询配置应用到查询上（不含投影）
#[must_use]
pub fn apply<F: QueryField>(
    query: Select<F::Entity>,
    clauses: &[FilterClause<F>],
    config: &FindConfig<F>,
) -> Select<F::Entity> {
    let query = apply_filter(query, clauses);
    config.apply_pagination(config.apply_order(query))
}

/// 只应用过滤条件，计数时使用
#[must_use]
pub fn apply_filter<F: QueryField>(
    query: Select<F::Entity>,
    clauses: &[FilterClause<F>],
) -> Select<F::Entity> {
    if clauses.is_empty() {
        query
    } else {
        query.filter(build_condition(clauses))
    }
}
