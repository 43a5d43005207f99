use sea_orm::{Order, QueryOrder, QuerySelect, Select};
use serde::{Deserialize, Serialize};

use super::QueryField;

/// 排序方向
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<SortOrder> for Order {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

/// 查询配置：字段投影、分页、排序
///
/// `select` 为 `None` 或空列表时返回全部字段；未选择的字段会从结果中省略，而不是置空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindConfig<F> {
    pub select: Option<Vec<F>>,
    pub skip: Option<u64>,
    pub take: Option<u64>,
    pub order: Vec<(F, SortOrder)>,
}

impl<F> Default for FindConfig<F> {
    fn default() -> Self {
        Self {
            select: None,
            skip: None,
            take: None,
            order: Vec::new(),
        }
    }
}

impl<F: QueryField> FindConfig<F> {
    /// 只返回指定字段
    #[must_use]
    pub fn select(fields: impl IntoIterator<Item = F>) -> Self {
        Self {
            select: Some(fields.into_iter().collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub const fn with_take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// 追加排序字段（按追加顺序生效）
    #[must_use]
    pub fn order_by(mut self, field: F, order: SortOrder) -> Self {
        self.order.push((field, order));
        self
    }

    /// 有效的投影字段；空列表视为不投影
    #[must_use]
    pub fn projection(&self) -> Option<&[F]> {
        self.select.as_deref().filter(|fields| !fields.is_empty())
    }

    /// 显式排序之后总是追加默认排序列，保证结果稳定
    #[must_use]
    pub fn apply_order(&self, query: Select<F::Entity>) -> Select<F::Entity> {
        let query = self
            .order
            .iter()
            .fold(query, |query, (field, order)| {
                query.order_by(field.column(), Order::from(*order))
            });
        query.order_by(F::default_order_column(), Order::Asc)
    }

    #[must_use]
    pub fn apply_pagination(&self, query: Select<F::Entity>) -> Select<F::Entity> {
        query.offset(self.skip).limit(self.take)
    }
}
