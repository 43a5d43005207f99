use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, Value};

use super::QueryField;

/// 单个过滤条件
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause<F> {
    /// `field IN (values)`；空集合不匹配任何记录
    In(F, Vec<Value>),
    /// `field = value`
    Eq(F, Value),
}

impl<F: QueryField> FilterClause<F> {
    /// 集合成员过滤
    pub fn is_in<V, I>(field: F, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::In(field, values.into_iter().map(Into::into).collect())
    }

    /// 等值过滤
    pub fn equals<V: Into<Value>>(field: F, value: V) -> Self {
        Self::Eq(field, value.into())
    }

    /// 被过滤的字段
    pub const fn field(&self) -> F {
        match self {
            Self::In(field, _) | Self::Eq(field, _) => *field,
        }
    }

    fn to_expr(&self) -> SimpleExpr {
        match self {
            Self::In(_, values) if values.is_empty() => Expr::cust("1 = 0"),
            Self::In(field, values) => field.column().is_in(values.iter().cloned()),
            Self::Eq(field, value) => field.column().eq(value.clone()),
        }
    }
}

/// 所有条件取交集
#[must_use]
pub fn build_condition<F: QueryField>(clauses: &[FilterClause<F>]) -> Condition {
    clauses
        .iter()
        .fold(Condition::all(), |condition, clause| condition.add(clause.to_expr()))
}
