use serde_json::Value;

use super::QueryField;

/// 对序列化后的记录做字段投影
///
/// 未选择的键被移除；非对象值原样返回。
#[must_use]
pub fn project<F: QueryField>(record: Value, select: Option<&[F]>) -> Value {
    match (record, select) {
        (Value::Object(mut map), Some(fields)) => {
            map.retain(|key, _| fields.iter().any(|field| field.key() == key));
            Value::Object(map)
        }
        (record, _) => record,
    }
}
