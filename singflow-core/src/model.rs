pub mod line;
pub mod manifest;
pub mod song;

pub use line::*;
pub use manifest::*;
pub use song::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `id` 字段既可能是字符串也可能是数字，统一转为字符串
pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
