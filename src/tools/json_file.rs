//! 本地工具共用的 JSON 文件读写与参数提取

use std::path::Path;

use serde_json::Value;

use crate::core::{CoreError, CoreResult};

/// 读取 JSON 数组文件；文件不存在或为空时返回空 Vec，非对象元素被忽略
pub fn read_json_list(path: &Path) -> CoreResult<Vec<Value>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(items) => Ok(items.into_iter().filter(Value::is_object).collect()),
        _ => Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("expected JSON array in {}", path.display()),
        ))),
    }
}

/// 以缩进格式写出 JSON；父目录不存在时自动创建
pub fn write_json(path: &Path, value: &Value) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// 读取 payload 中的文本字段并去空白；数字 / 布尔转成字符串，其它视为空
pub fn text_field(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}
