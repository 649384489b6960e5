//! 确定性标识：对键排序后的紧凑 JSON 做 SHA-256，截断前 24 位十六进制
//!
//! 不依赖对象地址或插入序号，同样的输入在任何进程、任何机器上得到同样的 ID。

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

const ID_HEX_LEN: usize = 24;

/// 稳定序列化：BTreeMap 保证键有序，serde_json 默认输出无空白的紧凑格式
fn stable_json(fields: &BTreeMap<&str, &str>) -> String {
    // 字符串到字符串的映射序列化不会失败
    serde_json::to_string(fields).unwrap_or_default()
}

/// 以 `prefix` 开头的截断摘要，例如 `co_3f1a...`
pub fn stable_digest_id(prefix: &str, fields: &BTreeMap<&str, &str>) -> String {
    let digest = Sha256::digest(stable_json(fields).as_bytes());
    let hex = hex::encode(digest);
    format!("{prefix}{}", &hex[..ID_HEX_LEN])
}

/// 由来源三元组生成 canonical_id
pub fn make_canonical_id(
    source_system: &str,
    source_record_type: &str,
    source_record_id: &str,
) -> String {
    let fields = BTreeMap::from([
        ("source_system", source_system),
        ("source_record_type", source_record_type),
        ("source_record_id", source_record_id),
    ]);
    stable_digest_id("co_", &fields)
}
