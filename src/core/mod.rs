//! 核心数据层：规范化记录、确定性 ID、时间解析、错误类型

pub mod error;
pub mod identity;
pub mod record;
pub mod time;

pub use error::{CoreError, CoreResult};
pub use identity::{make_canonical_id, stable_digest_id};
pub use record::{CanonicalRecord, RecordBuilder, DEFAULT_DOMAIN, REMINDER_RECORD_TYPE};
pub use time::parse_timestamp;
