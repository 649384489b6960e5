//! SQLite 持久化（同步，rusqlite）
//!
//! 两张表：`canonical_records`（按 canonical_id upsert）与 `relations`（整体替换）。
//! 每次操作打开一个短连接并开启外键约束；批量写入放在单个事务里，保证原子性。
//! 时间统一以 RFC 3339 文本存储，读取时经 [`parse_timestamp`] 还原为 UTC。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::core::{parse_timestamp, CanonicalRecord, CoreError, CoreResult};
use crate::graph::{Relation, RelationType};
use crate::storage::MemoryStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS canonical_records (
    canonical_id TEXT PRIMARY KEY,
    source_system TEXT NOT NULL,
    source_record_type TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    start_at TEXT,
    end_at TEXT,
    due_at TEXT,
    created_at TEXT,
    updated_at TEXT,
    people_json TEXT NOT NULL,
    labels_json TEXT NOT NULL,
    domain TEXT NOT NULL,
    ingested_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS relations (
    relation_id TEXT PRIMARY KEY,
    from_canonical_id TEXT NOT NULL,
    to_canonical_id TEXT NOT NULL,
    relation_type TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    confidence REAL NOT NULL DEFAULT 1.0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY(from_canonical_id) REFERENCES canonical_records(canonical_id) ON DELETE CASCADE,
    FOREIGN KEY(to_canonical_id) REFERENCES canonical_records(canonical_id) ON DELETE CASCADE,
    UNIQUE(from_canonical_id, to_canonical_id, relation_type)
);

CREATE INDEX IF NOT EXISTS idx_canonical_records_start_at ON canonical_records(start_at);
CREATE INDEX IF NOT EXISTS idx_canonical_records_due_at ON canonical_records(due_at);
CREATE INDEX IF NOT EXISTS idx_canonical_records_created_at ON canonical_records(created_at);
CREATE INDEX IF NOT EXISTS idx_canonical_records_updated_at ON canonical_records(updated_at);
CREATE INDEX IF NOT EXISTS idx_relations_created_at ON relations(created_at);
CREATE INDEX IF NOT EXISTS idx_relations_type ON relations(relation_type);
"#;

/// 本地 SQLite 存储
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// 指向数据库文件；父目录不存在时自动创建。不会建表，见 [`Self::initialize_schema`]
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// 建表与索引（幂等）
    pub fn initialize_schema(&self) -> CoreResult<()> {
        self.connect()?.execute_batch(SCHEMA)?;
        tracing::debug!(path = %self.path.display(), "sqlite schema ready");
        Ok(())
    }

    fn connect(&self) -> CoreResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}

fn to_text(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|t| t.to_rfc3339())
}

/// NULL 还原为 None；无法解析的文本报错，不静默丢弃
fn from_text(
    canonical_id: &str,
    field: &str,
    value: Option<String>,
) -> CoreResult<Option<DateTime<Utc>>> {
    match value {
        None => Ok(None),
        Some(text) => parse_timestamp(&text).map(Some).ok_or_else(|| {
            CoreError::InvalidRecord(format!(
                "{canonical_id}: unparseable {field} timestamp {text:?}"
            ))
        }),
    }
}

/// 数据库行的原始形态，先整体读出再做校验转换
struct RecordRow {
    canonical_id: String,
    source_system: String,
    source_record_type: String,
    title: String,
    content: String,
    start_at: Option<String>,
    end_at: Option<String>,
    due_at: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    people_json: String,
    labels_json: String,
    domain: String,
}

impl RecordRow {
    fn into_record(self) -> CoreResult<CanonicalRecord> {
        let id = self.canonical_id.as_str();
        let start_at = from_text(id, "start_at", self.start_at)?;
        let end_at = from_text(id, "end_at", self.end_at)?;
        let due_at = from_text(id, "due_at", self.due_at)?;
        let created_at = from_text(id, "created_at", self.created_at)?;
        let updated_at = from_text(id, "updated_at", self.updated_at)?;
        let people: Vec<String> = serde_json::from_str(&self.people_json)?;
        let labels: Vec<String> = serde_json::from_str(&self.labels_json)?;
        let mut builder = CanonicalRecord::builder(
            self.canonical_id,
            self.source_system,
            self.source_record_type,
        )
        .title(self.title)
        .content(self.content)
        .people(people)
        .labels(labels)
        .domain(self.domain);
        if let Some(at) = start_at {
            builder = builder.start_at(at);
        }
        if let Some(at) = end_at {
            builder = builder.end_at(at);
        }
        if let Some(at) = due_at {
            builder = builder.due_at(at);
        }
        if let Some(at) = created_at {
            builder = builder.created_at(at);
        }
        if let Some(at) = updated_at {
            builder = builder.updated_at(at);
        }
        builder.build()
    }
}

impl MemoryStore for SqliteStore {
    fn fetch_records(&self) -> CoreResult<Vec<CanonicalRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT canonical_id, source_system, source_record_type, title, content,
                    start_at, end_at, due_at, created_at, updated_at,
                    people_json, labels_json, domain
             FROM canonical_records
             ORDER BY canonical_id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RecordRow {
                    canonical_id: row.get(0)?,
                    source_system: row.get(1)?,
                    source_record_type: row.get(2)?,
                    title: row.get(3)?,
                    content: row.get(4)?,
                    start_at: row.get(5)?,
                    end_at: row.get(6)?,
                    due_at: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                    people_json: row.get(10)?,
                    labels_json: row.get(11)?,
                    domain: row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    fn upsert_records(&self, records: &[CanonicalRecord]) -> CoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO canonical_records (
                    canonical_id, source_system, source_record_type, title, content,
                    start_at, end_at, due_at, created_at, updated_at,
                    people_json, labels_json, domain
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(canonical_id) DO UPDATE SET
                    source_system = excluded.source_system,
                    source_record_type = excluded.source_record_type,
                    title = excluded.title,
                    content = excluded.content,
                    start_at = excluded.start_at,
                    end_at = excluded.end_at,
                    due_at = excluded.due_at,
                    created_at = excluded.created_at,
                    updated_at = excluded.updated_at,
                    people_json = excluded.people_json,
                    labels_json = excluded.labels_json,
                    domain = excluded.domain",
            )?;
            for record in records {
                stmt.execute(params![
                    record.canonical_id(),
                    record.source_system(),
                    record.source_record_type(),
                    record.title(),
                    record.content(),
                    to_text(record.start_at()),
                    to_text(record.end_at()),
                    to_text(record.due_at()),
                    to_text(record.created_at()),
                    to_text(record.updated_at()),
                    serde_json::to_string(record.people())?,
                    serde_json::to_string(record.labels())?,
                    record.domain(),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = records.len(), "records upserted");
        Ok(())
    }

    fn replace_relations(&self, relations: &[Relation]) -> CoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM relations", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO relations (
                    relation_id, from_canonical_id, to_canonical_id, relation_type, reason, confidence
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(from_canonical_id, to_canonical_id, relation_type) DO UPDATE SET
                    relation_id = excluded.relation_id,
                    reason = excluded.reason,
                    confidence = excluded.confidence",
            )?;
            for relation in relations {
                stmt.execute(params![
                    relation.relation_id,
                    relation.from_canonical_id,
                    relation.to_canonical_id,
                    relation.relation_type.as_str(),
                    relation.reason,
                    relation.confidence,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn fetch_relations(&self) -> CoreResult<Vec<Relation>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT relation_id, from_canonical_id, to_canonical_id, relation_type,
                    reason, confidence, created_at
             FROM relations
             ORDER BY from_canonical_id, to_canonical_id, relation_type",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(relation_id, from, to, ty, reason, confidence, created_at)| -> CoreResult<Relation> {
                let relation_type = RelationType::parse(&ty).ok_or_else(|| {
                    CoreError::InvalidRelation(format!("{relation_id}: unknown type {ty}"))
                })?;
                Ok(Relation {
                    relation_id,
                    from_canonical_id: from,
                    to_canonical_id: to,
                    relation_type,
                    reason,
                    confidence,
                    created_at,
                })
            })
            .collect()
    }
}
