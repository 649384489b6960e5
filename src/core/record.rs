//! 规范化记录（CanonicalRecord）
//!
//! 与来源无关的个人记忆条目：笔记、日程、提醒都映射成同一结构。记录是不可变值，
//! 字段只读；「更新」即用同一个 canonical_id 构造新值，再由存储层按 ID 覆盖（后写者胜）。
//!
//! 构造统一走 [`RecordBuilder`]，非法字段在 `build()` 时立即返回
//! [`CoreError::InvalidRecord`]；反序列化也经过同一套校验。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{CoreError, CoreResult};
use crate::core::identity::make_canonical_id;

/// 未指定领域时的默认值
pub const DEFAULT_DOMAIN: &str = "general";

/// 提醒类记录的 source_record_type
pub const REMINDER_RECORD_TYPE: &str = "reminder";

/// 规范化记忆条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordDraft")]
pub struct CanonicalRecord {
    canonical_id: String,
    source_system: String,
    source_record_type: String,
    title: String,
    content: String,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    due_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    people: Vec<String>,
    labels: Vec<String>,
    domain: String,
}

impl CanonicalRecord {
    /// 已知 canonical_id 时的构建入口（例如从存储中还原）
    pub fn builder(
        canonical_id: impl Into<String>,
        source_system: impl Into<String>,
        source_record_type: impl Into<String>,
    ) -> RecordBuilder {
        RecordBuilder::new(canonical_id, source_system, source_record_type)
    }

    /// 由来源三元组派生 canonical_id 的构建入口（摄取新数据时使用）
    pub fn from_source(
        source_system: &str,
        source_record_type: &str,
        source_record_id: &str,
    ) -> RecordBuilder {
        let canonical_id = make_canonical_id(
            source_system.trim(),
            source_record_type.trim(),
            source_record_id.trim(),
        );
        RecordBuilder::new(canonical_id, source_system, source_record_type)
    }

    pub fn canonical_id(&self) -> &str {
        &self.canonical_id
    }

    pub fn source_system(&self) -> &str {
        &self.source_system
    }

    pub fn source_record_type(&self) -> &str {
        &self.source_record_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn start_at(&self) -> Option<DateTime<Utc>> {
        self.start_at
    }

    pub fn end_at(&self) -> Option<DateTime<Utc>> {
        self.end_at
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn people(&self) -> &[String] {
        &self.people
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// 锚点时间：start → due → created → updated → end 中第一个存在的
    pub fn anchor_time(&self) -> Option<DateTime<Utc>> {
        self.start_at
            .or(self.due_at)
            .or(self.created_at)
            .or(self.updated_at)
            .or(self.end_at)
    }

    /// 锚点时间所在的 UTC 日期
    pub fn anchor_day(&self) -> Option<NaiveDate> {
        self.anchor_time().map(|t| t.date_naive())
    }

    /// 小写、去空白后的人物集合（忽略空项）
    pub fn normalized_people(&self) -> std::collections::BTreeSet<String> {
        self.people
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// 小写、去空白后的领域；可能为空串
    pub fn normalized_domain(&self) -> String {
        self.domain.trim().to_lowercase()
    }

    pub fn is_reminder(&self) -> bool {
        self.source_record_type
            .eq_ignore_ascii_case(REMINDER_RECORD_TYPE)
    }

    /// 供检索使用的纯内容文本：title、content、people、domain 逐行拼接，不带字段标签
    ///
    /// 人物按小写去重并按小写排序；默认领域 general 不计入，空字段跳过。
    pub fn search_text(&self) -> String {
        let mut seen = std::collections::HashSet::new();
        let mut people: Vec<&str> = self
            .people
            .iter()
            .map(|p| p.as_str())
            .filter(|p| seen.insert(p.to_lowercase()))
            .collect();
        people.sort_by_key(|p| p.to_lowercase());
        let people = people.join(" ");
        let domain = if self.normalized_domain() == DEFAULT_DOMAIN {
            ""
        } else {
            self.domain.as_str()
        };
        [self.title.as_str(), self.content.as_str(), people.as_str(), domain]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// CanonicalRecord 的构建器：链式设置可选字段，`build()` 时统一校验
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecordBuilder {
    canonical_id: String,
    source_system: String,
    source_record_type: String,
    title: String,
    content: String,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    due_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    people: Vec<String>,
    labels: Vec<String>,
    domain: Option<String>,
}

/// 反序列化时的中间形态，字段与 CanonicalRecord 相同
type RecordDraft = RecordBuilder;

impl RecordBuilder {
    pub fn new(
        canonical_id: impl Into<String>,
        source_system: impl Into<String>,
        source_record_type: impl Into<String>,
    ) -> Self {
        Self {
            canonical_id: canonical_id.into(),
            source_system: source_system.into(),
            source_record_type: source_record_type.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn start_at(mut self, at: DateTime<Utc>) -> Self {
        self.start_at = Some(at);
        self
    }

    pub fn end_at(mut self, at: DateTime<Utc>) -> Self {
        self.end_at = Some(at);
        self
    }

    pub fn due_at(mut self, at: DateTime<Utc>) -> Self {
        self.due_at = Some(at);
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.people.push(person.into());
        self
    }

    pub fn people<I, S>(mut self, people: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.people.extend(people.into_iter().map(Into::into));
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// 校验并生成不可变记录
    pub fn build(self) -> CoreResult<CanonicalRecord> {
        let canonical_id = required("canonical_id", &self.canonical_id)?;
        let source_system = required("source_system", &self.source_system)?;
        let source_record_type = required("source_record_type", &self.source_record_type)?;

        if let (Some(start), Some(end)) = (self.start_at, self.end_at) {
            if end < start {
                return Err(CoreError::InvalidRecord(format!(
                    "{canonical_id}: end_at {end} is before start_at {start}"
                )));
            }
        }

        Ok(CanonicalRecord {
            canonical_id,
            source_system,
            source_record_type,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            start_at: self.start_at,
            end_at: self.end_at,
            due_at: self.due_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            people: normalize_string_list(self.people),
            labels: normalize_string_list(self.labels),
            domain: self
                .domain
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
        })
    }
}

impl TryFrom<RecordDraft> for CanonicalRecord {
    type Error = CoreError;

    fn try_from(draft: RecordDraft) -> Result<Self, Self::Error> {
        draft.build()
    }
}

fn required(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidRecord(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// 去除首尾空白并丢弃空项，保持原有顺序
fn normalize_string_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
