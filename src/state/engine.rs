//! 确定性状态引擎
//!
//! 只看结构化记忆模式（数量、时间、领域、FOLLOW_UP 关系），不使用学习模型。
//! 四个分数都是固定权重的线性组合再截断到合法区间，权重公开可审计。

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::core::{parse_timestamp, CanonicalRecord, CoreError, CoreResult, DEFAULT_DOMAIN};
use crate::graph::{Relation, RelationType};
use crate::state::models::{StateDiagnostics, StateFeatures, StateSnapshot};
use crate::storage::MemoryStore;

/// 状态引擎配置（对应配置文件 [state] 段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StateEngineConfig {
    /// 「最近」记录的时间窗口（天）
    pub recent_window_days: i64,
    /// 计入 FOLLOW_UP 关系的入库时间窗口（天）
    pub follow_up_window_days: i64,
}

/// 时间窗口上限（天）
pub const MAX_WINDOW_DAYS: i64 = 3650;

impl StateEngineConfig {
    /// 两个窗口都必须落在 [1, MAX_WINDOW_DAYS]
    pub fn validate(&self) -> CoreResult<()> {
        for (name, days) in [
            ("recent_window_days", self.recent_window_days),
            ("follow_up_window_days", self.follow_up_window_days),
        ] {
            if !(1..=MAX_WINDOW_DAYS).contains(&days) {
                return Err(CoreError::Config(config::ConfigError::Message(format!(
                    "state.{name} must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
                ))));
            }
        }
        Ok(())
    }
}

/// 窗口起点；天数截断到 [0, MAX_WINDOW_DAYS]，不会溢出
fn window_floor(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(days.clamp(0, MAX_WINDOW_DAYS)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Default for StateEngineConfig {
    fn default() -> Self {
        Self {
            recent_window_days: 7,
            follow_up_window_days: 7,
        }
    }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// 纯函数式状态引擎：输出只取决于 (records, relations, now)
#[derive(Debug, Clone, Default)]
pub struct StateEngine {
    config: StateEngineConfig,
}

impl StateEngine {
    pub fn new(config: StateEngineConfig) -> Self {
        Self { config }
    }

    /// 计算状态快照；`now` 为 None 时取当前 UTC 时间
    pub fn calculate(
        &self,
        records: &[CanonicalRecord],
        relations: &[Relation],
        now: Option<DateTime<Utc>>,
    ) -> StateSnapshot {
        let now = now.unwrap_or_else(Utc::now);
        let recent_floor = window_floor(now, self.config.recent_window_days);
        let follow_up_floor = window_floor(now, self.config.follow_up_window_days);
        let upcoming_ceiling = now
            .checked_add_signed(Duration::hours(24))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let recent: Vec<&CanonicalRecord> = records
            .iter()
            .filter(|r| r.anchor_time().is_some_and(|t| t >= recent_floor))
            .collect();
        let recent_ids: HashSet<&str> = recent.iter().map(|r| r.canonical_id()).collect();

        let upcoming_24h_count = recent
            .iter()
            .filter(|r| {
                r.anchor_time()
                    .is_some_and(|t| t >= now && t <= upcoming_ceiling)
            })
            .count();
        let overdue_reminder_count = recent
            .iter()
            .filter(|r| r.is_reminder() && r.due_at().is_some_and(|due| due < now))
            .count();
        let active_domain_count = recent
            .iter()
            .map(|r| r.normalized_domain())
            .filter(|d| !d.is_empty())
            .collect::<BTreeSet<_>>()
            .len();
        let domain_context = resolve_domain_context(&recent);

        let follow_up_relation_count = relations
            .iter()
            .filter(|rel| rel.relation_type == RelationType::FollowUp)
            .filter(|rel| {
                recent_ids.contains(rel.from_canonical_id.as_str())
                    || recent_ids.contains(rel.to_canonical_id.as_str())
            })
            .filter(|rel| {
                // 没有可解析的入库时间时照常计入
                rel.created_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .map_or(true, |created| created >= follow_up_floor)
            })
            .count();

        let recent_count = recent.len();
        let (context_switch_ratio, follow_up_density) = if recent_count > 0 {
            (
                active_domain_count as f64 / recent_count as f64,
                follow_up_relation_count as f64 / recent_count as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let recent_f = recent_count as f64;
        let overdue_f = overdue_reminder_count as f64;
        let upcoming_f = upcoming_24h_count as f64;

        let energy_level = clamp(
            55.0 + 3.5 * recent_f - 8.0 * overdue_f - 2.0 * upcoming_f - 10.0 * context_switch_ratio
                + 6.0 * follow_up_density,
            0.0,
            100.0,
        );
        let focus_index = clamp(
            72.0 - 25.0 * context_switch_ratio + 8.0 * follow_up_density - 1.0 * upcoming_f,
            0.0,
            100.0,
        );
        let execution_velocity = clamp(
            20.0 + 6.0 * recent_f + 8.0 * follow_up_density - 2.0 * overdue_f,
            0.0,
            100.0,
        );
        let low_energy_penalty = if energy_level < 35.0 { 0.35 } else { 0.0 };
        let stress_probability = clamp(
            0.15 + 0.12 * overdue_f + 0.04 * upcoming_f + 0.25 * context_switch_ratio
                - 0.20 * follow_up_density
                + low_energy_penalty,
            0.0,
            1.0,
        );

        tracing::debug!(
            recent = recent_count,
            overdue = overdue_reminder_count,
            upcoming = upcoming_24h_count,
            follow_ups = follow_up_relation_count,
            domain = %domain_context,
            "state calculated"
        );

        StateSnapshot {
            energy_level,
            stress_probability,
            focus_index,
            execution_velocity,
            domain_context,
            computed_at: now,
            features: StateFeatures {
                recent_record_count: recent_count,
                upcoming_24h_count,
                overdue_reminder_count,
                follow_up_relation_count,
                active_domain_count,
            },
            diagnostics: StateDiagnostics {
                context_switch_ratio,
                follow_up_density,
            },
        }
    }

    /// 从存储读取全部记录与关系后计算
    pub fn calculate_from_store(
        &self,
        store: &dyn MemoryStore,
        now: Option<DateTime<Utc>>,
    ) -> CoreResult<StateSnapshot> {
        let records = store.fetch_records()?;
        let relations = store.fetch_relations()?;
        Ok(self.calculate(&records, &relations, now))
    }
}

/// 最近记录中出现最多的领域；并列取字典序最小；空领域记作 general；没有记录时为 general
fn resolve_domain_context(recent: &[&CanonicalRecord]) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in recent {
        let domain = record.normalized_domain();
        let domain = if domain.is_empty() {
            DEFAULT_DOMAIN.to_string()
        } else {
            domain
        };
        *counts.entry(domain).or_insert(0) += 1;
    }
    // BTreeMap 按字典序迭代，只在严格更大时替换，即并列保留较小者
    let mut best: Option<(&String, usize)> = None;
    for (domain, count) in &counts {
        if best.map_or(true, |(_, top)| *count > top) {
            best = Some((domain, *count));
        }
    }
    best.map(|(domain, _)| domain.clone())
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 27, 18, 0, 0).unwrap()
    }

    fn sample_records() -> Vec<CanonicalRecord> {
        vec![
            CanonicalRecord::builder("co_1", "apple_notes", "note")
                .title("Roadmap draft")
                .created_at(Utc.with_ymd_and_hms(2026, 2, 26, 9, 0, 0).unwrap())
                .people(["sam@example.com"])
                .domain("work")
                .build()
                .unwrap(),
            CanonicalRecord::builder("co_2", "google_calendar", "event")
                .title("Roadmap sync")
                .start_at(Utc.with_ymd_and_hms(2026, 2, 27, 20, 0, 0).unwrap())
                .people(["sam@example.com"])
                .domain("work")
                .build()
                .unwrap(),
            CanonicalRecord::builder("co_3", "apple_reminders", "reminder")
                .title("Send recap")
                .due_at(Utc.with_ymd_and_hms(2026, 2, 27, 12, 0, 0).unwrap())
                .people(["sam@example.com"])
                .domain("work")
                .build()
                .unwrap(),
        ]
    }

    fn follow_up(from: &str, to: &str, created_at: Option<&str>) -> Relation {
        let mut rel = Relation::new(from, to, RelationType::FollowUp, "delta_hours=11.00");
        rel.created_at = created_at.map(str::to_string);
        rel
    }

    #[test]
    fn test_computes_expected_signals() {
        let relations = vec![follow_up("co_1", "co_2", Some("2026-02-27T00:00:00+00:00"))];
        let state = StateEngine::default().calculate(&sample_records(), &relations, Some(now()));

        assert_eq!(state.domain_context, "work");
        assert_eq!(state.features.recent_record_count, 3);
        assert_eq!(state.features.follow_up_relation_count, 1);
        assert_eq!(state.features.overdue_reminder_count, 1);
        assert_eq!(state.features.upcoming_24h_count, 1);
        assert_eq!(state.features.active_domain_count, 1);

        let csr = 1.0 / 3.0;
        let fud = 1.0 / 3.0;
        let energy = 55.0 + 3.5 * 3.0 - 8.0 - 2.0 - 10.0 * csr + 6.0 * fud;
        assert!((state.energy_level - energy).abs() < 1e-9);
        assert!((state.focus_index - (72.0 - 25.0 * csr + 8.0 * fud - 1.0)).abs() < 1e-9);
        assert!((state.execution_velocity - (20.0 + 18.0 + 8.0 * fud - 2.0)).abs() < 1e-9);
        let stress = 0.15 + 0.12 + 0.04 + 0.25 * csr - 0.20 * fud;
        assert!((state.stress_probability - stress).abs() < 1e-9);
        assert_eq!(state.computed_at, now());
    }

    #[test]
    fn test_empty_input_is_in_range() {
        let state = StateEngine::default().calculate(&[], &[], Some(now()));
        assert_eq!(state.domain_context, "general");
        assert_eq!(state.features, StateFeatures::default());
        assert_eq!(state.diagnostics, StateDiagnostics::default());
        assert_eq!(state.energy_level, 55.0);
        assert_eq!(state.focus_index, 72.0);
        assert_eq!(state.execution_velocity, 20.0);
        assert!((state.stress_probability - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_scores_are_clamped() {
        // 大量逾期提醒把精力压到 0 以下，压力推到 1 以上
        let records: Vec<_> = (0..30)
            .map(|i| {
                CanonicalRecord::builder(format!("co_{i}"), "apple_reminders", "reminder")
                    .due_at(now() - Duration::hours(i + 1))
                    .domain(format!("d{i}"))
                    .build()
                    .unwrap()
            })
            .collect();
        let state = StateEngine::default().calculate(&records, &[], Some(now()));
        assert_eq!(state.features.overdue_reminder_count, 30);
        assert_eq!(state.energy_level, 0.0);
        assert_eq!(state.stress_probability, 1.0);
        assert!((0.0..=100.0).contains(&state.focus_index));
        assert!((0.0..=100.0).contains(&state.execution_velocity));
    }

    #[test]
    fn test_stale_records_and_relations_are_ignored() {
        let old = CanonicalRecord::builder("co_old", "apple_notes", "note")
            .created_at(now() - Duration::days(30))
            .domain("archive")
            .build()
            .unwrap();
        let mut records = sample_records();
        records.push(old);
        let relations = vec![
            follow_up("co_1", "co_2", Some("2026-01-01 00:00:00")),
            follow_up("co_1", "co_3", Some("not a timestamp")),
            follow_up("co_old", "co_old_2", None),
            follow_up("co_2", "co_3", None),
        ];
        let state = StateEngine::default().calculate(&records, &relations, Some(now()));
        assert_eq!(state.features.recent_record_count, 3);
        assert_eq!(state.features.follow_up_relation_count, 2);
        assert_eq!(state.domain_context, "work");
    }

    #[test]
    fn test_domain_context_tie_breaks_lexicographically() {
        let make = |id: &str, domain: &str| {
            CanonicalRecord::builder(id, "apple_notes", "note")
                .created_at(now() - Duration::hours(1))
                .domain(domain)
                .build()
                .unwrap()
        };
        let records = vec![make("a", "work"), make("b", "Home"), make("c", "home"), make("d", "work")];
        let state = StateEngine::default().calculate(&records, &[], Some(now()));
        assert_eq!(state.domain_context, "home");
        assert_eq!(state.features.active_domain_count, 2);
    }

    #[test]
    fn test_custom_windows() {
        let engine = StateEngine::new(StateEngineConfig {
            recent_window_days: 1,
            follow_up_window_days: 1,
        });
        let state = engine.calculate(&sample_records(), &[], Some(now()));
        // co_1 创建于 33 小时前，落在 1 天窗口之外
        assert_eq!(state.features.recent_record_count, 2);
    }

    #[test]
    fn test_reads_from_store() {
        let store = InMemoryStore::new();
        store
            .upsert_records(&[CanonicalRecord::builder("co_1", "apple_notes", "note")
                .title("Prep brief")
                .created_at(Utc.with_ymd_and_hms(2026, 2, 27, 10, 0, 0).unwrap())
                .domain("strategy")
                .build()
                .unwrap()])
            .unwrap();
        let snapshot = StateEngine::default()
            .calculate_from_store(&store, Some(Utc.with_ymd_and_hms(2026, 2, 27, 12, 0, 0).unwrap()))
            .unwrap();
        assert_eq!(snapshot.features.recent_record_count, 1);
        assert_eq!(snapshot.domain_context, "strategy");
    }

    #[test]
    fn test_extreme_windows_do_not_panic() {
        for days in [i64::MAX / 1000, i64::MIN, -5, 0] {
            let engine = StateEngine::new(StateEngineConfig {
                recent_window_days: days,
                follow_up_window_days: days,
            });
            let state = engine.calculate(&sample_records(), &[], Some(now()));
            assert!((0.0..=1.0).contains(&state.stress_probability));
        }
    }

    #[test]
    fn test_validate_window_bounds() {
        assert!(StateEngineConfig::default().validate().is_ok());
        let ok = StateEngineConfig {
            recent_window_days: 1,
            follow_up_window_days: MAX_WINDOW_DAYS,
        };
        assert!(ok.validate().is_ok());
        for (recent, follow_up) in [(0, 7), (7, -1), (MAX_WINDOW_DAYS + 1, 7)] {
            let cfg = StateEngineConfig {
                recent_window_days: recent,
                follow_up_window_days: follow_up,
            };
            assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
        }
    }
}
