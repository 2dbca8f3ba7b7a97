//! Integration tests for gonggo-store
//!
//! These tests verify the append and read-back cycle for feedback and costs.

use gonggo_domain::traits::{CostLog, FeedbackStore};
use gonggo_domain::{CostEntry, FeedbackRecord, Field, FieldGroup, PatternSuggestion, TierLevel, TokenUsage};
use gonggo_store::{FeedbackQuery, SqliteStore, StoreError};

fn feedback(job_id: &str, field: Field, created_at: u64) -> FeedbackRecord {
    FeedbackRecord {
        job_id: job_id.to_string(),
        suggestion: PatternSuggestion {
            field,
            extracted_value: "2024-03-15".to_string(),
            context_snippet: "신청기한: 2024년 3월 15일(금) 18:00까지".to_string(),
            suggested_pattern: r"신청기한\s*[:：]\s*(\d{4})년\s*(\d{1,2})월\s*(\d{1,2})일".to_string(),
            failure_reason: "label 신청기한 is not covered".to_string(),
        },
        tier1_value: None,
        tier2_value: Some("2024-03-15".to_string()),
        created_at,
    }
}

fn cost(job_id: &str, tier: TierLevel, group: Option<FieldGroup>, cost_krw: f64) -> CostEntry {
    CostEntry {
        job_id: job_id.to_string(),
        tier,
        model: "model-x".to_string(),
        group,
        usage: TokenUsage::new(1000, 100),
        cost_krw,
        created_at: 1_700_000_000,
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_append_and_list_feedback() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let record = feedback("job-1", Field::Deadline, 100);
    store.append_feedback(&record).unwrap();

    let listed = store.list_feedback(&FeedbackQuery::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], record);
    assert_eq!(listed[0].field(), Field::Deadline);
}

#[test]
fn test_feedback_filters_and_ordering() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    store.append_feedback(&feedback("job-1", Field::Deadline, 100)).unwrap();
    store.append_feedback(&feedback("job-1", Field::Region, 200)).unwrap();
    store.append_feedback(&feedback("job-2", Field::Deadline, 300)).unwrap();

    let deadlines = store
        .list_feedback(&FeedbackQuery {
            field: Some(Field::Deadline),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(deadlines.len(), 2);
    // Newest first
    assert_eq!(deadlines[0].job_id, "job-2");

    let job1 = store
        .list_feedback(&FeedbackQuery {
            job_id: Some("job-1".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(job1.len(), 2);

    let limited = store
        .list_feedback(&FeedbackQuery {
            limit: Some(1),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].created_at, 300);
}

#[test]
fn test_feedback_counts() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    store.append_feedback(&feedback("a", Field::Deadline, 1)).unwrap();
    store.append_feedback(&feedback("b", Field::Deadline, 2)).unwrap();
    store.append_feedback(&feedback("c", Field::BudgetAmount, 3)).unwrap();

    let counts = store.feedback_counts().unwrap();
    assert_eq!(counts, vec![(Field::Deadline, 2), (Field::BudgetAmount, 1)]);
}

#[test]
fn test_record_and_sum_costs() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    store.record_cost(&cost("job-1", TierLevel::Tier2, Some(FieldGroup::A), 0.5)).unwrap();
    store.record_cost(&cost("job-1", TierLevel::Tier2, Some(FieldGroup::B), 0.25)).unwrap();
    store.record_cost(&cost("job-1", TierLevel::Tier3, None, 200.0)).unwrap();
    store.record_cost(&cost("job-2", TierLevel::Tier2, Some(FieldGroup::C), 1.0)).unwrap();

    let entries = store.list_costs("job-1").unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].group, Some(FieldGroup::A));
    assert_eq!(entries[2].tier, TierLevel::Tier3);
    assert_eq!(entries[2].group, None);
    assert_eq!(entries[2].usage, TokenUsage::new(1000, 100));

    let total = store.job_cost("job-1").unwrap();
    assert!((total - 200.75).abs() < 1e-9);
    assert_eq!(store.job_cost("unknown").unwrap(), 0.0);
}

#[test]
fn test_cost_by_tier() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    store.record_cost(&cost("a", TierLevel::Tier2, Some(FieldGroup::A), 1.0)).unwrap();
    store.record_cost(&cost("b", TierLevel::Tier2, Some(FieldGroup::D), 2.0)).unwrap();
    store.record_cost(&cost("b", TierLevel::Tier3, None, 300.0)).unwrap();

    let summary = store.cost_by_tier().unwrap();
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].0, TierLevel::Tier2);
    assert_eq!(summary[0].1.calls, 2);
    assert_eq!(summary[0].1.usage, TokenUsage::new(2000, 200));
    assert!((summary[1].1.cost_krw - 300.0).abs() < 1e-9);
}

#[test]
fn test_rule_tier_cost_rejected() {
    let mut store = SqliteStore::new(":memory:").unwrap();

    let result = store.record_cost(&cost("job", TierLevel::Tier1, None, 0.0));
    assert!(matches!(result, Err(StoreError::InvalidData(_))));
    assert!(store.list_costs("job").unwrap().is_empty());
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gonggo.db");

    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.append_feedback(&feedback("job-1", Field::Contact, 10)).unwrap();
        store.record_cost(&cost("job-1", TierLevel::Tier3, None, 120.0)).unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    assert_eq!(store.list_feedback(&FeedbackQuery::default()).unwrap().len(), 1);
    assert!((store.job_cost("job-1").unwrap() - 120.0).abs() < 1e-9);
}
