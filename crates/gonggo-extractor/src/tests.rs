//! End-to-end pipeline tests

#[cfg(test)]
mod tests {
    use crate::{
        EscalationReason, GroupStatus, JobInput, MemorySink, Orchestrator, PipelineMetrics,
        PipelineStage, ThreeTierConfig,
    };
    use gonggo_domain::traits::{CostLog, FeedbackStore};
    use gonggo_domain::{Confidence, CostEntry, FeedbackRecord, Field, FieldValue, TierLevel};
    use gonggo_llm::MockProvider;
    use gonggo_store::{FeedbackQuery, SqliteStore};

    /// Text long enough to avoid the short-text rule, matching no rule
    fn filler() -> String {
        "본 문서는 시험용 안내문으로 특별한 내용이 포함되어 있지 않습니다. ".repeat(5)
    }

    fn date(s: &str) -> FieldValue {
        FieldValue::Date(gonggo_domain::value::parse_date_text(s).unwrap())
    }

    fn rules_only() -> ThreeTierConfig {
        ThreeTierConfig {
            tier2_enabled: false,
            tier3_enabled: false,
            ..ThreeTierConfig::default()
        }
    }

    const TIER3_RESPONSE: &str = r#"{
        "fields": {"deadline": "2025-03-20", "keywords": ["창업", "R&D"]},
        "reasoning": "본문 일정표 기준",
        "pattern_suggestions": [{
            "field": "keywords",
            "extracted_value": ["창업", "R&D"],
            "context_snippet": "창업기업 R&D 지원",
            "suggested_pattern": "(창업|R&D)",
            "failure_reason": "키워드 규칙 없음"
        }]
    }"#;

    #[tokio::test]
    async fn test_labeled_deadline_with_rules_only() {
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(rules_only(), MemorySink::new());

        let outcome = orchestrator
            .extract(JobInput::new("job-1", "접수마감일: 2025-03-15"))
            .await;

        let deadline = &outcome.fields[&Field::Deadline];
        assert_eq!(deadline.confidence, Confidence::High);
        assert_eq!(deadline.tier, TierLevel::Tier1);
        assert_eq!(deadline.value, Some(date("2025-03-15")));

        assert_eq!(outcome.highest_tier, TierLevel::Tier1);
        assert_eq!(outcome.total_cost_krw, 0.0);
        assert_eq!(
            outcome.stages,
            vec![PipelineStage::Init, PipelineStage::Tier1Done, PipelineStage::Merged]
        );
        assert!(orchestrator.sink().lock().unwrap().costs.is_empty());
    }

    #[tokio::test]
    async fn test_empty_text() {
        let tier3 = MockProvider::new("{}");
        let orchestrator = Orchestrator::new(ThreeTierConfig::default(), MemorySink::new())
            .with_tier2(MockProvider::new("{}"))
            .with_tier3(tier3.clone());

        let outcome = orchestrator.extract(JobInput::new("job-empty", "")).await;

        assert!(outcome.fields.is_empty());
        assert_eq!(outcome.failed_fields.len(), Field::ALL.len());
        assert_eq!(outcome.coverage_percent, 0.0);
        assert!(outcome
            .escalation_reasons
            .contains(&EscalationReason::ShortText { chars: 0 }));
        assert!(outcome.escalation_reasons.contains(&EscalationReason::MissingRatio {
            missing: Field::ALL.len(),
            total: Field::ALL.len(),
        }));
        assert_eq!(tier3.call_count(), 1);
        assert!(outcome.escalated());
    }

    #[tokio::test]
    async fn test_merge_precedence() {
        let mut tier2 = MockProvider::default().with_model_name("small");
        tier2.add_response(
            "Field group: A",
            r#"{"organization": "창업진흥원", "contact": null, "deadline": "2030-01-01"}"#,
        );
        let tier3 = MockProvider::new(TIER3_RESPONSE).with_model_name("large");

        let orchestrator = Orchestrator::new(ThreeTierConfig::default(), MemorySink::new())
            .with_tier2(tier2.clone())
            .with_tier3(tier3);

        let text = format!("접수마감일: 2025-03-15\n{}", filler());
        let outcome = orchestrator.extract(JobInput::new("job-merge", text)).await;

        // Rule results are never offered to the focused tier
        let group_a_prompt = &tier2.prompts()[0];
        assert!(group_a_prompt.contains("Field group: A"));
        assert!(!group_a_prompt.contains("\"deadline\""));

        // Focused tier fills the gap
        let organization = &outcome.fields[&Field::Organization];
        assert_eq!(organization.tier, TierLevel::Tier2);
        assert_eq!(organization.confidence, Confidence::Medium);
        assert_eq!(organization.source, "small");

        // Escalation tier overwrites the rule result
        let deadline = &outcome.fields[&Field::Deadline];
        assert_eq!(deadline.tier, TierLevel::Tier3);
        assert_eq!(deadline.confidence, Confidence::High);
        assert_eq!(deadline.value, Some(date("2025-03-20")));
        assert_eq!(deadline.source, "large");

        assert!(outcome.fields.contains_key(&Field::Keywords));
        assert!(!outcome.fields.contains_key(&Field::Contact));
        assert_eq!(outcome.highest_tier, TierLevel::Tier3);
        assert_eq!(outcome.tier3_reasoning.as_deref(), Some("본문 일정표 기준"));
        assert_eq!(outcome.pattern_suggestions.len(), 1);
        assert!(outcome.fields.values().all(|r| r.value.is_some()));
    }

    #[tokio::test]
    async fn test_tier2_ceiling_skips_later_groups() {
        // 100,000 in + 10,000 out at small-model rates is 29.4 KRW per call
        let tier2 = MockProvider::new("{}").with_usage(100_000, 10_000);
        let config = ThreeTierConfig {
            tier2_max_cost_krw: 50.0,
            tier3_enabled: false,
            ..ThreeTierConfig::default()
        };
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(config, MemorySink::new()).with_tier2(tier2.clone());

        let outcome = orchestrator.extract(JobInput::new("job-budget", filler())).await;

        assert_eq!(tier2.call_count(), 2);
        let statuses: Vec<GroupStatus> = outcome.tier2_groups.iter().map(|g| g.status.clone()).collect();
        assert_eq!(
            statuses,
            vec![
                GroupStatus::Completed,
                GroupStatus::Completed,
                GroupStatus::SkippedBudget,
                GroupStatus::SkippedBudget,
            ]
        );
        assert!((outcome.tier2_cost_krw - 58.8).abs() < 1e-6);
        assert_eq!(outcome.total_cost_krw, outcome.tier2_cost_krw);
        assert_eq!(outcome.highest_tier, TierLevel::Tier2);
        assert_eq!(outcome.stages.last(), Some(&PipelineStage::Merged));

        let sink = orchestrator.sink();
        let sink = sink.lock().unwrap();
        assert_eq!(sink.costs.len(), 2);
        assert!(sink.costs.iter().all(|c| c.tier == TierLevel::Tier2));
        assert_eq!(sink.costs[1].group, Some(gonggo_domain::FieldGroup::B));
    }

    #[tokio::test]
    async fn test_short_text_always_escalates() {
        let tier3 = MockProvider::new(TIER3_RESPONSE);
        let config = ThreeTierConfig {
            tier2_enabled: false,
            ..ThreeTierConfig::default()
        };
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(config, MemorySink::new()).with_tier3(tier3.clone());

        let outcome = orchestrator
            .extract(JobInput::new("job-short", "접수마감일: 2025-03-15"))
            .await;

        assert_eq!(tier3.call_count(), 1);
        assert!(outcome
            .escalation_reasons
            .iter()
            .any(|r| matches!(r, EscalationReason::ShortText { .. })));
        assert!(outcome.escalated());
        assert!(outcome.tier3_cost_krw > 0.0);
    }

    #[tokio::test]
    async fn test_no_escalation_when_disabled() {
        let tier3 = MockProvider::new(TIER3_RESPONSE);
        let config = ThreeTierConfig {
            tier2_enabled: false,
            tier3_enabled: false,
            ..ThreeTierConfig::default()
        };
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(config, MemorySink::new()).with_tier3(tier3.clone());

        let outcome = orchestrator.extract(JobInput::new("job", "")).await;

        assert_eq!(tier3.call_count(), 0);
        assert!(!outcome.escalation_reasons.is_empty());
        assert!(!outcome.escalated());
    }

    #[tokio::test]
    async fn test_forced_escalation_respects_ceiling() {
        let tier3 = MockProvider::new(TIER3_RESPONSE);
        let config = ThreeTierConfig {
            tier2_enabled: false,
            tier3_enabled: false,
            force_tier3: true,
            tier3_max_cost_krw: 0.0,
            ..ThreeTierConfig::default()
        };
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(config, MemorySink::new()).with_tier3(tier3.clone());

        let outcome = orchestrator.extract(JobInput::new("job", filler())).await;

        assert_eq!(tier3.call_count(), 0);
        assert!(outcome.escalation_reasons.contains(&EscalationReason::Forced));
        assert_eq!(outcome.highest_tier, TierLevel::Tier1);
    }

    #[tokio::test]
    async fn test_forced_escalation_overrides_disabled_tier3() {
        let tier3 = MockProvider::new(TIER3_RESPONSE);
        let config = ThreeTierConfig {
            tier2_enabled: false,
            tier3_enabled: false,
            force_tier3: true,
            ..ThreeTierConfig::default()
        };
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(config, MemorySink::new()).with_tier3(tier3.clone());

        let outcome = orchestrator.extract(JobInput::new("job", filler())).await;

        assert_eq!(tier3.call_count(), 1);
        assert!(outcome.escalated());
    }

    #[tokio::test]
    async fn test_provider_failures_are_swallowed() {
        let mut tier2 = MockProvider::default();
        tier2.add_error("Field group");
        let mut tier3 = MockProvider::default();
        tier3.add_error("Full-document review");

        let orchestrator = Orchestrator::new(ThreeTierConfig::default(), MemorySink::new())
            .with_tier2(tier2)
            .with_tier3(tier3);

        let text = format!("접수마감일: 2025-03-15\n{}", filler());
        let outcome = orchestrator.extract(JobInput::new("job-fail", text)).await;

        assert_eq!(outcome.fields.len(), 1);
        assert!(outcome.fields.contains_key(&Field::Deadline));
        assert!(outcome
            .tier2_groups
            .iter()
            .all(|g| g.status == GroupStatus::CallFailed));
        assert!(!outcome.escalated());
        assert_eq!(outcome.highest_tier, TierLevel::Tier3);
        assert_eq!(outcome.total_cost_krw, 0.0);
        assert!(outcome.tier3_reasoning.is_none());
    }

    #[tokio::test]
    async fn test_unfamiliar_layout_escalates() {
        let config = ThreeTierConfig {
            escalation: crate::EscalationPolicy {
                missing_ratio_threshold: 1.0,
                ..Default::default()
            },
            ..ThreeTierConfig::default()
        };
        let tier3 = MockProvider::new("{}");
        let orchestrator = Orchestrator::new(config, MemorySink::new())
            .with_tier2(MockProvider::new("{}"))
            .with_tier3(tier3.clone());

        let outcome = orchestrator.extract(JobInput::new("job", filler())).await;

        assert!(outcome.escalation_reasons.iter().any(|r| matches!(
            r,
            EscalationReason::UnfamiliarLayout {
                tier1_resolved: 0,
                tier2_resolved: 0,
                ..
            }
        )));
        assert_eq!(tier3.call_count(), 1);
    }

    #[tokio::test]
    async fn test_detail_html_is_searched() {
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(rules_only(), MemorySink::new());
        let input = JobInput::default()
            .with_detail_html("<table><tr><td>주관기관: 창업진흥원</td></tr></table>")
            .with_description("문의처: 042-480-4321");

        let outcome = orchestrator.extract(input).await;

        assert_eq!(
            outcome.value(Field::Organization),
            Some(&FieldValue::Text("창업진흥원".to_string()))
        );
        assert!(outcome.value(Field::Contact).is_some());
    }

    #[tokio::test]
    async fn test_feedback_and_costs_reach_sqlite() {
        let store = SqliteStore::new(":memory:").unwrap();
        let orchestrator = Orchestrator::new(ThreeTierConfig::default(), store)
            .with_tier2(MockProvider::new("{}").with_model_name("small"))
            .with_tier3(MockProvider::new(TIER3_RESPONSE).with_model_name("large"));

        let outcome = orchestrator.extract(JobInput::new("job-db", filler())).await;
        assert!(outcome.escalated());

        let sink = orchestrator.sink();
        let store = sink.lock().unwrap();

        let feedback = store.list_feedback(&FeedbackQuery::default()).unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].job_id, "job-db");
        assert_eq!(feedback[0].field(), Field::Keywords);

        let costs = store.list_costs("job-db").unwrap();
        assert_eq!(costs.len(), 5);
        assert_eq!(costs.iter().filter(|c| c.tier == TierLevel::Tier3).count(), 1);
        let logged: f64 = costs.iter().map(|c| c.cost_krw).sum();
        assert!((logged - outcome.total_cost_krw).abs() < 1e-6);
    }

    struct FailingSink;

    impl FeedbackStore for FailingSink {
        type Error = String;

        fn append_feedback(&mut self, _record: &FeedbackRecord) -> Result<(), Self::Error> {
            Err("disk full".to_string())
        }
    }

    impl CostLog for FailingSink {
        type Error = String;

        fn record_cost(&mut self, _entry: &CostEntry) -> Result<(), Self::Error> {
            Err("disk full".to_string())
        }
    }

    #[tokio::test]
    async fn test_sink_failures_are_swallowed() {
        let orchestrator = Orchestrator::new(ThreeTierConfig::default(), FailingSink)
            .with_tier2(MockProvider::new("{}"))
            .with_tier3(MockProvider::new(TIER3_RESPONSE));

        let outcome = orchestrator.extract(JobInput::new("job", filler())).await;
        assert!(outcome.escalated());
        assert_eq!(outcome.pattern_suggestions.len(), 1);
    }

    #[tokio::test]
    async fn test_poisoned_sink_is_survivable() {
        let orchestrator = Orchestrator::new(ThreeTierConfig::default(), MemorySink::new())
            .with_tier2(MockProvider::new("{}"))
            .with_tier3(MockProvider::new(TIER3_RESPONSE));

        let sink = orchestrator.sink();
        let _ = std::thread::spawn(move || {
            let _guard = sink.lock().unwrap();
            panic!("poison the sink");
        })
        .join();

        let outcome = orchestrator.extract(JobInput::new("job", filler())).await;
        assert!(outcome.escalated());
        assert!(outcome.total_cost_krw > 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_jobs_share_orchestrator() {
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(rules_only(), MemorySink::new());

        let (a, b) = tokio::join!(
            orchestrator.extract(JobInput::new("a", "접수마감일: 2025-03-15")),
            orchestrator.extract(JobInput::new("b", "총 사업비: 52억원")),
        );

        assert_eq!(a.job_id, "a");
        assert!(a.value(Field::Deadline).is_some());
        assert_eq!(b.value(Field::BudgetAmount), Some(&FieldValue::Amount(5_200_000_000)));
    }

    #[tokio::test]
    async fn test_metrics_over_batch() {
        let orchestrator: Orchestrator<MockProvider, MockProvider> =
            Orchestrator::new(rules_only(), MemorySink::new());
        let mut metrics = PipelineMetrics::new();

        for text in ["접수마감일: 2025-03-15", "총 사업비: 52억원", ""] {
            let outcome = orchestrator.extract(JobInput::new("job", text)).await;
            metrics.record(&outcome);
        }

        assert_eq!(metrics.jobs, 3);
        assert_eq!(metrics.by_highest_tier[&TierLevel::Tier1], 3);
        assert_eq!(metrics.failed_by_field[&Field::Keywords], 3);
        assert_eq!(metrics.total_cost_krw, 0.0);
    }
}
