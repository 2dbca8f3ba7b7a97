//! Field module - the fixed extraction schema
//!
//! Every structured value the pipeline can produce is one of the statically
//! declared [`Field`]s. Each field belongs to exactly one [`FieldGroup`],
//! which is the unit of batching for the cheap model tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic group of a field
///
/// Groups batch fields into one model call each:
/// - A: Operations / dates
/// - B: Budget / duration
/// - C: Eligibility
/// - D: Domain / keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldGroup {
    /// Schedules, organizer, contact, application method
    A,
    /// Budget amounts, support ratio, project duration
    B,
    /// Who may apply
    C,
    /// Technical domain tags and keywords
    D,
}

impl FieldGroup {
    /// All groups in processing order
    pub const ALL: [FieldGroup; 4] = [FieldGroup::A, FieldGroup::B, FieldGroup::C, FieldGroup::D];

    /// Human-readable label for prompts and reports
    pub fn label(&self) -> &'static str {
        match self {
            FieldGroup::A => "Operations/Dates",
            FieldGroup::B => "Budget/Duration",
            FieldGroup::C => "Eligibility",
            FieldGroup::D => "Domain/Keywords",
        }
    }

    /// Single-letter code used in storage
    pub fn letter(&self) -> &'static str {
        match self {
            FieldGroup::A => "A",
            FieldGroup::B => "B",
            FieldGroup::C => "C",
            FieldGroup::D => "D",
        }
    }

    /// Parse the single-letter code
    pub fn from_letter(s: &str) -> Option<Self> {
        FieldGroup::ALL.iter().copied().find(|g| g.letter() == s.trim())
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.letter(), self.label())
    }
}

/// Shape of the value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Calendar date (YYYY-MM-DD)
    Date,
    /// Positive amount in Korean won
    Amount,
    /// Whole number (months, years)
    Integer,
    /// Percentage in (0, 100]
    Percent,
    /// Free text
    Text,
    /// List of tags
    List,
}

impl ValueKind {
    /// Format guidance shown to language models
    pub fn format_hint(&self) -> &'static str {
        match self {
            ValueKind::Date => "date string \"YYYY-MM-DD\"",
            ValueKind::Amount => "integer amount in KRW (원), e.g. 500000000",
            ValueKind::Integer => "integer",
            ValueKind::Percent => "number between 0 and 100",
            ValueKind::Text => "short string",
            ValueKind::List => "array of short strings",
        }
    }
}

/// An extractable field of a funding announcement
///
/// Fields are ordered by declaration, which is also the order the rule
/// engine visits them and the order they appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// 접수 시작일
    ApplicationStart,
    /// 접수 마감일
    Deadline,
    /// 주관/전담 기관
    Organization,
    /// 문의처
    Contact,
    /// 신청 방법
    ApplicationMethod,
    /// 총 사업 예산
    BudgetAmount,
    /// 기업(과제)당 최대 지원금
    MaxSupportAmount,
    /// 사업 기간 (개월)
    ProjectDurationMonths,
    /// 정부지원 비율
    GovernmentSharePercent,
    /// 지원 대상 유형
    TargetType,
    /// 업력 상한 (년)
    BusinessAgeMaxYears,
    /// 소재지 제한
    Region,
    /// 매출액 상한
    RevenueLimit,
    /// 요구/우대 인증
    RequiredCertifications,
    /// 자유 키워드
    Keywords,
    /// 기술 분야
    TechDomains,
    /// 지원 유형
    SupportType,
}

impl Field {
    /// Every declared field, in declaration order
    pub const ALL: [Field; 17] = [
        Field::ApplicationStart,
        Field::Deadline,
        Field::Organization,
        Field::Contact,
        Field::ApplicationMethod,
        Field::BudgetAmount,
        Field::MaxSupportAmount,
        Field::ProjectDurationMonths,
        Field::GovernmentSharePercent,
        Field::TargetType,
        Field::BusinessAgeMaxYears,
        Field::Region,
        Field::RevenueLimit,
        Field::RequiredCertifications,
        Field::Keywords,
        Field::TechDomains,
        Field::SupportType,
    ];

    /// The semantic group this field belongs to
    pub fn group(&self) -> FieldGroup {
        match self {
            Field::ApplicationStart
            | Field::Deadline
            | Field::Organization
            | Field::Contact
            | Field::ApplicationMethod => FieldGroup::A,
            Field::BudgetAmount
            | Field::MaxSupportAmount
            | Field::ProjectDurationMonths
            | Field::GovernmentSharePercent => FieldGroup::B,
            Field::TargetType
            | Field::BusinessAgeMaxYears
            | Field::Region
            | Field::RevenueLimit
            | Field::RequiredCertifications => FieldGroup::C,
            Field::Keywords | Field::TechDomains | Field::SupportType => FieldGroup::D,
        }
    }

    /// Value shape of this field
    pub fn kind(&self) -> ValueKind {
        match self {
            Field::ApplicationStart | Field::Deadline => ValueKind::Date,
            Field::Organization | Field::Contact | Field::ApplicationMethod | Field::Region => {
                ValueKind::Text
            }
            Field::BudgetAmount | Field::MaxSupportAmount | Field::RevenueLimit => ValueKind::Amount,
            Field::ProjectDurationMonths | Field::BusinessAgeMaxYears => ValueKind::Integer,
            Field::GovernmentSharePercent => ValueKind::Percent,
            Field::TargetType
            | Field::RequiredCertifications
            | Field::Keywords
            | Field::TechDomains
            | Field::SupportType => ValueKind::List,
        }
    }

    /// Stable snake_case key used in prompts, JSON and storage
    pub fn key(&self) -> &'static str {
        match self {
            Field::ApplicationStart => "application_start",
            Field::Deadline => "deadline",
            Field::Organization => "organization",
            Field::Contact => "contact",
            Field::ApplicationMethod => "application_method",
            Field::BudgetAmount => "budget_amount",
            Field::MaxSupportAmount => "max_support_amount",
            Field::ProjectDurationMonths => "project_duration_months",
            Field::GovernmentSharePercent => "government_share_percent",
            Field::TargetType => "target_type",
            Field::BusinessAgeMaxYears => "business_age_max_years",
            Field::Region => "region",
            Field::RevenueLimit => "revenue_limit",
            Field::RequiredCertifications => "required_certifications",
            Field::Keywords => "keywords",
            Field::TechDomains => "tech_domains",
            Field::SupportType => "support_type",
        }
    }

    /// Look up a field by its key
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }

    /// Description shown to language models
    pub fn description(&self) -> &'static str {
        match self {
            Field::ApplicationStart => "접수 시작일 (application opening date)",
            Field::Deadline => "접수 마감일 (application deadline)",
            Field::Organization => "주관/전담 기관명 (organizing agency)",
            Field::Contact => "문의처 전화번호 (contact phone number)",
            Field::ApplicationMethod => "신청 방법, 예: 온라인 접수, 이메일 (how to apply)",
            Field::BudgetAmount => "총 사업 예산 (total program budget)",
            Field::MaxSupportAmount => "기업 또는 과제당 최대 지원금 (max support per company)",
            Field::ProjectDurationMonths => "사업/협약 기간, 개월 수 (project duration in months)",
            Field::GovernmentSharePercent => "총 사업비 중 정부지원금 비율 (government share of cost)",
            Field::TargetType => "지원 대상 유형, 예: 중소기업, 예비창업자 (eligible applicant types)",
            Field::BusinessAgeMaxYears => "업력 상한, 창업 N년 이내 (max years since founding)",
            Field::Region => "소재지 제한 지역 (regional restriction)",
            Field::RevenueLimit => "매출액 상한 (revenue ceiling)",
            Field::RequiredCertifications => {
                "요구 또는 우대 인증, 예: 벤처기업, 이노비즈 (required certifications)"
            }
            Field::Keywords => "공고 핵심 키워드 5개 이내 (up to 5 keywords)",
            Field::TechDomains => "기술 분야, 예: AI, 바이오, 반도체 (technical domains)",
            Field::SupportType => "지원 유형, 예: R&D, 사업화, 교육 (support types)",
        }
    }

    /// Fields belonging to a group, in declaration order
    pub fn in_group(group: FieldGroup) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| f.group() == group)
            .collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("Unknown field: {}", s))
    }
}
