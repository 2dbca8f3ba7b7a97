//! The built-in rule table
//!
//! Rules for one field are listed highest priority first. Labeled forms
//! (`접수마감일: ...`) come before bare forms and carry `High`; bare or
//! dictionary forms carry `Medium`. `keywords` has no rules and is left to
//! the model tiers.

use crate::registry::{PatternRegistry, PatternRule};
use gonggo_domain::value::{parse_budget_to_won, parse_date, parse_won};
use gonggo_domain::{Confidence, Field, FieldValue};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::error;

/// `2025-03-15`, `2025.3.15`, `2025/03/15`, `2025년 3월 15일`
const DATE: &str = r"\d{4}\s*[.\-/년]\s*\d{1,2}\s*[.\-/월]\s*\d{1,2}";
const DATE_NAMED: &str = r"(?P<y>\d{4})\s*[.\-/년]\s*(?P<m>\d{1,2})\s*[.\-/월]\s*(?P<d>\d{1,2})";

const SEP: &str = r"\s*[:：]?\s*";
const START_LABEL: &str = r"(?:접수|신청|모집)\s*시작(?:일시|일)?";
const DEADLINE_LABEL: &str = r"(?:접수|신청|제출|모집)\s*(?:마감(?:일시|일)?|기한|종료일)";
const PERIOD_LABEL: &str = r"(?:접수|신청|모집|공고)\s*기간";
const RANGE_SEP: &str = r"[^~∼\n]{0,30}(?:[~∼]|부터)";

const NUMBER: &str = r"(?P<n>\d[\d,]*(?:\.\d+)?)";
const UNIT: &str = r"(?P<u>억|천만|백만|만)?";
/// `1억 5천만원`, `10억5,000만원`
const COMPOUND_AMOUNT: &str = r"(?P<n>\d[\d,]*)\s*억\s*(?P<n2>\d[\d,]*)\s*(?P<u2>천만|백만|만)\s*원";
const APPLY_WORD: &str = r"(?:접수|신청|제출|마감|모집)";
const BUDGET_LABEL: &str = r"(?:총\s*사업비|(?:총\s*)?(?:사업\s*)?예산|(?:총\s*)?지원\s*규모|총\s*지원금)";
const DURATION_LABEL: &str = r"(?:사업|협약|수행|지원|개발|과제)\s*기간";

const REGION_ALT: &str = "서울|부산|대구|인천|광주|대전|울산|세종|경기|강원|\
    충청북도|충청남도|전라북도|전라남도|경상북도|경상남도|충북|충남|전북|전남|경북|경남|제주";

type TagTable = &'static [(&'static str, &'static [&'static str])];

const REGIONS: TagTable = &[
    ("서울", &["서울"]),
    ("부산", &["부산"]),
    ("대구", &["대구"]),
    ("인천", &["인천"]),
    ("광주", &["광주"]),
    ("대전", &["대전"]),
    ("울산", &["울산"]),
    ("세종", &["세종"]),
    ("경기", &["경기"]),
    ("강원", &["강원"]),
    ("충북", &["충북", "충청북도"]),
    ("충남", &["충남", "충청남도"]),
    ("전북", &["전북", "전라북도"]),
    ("전남", &["전남", "전라남도"]),
    ("경북", &["경북", "경상북도"]),
    ("경남", &["경남", "경상남도"]),
    ("제주", &["제주"]),
];

const TARGET_TYPES: TagTable = &[
    ("예비창업자", &["예비창업자", "예비 창업자"]),
    ("스타트업", &["스타트업", "창업기업", "초기창업"]),
    ("중소기업", &["중소기업"]),
    ("중견기업", &["중견기업"]),
    ("소상공인", &["소상공인"]),
    ("사회적기업", &["사회적기업"]),
    ("대학", &["대학교", "대학"]),
    ("연구기관", &["연구기관", "출연연"]),
];

const CERTIFICATIONS: TagTable = &[
    ("벤처기업", &["벤처기업 확인", "벤처기업확인", "벤처기업 인증", "벤처인증"]),
    ("이노비즈", &["이노비즈", "INNO-BIZ", "Inno-Biz", "기술혁신형 중소기업"]),
    ("메인비즈", &["메인비즈", "MAIN-BIZ", "Main-Biz", "경영혁신형 중소기업"]),
    ("기업부설연구소", &["기업부설연구소", "연구개발전담부서"]),
    ("여성기업", &["여성기업 확인", "여성기업확인"]),
    ("ISO", &["ISO 9001", "ISO9001", "ISO 14001", "ISO14001"]),
];

const TECH_DOMAINS: TagTable = &[
    ("AI", &["인공지능", "AI", "머신러닝", "딥러닝"]),
    ("빅데이터", &["빅데이터", "데이터 분석"]),
    ("클라우드", &["클라우드"]),
    ("사물인터넷", &["사물인터넷", "IoT"]),
    ("블록체인", &["블록체인"]),
    ("메타버스", &["메타버스", "가상현실", "증강현실", "XR"]),
    ("반도체", &["반도체"]),
    ("이차전지", &["이차전지", "2차전지", "배터리"]),
    ("바이오", &["바이오", "헬스케어", "의료기기", "제약"]),
    ("모빌리티", &["모빌리티", "자율주행", "전기차", "미래차"]),
    ("로봇", &["로봇"]),
    ("드론", &["드론", "UAM"]),
    ("에너지", &["신재생에너지", "수소", "탄소중립", "태양광"]),
    ("소재부품", &["소재·부품", "소재부품", "소부장"]),
    ("보안", &["정보보호", "사이버보안", "보안"]),
    ("콘텐츠", &["콘텐츠", "게임"]),
    ("핀테크", &["핀테크"]),
    ("농식품", &["스마트팜", "푸드테크", "농식품"]),
];

const SUPPORT_TYPES: TagTable = &[
    ("R&D", &["R&D", "연구개발", "기술개발"]),
    ("사업화", &["사업화"]),
    ("시제품", &["시제품"]),
    ("교육", &["교육", "아카데미"]),
    ("멘토링", &["멘토링", "코칭"]),
    ("컨설팅", &["컨설팅"]),
    ("마케팅", &["마케팅", "판로", "홍보"]),
    ("해외진출", &["해외진출", "수출", "글로벌 진출"]),
    ("투자", &["투자유치", "투자 연계"]),
    ("융자", &["융자", "대출", "보증"]),
    ("공간", &["입주", "사무공간", "보육공간"]),
];

/// Compile the built-in table
///
/// A rule that fails to compile is logged and left out; the remaining rules
/// still load.
pub(crate) fn standard_registry() -> PatternRegistry {
    let mut registry = PatternRegistry::new();
    for rule in standard_rules() {
        match rule {
            Ok(rule) => registry.register(rule),
            Err(e) => error!("Skipping pattern rule that failed to compile: {}", e),
        }
    }
    registry
}

fn standard_rules() -> Vec<Result<PatternRule, regex::Error>> {
    use Confidence::{High, Medium};

    let amount = format!(r"{NUMBER}\s*{UNIT}\s*원");
    let compound = COMPOUND_AMOUNT;

    vec![
        // Group A
        PatternRule::new(
            "application_start.labeled",
            Field::ApplicationStart,
            High,
            &[format!("{START_LABEL}{SEP}{DATE_NAMED}").as_str()],
            named_date,
        ),
        PatternRule::new(
            "application_start.period",
            Field::ApplicationStart,
            High,
            &[format!("{PERIOD_LABEL}{SEP}{DATE_NAMED}{RANGE_SEP}").as_str()],
            named_date,
        ),
        PatternRule::new(
            "deadline.labeled",
            Field::Deadline,
            High,
            &[format!("{DEADLINE_LABEL}{SEP}{DATE_NAMED}").as_str()],
            named_date,
        ),
        PatternRule::new(
            "deadline.period",
            Field::Deadline,
            High,
            &[
                format!(r"{PERIOD_LABEL}{SEP}{DATE}{RANGE_SEP}\s*{DATE_NAMED}").as_str(),
                // End date without a year borrows the start year
                format!(
                    r"{PERIOD_LABEL}{SEP}(?P<y>\d{{4}})\s*[.\-/년]\s*\d{{1,2}}\s*[.\-/월]\s*\d{{1,2}}{RANGE_SEP}\s*(?P<m>\d{{1,2}})\s*[.\-/월]\s*(?P<d>\d{{1,2}})"
                ).as_str(),
            ],
            named_date,
        ),
        PatternRule::new(
            "deadline.until",
            Field::Deadline,
            Medium,
            // Only on lines about applying; project periods end in `~ date` too
            &[
                format!(r"{APPLY_WORD}[^\n]{{0,40}}?[~∼]\s*{DATE_NAMED}").as_str(),
                format!(r"{APPLY_WORD}[^\n]{{0,40}}?{DATE_NAMED}[^\n]{{0,20}}?까지").as_str(),
                format!(r"{DATE_NAMED}[^\n]{{0,20}}?까지[^\n]{{0,10}}?{APPLY_WORD}").as_str(),
            ],
            named_date,
        ),
        PatternRule::new(
            "organization.labeled",
            Field::Organization,
            High,
            &[r"(?:주관|전담|시행|수행|운영)\s*기관(?:명)?\s*[:：]\s*(?P<v>[^\n,(]{2,40})"],
            text_value,
        ),
        PatternRule::new(
            "organization.agency_name",
            Field::Organization,
            Medium,
            &[r"(?P<v>[가-힣]{2,20}(?:진흥원|진흥공단|진흥센터|재단|공단|평가원|기술원))"],
            text_value,
        ),
        PatternRule::new(
            "contact.labeled",
            Field::Contact,
            High,
            &[r"(?:문의처?|연락처|담당자?|전화)[^\n\d]{0,20}(?P<v>0\d{1,2}-\d{3,4}-\d{4}|1\d{3}-\d{4})"],
            text_value,
        ),
        PatternRule::new(
            "contact.phone",
            Field::Contact,
            Medium,
            &[r"(?P<v>0\d{1,2}-\d{3,4}-\d{4})", r"(?P<v>1\d{3}-\d{4})"],
            text_value,
        ),
        PatternRule::new(
            "application_method.labeled",
            Field::ApplicationMethod,
            High,
            &[r"(?:신청|접수|제출)\s*방법\s*[:：]\s*(?P<v>[^\n]{2,80})"],
            text_value,
        ),
        PatternRule::new(
            "application_method.channel",
            Field::ApplicationMethod,
            Medium,
            &[
                r"(?P<v>(?:온라인|이메일|전자우편|우편|방문)\s*(?:접수|제출|신청))",
                r"(?P<v>[가-힣A-Za-z]{2,20}\s*(?:홈페이지|시스템)\s*(?:을|를)?\s*(?:통해|통한|에서)?\s*(?:온라인\s*)?(?:접수|신청))",
            ],
            text_value,
        ),
        // Group B
        PatternRule::new(
            "budget_amount.labeled",
            Field::BudgetAmount,
            High,
            &[
                format!(r"{BUDGET_LABEL}{SEP}(?:총\s*)?(?:약\s*)?{compound}").as_str(),
                format!(r"{BUDGET_LABEL}{SEP}(?:총\s*)?(?:약\s*)?{amount}").as_str(),
            ],
            amount_value,
        ),
        PatternRule::new(
            "max_support_amount.per_unit",
            Field::MaxSupportAmount,
            High,
            &[
                format!(r"(?:기업|과제|업체|팀|개사)\s*당\s*(?:최대\s*)?(?:연\s*)?{compound}").as_str(),
                format!(r"(?:기업|과제|업체|팀|개사)\s*당\s*(?:최대\s*)?(?:연\s*)?{amount}").as_str(),
            ],
            amount_value,
        ),
        PatternRule::new(
            "max_support_amount.ceiling",
            Field::MaxSupportAmount,
            Medium,
            &[
                format!(r"(?:지원\s*한도|지원\s*금액){SEP}(?:최대\s*)?{compound}").as_str(),
                format!(r"(?:지원\s*한도|지원\s*금액){SEP}(?:최대\s*)?{amount}").as_str(),
                format!(r"최대\s*{compound}").as_str(),
                format!(r"최대\s*{amount}").as_str(),
            ],
            amount_value,
        ),
        PatternRule::new(
            "project_duration_months.months",
            Field::ProjectDurationMonths,
            High,
            &[
                format!(r"{DURATION_LABEL}{SEP}(?:최대\s*)?(?P<n>\d{{1,3}})\s*개월").as_str(),
                format!(r"{DURATION_LABEL}[^\n]{{0,60}}?\(\s*(?:최대\s*)?(?P<n>\d{{1,3}})\s*개월").as_str(),
            ],
            duration_months,
        ),
        PatternRule::new(
            "project_duration_months.years",
            Field::ProjectDurationMonths,
            Medium,
            &[format!(r"{DURATION_LABEL}{SEP}(?:최대\s*)?(?P<y>\d{{1,2}})\s*년").as_str()],
            duration_months,
        ),
        PatternRule::new(
            "government_share_percent.labeled",
            Field::GovernmentSharePercent,
            High,
            &[r"정부\s*(?:지원금|출연금|지원\s*비율|지원)[^\n%]{0,30}?(?P<p>\d{1,3}(?:\.\d+)?)\s*%"],
            percent_value,
        ),
        PatternRule::new(
            "government_share_percent.cost_share",
            Field::GovernmentSharePercent,
            Medium,
            &[r"사업비의\s*(?P<p>\d{1,3}(?:\.\d+)?)\s*%\s*(?:이내|이하|까지)"],
            percent_value,
        ),
        // Group C
        PatternRule::new(
            "target_type.labeled",
            Field::TargetType,
            High,
            &[r"(?s)(?:지원\s*대상|신청\s*자격|참여\s*대상|신청\s*대상)\s*[:：]?(?P<v>.{0,200})"],
            target_types,
        ),
        PatternRule::new(
            "target_type.dictionary",
            Field::TargetType,
            Medium,
            &[r"(?s)(?P<v>.+)"],
            target_types,
        ),
        PatternRule::new(
            "business_age_max_years.labeled",
            Field::BusinessAgeMaxYears,
            High,
            &[r"(?:업력|창업)\s*(?:후\s*)?(?P<n>\d{1,2})\s*년\s*(?:이내|미만|이하)"],
            business_age,
        ),
        PatternRule::new(
            "business_age_max_years.founded",
            Field::BusinessAgeMaxYears,
            Medium,
            &[r"설립\s*(?:후\s*)?(?P<n>\d{1,2})\s*년\s*(?:이내|미만|이하)"],
            business_age,
        ),
        PatternRule::new(
            "region.labeled",
            Field::Region,
            High,
            &[format!(
                r"(?:소재지|지역\s*제한|주된\s*사무소|본사|사업장)[^\n]{{0,30}}?(?P<v>{REGION_ALT})"
            ).as_str()],
            region_value,
        ),
        PatternRule::new(
            "region.located",
            Field::Region,
            Medium,
            &[format!(
                r"(?P<v>{REGION_ALT})(?:특별시|광역시|특별자치시|특별자치도|도)?\s*(?:내\s*)?(?:에\s*)?소재"
            ).as_str()],
            region_value,
        ),
        PatternRule::new(
            "revenue_limit.labeled",
            Field::RevenueLimit,
            High,
            &[
                format!(r"매출(?:액)?\s*(?:이\s*)?{compound}\s*(?:이하|미만|이내)").as_str(),
                format!(r"매출(?:액)?\s*(?:이\s*)?{amount}\s*(?:이하|미만|이내)").as_str(),
            ],
            amount_value,
        ),
        PatternRule::new(
            "required_certifications.dictionary",
            Field::RequiredCertifications,
            Medium,
            &[r"(?s)(?P<v>.+)"],
            certifications,
        ),
        // Group D
        PatternRule::new(
            "tech_domains.labeled",
            Field::TechDomains,
            High,
            &[r"(?s)(?:기술\s*분야|지원\s*분야|대상\s*분야|중점\s*분야)\s*[:：]?(?P<v>.{0,150})"],
            tech_domains,
        ),
        PatternRule::new(
            "tech_domains.dictionary",
            Field::TechDomains,
            Medium,
            &[r"(?s)(?P<v>.+)"],
            tech_domains,
        ),
        PatternRule::new(
            "support_type.labeled",
            Field::SupportType,
            High,
            &[r"(?s)(?:지원\s*내용|지원\s*유형|지원\s*분야)\s*[:：]?(?P<v>.{0,200})"],
            support_types,
        ),
        PatternRule::new(
            "support_type.dictionary",
            Field::SupportType,
            Medium,
            &[r"(?s)(?P<v>.+)"],
            support_types,
        ),
    ]
}

fn named_date(caps: &Captures<'_>) -> Option<FieldValue> {
    let year = caps.name("y")?.as_str();
    let month = caps.name("m")?.as_str();
    let day = caps.name("d")?.as_str();
    parse_date(year, month, day).map(FieldValue::Date)
}

fn amount_value(caps: &Captures<'_>) -> Option<FieldValue> {
    let number = caps.name("n")?.as_str();
    let won = match (caps.name("n2"), caps.name("u2")) {
        (Some(rest), Some(rest_unit)) => parse_budget_to_won(number, "억")?
            .checked_add(parse_budget_to_won(rest.as_str(), rest_unit.as_str())?)?,
        _ => match caps.name("u") {
            Some(unit) => parse_budget_to_won(number, unit.as_str())?,
            None => parse_won(number)?,
        },
    };
    Some(FieldValue::Amount(won))
}

fn duration_months(caps: &Captures<'_>) -> Option<FieldValue> {
    let months: i64 = match caps.name("n") {
        Some(n) => n.as_str().parse().ok()?,
        None => caps.name("y")?.as_str().parse::<i64>().ok()? * 12,
    };
    (1..=120).contains(&months).then_some(FieldValue::Integer(months))
}

fn percent_value(caps: &Captures<'_>) -> Option<FieldValue> {
    let percent: f64 = caps.name("p")?.as_str().parse().ok()?;
    (percent > 0.0 && percent <= 100.0).then_some(FieldValue::Percent(percent))
}

fn business_age(caps: &Captures<'_>) -> Option<FieldValue> {
    let years: i64 = caps.name("n")?.as_str().parse().ok()?;
    (1..=50).contains(&years).then_some(FieldValue::Integer(years))
}

fn text_value(caps: &Captures<'_>) -> Option<FieldValue> {
    let text = caps
        .name("v")?
        .as_str()
        .trim()
        .trim_end_matches(['.', ',', ';', '·'])
        .trim();
    if text.is_empty() {
        return None;
    }
    Some(FieldValue::Text(text.to_string()))
}

fn region_value(caps: &Captures<'_>) -> Option<FieldValue> {
    let surface = caps.name("v")?.as_str();
    REGIONS
        .iter()
        .find(|(_, words)| words.contains(&surface))
        .map(|(canonical, _)| FieldValue::Text(canonical.to_string()))
}

/// One compiled matcher per canonical tag
type TagMatchers = Vec<(&'static str, Regex)>;

static TARGET_TYPE_TAGS: LazyLock<TagMatchers> = LazyLock::new(|| compile_tags(TARGET_TYPES));
static CERTIFICATION_TAGS: LazyLock<TagMatchers> = LazyLock::new(|| compile_tags(CERTIFICATIONS));
static TECH_DOMAIN_TAGS: LazyLock<TagMatchers> = LazyLock::new(|| compile_tags(TECH_DOMAINS));
static SUPPORT_TYPE_TAGS: LazyLock<TagMatchers> = LazyLock::new(|| compile_tags(SUPPORT_TYPES));

/// Latin surfaces such as `AI` must stand alone: not inside `MAIN-BIZ` or
/// `EMAIL`. Hangul neighbours are allowed, so `AI기반` still matches.
fn compile_tags(table: TagTable) -> TagMatchers {
    table
        .iter()
        .filter_map(|(tag, words)| {
            let alternatives: Vec<String> = words
                .iter()
                .map(|w| {
                    if w.is_ascii() {
                        format!(r"(?:^|[^A-Za-z0-9]){}(?:[^A-Za-z0-9]|$)", regex::escape(w))
                    } else {
                        regex::escape(w)
                    }
                })
                .collect();
            match Regex::new(&alternatives.join("|")) {
                Ok(re) => Some((*tag, re)),
                Err(e) => {
                    error!("Skipping dictionary tag {}: {}", tag, e);
                    None
                }
            }
        })
        .collect()
}

fn target_types(caps: &Captures<'_>) -> Option<FieldValue> {
    dictionary_tags(caps, &TARGET_TYPE_TAGS)
}

fn certifications(caps: &Captures<'_>) -> Option<FieldValue> {
    dictionary_tags(caps, &CERTIFICATION_TAGS)
}

fn tech_domains(caps: &Captures<'_>) -> Option<FieldValue> {
    dictionary_tags(caps, &TECH_DOMAIN_TAGS)
}

fn support_types(caps: &Captures<'_>) -> Option<FieldValue> {
    dictionary_tags(caps, &SUPPORT_TYPE_TAGS)
}

/// Canonical tags whose surface words occur in the `v` capture, in table order
fn dictionary_tags(caps: &Captures<'_>, matchers: &[(&'static str, Regex)]) -> Option<FieldValue> {
    let scope = caps.name("v")?.as_str();
    let tags: Vec<String> = matchers
        .iter()
        .filter(|(_, re)| re.is_match(scope))
        .map(|(tag, _)| tag.to_string())
        .collect();
    (!tags.is_empty()).then_some(FieldValue::List(tags))
}
