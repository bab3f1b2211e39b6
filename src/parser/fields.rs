use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::anchor::Tokens;
use crate::error::ExtractError;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").unwrap());
static AGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S+)岁").unwrap());

pub const AGE_ANCHOR: &str = "年龄";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    RegistrationCode,
    FirstPublicityDate,
    Condition,
    BriefTitle,
    OfficialTitle,
    OrgStudyId,
    DrugName,
    DrugType,
    Purpose,
    Phase,
    InterventionModel,
    Classification,
    Allocation,
    Masking,
    Scope,
    Gender,
    HealthyVolunteers,
    EnrollmentAnticipated,
    EnrollmentActual,
    DataSafetyBoard,
    StartDate,
    AnticipatedCompletionDate,
    LeadName,
    LeadAgency,
}

/// How the anchored token is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Mandatory; a missing anchor fails the document.
    Text,
    /// Soft; unparseable or missing becomes `None`.
    Date,
    /// Soft; `有` / `无` / anything else.
    TriState,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub anchor: &'static str,
    pub offset: usize,
    pub rule: Rule,
}

const fn spec(field: Field, anchor: &'static str, offset: usize, rule: Rule) -> FieldSpec {
    FieldSpec { field, anchor, offset, rule }
}

/// Header block, looked up over the whole document.
pub const HEADER_FIELDS: &[FieldSpec] = &[
    spec(Field::RegistrationCode, "登记号：", 1, Rule::Text),
    spec(Field::FirstPublicityDate, "首次公示信息日期：", 1, Rule::Date),
    spec(Field::Condition, "适应症：", 1, Rule::Text),
    spec(Field::BriefTitle, "试验通俗题目：", 1, Rule::Text),
    spec(Field::OfficialTitle, "试验专业题目：", 1, Rule::Text),
    spec(Field::OrgStudyId, "试验方案编号：", 1, Rule::Text),
    spec(Field::DrugName, "药物名称：", 1, Rule::Text),
    spec(Field::DrugType, "药物类型：", 1, Rule::Text),
];

/// Section three. Several of these labels also appear elsewhere on the page,
/// so they are only valid against the narrowed clinical section.
pub const CLINICAL_FIELDS: &[FieldSpec] = &[
    spec(Field::Purpose, "1、试验目的", 1, Rule::Text),
    spec(Field::Phase, "试验分期：", 1, Rule::Text),
    spec(Field::InterventionModel, "设计类型：", 1, Rule::Text),
    spec(Field::Classification, "试验分类：", 1, Rule::Text),
    spec(Field::Allocation, "随机化：", 1, Rule::Text),
    spec(Field::Masking, "盲法：", 1, Rule::Text),
    spec(Field::Scope, "试验范围：", 1, Rule::Text),
    spec(Field::Gender, "性别", 1, Rule::Text),
    spec(Field::HealthyVolunteers, "健康受试者", 1, Rule::Text),
    spec(Field::EnrollmentAnticipated, "目标入组人数", 1, Rule::Text),
    spec(Field::EnrollmentActual, "实际入组人数", 1, Rule::Text),
    spec(Field::DataSafetyBoard, "6、数据安全监察委员会（DMC）：", 1, Rule::TriState),
];

/// Sections four and five.
pub const SCHEDULE_FIELDS: &[FieldSpec] = &[
    spec(Field::StartDate, "四、第一例受试者入组日期", 1, Rule::Date),
    spec(Field::AnticipatedCompletionDate, "五、试验终止日期", 1, Rule::Date),
];

/// Section six. The name sits two tokens below its header, after a "姓名" label.
pub const RESEARCHER_FIELDS: &[FieldSpec] = &[
    spec(Field::LeadName, "1、主要研究者信息", 2, Rule::Text),
    spec(Field::LeadAgency, "单位名称", 1, Rule::Text),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Date(Option<NaiveDate>),
    Flag(Option<bool>),
}

/// Values read from one catalogue table.
#[derive(Debug, Default)]
pub struct FieldValues<'a> {
    values: HashMap<Field, Value<'a>>,
}

impl<'a> FieldValues<'a> {
    pub fn text(&self, field: Field) -> Result<String, ExtractError> {
        match self.values.get(&field) {
            Some(Value::Text(s)) => Ok(s.to_string()),
            _ => Err(ExtractError::MissingField(field)),
        }
    }

    pub fn date(&self, field: Field) -> Result<Option<NaiveDate>, ExtractError> {
        match self.values.get(&field) {
            Some(Value::Date(d)) => Ok(*d),
            _ => Err(ExtractError::MissingField(field)),
        }
    }

    pub fn flag(&self, field: Field) -> Result<Option<bool>, ExtractError> {
        match self.values.get(&field) {
            Some(Value::Flag(f)) => Ok(*f),
            _ => Err(ExtractError::MissingField(field)),
        }
    }
}

/// Apply every entry of `table`, in order, stopping at the first mandatory miss.
pub fn extract<'a>(tokens: &Tokens<'a>, table: &[FieldSpec]) -> Result<FieldValues<'a>, ExtractError> {
    let mut values = HashMap::with_capacity(table.len());
    for spec in table {
        let value = match spec.rule {
            Rule::Text => Value::Text(tokens.offset(spec.anchor, spec.offset)?),
            Rule::Date => Value::Date(
                tokens
                    .offset(spec.anchor, spec.offset)
                    .ok()
                    .and_then(parse_date),
            ),
            Rule::TriState => Value::Flag(
                tokens
                    .offset(spec.anchor, spec.offset)
                    .ok()
                    .and_then(parse_tri_state),
            ),
        };
        values.insert(spec.field, value);
    }
    Ok(FieldValues { values })
}

/// Leading `YYYY-MM-DD`; trailing remarks are ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(raw)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

pub fn parse_tri_state(raw: &str) -> Option<bool> {
    match raw {
        "有" => Some(true),
        "无" => Some(false),
        _ => None,
    }
}

/// "18岁(最小年龄)" → 18. Non-numeric bounds ("无上限") and values without the
/// unit are `None`.
pub fn parse_age(raw: &str) -> Option<u32> {
    let caps = AGE_RE.captures(raw)?;
    let n = &caps[1];
    if is_numeric(n) {
        n.parse().ok()
    } else {
        None
    }
}

/// Minimum and maximum age, read from the two tokens after `年龄`.
///
/// Each bound is resolved on its own: a malformed maximum leaves the
/// minimum untouched. (The scraper this replaces cleared the minimum when
/// the maximum failed to parse; that was not carried over.)
pub fn age_bounds(tokens: &Tokens<'_>) -> (Option<u32>, Option<u32>) {
    let min = tokens.offset(AGE_ANCHOR, 1).ok().and_then(parse_age);
    let max = tokens.offset(AGE_ANCHOR, 2).ok().and_then(parse_age);
    (min, max)
}

/// Sponsor names between the sponsor header and the first contact label.
/// The token right after the header is the table caption and is skipped.
pub fn sponsors(tokens: &Tokens<'_>) -> Result<BTreeSet<String>, ExtractError> {
    let raw = tokens.between("二、申办者信息", "联系人姓名：", 2)?;
    Ok(dedup_names(raw))
}

pub fn dedup_names(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .map(|s| s.strip_suffix('/').unwrap_or(s))
        .filter(|s| !is_numeric(s))
        .map(str::to_string)
        .collect()
}

/// Inclusion and exclusion criteria, in source order.
pub fn criteria(tokens: &Tokens<'_>) -> Result<(Vec<String>, Vec<String>), ExtractError> {
    let inclusion = ordered_list(tokens.between("入选标准", "排除标准", 1)?);
    let exclusion = ordered_list(tokens.between("排除标准", "目标入组人数", 1)?);
    Ok((inclusion, exclusion))
}

/// Drops row numbers, keeps everything else in order.
pub fn ordered_list(raw: &[String]) -> Vec<String> {
    raw.iter().filter(|s| !is_numeric(s)).cloned().collect()
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
