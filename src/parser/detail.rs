use scraper::Html;

use super::anchor::Tokens;
use super::fields::{self, Field, CLINICAL_FIELDS, HEADER_FIELDS, RESEARCHER_FIELDS, SCHEDULE_FIELDS};
use super::locations::research_locations;
use super::tokens::tokenize;
use crate::error::ExtractError;
use crate::records::{
    Eligibility, Enrollment, LeadResearcher, Researchers, StudyDesign, TrialDetail,
};

const CLINICAL_START: &str = "三、临床试验信息";
const CLINICAL_END: &str = "四、第一例受试者入组日期";
const RESEARCHERS_START: &str = "六、研究者信息";
const RESEARCHERS_END: &str = "七、伦理委员会信息";
const STATUS_START: &str = "八、试验状态";
const STATUS_END: &str = "信息更新记录";

/// Parse one detail page into a [`TrialDetail`].
///
/// Sections are read top to bottom; the first missing mandatory anchor
/// aborts the whole document.
pub fn parse_trial_detail(html: &str, id: &str) -> Result<TrialDetail, ExtractError> {
    let document = Html::parse_document(html);
    assemble(&document, id)
}

pub fn assemble(document: &Html, id: &str) -> Result<TrialDetail, ExtractError> {
    let lines = tokenize(document)?;
    let doc = Tokens::new(&lines);

    let header = fields::extract(&doc, HEADER_FIELDS)?;
    let sponsors = fields::sponsors(&doc)?;

    let clinical_tokens = doc.section(CLINICAL_START, CLINICAL_END)?;
    let clinical = fields::extract(&clinical_tokens, CLINICAL_FIELDS)?;
    let (minimum_age, maximum_age) = fields::age_bounds(&clinical_tokens);
    let (inclusion, exclusion) = fields::criteria(&clinical_tokens)?;

    let schedule = fields::extract(&doc, SCHEDULE_FIELDS)?;

    let researcher_tokens = Tokens::new(doc.between(RESEARCHERS_START, RESEARCHERS_END, 0)?);
    let researchers = fields::extract(&researcher_tokens, RESEARCHER_FIELDS)?;
    let locations = research_locations(document);

    let overall_status = doc.between(STATUS_START, STATUS_END, 1)?.concat();

    Ok(TrialDetail {
        id: id.to_string(),
        registration_code: header.text(Field::RegistrationCode)?,
        first_publicity_date: header.date(Field::FirstPublicityDate)?,
        condition: header.text(Field::Condition)?,
        brief_title: header.text(Field::BriefTitle)?,
        official_title: header.text(Field::OfficialTitle)?,
        org_study_id: header.text(Field::OrgStudyId)?,
        drug_name: header.text(Field::DrugName)?,
        drug_type: header.text(Field::DrugType)?,
        sponsors,
        purpose: clinical.text(Field::Purpose)?,
        phase: clinical.text(Field::Phase)?,
        study_design_info: StudyDesign {
            classification: clinical.text(Field::Classification)?,
            intervention_model: clinical.text(Field::InterventionModel)?,
            allocation: clinical.text(Field::Allocation)?,
            masking: clinical.text(Field::Masking)?,
            scope: clinical.text(Field::Scope)?,
        },
        eligibility: Eligibility {
            minimum_age,
            maximum_age,
            gender: clinical.text(Field::Gender)?,
            healthy_volunteers: clinical.text(Field::HealthyVolunteers)?,
            inclusion,
            exclusion,
        },
        enrollment: Enrollment {
            anticipated: clinical.text(Field::EnrollmentAnticipated)?,
            actual: clinical.text(Field::EnrollmentActual)?,
        },
        has_data_safety_board: clinical.flag(Field::DataSafetyBoard)?,
        start_date: schedule.date(Field::StartDate)?,
        anticipated_completion_date: schedule.date(Field::AnticipatedCompletionDate)?,
        researchers: Researchers {
            lead: LeadResearcher {
                name: researchers.text(Field::LeadName)?,
                agency: researchers.text(Field::LeadAgency)?,
            },
            locations,
        },
        overall_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn full_detail_page() {
        let d = parse_trial_detail(&fixture("detail"), "abc123").unwrap();
        assert_eq!(d.id, "abc123");
        assert_eq!(d.registration_code, "CTR20200001");
        assert_eq!(d.first_publicity_date, NaiveDate::from_ymd_opt(2020, 1, 15));
        assert_eq!(d.condition, "2型糖尿病");
        assert_eq!(d.brief_title, "某药治疗2型糖尿病的有效性研究");
        assert_eq!(d.official_title, "一项多中心、随机、双盲、安慰剂对照的III期临床试验");
        assert_eq!(d.org_study_id, "ABC-301");
        assert_eq!(d.drug_name, "某某片");
        assert_eq!(d.drug_type, "化学药物");

        assert_eq!(d.sponsors.len(), 2);
        assert!(d.sponsors.contains("某某制药有限公司"));
        assert!(d.sponsors.contains("某某医药研究院"));

        assert_eq!(d.purpose, "评价某某片的有效性和安全性");
        assert_eq!(d.phase, "III期");
        assert_eq!(d.study_design_info.classification, "安全性和有效性");
        assert_eq!(d.study_design_info.intervention_model, "平行分组");
        assert_eq!(d.study_design_info.allocation, "随机化");
        assert_eq!(d.study_design_info.masking, "双盲");
        assert_eq!(d.study_design_info.scope, "国内试验");

        assert_eq!(d.eligibility.minimum_age, Some(18));
        assert_eq!(d.eligibility.maximum_age, Some(75));
        assert_eq!(d.eligibility.gender, "男+女");
        assert_eq!(d.eligibility.healthy_volunteers, "无");
        assert_eq!(d.eligibility.inclusion, vec!["确诊为2型糖尿病", "签署知情同意书"]);
        assert_eq!(d.eligibility.exclusion, vec!["1型糖尿病", "妊娠或哺乳期妇女"]);

        assert_eq!(d.enrollment.anticipated, "国内: 300 ;");
        assert_eq!(d.enrollment.actual, "国内: 登记人暂未填写该信息;");
        assert_eq!(d.has_data_safety_board, Some(true));
        assert_eq!(d.start_date, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(d.anticipated_completion_date, None);

        assert_eq!(d.researchers.lead.name, "王某某");
        assert_eq!(d.researchers.lead.agency, "北京协和医院");
        assert_eq!(d.researchers.locations.len(), 2);
        assert_eq!(d.researchers.locations[1].address.city, None);

        assert_eq!(d.overall_status, "进行中（招募中）");
    }

    #[test]
    fn unparseable_publicity_date_is_null() {
        let html = fixture("detail").replace("2020-01-15", "待定");
        let d = parse_trial_detail(&html, "abc123").unwrap();
        assert_eq!(d.first_publicity_date, None);
        assert_eq!(d.registration_code, "CTR20200001");
        assert_eq!(d.start_date, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert_eq!(d.researchers.locations.len(), 2);
    }

    #[test]
    fn missing_publicity_anchor_is_null() {
        let html = fixture("detail").replace("首次公示信息日期：", "公示日期");
        let d = parse_trial_detail(&html, "abc123").unwrap();
        assert_eq!(d.first_publicity_date, None);
        assert_eq!(d.condition, "2型糖尿病");
    }

    #[test]
    fn missing_mandatory_anchor_fails() {
        let html = fixture("detail").replace("试验方案编号：", "方案编号");
        let err = parse_trial_detail(&html, "abc123").unwrap_err();
        assert!(matches!(err, ExtractError::AnchorNotFound(a) if a == "试验方案编号："));
    }

    #[test]
    fn clinical_labels_read_inside_section_only() {
        // "性别" also appears in the contact block above section three
        let d = parse_trial_detail(&fixture("detail"), "abc123").unwrap();
        assert_eq!(d.eligibility.gender, "男+女");
    }

    #[test]
    fn error_page_is_rejected() {
        let err = parse_trial_detail("<html><body>记录不存在</body></html>", "x").unwrap_err();
        assert!(matches!(err, ExtractError::AnchorNotFound(_)));
    }

    #[test]
    fn serializes_in_declared_order() {
        let d = parse_trial_detail(&fixture("detail"), "abc123").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        let id = json.find("\"id\"").unwrap();
        let code = json.find("\"registration_code\"").unwrap();
        let status = json.find("\"overall_status\"").unwrap();
        assert!(id < code && code < status);
        assert!(json.contains("\"first_publicity_date\":\"2020-01-15\""));
        assert!(json.contains("\"anticipated_completion_date\":null"));
    }
}
