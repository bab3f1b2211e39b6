use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the search result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: String,
    pub registration_code: String,
    pub state: String,
    pub drug: String,
    pub indication: String,
    pub title: String,
}

/// A fully parsed detail page. Field order is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialDetail {
    pub id: String,
    pub registration_code: String,
    pub first_publicity_date: Option<NaiveDate>,
    pub condition: String,
    pub brief_title: String,
    pub official_title: String,
    pub org_study_id: String,
    pub drug_name: String,
    pub drug_type: String,
    pub sponsors: BTreeSet<String>,
    pub purpose: String,
    pub phase: String,
    pub study_design_info: StudyDesign,
    pub eligibility: Eligibility,
    pub enrollment: Enrollment,
    pub has_data_safety_board: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub anticipated_completion_date: Option<NaiveDate>,
    pub researchers: Researchers,
    pub overall_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyDesign {
    pub classification: String,
    pub intervention_model: String,
    pub allocation: String,
    pub masking: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eligibility {
    pub minimum_age: Option<u32>,
    pub maximum_age: Option<u32>,
    pub gender: String,
    pub healthy_volunteers: String,
    pub inclusion: Vec<String>,
    pub exclusion: Vec<String>,
}

/// Head counts exactly as displayed ("60 ; 国内: 60 ;" etc.).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    pub anticipated: String,
    pub actual: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Researchers {
    pub lead: LeadResearcher,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadResearcher {
    pub name: String,
    pub agency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub agency: Option<String>,
    pub researcher: Option<String>,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Address {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}
