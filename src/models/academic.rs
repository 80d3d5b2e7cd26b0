//! Plain records describing professors, universities and applications.
//!
//! These carry data only; harvesting fills the profile side, everything else is
//! entered by hand.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A professor as tracked for applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorProfile {
    pub name: String,
    pub last_name: String,
    pub university: String,
    pub email: String,
    pub research_interests: Vec<String>,
    pub field_of_study: String,
}

/// A university and what applying there involves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityProfile {
    pub name: String,
    pub acronym: String,
    pub rank: u32,
    pub country: String,
    pub region: String,
    pub size: String,
    pub professors: Vec<ProfessorProfile>,
    pub application: Application,
}

/// Requirements of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub deadline: NaiveDate,
    pub description: Vec<String>,
    pub requires_sop: bool,
    pub requires_cv: bool,
    pub language_proficiency: Option<LanguageProficiency>,
}

/// Minimum score on a language test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProficiency {
    pub test: LanguageTest,
    pub minimum_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTest {
    Toefl,
    Ielts,
    Duolingo,
}

impl Application {
    /// Whether the deadline has not yet passed on `today`
    pub fn is_open(&self, today: NaiveDate) -> bool {
        today <= self.deadline
    }
}
