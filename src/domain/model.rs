use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::RiskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person being assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub age: i32,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Parent,
    Sibling,
    Child,
    Grandparent,
    Aunt,
    Uncle,
    Niece,
    Nephew,
    Cousin,
}

/// Degree of kinship used by the family-history rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kinship {
    FirstDegree,
    SecondDegree,
    Distant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeRecord {
    pub relation: Relation,
    pub age_at_diagnosis_or_current: i32,
    #[serde(default)]
    pub conditions: BTreeSet<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RelativeRecord {
    pub fn new(relation: Relation, age: i32, conditions: &[Condition]) -> Self {
        Self {
            relation,
            age_at_diagnosis_or_current: age,
            conditions: conditions.iter().copied().collect(),
            notes: None,
        }
    }
}

/// Closed condition vocabulary. Declaration order is the reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Condition {
    HeartDisease,
    Diabetes,
    CancerGeneral,
    BreastCancer,
    ColorectalCancer,
    ProstateCancer,
    OvarianCancer,
    Alzheimers,
    Parkinsons,
    Osteoporosis,
    AutoimmuneDiseases,
    MentalHealthDisorders,
}

impl Condition {
    pub const ALL: [Condition; 12] = [
        Condition::HeartDisease,
        Condition::Diabetes,
        Condition::CancerGeneral,
        Condition::BreastCancer,
        Condition::ColorectalCancer,
        Condition::ProstateCancer,
        Condition::OvarianCancer,
        Condition::Alzheimers,
        Condition::Parkinsons,
        Condition::Osteoporosis,
        Condition::AutoimmuneDiseases,
        Condition::MentalHealthDisorders,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Condition::HeartDisease => "Heart Disease",
            Condition::Diabetes => "Diabetes",
            Condition::CancerGeneral => "Cancer (General)",
            Condition::BreastCancer => "Breast Cancer",
            Condition::ColorectalCancer => "Colorectal Cancer",
            Condition::ProstateCancer => "Prostate Cancer",
            Condition::OvarianCancer => "Ovarian Cancer",
            Condition::Alzheimers => "Alzheimer's",
            Condition::Parkinsons => "Parkinson's",
            Condition::Osteoporosis => "Osteoporosis",
            Condition::AutoimmuneDiseases => "Autoimmune Diseases",
            Condition::MentalHealthDisorders => "Mental Health Disorders",
        }
    }

    pub fn is_cancer(&self) -> bool {
        self.name().contains("Cancer")
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Condition {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Cancer-General" {
            return Ok(Condition::CancerGeneral);
        }
        Condition::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| RiskError::InvalidConfigValueError {
                field: "condition".to_string(),
                value: s.to_string(),
                reason: "Not in the condition vocabulary".to_string(),
            })
    }
}

impl TryFrom<String> for Condition {
    type Error = RiskError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.name().to_string()
    }
}

/// Per-condition tier. Ordering follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Classifies the unscaled accumulator. Ties go to the higher tier.
    pub fn from_raw_score(raw: f64) -> Self {
        if raw >= 8.0 {
            RiskLevel::VeryHigh
        } else if raw >= 5.0 {
            RiskLevel::High
        } else if raw >= 2.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn is_elevated(&self) -> bool {
        *self >= RiskLevel::High
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }
}

/// Tier of the averaged, scaled score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallRiskLevel {
    #[serde(rename = "Low Genetic Risk")]
    Low,
    #[serde(rename = "Moderate Genetic Risk")]
    Moderate,
    #[serde(rename = "High Genetic Risk")]
    High,
}

impl OverallRiskLevel {
    pub fn from_scaled_mean(mean: f64) -> Self {
        if mean >= 70.0 {
            OverallRiskLevel::High
        } else if mean >= 40.0 {
            OverallRiskLevel::Moderate
        } else {
            OverallRiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallRiskLevel::Low => "Low Genetic Risk",
            OverallRiskLevel::Moderate => "Moderate Genetic Risk",
            OverallRiskLevel::High => "High Genetic Risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    pub condition: Condition,
    /// Unscaled accumulator, used for classification.
    pub raw_score: f64,
    /// `round(raw_score * 10)`.
    pub risk_score: i64,
    pub risk_level: RiskLevel,
    pub contributing_factors: Vec<String>,
    pub prevention_steps: Vec<String>,
    pub screening_steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub results: Vec<RiskResult>,
    pub overall_risk_score: i64,
    pub overall_risk_level: OverallRiskLevel,
    pub high_risk_conditions: Vec<Condition>,
    pub screening_schedule: Vec<String>,
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    pub fn result_for(&self, condition: Condition) -> Option<&RiskResult> {
        self.results.iter().find(|r| r.condition == condition)
    }
}

/// Input of one scoring run, as read from a file or an API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub subject: Subject,
    #[serde(default)]
    pub relatives: Vec<RelativeRecord>,
}

/// Output of the transform phase, consumed by load.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub request: ScoringRequest,
    pub assessment: RiskAssessment,
    pub csv_output: String,
    pub json_output: String,
}
