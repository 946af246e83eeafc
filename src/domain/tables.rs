use crate::domain::model::{Condition, Kinship, Relation, Sex};
use crate::utils::error::{Result, RiskError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Static reference text for one condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionProfile {
    pub description: String,
    pub prevention_steps: Vec<String>,
    pub screening_steps: Vec<String>,
}

/// `min(age / divisor, cap)` added when sex and condition match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicRule {
    pub sex: Sex,
    pub condition: Condition,
    pub divisor: f64,
    pub cap: f64,
    pub factor: String,
}

/// Fixed bonus for an exact (case-sensitive) ancestry match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestryRule {
    pub ancestry: String,
    pub condition: Condition,
    pub bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileEntry {
    name: Condition,
    #[serde(flatten)]
    profile: ConditionProfile,
}

/// On-disk shape of a tables override file. A present section replaces the
/// built-in one entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TablesFile {
    #[serde(default)]
    conditions: Option<Vec<ProfileEntry>>,
    #[serde(default)]
    demographic: Option<Vec<DemographicRule>>,
    #[serde(default)]
    ancestry: Option<Vec<AncestryRule>>,
}

/// Immutable lookup tables shared by every scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringTables {
    profiles: BTreeMap<Condition, ConditionProfile>,
    demographic: Vec<DemographicRule>,
    ancestry: Vec<AncestryRule>,
    kinship: HashMap<Relation, Kinship>,
    fallback: ConditionProfile,
}

impl ScoringTables {
    /// 內建表格，一次建立後以 Arc 共用
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
            demographic: builtin_demographic_rules(),
            ancestry: builtin_ancestry_rules(),
            kinship: builtin_kinship(),
            fallback: fallback_profile(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::builtin())
    }

    /// 從 TOML 檔案載入覆寫表格
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Unknown condition names fail here, never at scoring time.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TablesFile = toml::from_str(content)?;
        let mut tables = Self::builtin();

        if let Some(entries) = file.conditions {
            tables.profiles = entries
                .into_iter()
                .map(|entry| (entry.name, entry.profile))
                .collect();
        }
        if let Some(rules) = file.demographic {
            tables.demographic = rules;
        }
        if let Some(rules) = file.ancestry {
            tables.ancestry = rules;
        }

        tables.validate()?;
        tracing::debug!(
            "Loaded scoring tables: {} profiles, {} demographic rules, {} ancestry rules",
            tables.profiles.len(),
            tables.demographic.len(),
            tables.ancestry.len()
        );
        Ok(tables)
    }

    /// Falls back to the generic profile for conditions without an entry.
    pub fn profile(&self, condition: Condition) -> &ConditionProfile {
        self.profiles.get(&condition).unwrap_or(&self.fallback)
    }

    pub fn has_profile(&self, condition: Condition) -> bool {
        self.profiles.contains_key(&condition)
    }

    pub fn demographic_rules(&self, sex: Sex, condition: Condition) -> impl Iterator<Item = &DemographicRule> {
        self.demographic
            .iter()
            .filter(move |rule| rule.sex == sex && rule.condition == condition)
    }

    pub fn ancestry_rules<'a>(
        &'a self,
        ancestry: &'a str,
        condition: Condition,
    ) -> impl Iterator<Item = &'a AncestryRule> {
        self.ancestry
            .iter()
            .filter(move |rule| rule.ancestry == ancestry && rule.condition == condition)
    }

    pub fn kinship(&self, relation: Relation) -> Kinship {
        self.kinship
            .get(&relation)
            .copied()
            .unwrap_or(Kinship::Distant)
    }
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Validate for ScoringTables {
    fn validate(&self) -> Result<()> {
        for (i, rule) in self.demographic.iter().enumerate() {
            if !(rule.divisor > 0.0) {
                return Err(RiskError::InvalidConfigValueError {
                    field: format!("demographic[{}].divisor", i),
                    value: rule.divisor.to_string(),
                    reason: "Divisor must be positive".to_string(),
                });
            }
            if rule.cap < 0.0 {
                return Err(RiskError::InvalidConfigValueError {
                    field: format!("demographic[{}].cap", i),
                    value: rule.cap.to_string(),
                    reason: "Cap cannot be negative".to_string(),
                });
            }
        }
        for (i, rule) in self.ancestry.iter().enumerate() {
            crate::utils::validation::validate_non_empty_string(
                &format!("ancestry[{}].ancestry", i),
                &rule.ancestry,
            )?;
        }
        Ok(())
    }
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn profile(description: &str, prevention: &[&str], screening: &[&str]) -> ConditionProfile {
    ConditionProfile {
        description: description.to_string(),
        prevention_steps: steps(prevention),
        screening_steps: steps(screening),
    }
}

const BRCA_COUNSELING: &str = "Genetic counseling for BRCA1/BRCA2 testing";
const EARLY_COLONOSCOPY: &str =
    "Colonoscopy starting at age 40, or 10 years before the earliest family diagnosis";

fn builtin_profiles() -> BTreeMap<Condition, ConditionProfile> {
    use Condition::*;

    let mut profiles = BTreeMap::new();
    profiles.insert(
        HeartDisease,
        profile(
            "Coronary artery disease, heart attack and related cardiovascular conditions",
            &[
                "Follow a heart-healthy diet low in saturated fat and sodium",
                "Get at least 150 minutes of moderate exercise per week",
                "Avoid smoking and limit alcohol",
            ],
            &[
                "Blood pressure check at every visit",
                "Lipid panel every 1-2 years",
                "Discuss a coronary calcium score with your cardiologist",
            ],
        ),
    );
    profiles.insert(
        Diabetes,
        profile(
            "Type 2 diabetes and impaired glucose regulation",
            &[
                "Maintain a healthy body weight",
                "Limit refined carbohydrates and sugary drinks",
                "Stay physically active",
            ],
            &["Fasting glucose or HbA1c test annually"],
        ),
    );
    profiles.insert(
        CancerGeneral,
        profile(
            "Elevated overall cancer susceptibility from a family pattern of cancers",
            &[
                "Avoid tobacco products",
                "Limit alcohol and processed meat",
                "Use sun protection",
            ],
            &[
                "Discuss a hereditary cancer panel with a genetic counselor",
                EARLY_COLONOSCOPY,
            ],
        ),
    );
    profiles.insert(
        BreastCancer,
        profile(
            "Breast cancer, including hereditary BRCA-related forms",
            &[
                "Limit alcohol intake",
                "Maintain a healthy weight after menopause",
                "Breastfeed if possible",
            ],
            &[
                "Annual mammogram starting at age 40 or earlier",
                "Breast MRI in addition to mammography",
                BRCA_COUNSELING,
            ],
        ),
    );
    profiles.insert(
        ColorectalCancer,
        profile(
            "Cancer of the colon or rectum",
            &[
                "Eat a high-fiber diet rich in vegetables",
                "Limit red and processed meat",
                "Stay physically active",
            ],
            &[EARLY_COLONOSCOPY, "Annual fecal immunochemical test (FIT)"],
        ),
    );
    profiles.insert(
        ProstateCancer,
        profile(
            "Prostate cancer",
            &[
                "Eat a diet rich in vegetables and low in saturated fat",
                "Maintain a healthy weight",
            ],
            &["PSA testing starting at age 40-45", "Digital rectal exam as advised"],
        ),
    );
    profiles.insert(
        OvarianCancer,
        profile(
            "Ovarian cancer, including hereditary BRCA-related forms",
            &[
                "Discuss oral contraceptive use with your provider",
                "Consider risk-reducing options after genetic counseling",
            ],
            &[
                BRCA_COUNSELING,
                "Transvaginal ultrasound and CA-125 as advised",
            ],
        ),
    );
    profiles.insert(
        Alzheimers,
        profile(
            "Alzheimer's disease and related dementias",
            &[
                "Stay mentally and socially active",
                "Control blood pressure and cholesterol",
                "Get regular aerobic exercise",
            ],
            &["Annual cognitive assessment after age 65"],
        ),
    );
    profiles.insert(
        Parkinsons,
        profile(
            "Parkinson's disease",
            &[
                "Exercise regularly",
                "Limit exposure to pesticides and solvents",
            ],
            &["Neurological evaluation if tremor or stiffness develops"],
        ),
    );
    profiles.insert(
        Osteoporosis,
        profile(
            "Loss of bone density and increased fracture risk",
            &[
                "Get enough calcium and vitamin D",
                "Do weight-bearing exercise",
                "Avoid smoking",
            ],
            &["Bone density (DEXA) scan"],
        ),
    );
    profiles.insert(
        AutoimmuneDiseases,
        profile(
            "Autoimmune conditions such as lupus, rheumatoid arthritis and thyroid disease",
            &[
                "Manage stress",
                "Keep a symptom journal and report changes early",
            ],
            &["Antinuclear antibody (ANA) test if symptoms develop", "Thyroid function test"],
        ),
    );
    profiles.insert(
        MentalHealthDisorders,
        profile(
            "Depression, anxiety, bipolar disorder and related conditions",
            &[
                "Maintain regular sleep",
                "Build a support network",
                "Limit alcohol and avoid recreational drugs",
            ],
            &["Annual depression and anxiety screening"],
        ),
    );
    profiles
}

fn builtin_demographic_rules() -> Vec<DemographicRule> {
    vec![
        DemographicRule {
            sex: Sex::Female,
            condition: Condition::BreastCancer,
            divisor: 10.0,
            cap: 5.0,
            factor: "Female gender".to_string(),
        },
        DemographicRule {
            sex: Sex::Male,
            condition: Condition::ProstateCancer,
            divisor: 15.0,
            cap: 4.0,
            factor: "Male gender".to_string(),
        },
        DemographicRule {
            sex: Sex::Female,
            condition: Condition::OvarianCancer,
            divisor: 20.0,
            cap: 3.0,
            factor: "Female gender".to_string(),
        },
    ]
}

fn builtin_ancestry_rules() -> Vec<AncestryRule> {
    vec![
        AncestryRule {
            ancestry: "Ashkenazi Jewish".to_string(),
            condition: Condition::BreastCancer,
            bonus: 3.0,
        },
        AncestryRule {
            ancestry: "Ashkenazi Jewish".to_string(),
            condition: Condition::ColorectalCancer,
            bonus: 2.0,
        },
        AncestryRule {
            ancestry: "African American".to_string(),
            condition: Condition::ColorectalCancer,
            bonus: 2.0,
        },
    ]
}

fn builtin_kinship() -> HashMap<Relation, Kinship> {
    use Relation::*;

    let mut kinship = HashMap::new();
    for relation in [Parent, Sibling, Child] {
        kinship.insert(relation, Kinship::FirstDegree);
    }
    for relation in [Grandparent, Aunt, Uncle, Niece, Nephew] {
        kinship.insert(relation, Kinship::SecondDegree);
    }
    kinship.insert(Cousin, Kinship::Distant);
    kinship
}

fn fallback_profile() -> ConditionProfile {
    profile(
        "No condition-specific guidance is available",
        &[
            "Maintain a healthy lifestyle",
            "Keep your family health history up to date",
        ],
        &["Discuss appropriate screening with your healthcare provider"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_cover_vocabulary() {
        let tables = ScoringTables::builtin();
        for condition in Condition::ALL {
            assert!(tables.has_profile(condition), "missing {}", condition);
        }
        assert!(tables.validate().is_ok());
    }

    #[test]
    fn test_kinship_degrees() {
        let tables = ScoringTables::builtin();
        assert_eq!(tables.kinship(Relation::Child), Kinship::FirstDegree);
        assert_eq!(tables.kinship(Relation::Niece), Kinship::SecondDegree);
        assert_eq!(tables.kinship(Relation::Cousin), Kinship::Distant);
    }

    #[test]
    fn test_override_replaces_profiles_and_falls_back() {
        let toml_content = r#"
[[conditions]]
name = "Diabetes"
description = "Custom diabetes"
prevention_steps = ["Walk daily"]
screening_steps = ["HbA1c every 6 months"]
"#;
        let tables = ScoringTables::from_toml_str(toml_content).unwrap();
        assert_eq!(
            tables.profile(Condition::Diabetes).screening_steps,
            vec!["HbA1c every 6 months".to_string()]
        );
        assert!(!tables.has_profile(Condition::HeartDisease));
        assert_eq!(
            tables.profile(Condition::HeartDisease).screening_steps,
            vec!["Discuss appropriate screening with your healthcare provider".to_string()]
        );
        // 未覆寫的區段維持內建值
        assert_eq!(
            tables
                .ancestry_rules("African American", Condition::ColorectalCancer)
                .count(),
            1
        );
    }

    #[test]
    fn test_unknown_condition_rejected_at_load() {
        let toml_content = r#"
[[ancestry]]
ancestry = "Ashkenazi Jewish"
condition = "Gout"
bonus = 1.0
"#;
        assert!(ScoringTables::from_toml_str(toml_content).is_err());
    }

    #[test]
    fn test_non_positive_divisor_rejected() {
        let toml_content = r#"
[[demographic]]
sex = "female"
condition = "Breast Cancer"
divisor = 0.0
cap = 5.0
factor = "Female gender"
"#;
        let err = ScoringTables::from_toml_str(toml_content).unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfigValueError { .. }));
    }
}
