use crate::domain::model::{Condition, RelativeRecord, RiskAssessment, ScoringRequest, Sex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body POSTed to the persistence service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub overall_risk_score: i64,
    pub risk_level: String,
    pub high_risk_conditions: Vec<Condition>,
    pub family_members: Vec<RelativeRecord>,
    pub age: i32,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ancestry: Option<String>,
    pub calculated_at: DateTime<Utc>,
}

impl SavePayload {
    pub fn new(
        request: &ScoringRequest,
        assessment: &RiskAssessment,
        calculated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            overall_risk_score: assessment.overall_risk_score,
            risk_level: assessment.overall_risk_level.as_str().to_string(),
            high_risk_conditions: assessment.high_risk_conditions.clone(),
            family_members: request.relatives.clone(),
            age: request.subject.age,
            sex: request.subject.sex,
            ancestry: request.subject.ancestry.clone(),
            calculated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Relation, Subject};
    use crate::domain::scorer::RiskScorer;
    use chrono::TimeZone;

    #[test]
    fn test_payload_shape() {
        let request = ScoringRequest {
            subject: Subject {
                age: 45,
                sex: Sex::Female,
                ancestry: None,
            },
            relatives: vec![RelativeRecord::new(
                Relation::Parent,
                48,
                &[Condition::BreastCancer],
            )],
        };
        let assessment = RiskScorer::default().assess(&request.subject, &request.relatives);
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();

        let value = serde_json::to_value(SavePayload::new(&request, &assessment, at)).unwrap();

        assert_eq!(value["age"], 45);
        assert_eq!(value["sex"], "female");
        assert_eq!(value["riskLevel"], "Low Genetic Risk");
        assert_eq!(value["calculatedAt"], "2026-10-17T09:30:00Z");
        assert_eq!(
            value["highRiskConditions"],
            serde_json::json!(["Cancer (General)", "Breast Cancer"])
        );
        assert_eq!(
            value["familyMembers"][0]["ageAtDiagnosisOrCurrent"],
            48
        );
        assert!(value.get("ancestry").is_none());
    }
}
