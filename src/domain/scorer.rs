use crate::domain::model::{
    Condition, Kinship, OverallRiskLevel, RelativeRecord, RiskAssessment, RiskLevel, RiskResult,
    Subject,
};
use crate::domain::schedule;
use crate::domain::tables::ScoringTables;
use std::sync::Arc;

const FIRST_DEGREE_WEIGHT: f64 = 4.0;
const SECOND_DEGREE_WEIGHT: f64 = 2.0;
const EARLY_ONSET_WEIGHT: f64 = 2.0;
const EARLY_ONSET_AGE: i32 = 50;
const REPORT_SCALE: f64 = 10.0;

/// Rule-based family-history risk scorer.
///
/// Pure and total: it never fails, performs no I/O and holds only a shared
/// read-only reference to its tables, so a single instance can be used from
/// any number of threads.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    tables: Arc<ScoringTables>,
}

impl RiskScorer {
    pub fn new(tables: Arc<ScoringTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    /// One result per vocabulary condition, in vocabulary order.
    pub fn score(&self, subject: &Subject, relatives: &[RelativeRecord]) -> Vec<RiskResult> {
        Condition::ALL
            .iter()
            .map(|&condition| self.score_condition(condition, subject, relatives))
            .collect()
    }

    /// Scores every condition and derives the summary, schedule and recommendations.
    pub fn assess(&self, subject: &Subject, relatives: &[RelativeRecord]) -> RiskAssessment {
        let results = self.score(subject, relatives);
        let (overall_risk_score, overall_risk_level) = overall_risk(&results);
        let high_risk_conditions = results
            .iter()
            .filter(|r| r.risk_level.is_elevated())
            .map(|r| r.condition)
            .collect();
        let screening_schedule = schedule::screening_schedule(subject, &results);
        let recommendations = schedule::recommendations(&results);

        RiskAssessment {
            results,
            overall_risk_score,
            overall_risk_level,
            high_risk_conditions,
            screening_schedule,
            recommendations,
        }
    }

    fn score_condition(
        &self,
        condition: Condition,
        subject: &Subject,
        relatives: &[RelativeRecord],
    ) -> RiskResult {
        let mut raw = 0.0;
        let mut factors = Vec::new();

        for rule in self.tables.demographic_rules(subject.sex, condition) {
            raw += (f64::from(subject.age) / rule.divisor).min(rule.cap);
            factors.push(rule.factor.clone());
        }

        let matched: Vec<&RelativeRecord> = relatives
            .iter()
            .filter(|relative| has_condition(relative, condition))
            .collect();

        let first_degree = self.count_kinship(&matched, Kinship::FirstDegree);
        if first_degree > 0 {
            raw += first_degree as f64 * FIRST_DEGREE_WEIGHT;
            factors.push(format!(
                "{} first-degree relative(s) with {}",
                first_degree, condition
            ));
        }

        let second_degree = self.count_kinship(&matched, Kinship::SecondDegree);
        if second_degree > 0 {
            raw += second_degree as f64 * SECOND_DEGREE_WEIGHT;
            factors.push(format!(
                "{} second-degree relative(s) with {}",
                second_degree, condition
            ));
        }

        // 與親等加權獨立計算，同一位親屬可同時貢獻兩項
        let early_onset = matched
            .iter()
            .filter(|relative| relative.age_at_diagnosis_or_current < EARLY_ONSET_AGE)
            .count();
        if early_onset > 0 {
            raw += early_onset as f64 * EARLY_ONSET_WEIGHT;
            factors.push(format!(
                "{} relative(s) diagnosed before age {}",
                early_onset, EARLY_ONSET_AGE
            ));
        }

        if let Some(ancestry) = subject.ancestry.as_deref() {
            for rule in self.tables.ancestry_rules(ancestry, condition) {
                raw += rule.bonus;
                factors.push(format!("{} ancestry", ancestry));
            }
        }

        let profile = self.tables.profile(condition);
        RiskResult {
            condition,
            raw_score: raw,
            risk_score: scale(raw),
            risk_level: RiskLevel::from_raw_score(raw),
            contributing_factors: factors,
            prevention_steps: profile.prevention_steps.clone(),
            screening_steps: profile.screening_steps.clone(),
        }
    }

    fn count_kinship(&self, matched: &[&RelativeRecord], kinship: Kinship) -> usize {
        matched
            .iter()
            .filter(|relative| self.tables.kinship(relative.relation) == kinship)
            .count()
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(ScoringTables::shared())
    }
}

fn has_condition(relative: &RelativeRecord, condition: Condition) -> bool {
    if condition == Condition::CancerGeneral {
        relative.conditions.iter().any(|c| c.is_cancer())
    } else {
        relative.conditions.contains(&condition)
    }
}

fn scale(raw: f64) -> i64 {
    (raw * REPORT_SCALE).round() as i64
}

/// Mean of the scaled scores, rounded, and its tier on the 70/40 ladder.
pub fn overall_risk(results: &[RiskResult]) -> (i64, OverallRiskLevel) {
    if results.is_empty() {
        return (0, OverallRiskLevel::Low);
    }
    let total: i64 = results.iter().map(|r| r.risk_score).sum();
    let mean = (total as f64 / results.len() as f64).round();
    (mean as i64, OverallRiskLevel::from_scaled_mean(mean))
}
