use crate::domain::model::{RiskLevel, RiskResult, Sex, Subject};
use std::collections::HashSet;

struct ScheduleEntry {
    text: &'static str,
    min_age: i32,
    max_age: Option<i32>,
    sex: Option<Sex>,
}

const BASELINE_SCHEDULE: &[ScheduleEntry] = &[
    ScheduleEntry {
        text: "Annual physical exam with blood pressure check",
        min_age: 18,
        max_age: None,
        sex: None,
    },
    ScheduleEntry {
        text: "Cholesterol panel every 4-6 years",
        min_age: 20,
        max_age: None,
        sex: None,
    },
    ScheduleEntry {
        text: "Cervical cancer screening (Pap smear) every 3 years",
        min_age: 21,
        max_age: Some(65),
        sex: Some(Sex::Female),
    },
    ScheduleEntry {
        text: "Diabetes screening (HbA1c) every 3 years",
        min_age: 35,
        max_age: None,
        sex: None,
    },
    ScheduleEntry {
        text: "Annual mammogram",
        min_age: 40,
        max_age: None,
        sex: Some(Sex::Female),
    },
    ScheduleEntry {
        text: "Colorectal cancer screening starting at age 45",
        min_age: 45,
        max_age: None,
        sex: None,
    },
    ScheduleEntry {
        text: "Discuss PSA testing with your provider",
        min_age: 50,
        max_age: None,
        sex: Some(Sex::Male),
    },
    ScheduleEntry {
        text: "Bone density (DEXA) scan",
        min_age: 65,
        max_age: None,
        sex: Some(Sex::Female),
    },
];

impl ScheduleEntry {
    fn applies_to(&self, subject: &Subject) -> bool {
        subject.age >= self.min_age
            && self.max_age.map_or(true, |max| subject.age <= max)
            && self.sex.map_or(true, |sex| sex == subject.sex)
    }
}

/// Age/sex-gated baseline entries followed by the screening steps of every
/// high or very high condition. First occurrence wins; no duplicates.
pub fn screening_schedule(subject: &Subject, results: &[RiskResult]) -> Vec<String> {
    let baseline = BASELINE_SCHEDULE
        .iter()
        .filter(|entry| entry.applies_to(subject))
        .map(|entry| entry.text.to_string());
    let elevated = results
        .iter()
        .filter(|r| r.risk_level.is_elevated())
        .flat_map(|r| r.screening_steps.iter().cloned());

    dedup_in_order(baseline.chain(elevated))
}

/// Free-text guidance derived from the per-condition tiers.
pub fn recommendations(results: &[RiskResult]) -> Vec<String> {
    let elevated: Vec<&RiskResult> = results
        .iter()
        .filter(|r| r.risk_level.is_elevated())
        .collect();

    if elevated.is_empty() {
        return vec![
            "Keep following age-appropriate screening guidelines".to_string(),
            "Update your family health history as relatives receive new diagnoses".to_string(),
        ];
    }

    let mut lines: Vec<String> = elevated
        .iter()
        .map(|r| {
            let wording = match r.risk_level {
                RiskLevel::VeryHigh => "very high",
                _ => "high",
            };
            format!(
                "Discuss your {} {} risk with your healthcare provider",
                wording, r.condition
            )
        })
        .collect();

    if elevated.iter().any(|r| r.risk_level == RiskLevel::VeryHigh) {
        lines.push("Consider a referral to a genetic counselor".to_string());
    }
    if elevated.iter().any(|r| r.condition.is_cancer()) {
        lines.push("Ask about hereditary cancer genetic testing".to_string());
    }

    dedup_in_order(lines)
}

fn dedup_in_order<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
