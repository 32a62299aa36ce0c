//! Skip-calculation engine.
//!
//! Pure transformation of scraped rows into a decision-ready report:
//! no I/O, no error conditions. Empty or zero-total input degrades to
//! zeros instead of failing.

mod types;

pub use types::*;

use crate::portal::{ClassType, SubjectRecord};

/// Mandated attendance ratios. Passed explicitly so tests can substitute
/// alternate policy values; production callers use [`Thresholds::default`].
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Per-subject decision ratio
    pub per_subject: f64,
    /// Overall aggregate decision ratio
    pub overall: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            per_subject: 0.70,
            overall: 0.75,
        }
    }
}

impl Thresholds {
    fn labels(&self) -> ThresholdLabels {
        ThresholdLabels {
            per_subject: format!("{}%", self.per_subject * 100.0),
            overall: format!("{}%", self.overall * 100.0),
        }
    }
}

/// How many more classes can be missed while keeping the attendance
/// ratio at or above `threshold`.
///
/// `floor((present - threshold * total) / (1 - threshold))`.
///
/// A non-negative result is the number of further absences still
/// tolerable. A negative result is the number of consecutive presences
/// required before the ratio reaches the threshold (each one grows both
/// `present` and `total` by 1). `total == 0` means no data and returns 0.
pub fn calculate_skippable(present: u32, total: u32, threshold: f64) -> i64 {
    if total == 0 {
        return 0;
    }

    let skippable = (f64::from(present) - threshold * f64::from(total)) / (1.0 - threshold);
    skippable.floor() as i64
}

/// Classifies a percentage into one of the four severity tiers.
pub fn severity(percentage: f64) -> Severity {
    if percentage >= 85.0 {
        Severity::Safe
    } else if percentage >= 75.0 {
        Severity::Caution
    } else if percentage >= 70.0 {
        Severity::Warning
    } else {
        Severity::Critical
    }
}

/// Builds the full report from scraped rows.
///
/// The overall aggregate sums lectures and labs together, even though the
/// portal's own gross figure covers lectures only - a deliberate product
/// choice, not a bug.
pub fn process_attendance(
    records: &[SubjectRecord],
    semester: &str,
    thresholds: &Thresholds,
) -> AttendanceReport {
    let subjects = records
        .iter()
        .map(|record| {
            let pct = percentage(record.present, record.total);
            EnrichedSubject {
                record: record.clone(),
                percentage_num: round2(pct),
                skippable: calculate_skippable(record.present, record.total, thresholds.per_subject),
                // Severity from the unrounded percentage
                severity: severity(pct),
            }
        })
        .collect();

    let (present, total) = sum_counts(records.iter());
    let overall_pct = round2(percentage(present, total));

    let overall = OverallTotals {
        present,
        total,
        percentage: overall_pct,
        skippable: calculate_skippable(present, total, thresholds.overall),
        severity: severity(overall_pct),
    };

    AttendanceReport {
        subjects,
        overall,
        lecture_gross: group_totals(records, &ClassType::Lecture),
        lab_gross: group_totals(records, &ClassType::Lab),
        semester: semester.to_string(),
        thresholds: thresholds.labels(),
    }
}

fn percentage(present: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        (f64::from(present) / f64::from(total)) * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sum_counts<'a>(records: impl Iterator<Item = &'a SubjectRecord>) -> (u32, u32) {
    records.fold((0, 0), |(p, t), r| (p + r.present, t + r.total))
}

fn group_totals(records: &[SubjectRecord], class_type: &ClassType) -> GroupTotals {
    let (present, total) = sum_counts(records.iter().filter(|r| &r.class_type == class_type));
    GroupTotals {
        present,
        total,
        percentage: round2(percentage(present, total)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, class_type: ClassType, present: u32, total: u32) -> SubjectRecord {
        SubjectRecord {
            course_code: code.to_string(),
            course_name: String::new(),
            class_type,
            present,
            total,
            percentage: String::new(),
        }
    }

    #[test]
    fn skippable_reference_values() {
        assert_eq!(calculate_skippable(33, 37, 0.7), 23);
        assert_eq!(calculate_skippable(27, 39, 0.7), -1);
        assert_eq!(calculate_skippable(40, 54, 0.7), 7);
        assert_eq!(calculate_skippable(8, 11, 0.7), 1);
        assert_eq!(calculate_skippable(234, 317, 0.75), -15);
        assert_eq!(calculate_skippable(0, 0, 0.7), 0);
    }

    #[test]
    fn zero_total_always_zero() {
        for present in [0, 1, 10, 1000] {
            for threshold in [0.5, 0.7, 0.75, 0.9] {
                assert_eq!(calculate_skippable(present, 0, threshold), 0);
            }
        }
    }

    #[test]
    fn skippable_monotonic_in_present() {
        let total = 40;
        let mut previous = i64::MIN;
        for present in 0..=total {
            let s = calculate_skippable(present, total, 0.7);
            assert!(s >= previous, "not monotonic at present={present}");
            previous = s;
        }
    }

    #[test]
    fn skippable_non_increasing_in_threshold() {
        let mut previous = i64::MAX;
        for threshold in [0.5, 0.6, 0.7, 0.75, 0.8, 0.9] {
            let s = calculate_skippable(30, 40, threshold);
            assert!(s <= previous, "increased at threshold={threshold}");
            previous = s;
        }
    }

    #[test]
    fn severity_tiers() {
        assert_eq!(severity(90.0), Severity::Safe);
        assert_eq!(severity(80.0), Severity::Caution);
        assert_eq!(severity(72.0), Severity::Warning);
        assert_eq!(severity(65.0), Severity::Critical);
    }

    #[test]
    fn severity_boundaries_belong_to_higher_tier() {
        assert_eq!(severity(85.0), Severity::Safe);
        assert_eq!(severity(75.0), Severity::Caution);
        assert_eq!(severity(70.0), Severity::Warning);
        assert_eq!(severity(84.99), Severity::Caution);
        assert_eq!(severity(74.99), Severity::Warning);
        assert_eq!(severity(69.99), Severity::Critical);
        assert_eq!(severity(0.0), Severity::Critical);
    }

    #[test]
    fn empty_rows_yield_zero_report() {
        let report = process_attendance(&[], "", &Thresholds::default());
        assert!(report.subjects.is_empty());
        assert_eq!(report.overall.present, 0);
        assert_eq!(report.overall.total, 0);
        assert_eq!(report.overall.percentage, 0.0);
        assert_eq!(report.overall.skippable, 0);
        assert_eq!(report.overall.severity, Severity::Critical);
    }

    #[test]
    fn reference_scenario() {
        let records = vec![
            record("A", ClassType::Lecture, 33, 37),
            record("B", ClassType::Lab, 12, 16),
            record("C", ClassType::Lecture, 40, 54),
            record("D", ClassType::Lecture, 27, 39),
        ];
        let report = process_attendance(&records, "5", &Thresholds::default());

        assert_eq!(report.overall.present, 112);
        assert_eq!(report.overall.total, 146);
        assert_eq!(report.overall.percentage, 76.71);
        assert_eq!(report.overall.severity, Severity::Caution);

        assert_eq!(report.subjects[0].skippable, 23);
        assert_eq!(report.subjects[0].severity, Severity::Safe);
        assert_eq!(report.subjects[3].skippable, -1);
        assert_eq!(report.subjects[3].severity, Severity::Critical);

        assert_eq!(report.semester, "5");
    }

    #[test]
    fn subtotals_partition_the_overall() {
        let records = vec![
            record("A", ClassType::Lecture, 33, 37),
            record("B", ClassType::Lab, 12, 16),
            record("C", ClassType::Lecture, 40, 54),
            record("D", ClassType::Lab, 7, 10),
        ];
        let report = process_attendance(&records, "", &Thresholds::default());

        assert_eq!(
            report.lecture_gross.present + report.lab_gross.present,
            report.overall.present
        );
        assert_eq!(
            report.lecture_gross.total + report.lab_gross.total,
            report.overall.total
        );
    }

    #[test]
    fn threshold_labels_formatted() {
        let report = process_attendance(&[], "", &Thresholds::default());
        assert_eq!(report.thresholds.per_subject, "70%");
        assert_eq!(report.thresholds.overall, "75%");
    }

    #[test]
    fn alternate_thresholds_are_honored() {
        let thresholds = Thresholds {
            per_subject: 0.5,
            overall: 0.5,
        };
        let records = vec![record("A", ClassType::Lecture, 30, 40)];
        let report = process_attendance(&records, "", &thresholds);
        // (30 - 0.5 * 40) / 0.5 = 20
        assert_eq!(report.subjects[0].skippable, 20);
        assert_eq!(report.thresholds.per_subject, "50%");
    }

    #[test]
    fn serializes_in_dashboard_shape() {
        let records = vec![record("CE341", ClassType::Lecture, 33, 37)];
        let report = process_attendance(&records, "5", &Thresholds::default());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["subjects"][0]["courseCode"], "CE341");
        assert_eq!(json["subjects"][0]["classType"], "LECT");
        assert_eq!(json["subjects"][0]["percentageNum"], 89.19);
        assert_eq!(json["subjects"][0]["severity"]["level"], "safe");
        assert_eq!(json["subjects"][0]["severity"]["color"], "green");
        // (33 - 0.75 * 37) / 0.25 = 21
        assert_eq!(json["overall"]["skippable"], 21);
        assert_eq!(json["thresholds"]["perSubject"], "70%");
    }
}
