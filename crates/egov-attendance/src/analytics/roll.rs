//! Roll-number parsing for usage analytics.
//!
//! Roll numbers look like `23CE045`: 2-digit admission year, 2-3 letter
//! department code, student number. Year of study is derived from the
//! academic calendar, which starts in July.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Department codes in use at the institute. Breakdowns in the analytics
/// summary are restricted to this list.
pub const KNOWN_DEPARTMENTS: [&str; 18] = [
    "CE", "IT", "CS", "EC", "EE", "ME", "CL", "IC", "BM", "AI", "DS", "CY", "BT", "CV", "MCA",
    "MBA", "PHD", "ARC",
];

static ROLL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})([A-Z]{2,3})(\d+)$").unwrap());

/// A successfully parsed roll number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollNumber {
    /// Trimmed, upper-cased input
    pub raw: String,
    /// Full admission year (e.g. 2023)
    pub admission_year: i32,
    pub department: String,
    pub student_num: String,
    /// Derived year of study, clamped to 1..=6
    pub year_of_study: u32,
}

/// Parses a roll number against today's date. Returns `None` when the
/// input doesn't match the expected shape.
pub fn parse_roll_number(input: &str) -> Option<RollNumber> {
    parse_roll_number_at(input, Local::now().date_naive())
}

fn parse_roll_number_at(input: &str, today: NaiveDate) -> Option<RollNumber> {
    let cleaned = input.trim().to_uppercase();
    let caps = ROLL_RE.captures(&cleaned)?;

    let admission_yy: i32 = caps[1].parse().ok()?;
    let department = caps[2].to_string();
    let student_num = caps[3].to_string();

    // Academic year starts in July: in Feb 2026 the academic year is
    // 2025-26, so its start is 2025.
    let calendar_yy = today.year() % 100;
    let academic_start_yy = if today.month() >= 7 {
        calendar_yy
    } else {
        calendar_yy - 1
    };
    let year_of_study = (academic_start_yy - admission_yy + 1).clamp(1, 6) as u32;

    Some(RollNumber {
        admission_year: 2000 + admission_yy,
        department,
        student_num,
        year_of_study,
        raw: cleaned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_standard_roll_number() {
        let roll = parse_roll_number_at("23CE045", date(2025, 9, 1)).unwrap();
        assert_eq!(roll.raw, "23CE045");
        assert_eq!(roll.admission_year, 2023);
        assert_eq!(roll.department, "CE");
        assert_eq!(roll.student_num, "045");
        // Academic year 2025-26, admitted 2023 -> third year
        assert_eq!(roll.year_of_study, 3);
    }

    #[test]
    fn spring_semester_uses_previous_academic_year() {
        // Feb 2026 is still academic year 2025-26
        let roll = parse_roll_number_at("23CE045", date(2026, 2, 15)).unwrap();
        assert_eq!(roll.year_of_study, 3);
    }

    #[test]
    fn lower_case_and_whitespace_accepted() {
        let roll = parse_roll_number_at("  23ce045 ", date(2025, 9, 1)).unwrap();
        assert_eq!(roll.raw, "23CE045");
    }

    #[test]
    fn three_letter_department() {
        let roll = parse_roll_number_at("24MCA012", date(2025, 9, 1)).unwrap();
        assert_eq!(roll.department, "MCA");
        assert_eq!(roll.year_of_study, 2);
    }

    #[test]
    fn year_of_study_is_clamped() {
        // Admitted long ago -> clamped to 6
        let old = parse_roll_number_at("15CE001", date(2025, 9, 1)).unwrap();
        assert_eq!(old.year_of_study, 6);
        // Roll number "from the future" -> clamped to 1
        let future = parse_roll_number_at("27CE001", date(2025, 9, 1)).unwrap();
        assert_eq!(future.year_of_study, 1);
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "CE045", "23045", "23ce", "23ABCD045", "2-3CE045"] {
            assert!(
                parse_roll_number_at(input, date(2025, 9, 1)).is_none(),
                "accepted {input:?}"
            );
        }
    }
}
