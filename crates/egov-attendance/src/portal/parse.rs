//! HTML extraction for the attendance partial-postback response.
//!
//! The portal answers the attendance postback with an ASP.NET AJAX
//! delta containing the refreshed panels; the tables of interest are
//! `#gvGrossAttPop` (per-subject rows) and `#gvGAttSubjectsPop`
//! (course code -> name lookup), with `#lblHeadAnnouncement` carrying
//! the semester and the portal's own lecture gross.

use super::error::PortalError;
use super::types::{ClassType, RawAttendance, SubjectRecord};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

// Static selectors - compiled once
static GROSS_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#gvGrossAttPop").unwrap());
static COURSE_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#gvGAttSubjectsPop").unwrap());
static HEADER_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#lblHeadAnnouncement").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());

static SEMESTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Semester\s*(\d+)").unwrap());
static GROSS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\s*([\d.]+)\s*%").unwrap());

/// Parses the attendance response into rows plus header metadata.
///
/// Fails with [`PortalError::ResultsNotFound`] when the results table is
/// absent - an expired session and a markup change are indistinguishable
/// at this level.
pub fn parse_attendance_html(html: &str) -> Result<RawAttendance, PortalError> {
    let document = Html::parse_document(html);

    let gross_table = document
        .select(&GROSS_TABLE)
        .next()
        .ok_or_else(|| PortalError::ResultsNotFound {
            message: "gvGrossAttPop missing; the page structure changed or the session expired"
                .to_string(),
        })?;

    let course_table = document.select(&COURSE_TABLE).next();

    let mut data = Vec::new();

    // Skip the header row; a subject row has at least 4 cells
    for row in gross_table.select(&ROW).skip(1) {
        let cells: Vec<ElementRef> = row.select(&CELL).collect();
        if cells.len() < 4 {
            continue;
        }

        let course_code = inner_span_text(&cells[0]);
        let class_type = inner_span_text(&cells[1]);
        let present_total: String = cell_text(&cells[2]).split_whitespace().collect();
        let percentage = cell_text(&cells[3]);

        let course_name = course_table
            .and_then(|table| lookup_course_name(&table, &course_code))
            .unwrap_or_default();

        let mut parts = present_total.split('/');
        let present = parse_count(parts.next());
        let total = parse_count(parts.next());

        data.push(SubjectRecord {
            course_code,
            course_name,
            class_type: ClassType::parse(&class_type),
            present,
            total,
            percentage,
        });
    }

    let header_text = document
        .select(&HEADER_LABEL)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    let semester = SEMESTER_RE
        .captures(&header_text)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    let header_gross = GROSS_RE
        .captures(&header_text)
        .map(|caps| format!("{}%", &caps[1]));

    debug!(
        rows = data.len(),
        semester = %semester,
        header_gross = header_gross.is_some(),
        "parsed attendance fragment"
    );

    let lecture_gross = header_gross
        .unwrap_or_else(|| computed_gross(&data, &ClassType::Lecture));
    let lab_gross = computed_gross(&data, &ClassType::Lab);

    Ok(RawAttendance {
        data,
        lecture_gross,
        lab_gross,
        semester,
    })
}

/// Innermost `<span>` text of a grid cell, as the portal wraps codes and
/// class types in spans.
fn inner_span_text(cell: &ElementRef) -> String {
    cell.select(&SPAN)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_count(part: Option<&str>) -> u32 {
    part.and_then(|s| s.parse::<u32>().ok()).unwrap_or(0)
}

/// Finds the course name in the lookup table: the cell immediately
/// following the one whose text equals the course code, within the same
/// row.
fn lookup_course_name(table: &ElementRef, course_code: &str) -> Option<String> {
    for row in table.select(&ROW) {
        let cells: Vec<ElementRef> = row.select(&CELL).collect();
        for (i, cell) in cells.iter().enumerate() {
            if cell_text(cell) == course_code {
                return cells.get(i + 1).map(cell_text);
            }
        }
    }
    None
}

/// Gross percentage over rows of one class type, to 2 decimals.
fn computed_gross(data: &[SubjectRecord], class_type: &ClassType) -> String {
    let (present, total) = data
        .iter()
        .filter(|r| &r.class_type == class_type)
        .fold((0u64, 0u64), |(p, t), r| {
            (p + u64::from(r.present), t + u64::from(r.total))
        });

    if total > 0 {
        format!("{:.2}%", (present as f64 / total as f64) * 100.0)
    } else {
        "0%".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <div id="UpGrossAtt">
            <span id="lblHeadAnnouncement">Gross Attendance of Semester 5 (LECT) - 76.71 %</span>
            <table id="gvGrossAttPop">
                <tr><th>Course</th><th>Type</th><th>Present/Total</th><th>%</th></tr>
                <tr>
                    <td><span>CE341</span></td><td><span>LECT</span></td>
                    <td> 33 / 37 </td><td>89.19</td>
                </tr>
                <tr>
                    <td><span>CE341</span></td><td><span>LAB</span></td>
                    <td>12/16</td><td>75.00</td>
                </tr>
                <tr>
                    <td><span>CE343</span></td><td><span>LECT</span></td>
                    <td>27/39</td><td>69.23</td>
                </tr>
                <tr><td>only-three</td><td>cells</td><td>here</td></tr>
            </table>
            <table id="gvGAttSubjectsPop">
                <tr><td>CE341</td><td>Operating Systems</td></tr>
                <tr><td>CE343</td><td>Computer Networks</td></tr>
            </table>
        </div>"#;

    #[test]
    fn parses_rows_with_lookup() {
        let raw = parse_attendance_html(FIXTURE).unwrap();
        assert_eq!(raw.data.len(), 3);

        let first = &raw.data[0];
        assert_eq!(first.course_code, "CE341");
        assert_eq!(first.course_name, "Operating Systems");
        assert_eq!(first.class_type, ClassType::Lecture);
        assert_eq!(first.present, 33);
        assert_eq!(first.total, 37);
        assert_eq!(first.percentage, "89.19");

        assert_eq!(raw.data[1].class_type, ClassType::Lab);
        assert_eq!(raw.data[2].course_name, "Computer Networks");
    }

    #[test]
    fn header_metadata_extracted() {
        let raw = parse_attendance_html(FIXTURE).unwrap();
        assert_eq!(raw.semester, "5");
        // Header value wins over the computed lecture gross
        assert_eq!(raw.lecture_gross, "76.71%");
        // Lab gross is always computed: 12/16
        assert_eq!(raw.lab_gross, "75.00%");
    }

    #[test]
    fn falls_back_to_computed_gross_without_header() {
        let html = FIXTURE.replace("Gross Attendance of Semester 5 (LECT) - 76.71 %", "");
        let raw = parse_attendance_html(&html).unwrap();
        assert_eq!(raw.semester, "");
        // Lectures: (33 + 27) / (37 + 39) = 78.95%
        assert_eq!(raw.lecture_gross, "78.95%");
    }

    #[test]
    fn missing_table_is_results_not_found() {
        let err = parse_attendance_html("<html><body>login page</body></html>").unwrap_err();
        assert!(matches!(err, PortalError::ResultsNotFound { .. }));
    }

    #[test]
    fn non_numeric_counts_default_to_zero() {
        let html = r#"
            <table id="gvGrossAttPop">
                <tr><th>h</th></tr>
                <tr><td><span>X</span></td><td><span>LECT</span></td><td>n/a</td><td>-</td></tr>
            </table>"#;
        let raw = parse_attendance_html(html).unwrap();
        assert_eq!(raw.data[0].present, 0);
        assert_eq!(raw.data[0].total, 0);
    }

    #[test]
    fn unknown_course_code_leaves_name_empty() {
        let html = r#"
            <table id="gvGrossAttPop">
                <tr><th>h</th></tr>
                <tr><td><span>ZZ999</span></td><td><span>LECT</span></td><td>1/2</td><td>50</td></tr>
            </table>
            <table id="gvGAttSubjectsPop"><tr><td>CE341</td><td>OS</td></tr></table>"#;
        let raw = parse_attendance_html(html).unwrap();
        assert_eq!(raw.data[0].course_name, "");
    }

    #[test]
    fn empty_table_yields_zero_gross() {
        let html = r#"<table id="gvGrossAttPop"><tr><th>h</th></tr></table>"#;
        let raw = parse_attendance_html(html).unwrap();
        assert!(raw.data.is_empty());
        assert_eq!(raw.lecture_gross, "0%");
        assert_eq!(raw.lab_gross, "0%");
    }
}
