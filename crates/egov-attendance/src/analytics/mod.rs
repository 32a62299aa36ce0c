//! Usage analytics store.
//!
//! Records one row per attendance fetch, keyed by the parsed roll
//! number, and aggregates a small admin summary. The store only ever
//! sees the username string - never credentials, HTML or session state -
//! and its failures are swallowed by the caller, off the critical path.

mod roll;

pub use roll::{parse_roll_number, RollNumber, KNOWN_DEPARTMENTS};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_analytics.sql");

/// How many accesses the summary lists verbatim.
const RECENT_LIMIT: i64 = 50;

/// SQLite-backed access log.
pub struct AnalyticsStore {
    db: Mutex<Connection>,
}

/// Admin-facing aggregate of recorded accesses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_accesses: i64,
    pub unique_users: i64,
    /// Per-department counts, restricted to [`KNOWN_DEPARTMENTS`]
    pub departments: BTreeMap<String, i64>,
    /// Counts keyed by "Year <N>"
    pub years: BTreeMap<String, i64>,
    /// Daily counts for the last 7 days, zero-filled
    pub daily: BTreeMap<String, i64>,
    pub recent: Vec<RecentAccess>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAccess {
    pub roll_number: String,
    pub timestamp: String,
    pub department: String,
    pub year_of_study: u32,
}

impl AnalyticsStore {
    /// Opens (or creates) the store at the given path and initializes the
    /// schema.
    pub fn new(db_path: &str) -> rusqlite::Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Records one access.
    pub fn log_access(&self, roll: &RollNumber) -> rusqlite::Result<()> {
        self.log_access_at(roll, Utc::now())
    }

    fn log_access_at(&self, roll: &RollNumber, at: DateTime<Utc>) -> rusqlite::Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO accesses (roll_number, department, year_of_study, accessed_on, accessed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &roll.raw,
                &roll.department,
                roll.year_of_study,
                at.date_naive().to_string(),
                at.to_rfc3339(),
            ),
        )?;
        Ok(())
    }

    /// Builds the admin summary.
    pub fn summary(&self) -> rusqlite::Result<AnalyticsSummary> {
        self.summary_at(Local::now().date_naive())
    }

    fn summary_at(&self, today: NaiveDate) -> rusqlite::Result<AnalyticsSummary> {
        let db = self.db.lock().unwrap();

        let total_accesses: i64 =
            db.query_row("SELECT COUNT(*) FROM accesses", [], |row| row.get(0))?;
        let unique_users: i64 = db.query_row(
            "SELECT COUNT(DISTINCT roll_number) FROM accesses",
            [],
            |row| row.get(0),
        )?;

        let mut departments = BTreeMap::new();
        {
            let mut stmt =
                db.prepare("SELECT department, COUNT(*) FROM accesses GROUP BY department")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (dept, count) = row?;
                if KNOWN_DEPARTMENTS.contains(&dept.as_str()) {
                    departments.insert(dept, count);
                }
            }
        }

        let mut years = BTreeMap::new();
        {
            let mut stmt =
                db.prepare("SELECT year_of_study, COUNT(*) FROM accesses GROUP BY year_of_study")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (year, count) = row?;
                years.insert(format!("Year {year}"), count);
            }
        }

        let mut daily = BTreeMap::new();
        for days_back in (0..7i64).rev() {
            let day = today - Duration::days(days_back);
            let key = day.to_string();
            let count: i64 = db.query_row(
                "SELECT COUNT(*) FROM accesses WHERE accessed_on = ?1",
                [&key],
                |row| row.get(0),
            )?;
            daily.insert(key, count);
        }

        let mut recent = Vec::new();
        {
            let mut stmt = db.prepare(
                "SELECT roll_number, accessed_at, department, year_of_study
                 FROM accesses ORDER BY accessed_at DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map([RECENT_LIMIT], |row| {
                Ok(RecentAccess {
                    roll_number: row.get(0)?,
                    timestamp: row.get(1)?,
                    department: row.get(2)?,
                    year_of_study: row.get(3)?,
                })
            })?;
            for row in rows {
                recent.push(row?);
            }
        }

        Ok(AnalyticsSummary {
            total_accesses,
            unique_users,
            departments,
            years,
            daily,
            recent,
        })
    }
}
