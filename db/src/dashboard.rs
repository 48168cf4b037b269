//! Dashboard statistics derived from the current store contents.
//!
//! Nothing is cached: [`build`] reads every record and [`summarize`] recomputes all figures.
//! An empty store yields zero counts, a zero-filled trend and empty lists.

use std::collections::HashMap;

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime};
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    error::Result,
    models::{Patient, PatientFilter, PatientId, PatientStatus},
    store::{PatientStore, today},
};

pub const DEFAULT_TREND_WEEKS: u32 = 8;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Parameters of a dashboard computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Number of calendar weeks in the admission trend, ending with the current week.
    pub trend_weeks: u32,
    /// Maximum number of entries in the recent activity list.
    pub recent_limit: usize,
    /// The date treated as "today".
    pub today: Date,
}

impl DashboardOptions {
    pub fn new(trend_weeks: u32, recent_limit: usize) -> Self {
        Self {
            trend_weeks,
            recent_limit,
            today: today(),
        }
    }
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_WEEKS, DEFAULT_RECENT_LIMIT)
    }
}

/// Record counts by status. `admitted + discharged == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub total: u64,
    pub admitted: u64,
    pub discharged: u64,
    /// Records whose admission date is today.
    pub admitted_today: u64,
}

/// Admissions during one calendar week (Monday to Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeeklyCount {
    pub week_start: Date,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConditionCount {
    pub condition: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Created,
    Updated,
}

/// A recently created or changed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecentActivity {
    pub id: PatientId,
    pub name: String,
    pub status: PatientStatus,
    pub activity: Activity,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Dashboard {
    pub counts: StatusCounts,
    /// Oldest week first, one entry per week of the window.
    pub weekly_admissions: Vec<WeeklyCount>,
    /// Most frequent condition first.
    pub conditions: Vec<ConditionCount>,
    /// Newest first.
    pub recent: Vec<RecentActivity>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Reads the whole store and summarizes it.
#[instrument(skip(store))]
pub async fn build(store: &dyn PatientStore, options: &DashboardOptions) -> Result<Dashboard> {
    let patients = store.list(&PatientFilter::default()).await?;
    Ok(summarize(&patients, options))
}

/// Computes every dashboard figure. `patients` must be in creation order.
pub fn summarize(patients: &[Patient], options: &DashboardOptions) -> Dashboard {
    Dashboard {
        counts: count_statuses(patients, options.today),
        weekly_admissions: weekly_admissions(patients, options.trend_weeks, options.today),
        conditions: condition_frequency(patients),
        recent: recent_activity(patients, options.recent_limit),
        generated_at: OffsetDateTime::now_utc(),
    }
}

pub fn count_statuses(patients: &[Patient], today: Date) -> StatusCounts {
    patients
        .iter()
        .fold(StatusCounts::default(), |mut counts, patient| {
            counts.total += 1;
            match patient.status {
                PatientStatus::Admitted => counts.admitted += 1,
                PatientStatus::Discharged => counts.discharged += 1,
            }
            if patient.admission_date == today {
                counts.admitted_today += 1;
            }
            counts
        })
}

/// The Monday starting the calendar week of `date`.
pub fn week_start(date: Date) -> Date {
    let offset = i64::from(date.weekday().number_days_from_monday());
    date.saturating_sub(Duration::days(offset))
}

/// Admissions per week for the `weeks` weeks ending with the week of `today`.
///
/// Always returns exactly `weeks` entries; admissions outside the window are ignored.
pub fn weekly_admissions(patients: &[Patient], weeks: u32, today: Date) -> Vec<WeeklyCount> {
    if weeks == 0 {
        return Vec::new();
    }

    let current = week_start(today);
    let first = current.saturating_sub(Duration::weeks(i64::from(weeks) - 1));

    let mut trend: Vec<WeeklyCount> = (0..weeks)
        .map(|offset| WeeklyCount {
            week_start: first.saturating_add(Duration::weeks(offset.into())),
            count: 0,
        })
        .collect();

    for patient in patients {
        let week = week_start(patient.admission_date);
        if week < first || week > current {
            continue;
        }

        let Ok(idx) = usize::try_from((week - first).whole_weeks()) else {
            continue;
        };
        if let Some(entry) = trend.get_mut(idx) {
            entry.count += 1;
        }
    }

    trend
}

/// Counts records per condition, most frequent first.
///
/// Conditions are compared trimmed and case-insensitively and reported with their first-seen
/// spelling. Equal counts keep first-seen order.
pub fn condition_frequency(patients: &[Patient]) -> Vec<ConditionCount> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ConditionCount> = Vec::new();

    for patient in patients {
        let label = patient.condition.trim();
        let key = label.to_lowercase();

        match positions.get(&key) {
            Some(&idx) => counts[idx].count += 1,
            None => {
                positions.insert(key, counts.len());
                counts.push(ConditionCount {
                    condition: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable, so ties stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The `limit` most recently touched records, newest first.
pub fn recent_activity(patients: &[Patient], limit: usize) -> Vec<RecentActivity> {
    let mut recent: Vec<&Patient> = patients.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

    recent
        .into_iter()
        .take(limit)
        .map(|patient| RecentActivity {
            id: patient.id,
            name: patient.name.clone(),
            status: patient.status,
            activity: if patient.updated_at > patient.created_at {
                Activity::Updated
            } else {
                Activity::Created
            },
            at: patient.updated_at,
        })
        .collect()
}
