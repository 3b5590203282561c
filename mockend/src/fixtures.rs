//! Sample records for seeding a store.
//!
//! Completion dates are relative to the moment the fixtures are generated, so a
//! freshly seeded store always has todos completed "yesterday", "this week" and
//! "last month".

use chrono::{DateTime, Datelike, Duration, Utc};

use mockend_core::{
    ident::{IdGenerator, UuidGenerator},
    record::{Label, TodoInput},
};
use mockend_memory::Seed;

/// Builds sample seed data.
#[derive(Debug)]
pub struct Fixtures;

impl Fixtures {
    /// Five labels and ten todos, dated relative to now, with UUID identifiers.
    pub fn sample() -> Seed {
        Fixtures::sample_at(Utc::now(), &UuidGenerator)
    }

    /// Same as [`sample`](Fixtures::sample) with an explicit clock and id source.
    pub fn sample_at(now: DateTime<Utc>, ids: &dyn IdGenerator) -> Seed {
        let labels: Vec<Label> = ["Blocked", "Tech Debt", "Bug", "Feature", "Upstream"]
            .into_iter()
            .map(|title| Label { id: ids.generate(), title: title.to_string(), color: None })
            .collect();

        let start_of_week = start_of_week(now);
        let start_of_last_week = start_of_week - Duration::weeks(1);

        let open = |title: &str, with: &[usize]| TodoInput {
            id: Some(ids.generate()),
            labels: with.iter().map(|&i| (&labels[i]).into()).collect(),
            ..TodoInput::new(title)
        };
        let done = |title: &str, with: &[usize], at: DateTime<Utc>| TodoInput {
            completed: true,
            completed_at: Some(at),
            ..open(title, with)
        };

        let todos = vec![
            open("Fix Flummox overheating", &[2]),
            open("Add Whatitz analytics", &[0, 4]),
            done("Wax Ventricals", &[], now - Duration::days(1)),
            done("Prevent explosions", &[], start_of_week - Duration::days(3)),
            done("Bowline Gimbels", &[0], now - Duration::days(10)),
            done("Recipricate Splines", &[], now - Duration::days(8)),
            done("Get pistons detailed", &[], start_of_week - Duration::days(2)),
            done("Harness Core", &[2], now - Duration::days(15)),
            done("Calibrate torques", &[], now - Duration::days(17)),
            done("Recalibrate Floozel", &[1], start_of_last_week - Duration::days(20)),
        ];

        Seed { labels, todos }
    }
}

/// Midnight UTC on the Sunday starting the week that contains `now`.
fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days = i64::from(now.weekday().num_days_from_sunday());
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);

    midnight - Duration::days(days)
}
