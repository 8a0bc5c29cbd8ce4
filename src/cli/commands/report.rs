//! report: hydrated entries over a range of days

use std::collections::BTreeSet;

use anyhow::{bail, Context as _, Result};
use chrono::NaiveDate;

use super::Context;
use crate::api::{GetUserTimeEntries, PaginationParam};
use crate::cli::args::ReportArgs;
use crate::core::timefmt::{named_range, parse_date, DateRange, Zone, RANGE_NAMES};
use crate::core::types::{TimeEntryHydrated, TimeInterval, User};
use crate::engine::hydrate_all;

/// Turn `report` positional arguments into a day range.
fn range(ctx: &Context, args: &[String]) -> Result<DateRange> {
    let config = ctx.factory.config();
    let zone = config.time_zone();
    let now = ctx.factory.now();
    match args {
        [name] if RANGE_NAMES.contains(&name.as_str()) => {
            Ok(named_range(name, zone.date_of(now), &config.workweek_days())?)
        }
        [first] => Ok(DateRange::single(
            parse_date(first, now, &zone).context("invalid range start")?,
        )),
        [first, last] => {
            let first = parse_date(first, now, &zone).context("invalid range start")?;
            let last = parse_date(last, now, &zone).context("invalid range end")?;
            if last < first {
                bail!("range end {last} is before its start {first}");
            }
            Ok(DateRange { first, last })
        }
        _ => bail!("expected a range name or one or two dates"),
    }
}

/// Insert an empty row at the start of every day in `range` that has no
/// entry. `entries` must be sorted by start.
fn fill_missing_dates(
    entries: Vec<TimeEntryHydrated>,
    range: DateRange,
    zone: &Zone,
    workspace: &str,
    user: &User,
) -> Result<Vec<TimeEntryHydrated>> {
    let seen: BTreeSet<NaiveDate> = entries
        .iter()
        .map(|e| zone.date_of(e.time_interval.start))
        .collect();
    let mut filled = entries;
    for day in range.days().filter(|d| !seen.contains(d)) {
        let (start, _) = zone.day_bounds(day)?;
        filled.push(TimeEntryHydrated {
            id: String::new(),
            workspace_id: workspace.to_string(),
            description: String::new(),
            project: None,
            task: None,
            tags: Vec::new(),
            user: user.clone(),
            billable: false,
            time_interval: TimeInterval {
                start,
                end: Some(start),
            },
            is_locked: false,
        });
    }
    filled.sort_by_key(|e| e.time_interval.start);
    Ok(filled)
}

pub async fn report(ctx: &Context, args: ReportArgs) -> Result<()> {
    let range = range(ctx, &args.range)?;
    let zone = ctx.factory.config().time_zone();
    let (start, end) = range.bounds(&zone)?;

    let workspace = ctx.factory.workspace().await?;
    let project_id = match args.project.as_deref() {
        Some(p) => Some(ctx.project_id(p).await?),
        None => None,
    };

    let api = ctx.factory.api()?;
    let mut entries = api
        .get_user_time_entries(GetUserTimeEntries {
            workspace: workspace.clone(),
            user_id: ctx.factory.user_id().await?,
            start: Some(start),
            end: Some(end),
            in_progress: None,
            description: args.description,
            project_id,
            pagination: PaginationParam::all(),
        })
        .await
        .context("report time entries")?;
    entries.sort_by_key(|e| e.time_interval.start);
    tracing::debug!(entries = entries.len(), first = %range.first, last = %range.last, "report");

    let mut hydrated = hydrate_all(api, entries, ctx.factory.cancel_token()).await?;
    if args.fill_missing_dates {
        let user = ctx.factory.me().await?;
        hydrated = fill_missing_dates(hydrated, range, &zone, &workspace, user)?;
    }
    ctx.emit(&hydrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::UserSettings;
    use chrono::{TimeZone, Utc};

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            status: "ACTIVE".into(),
            active_workspace: "w".into(),
            default_workspace: "w".into(),
            settings: UserSettings::default(),
        }
    }

    fn entry_on(day: u32, hour: u32) -> TimeEntryHydrated {
        let start = Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap();
        TimeEntryHydrated {
            id: format!("e{day}"),
            workspace_id: "w".into(),
            description: "work".into(),
            project: None,
            task: None,
            tags: Vec::new(),
            user: user(),
            billable: true,
            time_interval: TimeInterval {
                start,
                end: Some(start + chrono::Duration::hours(1)),
            },
            is_locked: false,
        }
    }

    #[test]
    fn missing_days_get_empty_rows_in_order() {
        let range = DateRange {
            first: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            last: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        };
        let entries = vec![entry_on(4, 9), entry_on(6, 10)];
        let filled = fill_missing_dates(entries, range, &Zone::Utc, "w", &user()).unwrap();

        let ids: Vec<&str> = filled.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e4", "", "e6", ""]);
        let empty = &filled[1];
        assert_eq!(empty.time_interval.start, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
        assert_eq!(empty.time_interval.end, Some(empty.time_interval.start));
        assert_eq!(empty.user.id, "u1");
    }

    #[test]
    fn full_range_is_untouched() {
        let range = DateRange::single(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let filled = fill_missing_dates(vec![entry_on(4, 9)], range, &Zone::Utc, "w", &user()).unwrap();
        assert_eq!(filled.len(), 1);
    }
}
