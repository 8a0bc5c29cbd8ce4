//! log: the entries of one day

use anyhow::{Context as _, Result};

use super::Context;
use crate::api::{Log, LogInProgress};
use crate::cli::args::{LogAction, LogArgs};
use crate::core::timefmt::parse_date;
use crate::engine::{hydrate, hydrate_all};

pub async fn log(ctx: &Context, args: LogArgs) -> Result<()> {
    if let Some(LogAction::InProgress) = args.action {
        return in_progress(ctx).await;
    }

    let zone = ctx.factory.config().time_zone();
    let now = ctx.factory.now();
    let date = match args.date.as_deref() {
        Some(d) => parse_date(d, now, &zone).context("invalid --date")?,
        None => zone.date_of(now),
    };

    let api = ctx.factory.api()?;
    let entries = api
        .log(Log {
            workspace: ctx.factory.workspace().await?,
            user_id: ctx.factory.user_id().await?,
            date,
            zone,
        })
        .await
        .context("list time entries")?;
    let hydrated = hydrate_all(api, entries, ctx.factory.cancel_token()).await?;
    ctx.emit(&hydrated)
}

async fn in_progress(ctx: &Context) -> Result<()> {
    let api = ctx.factory.api()?;
    let running = api
        .log_in_progress(LogInProgress {
            workspace: ctx.factory.workspace().await?,
            user_id: ctx.factory.user_id().await?,
        })
        .await
        .context("show running time entry")?;
    match running {
        Some(entry) => {
            let hydrated = hydrate(api, entry, ctx.factory.cancel_token()).await?;
            ctx.emit_one(&hydrated)
        }
        None => {
            ctx.note("there is no time entry in progress");
            Ok(())
        }
    }
}
