use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use squats::consts::ACTIVITY_LOG_FILE;
use squats::utils::parse_date;
use squats::{
    ActivityLog, FileBackend, LogFanout, ProgressLog, ProgressStore, SlotTable, StoreOptions,
    TracingLog,
};

use crate::cli::{AppError, Cli, Commands};
use crate::config::Config;
use crate::output::{
    ActionReport, output_action_json, output_day_json, output_slots_json, output_week_json,
    print_action, print_day_table, print_slot_table, print_week_table,
};
use crate::timezone::Timezone;

struct CommandContext<'a> {
    store: &'a ProgressStore,
    json: bool,
    use_color: bool,
}

fn slot_table(config: &Config) -> Result<SlotTable, AppError> {
    match &config.slots {
        Some(labels) => Ok(SlotTable::from_labels(labels)?),
        None => Ok(SlotTable::default()),
    }
}

fn progress_log(config: &Config, data_dir: &Path) -> Arc<dyn ProgressLog> {
    let tracing: Arc<dyn ProgressLog> = Arc::new(TracingLog);
    if !config.activity_log {
        return tracing;
    }
    let activity = ActivityLog::new(data_dir.join(ACTIVITY_LOG_FILE));
    Arc::new(LogFanout::new().with(tracing).with(Arc::new(activity)))
}

fn squats_home() -> Option<PathBuf> {
    std::env::var_os("SQUATS_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Accepts YYYY-MM-DD, YYYYMMDD or "today" (in the store's timezone)
fn resolve_date(store: &ProgressStore, input: &str) -> Result<NaiveDate, AppError> {
    if input.trim().eq_ignore_ascii_case("today") {
        return Ok(store.today());
    }
    parse_date(input).map_err(|_| AppError::InvalidDate {
        input: input.to_string(),
    })
}

fn resolve_slot(slots: &SlotTable, input: &str) -> Result<usize, AppError> {
    slots.resolve(input).ok_or_else(|| AppError::UnknownSlot {
        input: input.to_string(),
        slots: slots.len(),
    })
}

fn handle_day(ctx: &CommandContext<'_>, date: NaiveDate) -> Result<(), AppError> {
    let store = ctx.store;
    let summary = store.day_summary(date);
    let statuses = store.statuses(date);
    if ctx.json {
        println!("{}", output_day_json(&summary, store.slots(), &statuses)?);
    } else {
        print_day_table(&summary, store.slots(), &statuses, ctx.use_color);
    }
    Ok(())
}

fn handle_week(ctx: &CommandContext<'_>, start: Option<NaiveDate>) -> Result<(), AppError> {
    let week = ctx.store.week_summary(start);
    if ctx.json {
        println!("{}", output_week_json(&week)?);
    } else {
        print_week_table(&week, ctx.use_color);
    }
    Ok(())
}

fn report_action(
    ctx: &CommandContext<'_>,
    date: NaiveDate,
    slot: Option<usize>,
    completed: bool,
) -> Result<(), AppError> {
    let report = ActionReport {
        date,
        slot,
        time: slot.map(|i| ctx.store.slots().label(i)),
        completed,
        day_complete: ctx.store.all_slots_complete(date),
    };
    if ctx.json {
        println!("{}", output_action_json(&report)?);
    } else {
        print_action(&report, ctx.use_color);
    }
    Ok(())
}

fn dispatch(ctx: &CommandContext<'_>, command: Option<&Commands>) -> Result<(), AppError> {
    let store = ctx.store;
    match command {
        None | Some(Commands::Today) => handle_day(ctx, store.today()),
        Some(Commands::Show { date }) => handle_day(ctx, resolve_date(store, date)?),
        Some(Commands::Week { start }) => {
            let start = start.as_deref().map(|s| resolve_date(store, s)).transpose()?;
            handle_week(ctx, start)
        }
        Some(Commands::Slots) => {
            if ctx.json {
                println!("{}", output_slots_json(store.slots())?);
            } else {
                print_slot_table(store.slots(), ctx.use_color);
            }
            Ok(())
        }
        Some(Commands::Set { date, slot, state }) => {
            let date = resolve_date(store, date)?;
            let index = resolve_slot(store.slots(), slot)?;
            store.set_slot(date, index, state.completed())?;
            report_action(ctx, date, Some(index), state.completed())
        }
        Some(Commands::Toggle { date, slot }) => {
            let date = resolve_date(store, date)?;
            let index = resolve_slot(store.slots(), slot)?;
            let completed = store.toggle_slot(date, index)?;
            report_action(ctx, date, Some(index), completed)
        }
        Some(Commands::Next { date }) => {
            let date = match date {
                Some(d) => resolve_date(store, d)?,
                None => store.today(),
            };
            let marked = store.complete_next(date)?;
            report_action(ctx, date, marked, true)
        }
        Some(Commands::Reset { start }) => {
            let start = start.as_deref().map(|s| resolve_date(store, s)).transpose()?;
            store.reset_week(start)?;
            if !ctx.json {
                println!("Started a fresh week.");
            }
            handle_week(ctx, start)
        }
    }
}

pub(crate) fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    let timezone = Timezone::parse(cli.timezone.as_deref())?;
    let slots = slot_table(config)?;
    let data_dir = cli.resolve_data_dir(config, squats_home());
    tracing::debug!("Using data directory {}", data_dir.display());

    let options = StoreOptions::default()
        .with_flush(config.flush)
        .with_reset(config.reset_policy)
        .with_clock(Arc::new(timezone))
        .with_log(progress_log(config, &data_dir));
    let store = ProgressStore::open(FileBackend::in_dir(&data_dir), slots, options);
    tracing::debug!(status = ?store.load_status(), "Opened {}", store.path().display());

    let ctx = CommandContext {
        store: &store,
        json: cli.json,
        use_color: cli.use_color(),
    };
    dispatch(&ctx, cli.command.as_ref())?;
    store.flush()?;
    Ok(())
}
