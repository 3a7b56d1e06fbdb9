pub mod cli;
pub mod config;
pub mod datetime;
pub mod event;
pub mod interaction;
pub mod layout;
pub mod render;
pub mod views;

use std::ffi::OsString;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::views::ViewMode;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting almanac"
  );
  debug!(?cli.rc_overrides, "command line rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let timezone = cfg.timezone();
  let calendar = cfg.week_calendar();
  let today = match cli.today.as_deref()
  {
    | Some(raw) => {
      NaiveDate::parse_from_str(
        raw.trim(),
        "%Y-%m-%d"
      )
      .with_context(|| {
        format!(
          "invalid --today value: {raw}"
        )
      })?
    }
    | None => {
      datetime::today_in_timezone(
        timezone
      )
    }
  };

  let view = cli
    .view
    .unwrap_or_else(|| cfg.default_view());
  let agenda_days =
    cfg.policies.agenda_days;
  let focus = views::shift_focus(
    datetime::parse_reference_date(
      &cli.date, today
    )?,
    view,
    cli.shift,
    agenda_days
  );

  let events_path = cli
    .events
    .or_else(|| cfg.events_path());
  let events = event::load_events(
    events_path.as_deref(),
    timezone
  )?;

  info!(
    view = view.as_key(),
    %focus,
    %today,
    timezone = %timezone,
    week_start = ?calendar.week_start(),
    events = events.len(),
    "rendering calendar"
  );

  let renderer =
    render::Renderer::new(&cfg);
  let title = views::view_title(
    view,
    focus,
    &calendar,
    agenda_days
  );
  let max_visible =
    cfg.policies.max_visible;

  match view {
    | ViewMode::Month => {
      let layout = layout::layout_month(
        &events,
        focus,
        today,
        &calendar,
        max_visible
      );
      if cli.json {
        renderer.print_json(&layout)?;
      } else {
        renderer
          .print_month(&title, &layout)?;
      }
    }
    | ViewMode::Week => {
      let layout =
        layout::layout_week_view(
          &events,
          focus,
          today,
          &calendar,
          max_visible
        );
      if cli.json {
        renderer.print_json(&layout)?;
      } else {
        renderer.print_week(
          &title,
          &calendar.weekday_labels(),
          &layout
        )?;
      }
    }
    | ViewMode::Day => {
      let listed =
        views::day_events(&events, focus);
      if cli.json {
        renderer.print_json(&listed)?;
      } else {
        renderer.print_day(
          &title, focus, &listed
        )?;
      }
    }
    | ViewMode::Agenda => {
      let days = views::agenda(
        &events,
        focus,
        agenda_days
      );
      if cli.json {
        renderer.print_json(&days)?;
      } else {
        renderer
          .print_agenda(&title, &days)?;
      }
    }
  }

  info!("done");
  Ok(())
}
