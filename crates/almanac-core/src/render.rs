use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::event::CalendarEvent;
use crate::layout::pipeline::{MonthLayout, WeekLayout};
use crate::views::AgendaDay;

const CELL_WIDTH: usize = 14;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.display.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, value))]
    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, layout))]
    pub fn print_month(&self, title: &str, layout: &MonthLayout) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_month(&mut out, title, layout)
    }

    #[tracing::instrument(skip(self, layout, labels))]
    pub fn print_week(
        &self,
        title: &str,
        labels: &[&str; 7],
        layout: &WeekLayout,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{title}")?;
        write_row(&mut out, labels.iter().map(|label| label.to_string()))?;
        self.write_week(&mut out, layout)
    }

    #[tracing::instrument(skip(self, events))]
    pub fn print_day(
        &self,
        title: &str,
        day: NaiveDate,
        events: &[&CalendarEvent],
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{title}")?;
        if events.is_empty() {
            writeln!(out, "  (no events)")?;
        }
        for event in events {
            writeln!(out, "  {}", self.event_line(event, day))?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, days))]
    pub fn print_agenda(&self, title: &str, days: &[AgendaDay<'_>]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_agenda(&mut out, title, days)
    }

    pub fn write_month<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        layout: &MonthLayout,
    ) -> anyhow::Result<()> {
        writeln!(out, "{title}")?;
        write_row(
            &mut *out,
            layout.weekday_labels.iter().map(|label| label.to_string()),
        )?;
        for week in &layout.weeks {
            self.write_week(&mut *out, week)?;
        }
        Ok(())
    }

    pub fn write_week<W: Write>(&self, out: &mut W, week: &WeekLayout) -> anyhow::Result<()> {
        let dates = week.days.iter().map(|day| {
            let number = day.cell.date.day().to_string();
            let label = if day.cell.is_today {
                format!("[{number}]")
            } else {
                number
            };
            if day.cell.is_current_month {
                label
            } else {
                self.paint(&label, "90")
            }
        });
        write_row(&mut *out, dates)?;

        for row in 0..week.rows {
            let mut cells = vec![String::new(); 7];
            for segment in week.segments().filter(|segment| segment.slot == row) {
                let geometry = segment.geometry;
                let mut label = segment.title.clone();
                if let Some(multi_week) = geometry.multi_week {
                    if multi_week.continues_from_previous() {
                        label.insert(0, '<');
                    }
                    if multi_week.continues_to_next() {
                        label.push('>');
                    }
                }
                let code = segment.color.unwrap_or_default().ansi_code();
                let last = (geometry.column + geometry.span).min(7);
                for column in geometry.column..last {
                    cells[column] = if column == geometry.column {
                        self.paint(&truncate(&label, CELL_WIDTH), code)
                    } else {
                        self.paint(&"~".repeat(CELL_WIDTH), code)
                    };
                }
            }
            write_row(&mut *out, cells)?;
        }

        if week.days.iter().any(|day| day.hidden_count > 0) {
            let overflow = week.days.iter().map(|day| {
                if day.hidden_count > 0 {
                    format!("+{} more", day.hidden_count)
                } else {
                    String::new()
                }
            });
            write_row(&mut *out, overflow)?;
        }

        writeln!(out)?;
        Ok(())
    }

    pub fn write_agenda<W: Write>(
        &self,
        out: &mut W,
        title: &str,
        days: &[AgendaDay<'_>],
    ) -> anyhow::Result<()> {
        writeln!(out, "{title}")?;
        if days.is_empty() {
            writeln!(out, "  (no events)")?;
        }
        for day in days {
            writeln!(out, "{}", self.paint(&day.date.format("%a %Y-%m-%d").to_string(), "1"))?;
            for event in &day.events {
                writeln!(out, "  {}", self.event_line(event, day.date))?;
            }
        }
        Ok(())
    }

    fn event_line(&self, event: &CalendarEvent, day: NaiveDate) -> String {
        let when = if event.all_day {
            "all day".to_string()
        } else if event.is_multi_day() {
            let from = if event.start_day() == day {
                event.start.format("%H:%M").to_string()
            } else {
                "...".to_string()
            };
            let to = if event.end_day() == day {
                event.end.format("%H:%M").to_string()
            } else {
                "...".to_string()
            };
            format!("{from}-{to}")
        } else {
            format!(
                "{}-{}",
                event.start.format("%H:%M"),
                event.end.format("%H:%M")
            )
        };

        let mut line = format!(
            "{:<11} {}",
            when,
            self.paint(&event.title, event.color.unwrap_or_default().ansi_code())
        );
        if event.is_multi_day() {
            line.push_str(&format!(
                " ({} - {})",
                event.start_day().format("%m-%d"),
                event.end_day().format("%m-%d")
            ));
        }
        if let Some(location) = event.location.as_deref().filter(|l| !l.trim().is_empty()) {
            line.push_str(&format!(" @ {location}"));
        }
        line
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_row<W, I>(mut writer: W, cells: I) -> anyhow::Result<()>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    let mut line = String::new();
    for (idx, cell) in cells.into_iter().enumerate() {
        if idx > 0 {
            line.push_str(" | ");
        }
        let visible_width = UnicodeWidthStr::width(strip_ansi(&cell).as_str());
        let padding = CELL_WIDTH.saturating_sub(visible_width);
        line.push_str(&cell);
        line.push_str(&" ".repeat(padding));
    }
    writeln!(writer, "{}", line.trim_end())?;
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width.saturating_sub(1) {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
