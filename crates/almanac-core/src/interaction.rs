use anyhow::anyhow;
use chrono::{
  Duration,
  NaiveDate
};
use tracing::debug;

use crate::datetime::{
  WeekCalendar,
  diff_days
};
use crate::event::CalendarEvent;
use crate::layout::pipeline::{
  WeekLayout,
  layout_week_view
};

/// Moves both endpoints of `event` by the
/// same delta. All-day events only move
/// by whole days.
pub fn shift_event(
  event: &CalendarEvent,
  day_delta: i64,
  minute_delta: i64
) -> CalendarEvent {
  let mut delta =
    Duration::try_days(day_delta)
      .unwrap_or_default();
  if !event.all_day {
    delta += Duration::try_minutes(
      minute_delta
    )
    .unwrap_or_default();
  }

  let mut moved = event.clone();
  moved.start = event
    .start
    .checked_add_signed(delta)
    .unwrap_or(event.start);
  moved.end = event
    .end
    .checked_add_signed(delta)
    .unwrap_or(event.end);
  moved
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
  Idle,
  Dragging {
    original: CalendarEvent,
    origin:   NaiveDate
  },
  Previewing {
    original: CalendarEvent,
    origin:   NaiveDate,
    target:   NaiveDate,
    preview:  CalendarEvent
  },
  Committed(CalendarEvent),
  Cancelled
}

impl DragState {
  fn name(&self) -> &'static str {
    match self {
      | DragState::Idle => "idle",
      | DragState::Dragging { .. } => {
        "dragging"
      }
      | DragState::Previewing {
        ..
      } => "previewing",
      | DragState::Committed(_) => {
        "committed"
      }
      | DragState::Cancelled => {
        "cancelled"
      }
    }
  }
}

/// Pointer-driven move of one event.
///
/// The session only tracks which event
/// is in flight and where it would land;
/// previews are produced by running the
/// regular layout over the event list
/// with the candidate substituted.
#[derive(Debug, Clone)]
pub struct DragSession {
  state: DragState
}

impl Default for DragSession {
  fn default() -> Self {
    Self::new()
  }
}

impl DragSession {
  pub fn new() -> Self {
    Self {
      state: DragState::Idle
    }
  }

  pub fn state(&self) -> &DragState {
    &self.state
  }

  pub fn begin(
    &mut self,
    event: CalendarEvent,
    origin: NaiveDate
  ) -> anyhow::Result<()> {
    match self.state {
      | DragState::Idle
      | DragState::Committed(_)
      | DragState::Cancelled => {
        debug!(
          event = %event.id,
          %origin,
          "drag started"
        );
        self.state =
          DragState::Dragging {
            original: event,
            origin
          };
        Ok(())
      }
      | _ => {
        Err(anyhow!(
          "cannot start a drag while {}",
          self.state.name()
        ))
      }
    }
  }

  /// Updates the drop candidate for the
  /// pointer hovering `target`. Hovering
  /// the origin without a time offset
  /// drops the preview again.
  pub fn hover(
    &mut self,
    target: NaiveDate,
    minute_delta: i64
  ) -> anyhow::Result<&CalendarEvent> {
    let (original, origin) =
      match &self.state {
        | DragState::Dragging {
          original,
          origin
        }
        | DragState::Previewing {
          original,
          origin,
          ..
        } => (original.clone(), *origin),
        | other => {
          return Err(anyhow!(
            "cannot hover while {}",
            other.name()
          ));
        }
      };

    let day_delta =
      diff_days(origin, target);
    self.state = if day_delta == 0
      && minute_delta == 0
    {
      DragState::Dragging {
        original,
        origin
      }
    } else {
      let preview = shift_event(
        &original,
        day_delta,
        minute_delta
      );
      debug!(
        event = %original.id,
        day_delta,
        minute_delta,
        "drop preview updated"
      );
      DragState::Previewing {
        original,
        origin,
        target,
        preview
      }
    };

    match &self.state {
      | DragState::Previewing {
        preview,
        ..
      } => Ok(preview),
      | DragState::Dragging {
        original,
        ..
      } => Ok(original),
      | other => {
        Err(anyhow!(
          "unexpected drag state {}",
          other.name()
        ))
      }
    }
  }

  pub fn preview(
    &self
  ) -> Option<&CalendarEvent> {
    match &self.state {
      | DragState::Previewing {
        preview,
        ..
      } => Some(preview),
      | _ => None
    }
  }

  /// `events` with the dragged event
  /// replaced by its drop candidate.
  pub fn preview_events(
    &self,
    events: &[CalendarEvent]
  ) -> Option<Vec<CalendarEvent>> {
    let preview = self.preview()?;
    Some(
      events
        .iter()
        .map(|event| {
          if event.id == preview.id {
            preview.clone()
          } else {
            event.clone()
          }
        })
        .collect()
    )
  }

  /// Week row around the hovered day as
  /// it would look after the drop.
  pub fn preview_week(
    &self,
    events: &[CalendarEvent],
    today: NaiveDate,
    calendar: &WeekCalendar,
    max_visible: usize
  ) -> Option<WeekLayout> {
    let DragState::Previewing {
      target, ..
    } = &self.state
    else {
      return None;
    };
    let candidate =
      self.preview_events(events)?;
    Some(layout_week_view(
      &candidate,
      *target,
      today,
      calendar,
      max_visible
    ))
  }

  /// Finishes the drag and hands back the
  /// event to store. Without a preview
  /// the original comes back unchanged.
  pub fn commit(
    &mut self
  ) -> anyhow::Result<CalendarEvent> {
    let committed = match &self.state {
      | DragState::Previewing {
        preview,
        ..
      } => preview.clone(),
      | DragState::Dragging {
        original,
        ..
      } => original.clone(),
      | other => {
        return Err(anyhow!(
          "cannot commit while {}",
          other.name()
        ));
      }
    };

    debug!(
      event = %committed.id,
      start = %committed.start,
      end = %committed.end,
      "drag committed"
    );
    self.state = DragState::Committed(
      committed.clone()
    );
    Ok(committed)
  }

  pub fn cancel(
    &mut self
  ) -> anyhow::Result<()> {
    match self.state {
      | DragState::Dragging { .. }
      | DragState::Previewing {
        ..
      } => {
        debug!("drag cancelled");
        self.state = DragState::Cancelled;
        Ok(())
      }
      | _ => {
        Err(anyhow!(
          "cannot cancel while {}",
          self.state.name()
        ))
      }
    }
  }
}
