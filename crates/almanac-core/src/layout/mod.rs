//! Pure layout engine: grids, day
//! membership, weekly slots, segment
//! geometry and per-day visibility.
//!
//! Nothing in here performs I/O or keeps
//! state between calls; every function
//! returns freshly built values derived
//! only from its arguments.

pub mod grid;
pub mod membership;
pub mod pipeline;
pub mod segment;
pub mod slots;
pub mod visibility;

pub use grid::{
  CalendarCell,
  MonthGrid,
  Week,
  build_month_grid,
  build_week
};
pub use membership::{
  events_in_window,
  events_on_day
};
pub use pipeline::{
  DayLayout,
  MonthLayout,
  PlacedSegment,
  WeekLayout,
  layout_month,
  layout_week_row,
  layout_week_view
};
pub use segment::{
  MultiWeek,
  SegmentInfo,
  segment_info
};
pub use slots::{
  SlottedEvent,
  layout_week
};
pub use visibility::{
  DayVisibility,
  day_visibility,
  hidden_ids_for_week
};
