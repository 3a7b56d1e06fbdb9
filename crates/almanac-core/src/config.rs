use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  warn
};

use crate::datetime::{
  WeekCalendar,
  parse_weekday_name,
  resolve_timezone
};
use crate::views::ViewMode;

const CONFIG_ENV_VAR: &str =
  "ALMANAC_CONFIG";
const CONFIG_DIR_NAME: &str = "almanac";
const CONFIG_FILE_NAME: &str =
  "almanac.toml";

fn default_true() -> bool {
  true
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_max_visible() -> usize {
  4
}

fn default_agenda_days() -> u32 {
  14
}

fn default_view() -> String {
  "month".to_string()
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Config {
  #[serde(default)]
  pub version:  u32,
  #[serde(default)]
  pub timezone: Option<String>,
  #[serde(default)]
  pub events:   Option<PathBuf>,
  #[serde(default)]
  pub policies: Policies,
  #[serde(default)]
  pub display:  Display,
  #[serde(skip)]
  pub loaded_file: Option<PathBuf>
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Policies {
  #[serde(default = "default_week_start")]
  pub week_start:  String,
  #[serde(
    default = "default_max_visible"
  )]
  pub max_visible: usize,
  #[serde(
    default = "default_agenda_days"
  )]
  pub agenda_days: u32
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Display {
  #[serde(default = "default_true")]
  pub color:        bool,
  #[serde(default = "default_view")]
  pub default_view: String
}

impl Default for Config {
  fn default() -> Self {
    Self {
      version:     1,
      timezone:    None,
      events:      None,
      policies:    Policies::default(),
      display:     Display::default(),
      loaded_file: None
    }
  }
}

impl Default for Policies {
  fn default() -> Self {
    Self {
      week_start:  default_week_start(),
      max_visible: default_max_visible(),
      agenda_days: default_agenda_days()
    }
  }
}

impl Default for Display {
  fn default() -> Self {
    Self {
      color:        default_true(),
      default_view: default_view()
    }
  }
}

impl Config {
  #[tracing::instrument]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(config_override)
    else {
      warn!(
        "no almanac.toml found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg = Self::from_toml_str(
      &raw
    )
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;
    cfg.loaded_file = Some(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Config =
      toml::from_str(raw)
        .context("invalid config toml")?;
    cfg.sanitize();
    Ok(cfg)
  }

  /// Applies `key=value` overrides on top
  /// of the loaded file.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .trim()
        .to_string();
      let value = v.trim().to_string();
      debug!(key = %key, value = %value, "applying override");

      match key.as_str() {
        | "timezone" => {
          self.timezone = Some(value);
        }
        | "events" => {
          self.events =
            Some(PathBuf::from(value));
        }
        | "policies.week_start"
        | "week_start" => {
          if parse_weekday_name(&value)
            .is_none()
          {
            return Err(anyhow!(
              "invalid week start: \
               {value}"
            ));
          }
          self.policies.week_start =
            value;
        }
        | "policies.max_visible"
        | "max_visible" => {
          self.policies.max_visible =
            value.parse().with_context(
              || {
                format!(
                  "invalid max_visible: \
                   {value}"
                )
              }
            )?;
        }
        | "policies.agenda_days"
        | "agenda_days" => {
          self.policies.agenda_days =
            value.parse().with_context(
              || {
                format!(
                  "invalid agenda_days: \
                   {value}"
                )
              }
            )?;
        }
        | "display.color" | "color" => {
          self.display.color =
            parse_bool(&value)
              .ok_or_else(|| {
                anyhow!(
                  "invalid color \
                   setting: {value}"
                )
              })?;
        }
        | "display.default_view"
        | "default_view" => {
          if ViewMode::from_key(&value)
            .is_none()
          {
            return Err(anyhow!(
              "invalid default view: \
               {value}"
            ));
          }
          self.display.default_view =
            value;
        }
        | other => {
          return Err(anyhow!(
            "unknown config key: {other}"
          ));
        }
      }
    }

    self.sanitize();
    Ok(())
  }

  pub fn week_calendar(
    &self
  ) -> WeekCalendar {
    let weekday = parse_weekday_name(
      &self.policies.week_start
    )
    .unwrap_or(chrono::Weekday::Sun);
    WeekCalendar::new(weekday)
  }

  pub fn timezone(&self) -> Tz {
    resolve_timezone(
      self.timezone.as_deref()
    )
  }

  pub fn events_path(
    &self
  ) -> Option<PathBuf> {
    self
      .events
      .as_deref()
      .map(expand_tilde)
  }

  pub fn default_view(
    &self
  ) -> ViewMode {
    ViewMode::from_key(
      &self.display.default_view
    )
    .unwrap_or(ViewMode::Month)
  }

  fn sanitize(&mut self) {
    if parse_weekday_name(
      &self.policies.week_start
    )
    .is_none()
    {
      if !self
        .policies
        .week_start
        .trim()
        .is_empty()
      {
        warn!(
          week_start = %self.policies.week_start,
          "unknown week start; using default"
        );
      }
      self.policies.week_start =
        default_week_start();
    }

    if self.policies.max_visible == 0 {
      self.policies.max_visible =
        default_max_visible();
    }

    if self.policies.agenda_days == 0 {
      self.policies.agenda_days =
        default_agenda_days();
    }

    if ViewMode::from_key(
      &self.display.default_view
    )
    .is_none()
    {
      warn!(
        default_view = %self.display.default_view,
        "unknown default view; using month"
      );
      self.display.default_view =
        default_view();
    }
  }
}

#[tracing::instrument]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(expand_tilde(path));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed == "/dev/null" {
      return None;
    }
    if !trimmed.is_empty() {
      return Some(expand_tilde(
        Path::new(trimmed)
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  candidate.exists().then_some(candidate)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use chrono::Weekday;

  use super::*;

  #[test]
  fn empty_file_yields_defaults() {
    let cfg = Config::from_toml_str("")
      .expect("parse empty config");
    assert_eq!(
      cfg.policies,
      Policies::default()
    );
    assert_eq!(
      cfg.week_calendar().week_start(),
      Weekday::Sun
    );
    assert_eq!(
      cfg.default_view(),
      ViewMode::Month
    );
  }

  #[test]
  fn sanitizes_bad_values() {
    let cfg = Config::from_toml_str(
      r#"
version = 1

[policies]
week_start = "someday"
max_visible = 0
agenda_days = 0

[display]
default_view = "timeline"
"#
    )
    .expect("parse config");
    assert_eq!(
      cfg.policies.week_start,
      "sunday"
    );
    assert_eq!(
      cfg.policies.max_visible,
      4
    );
    assert_eq!(
      cfg.policies.agenda_days,
      14
    );
    assert_eq!(
      cfg.display.default_view,
      "month"
    );
  }

  #[test]
  fn overrides_replace_file_values() {
    let mut cfg = Config::from_toml_str(
      r#"
timezone = "UTC"
[policies]
week_start = "sunday"
"#
    )
    .expect("parse config");

    cfg
      .apply_overrides(vec![
        (
          "rc.policies.week_start"
            .to_string(),
          "monday".to_string()
        ),
        (
          "max_visible".to_string(),
          "6".to_string()
        ),
        (
          "display.color".to_string(),
          "off".to_string()
        ),
      ])
      .expect("apply overrides");

    assert_eq!(
      cfg.week_calendar().week_start(),
      Weekday::Mon
    );
    assert_eq!(
      cfg.policies.max_visible,
      6
    );
    assert!(!cfg.display.color);
  }

  #[test]
  fn rejects_unknown_or_invalid_overrides() {
    let mut cfg = Config::default();
    assert!(
      cfg
        .apply_overrides(vec![(
          "colour".to_string(),
          "on".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "policies.week_start"
            .to_string(),
          "funday".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "max_visible".to_string(),
          "many".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn invalid_timezone_falls_back_to_utc() {
    let cfg = Config {
      timezone: Some(
        "Mars/Olympus".to_string()
      ),
      ..Config::default()
    };
    assert_eq!(
      cfg.timezone(),
      chrono_tz::UTC
    );
  }
}
