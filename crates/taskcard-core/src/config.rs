use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::format::{
  Item,
  StrftimeItems
};
use chrono::{
  DateTime,
  Datelike,
  NaiveDateTime,
  TimeZone,
  Utc
};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

const CONFIG_ENV_VAR: &str =
  "TASKCARD_CONFIG";
const CONFIG_DIR_NAME: &str =
  "taskcard";
const CONFIG_FILE_NAME: &str =
  "config.toml";

pub const DEFAULT_DATE_FORMAT: &str =
  "%-d %B";
pub const DEFAULT_TIME_FORMAT: &str =
  "%H:%M";
pub const DEFAULT_PLACEHOLDER: &str =
  "Start typing your text here...";

pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
  #[serde(default)]
  display: DisplaySection
}

#[derive(Debug, Default, Deserialize)]
struct DisplaySection {
  timezone:    Option<String>,
  date_format: Option<String>,
  time_format: Option<String>,
  placeholder: Option<String>
}

/// Validated display settings for due
/// dates and the edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
  pub timezone:    Tz,
  pub date_format: String,
  pub time_format: String,
  pub placeholder: String
}

impl Default for DisplayConfig {
  fn default() -> Self {
    Self {
      timezone:    Tz::UTC,
      date_format: DEFAULT_DATE_FORMAT
        .to_string(),
      time_format: DEFAULT_TIME_FORMAT
        .to_string(),
      placeholder: DEFAULT_PLACEHOLDER
        .to_string()
    }
  }
}

impl DisplayConfig {
  pub fn format_date(
    &self,
    due: DateTime<Utc>
  ) -> String {
    due
      .with_timezone(&self.timezone)
      .format(&self.date_format)
      .to_string()
  }

  pub fn format_time(
    &self,
    due: DateTime<Utc>
  ) -> String {
    due
      .with_timezone(&self.timezone)
      .format(&self.time_format)
      .to_string()
  }

  /// Reads a deadline typed as
  /// `"<date> <time>"` in the display
  /// formats. Formats without a year
  /// take the year of `now`.
  pub fn parse_deadline(
    &self,
    text: &str,
    now: DateTime<Utc>
  ) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }

    let pattern = format!(
      "{} {}",
      self.date_format,
      self.time_format
    );
    let naive =
      NaiveDateTime::parse_from_str(
        text, &pattern
      )
      .or_else(|_| {
        let year = now
          .with_timezone(&self.timezone)
          .year();
        NaiveDateTime::parse_from_str(
          &format!("{year} {text}"),
          &format!("%Y {pattern}")
        )
      })
      .ok()?;

    self
      .timezone
      .from_local_datetime(&naive)
      .earliest()
      .map(|local| {
        local.with_timezone(&Utc)
      })
  }
}

/// What a component needs besides the
/// card: display settings and the clock
/// used for expiry on each render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
  pub display: DisplayConfig,
  pub clock:   Clock
}

impl Default for RenderOptions {
  fn default() -> Self {
    Self {
      display: DisplayConfig::default(),
      clock:   Utc::now
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub display:     DisplayConfig,
  pub loaded_file: Option<PathBuf>
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) = resolve_config_path(
      config_override
    )?
    else {
      warn!(
        "no config file found; using \
         defaults"
      );
      return Ok(Self::default());
    };

    info!(config = %path.display(), "loading config");
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let mut cfg = Self::parse(&text)
      .with_context(|| {
        format!(
          "invalid config {}",
          path.display()
        )
      })?;
    cfg.loaded_file = Some(path);
    Ok(cfg)
  }

  pub fn parse(
    text: &str
  ) -> anyhow::Result<Self> {
    let file: ConfigFile =
      toml::from_str(text)
        .context("malformed TOML")?;
    let section = file.display;
    let defaults =
      DisplayConfig::default();

    let timezone = match section
      .timezone
      .as_deref()
    {
      | Some(name) => {
        name.trim().parse::<Tz>().map_err(
          |_| {
            anyhow!(
              "unknown timezone: {name}"
            )
          }
        )?
      }
      | None => defaults.timezone
    };

    let date_format = section
      .date_format
      .unwrap_or(defaults.date_format);
    let time_format = section
      .time_format
      .unwrap_or(defaults.time_format);
    validate_format(&date_format)?;
    validate_format(&time_format)?;

    debug!(
      %timezone,
      %date_format,
      %time_format,
      "parsed display config"
    );

    Ok(Self {
      display:     DisplayConfig {
        timezone,
        date_format,
        time_format,
        placeholder: section
          .placeholder
          .unwrap_or(
            defaults.placeholder
          )
      },
      loaded_file: None
    })
  }

  pub fn render_options(
    &self
  ) -> RenderOptions {
    RenderOptions {
      display: self.display.clone(),
      ..RenderOptions::default()
    }
  }
}

fn validate_format(
  pattern: &str
) -> anyhow::Result<()> {
  if StrftimeItems::new(pattern)
    .any(|item| {
      matches!(item, Item::Error)
    })
  {
    return Err(anyhow!(
      "invalid date/time format: \
       {pattern}"
    ));
  }
  Ok(())
}

fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(from_env) =
    std::env::var(CONFIG_ENV_VAR)
    && !from_env.trim().is_empty()
  {
    return Ok(Some(PathBuf::from(
      from_env
    )));
  }

  let candidate = dirs::config_dir()
    .map(|dir| {
      dir
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
    });
  Ok(
    candidate
      .filter(|path| path.exists())
  )
}
