use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono::Weekday;
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

use crate::datetime::parse_week_start;

const DEFAULT_CONFIG_TOML: &str =
  include_str!("../config/rota.toml");
const CONFIG_ENV_VAR: &str =
  "ROTA_CONFIG";
const CONFIG_DIR_NAME: &str = "rota";
const CONFIG_FILE_NAME: &str =
  "rota.toml";

const DEFAULT_PALETTE: [&str; 40] = [
  "bg-one",
  "bg-two",
  "bg-three",
  "bg-four",
  "bg-five",
  "bg-six",
  "bg-seven",
  "bg-eight",
  "bg-nine",
  "bg-ten",
  "bg-eleven",
  "bg-twelve",
  "bg-thirteen",
  "bg-fourteen",
  "bg-fifteen",
  "bg-sixteen",
  "bg-seventeen",
  "bg-eighteen",
  "bg-nineteen",
  "bg-twenty",
  "bg-twenty-one",
  "bg-twenty-two",
  "bg-twenty-three",
  "bg-twenty-four",
  "bg-twenty-five",
  "bg-twenty-six",
  "bg-twenty-seven",
  "bg-twenty-eight",
  "bg-twenty-nine",
  "bg-thirty",
  "bg-thirty-one",
  "bg-thirty-two",
  "bg-thirty-three",
  "bg-thirty-four",
  "bg-thirty-five",
  "bg-thirty-six",
  "bg-thirty-seven",
  "bg-thirty-eight",
  "bg-thirty-nine",
  "bg-forty"
];

const NEUTRAL_TAG_COLOR: &str = "#666";
const NEUTRAL_TAG_BG: &str = "#f5f7fa";

const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
  CONFIG_VERSION
}

fn default_timezone() -> String {
  "UTC".to_string()
}

fn default_week_start() -> String {
  "monday".to_string()
}

fn default_palette_classes()
-> Vec<String> {
  DEFAULT_PALETTE
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_palette_fallback() -> String
{
  "bg-one".to_string()
}

fn default_staff_color() -> String {
  "#19979c".to_string()
}

fn default_updated_color() -> String {
  "#ff8847".to_string()
}

fn default_tags() -> TagCatalog {
  let entries = [
    ("morning", "Morning", "#ffd700", "#fff8bf"),
    ("afternoon", "Afternoon", "#ff8847", "#fff2ea"),
    ("evening", "Evening", "#4c6ef5", "#eef0ff"),
    ("important", "Important", "#ff4444", "#ffefef"),
    ("meeting", "Meeting", "#20c997", "#e6f9f3"),
    ("training", "Training", "#a980f0", "#f2e9fd")
  ];
  TagCatalog(
    entries
      .into_iter()
      .map(|(id, text, color, bg)| {
        TagStyle {
          id:    id.to_string(),
          text:  text.to_string(),
          color: color.to_string(),
          bg:    bg.to_string()
        }
      })
      .collect()
  )
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct RotaConfig {
  #[serde(default = "default_version")]
  pub version:      u32,
  #[serde(default)]
  pub display:      DisplayConfig,
  #[serde(default)]
  pub palette:      Palette,
  #[serde(default)]
  pub staff_colors: StaffColors,
  #[serde(default)]
  pub labels:       Labels,
  #[serde(default = "default_tags")]
  pub tags:         TagCatalog
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct DisplayConfig {
  #[serde(default = "default_timezone")]
  pub timezone:   String,
  #[serde(
    default = "default_week_start"
  )]
  pub week_start: String
}

/// Color classes handed out by list
/// position. Index `i` always maps to
/// the same class for a given palette.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Palette {
  #[serde(
    default = "default_palette_classes"
  )]
  pub classes:  Vec<String>,
  #[serde(
    default = "default_palette_fallback"
  )]
  pub fallback: String
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct StaffColors {
  #[serde(default = "default_staff_color")]
  pub default:  String,
  #[serde(
    default = "default_updated_color"
  )]
  pub updated:  String,
  #[serde(default)]
  pub by_staff: BTreeMap<String, String>
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Serialize,
  Deserialize,
)]
pub struct Labels {
  #[serde(default = "Labels::no_events")]
  pub no_events:        String,
  #[serde(default = "Labels::pair_day")]
  pub pair_day:         String,
  #[serde(
    default = "Labels::pair_day_unknown"
  )]
  pub pair_day_unknown: String,
  #[serde(default = "Labels::shift")]
  pub shift:            String,
  #[serde(default = "Labels::time")]
  pub time:             String,
  #[serde(
    default = "Labels::unknown_staff"
  )]
  pub unknown_staff:    String,
  #[serde(
    default = "Labels::unknown_shift"
  )]
  pub unknown_shift:    String,
  #[serde(default = "Labels::card_title")]
  pub card_title:       String,
  #[serde(
    default = "Labels::not_available"
  )]
  pub not_available:    String
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
pub struct TagStyle {
  pub id:    String,
  #[serde(default)]
  pub text:  String,
  #[serde(default)]
  pub color: String,
  #[serde(default)]
  pub bg:    String
}

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct TagCatalog(pub Vec<TagStyle>);

impl Default for RotaConfig {
  fn default() -> Self {
    Self {
      version:      default_version(),
      display:      DisplayConfig::default(
      ),
      palette:      Palette::default(),
      staff_colors: StaffColors::default(),
      labels:       Labels::default(),
      tags:         default_tags()
    }
  }
}

impl Default for DisplayConfig {
  fn default() -> Self {
    Self {
      timezone:   default_timezone(),
      week_start: default_week_start()
    }
  }
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      classes:  default_palette_classes(
      ),
      fallback: default_palette_fallback(
      )
    }
  }
}

impl Default for StaffColors {
  fn default() -> Self {
    Self {
      default:  default_staff_color(),
      updated:  default_updated_color(),
      by_staff: BTreeMap::new()
    }
  }
}

impl Default for Labels {
  fn default() -> Self {
    Self {
      no_events:        Self::no_events(),
      pair_day:         Self::pair_day(),
      pair_day_unknown:
        Self::pair_day_unknown(),
      shift:            Self::shift(),
      time:             Self::time(),
      unknown_staff:
        Self::unknown_staff(),
      unknown_shift:
        Self::unknown_shift(),
      card_title:       Self::card_title(),
      not_available:
        Self::not_available()
    }
  }
}

impl Default for TagCatalog {
  fn default() -> Self {
    default_tags()
  }
}

impl Labels {
  fn no_events() -> String {
    "No events".to_string()
  }

  fn pair_day() -> String {
    "Pair day".to_string()
  }

  fn pair_day_unknown() -> String {
    "Pair day!".to_string()
  }

  fn shift() -> String {
    "Shift".to_string()
  }

  fn time() -> String {
    "Time".to_string()
  }

  fn unknown_staff() -> String {
    "Unknown Staff".to_string()
  }

  fn unknown_shift() -> String {
    "Unknown Shift".to_string()
  }

  fn card_title() -> String {
    "Shift".to_string()
  }

  fn not_available() -> String {
    "N/A".to_string()
  }
}

impl DisplayConfig {
  /// Configured display timezone, UTC
  /// when the id does not parse.
  pub fn timezone(&self) -> Tz {
    match self.timezone.trim().parse::<Tz>()
    {
      | Ok(tz) => tz,
      | Err(error) => {
        tracing::error!(
          timezone = %self.timezone,
          %error,
          "invalid display timezone; using UTC"
        );
        chrono_tz::UTC
      }
    }
  }

  pub fn week_start(&self) -> Weekday {
    parse_week_start(&self.week_start)
  }
}

impl Palette {
  pub fn color_at(
    &self,
    index: usize
  ) -> String {
    if self.classes.is_empty() {
      return self.fallback.clone();
    }
    self.classes
      [index % self.classes.len()]
    .clone()
  }

  /// Class for an optional position;
  /// `None` maps to the fallback.
  pub fn color_for(
    &self,
    index: Option<usize>
  ) -> String {
    index
      .map(|idx| self.color_at(idx))
      .unwrap_or_else(|| {
        self.fallback.clone()
      })
  }
}

impl StaffColors {
  pub fn color_for(
    &self,
    staff_id: &str
  ) -> &str {
    self
      .by_staff
      .get(staff_id)
      .map(String::as_str)
      .unwrap_or(self.default.as_str())
  }
}

impl TagCatalog {
  pub fn get(
    &self,
    id: &str
  ) -> Option<&TagStyle> {
    self.0.iter().find(|tag| tag.id == id)
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = &TagStyle> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Style for a tag id; tags missing
  /// from the catalog render as their
  /// raw id in neutral colors.
  pub fn style_or_plain(
    &self,
    id: &str
  ) -> TagStyle {
    self.get(id).cloned().unwrap_or_else(
      || TagStyle {
        id:    id.to_string(),
        text:  id.to_string(),
        color: NEUTRAL_TAG_COLOR
          .to_string(),
        bg:    NEUTRAL_TAG_BG.to_string()
      }
    )
  }
}

impl RotaConfig {
  /// Resolution order: explicit path,
  /// `ROTA_CONFIG`, then
  /// `<config dir>/rota/rota.toml`, then
  /// the embedded defaults. Only an
  /// explicit path is allowed to fail.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    if let Some(path) = override_path {
      info!(config = %path.display(), "loading explicit config");
      let mut cfg =
        Self::from_file(path)?;
      cfg.sanitize();
      return Ok(cfg);
    }

    if let Some(path) =
      discovered_config_path()
    {
      match Self::from_file(&path) {
        | Ok(mut cfg) => {
          info!(config = %path.display(), "loaded config");
          cfg.sanitize();
          return Ok(cfg);
        }
        | Err(error) => {
          tracing::error!(
            config = %path.display(),
            error = %format!("{error:#}"),
            "failed loading config; using defaults"
          );
        }
      }
    } else {
      debug!(
        "no config file found; using \
         embedded defaults"
      );
    }

    Ok(Self::embedded())
  }

  /// The defaults shipped with the
  /// crate.
  pub fn embedded() -> Self {
    match Self::from_toml_str(
      DEFAULT_CONFIG_TOML
    ) {
      | Ok(mut cfg) => {
        cfg.sanitize();
        cfg
      }
      | Err(error) => {
        tracing::error!(
          error = %format!("{error:#}"),
          "embedded config failed to parse; using built-in defaults"
        );
        Self::default()
      }
    }
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    toml::from_str::<RotaConfig>(raw)
      .context("invalid rota config")
  }

  fn from_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let raw = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    Self::from_toml_str(&raw)
      .with_context(|| {
        format!(
          "failed to parse {}",
          path.display()
        )
      })
  }

  pub fn timezone(&self) -> Tz {
    self.display.timezone()
  }

  pub fn week_start(&self) -> Weekday {
    self.display.week_start()
  }

  fn sanitize(&mut self) {
    if self.version != CONFIG_VERSION {
      warn!(
        version = self.version,
        supported = CONFIG_VERSION,
        "unsupported config version; \
         reading as version 1"
      );
      self.version = CONFIG_VERSION;
    }

    self.palette.classes.retain(
      |class| !class.trim().is_empty()
    );
    if self.palette.classes.is_empty() {
      warn!(
        "palette had no classes; using \
         default palette"
      );
      self.palette.classes =
        default_palette_classes();
    }
    if self
      .palette
      .fallback
      .trim()
      .is_empty()
    {
      self.palette.fallback =
        default_palette_fallback();
    }

    if self
      .staff_colors
      .default
      .trim()
      .is_empty()
    {
      self.staff_colors.default =
        default_staff_color();
    }

    let before = self.tags.len();
    let mut seen =
      std::collections::BTreeSet::new();
    self.tags.0.retain(|tag| {
      !tag.id.trim().is_empty()
        && seen.insert(tag.id.clone())
    });
    for tag in &mut self.tags.0 {
      if tag.text.trim().is_empty() {
        tag.text = tag.id.clone();
      }
    }
    if self.tags.len() != before {
      warn!(
        dropped = before - self.tags.len(),
        "dropped blank or duplicate tag ids"
      );
    }

    if self
      .display
      .timezone
      .trim()
      .parse::<Tz>()
      .is_err()
    {
      warn!(
        timezone = %self.display.timezone,
        "unknown display timezone; using UTC"
      );
      self.display.timezone =
        default_timezone();
    }
  }
}

fn discovered_config_path()
-> Option<PathBuf> {
  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  let candidate = dirs::config_dir()?
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  candidate.exists().then_some(candidate)
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn embedded_config_matches_builtin_defaults(
  ) {
    let mut expected =
      RotaConfig::default();
    expected.staff_colors.by_staff = [
      ("staff-1", "#FFD700"),
      ("staff-2", "#FF4444"),
      ("staff-3", "#4CAF50"),
      ("staff-4", "#2196F3")
    ]
    .into_iter()
    .map(|(k, v)| {
      (k.to_string(), v.to_string())
    })
    .collect();

    assert_eq!(
      RotaConfig::embedded(),
      expected
    );
  }

  #[test]
  fn palette_wraps_by_position() {
    let palette = Palette {
      classes:  vec![
        "a".to_string(),
        "b".to_string(),
      ],
      fallback: "z".to_string()
    };
    assert_eq!(palette.color_at(0), "a");
    assert_eq!(palette.color_at(3), "b");
    assert_eq!(
      palette.color_for(None),
      "z"
    );
  }

  #[test]
  fn partial_override_keeps_other_sections(
  ) {
    let cfg = RotaConfig::from_toml_str(
      r##"
        [display]
        timezone = "Europe/Istanbul"

        [[tags]]
        id = "night"
        color = "#000"
      "##
    )
    .expect("partial config parses");

    assert_eq!(
      cfg.timezone(),
      chrono_tz::Europe::Istanbul
    );
    assert_eq!(cfg.week_start(), Weekday::Mon);
    assert_eq!(cfg.palette.classes.len(), 40);
    assert_eq!(cfg.tags.len(), 1);
    assert_eq!(
      cfg.labels.no_events,
      "No events"
    );
  }

  #[test]
  fn explicit_file_is_loaded_and_sanitized(
  ) {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      r#"
        [palette]
        classes = ["", "only"]

        [[tags]]
        id = "x"

        [[tags]]
        id = "x"
      "#
    )
    .expect("write config");

    let cfg =
      RotaConfig::load(Some(file.path()))
        .expect("config loads");
    assert_eq!(cfg.palette.classes, vec![
      "only".to_string()
    ]);
    assert_eq!(cfg.tags.len(), 1);
    assert_eq!(
      cfg.tags.get("x").map(|t| t.text.as_str()),
      Some("x")
    );
  }

  #[test]
  fn unknown_version_is_read_as_current(
  ) {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(
      file,
      "version = 7\n\n[labels]\nno_events = \"Free\""
    )
    .expect("write config");

    let cfg =
      RotaConfig::load(Some(file.path()))
        .expect("config loads");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.labels.no_events, "Free");

    let raw =
      RotaConfig::from_toml_str("version = 7")
        .expect("parses");
    assert_eq!(raw.version, 7);
  }

  #[test]
  fn explicit_broken_file_is_an_error() {
    let mut file =
      tempfile::NamedTempFile::new()
        .expect("temp file");
    writeln!(file, "palette = 3")
      .expect("write config");
    assert!(
      RotaConfig::load(Some(file.path()))
        .is_err()
    );
  }

  #[test]
  fn unknown_tags_render_plain() {
    let catalog = TagCatalog::default();
    let style =
      catalog.style_or_plain("custom");
    assert_eq!(style.text, "custom");
    assert_eq!(style.color, NEUTRAL_TAG_COLOR);
    assert_eq!(
      catalog
        .style_or_plain("morning")
        .text,
      "Morning"
    );
  }
}
