//! Game configuration loaded from JSON.
//!
//! The file mirrors this layout (camelCase keys, unknown keys rejected):
//!
//! ```json
//! {
//!   "columnNumber": 20, "rowNumber": 20,
//!   "moveDelay": 250, "maxMoves": 1000000,
//!   "unitsPerLeague": 10, "unitWeight": 30, "newbornWeight": 10,
//!   "spriteWidth": 20, "spriteHeight": 20,
//!   "leagues": {
//!     "red": {
//!       "directory": "red", "startKind": "start", "defaultSprite": "#FF0000",
//!       "unitKinds": { "start": { "exec": "start.gd", "sprite": "#FF0000" } }
//!     }
//!   }
//! }
//! ```
//!
//! Every member except `leagues` has a default. The sprite size members are
//! optional and only matter to image renderers. League directories are
//! resolved against the directory of the first file loaded.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::display::{Rgb, Sprite};
use crate::error::ConfigError;

/// On-disk shape of the configuration root.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_dimension")]
    column_number: u16,
    #[serde(default = "default_dimension")]
    row_number: u16,
    #[serde(default = "default_move_delay")]
    move_delay: u64,
    #[serde(default = "default_max_moves")]
    max_moves: u64,
    #[serde(default = "default_units_per_league")]
    units_per_league: u32,
    #[serde(default = "default_unit_weight")]
    unit_weight: i64,
    #[serde(default = "default_newborn_weight")]
    newborn_weight: i64,
    sprite_width: Option<u32>,
    sprite_height: Option<u32>,
    leagues: BTreeMap<String, LeagueFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LeagueFile {
    directory: Option<String>,
    #[serde(default = "default_start_kind")]
    start_kind: String,
    default_sprite: Option<String>,
    unit_kinds: BTreeMap<String, KindFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct KindFile {
    exec: String,
    sprite: Option<String>,
}

const fn default_dimension() -> u16 {
    20
}

const fn default_move_delay() -> u64 {
    250
}

const fn default_max_moves() -> u64 {
    1_000_000
}

const fn default_units_per_league() -> u32 {
    10
}

const fn default_unit_weight() -> i64 {
    30
}

const fn default_newborn_weight() -> i64 {
    10
}

fn default_start_kind() -> String {
    "start".to_owned()
}

/// One unit kind of a league.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConfig {
    /// Kind name.
    pub name: String,
    /// Program file, resolved against the league directory.
    pub exec: PathBuf,
    /// Sprite for units of this kind.
    pub sprite: Sprite,
}

/// One league.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueConfig {
    /// League name.
    pub name: String,
    /// Resolved league directory.
    pub directory: PathBuf,
    /// Name of the kind initial units are created with.
    pub start_kind: String,
    /// Kinds, ordered by name.
    pub kinds: Vec<KindConfig>,
}

impl LeagueConfig {
    /// Index of the start kind in [`LeagueConfig::kinds`].
    #[must_use]
    pub fn start_kind_index(&self) -> Option<usize> {
        self.kinds.iter().position(|k| k.name == self.start_kind)
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Board width in cells.
    pub columns: u16,
    /// Board height in cells.
    pub rows: u16,
    /// Pause between moves.
    pub move_delay: Duration,
    /// Move ceiling.
    pub max_moves: u64,
    /// Units each league starts with.
    pub units_per_league: u32,
    /// Weight of initial units.
    pub unit_weight: i64,
    /// Weight of units spawned by `clon`.
    pub newborn_weight: i64,
    /// Pixel width of one cell for image renderers. The terminal viewer
    /// ignores it.
    pub sprite_width: Option<u32>,
    /// Pixel height of one cell for image renderers.
    pub sprite_height: Option<u32>,
    /// Leagues, ordered by name.
    pub leagues: Vec<LeagueConfig>,
    base_dir: PathBuf,
    raw: Map<String, Value>,
}

impl Config {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON of the
    /// expected shape, or fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_root(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_root(raw, base_dir, path)
    }

    /// Parse and validate a configuration string. League directories are
    /// resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON of the expected shape
    /// or fails validation.
    pub fn parse(json: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let origin = Path::new("<inline>");
        let raw = parse_root(json, origin)?;
        Self::from_root(raw, base_dir.to_path_buf(), origin)
    }

    /// Overlay the top-level members of another file; the later file wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the merged
    /// configuration is invalid. `self` is unchanged on error.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let overlay = read_root(path)?;
        let mut raw = self.raw.clone();
        raw.extend(overlay);
        *self = Self::from_root(raw, self.base_dir.clone(), path)?;
        Ok(())
    }

    /// Directory league directories are resolved against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Total units placed at setup.
    #[must_use]
    pub fn initial_units(&self) -> usize {
        self.units_per_league as usize * self.leagues.len()
    }

    fn from_root(
        raw: Map<String, Value>,
        base_dir: PathBuf,
        origin: &Path,
    ) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_value(Value::Object(raw.clone())).map_err(|source| {
                ConfigError::Parse {
                    path: origin.to_path_buf(),
                    source,
                }
            })?;

        let mut rng = rand::rng();
        let leagues = file
            .leagues
            .into_iter()
            .map(|(name, league)| resolve_league(&base_dir, name, league, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;

        let config = Self {
            columns: file.column_number,
            rows: file.row_number,
            move_delay: Duration::from_millis(file.move_delay),
            max_moves: file.max_moves,
            units_per_league: file.units_per_league,
            unit_weight: file.unit_weight,
            newborn_weight: file.newborn_weight,
            sprite_width: file.sprite_width,
            sprite_height: file.sprite_height,
            leagues,
            base_dir,
            raw,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.columns == 0 || self.rows == 0 {
            return invalid(format!(
                "board must be at least 1x1, got {}x{}",
                self.columns, self.rows
            ));
        }
        if self.units_per_league == 0 {
            return invalid("unitsPerLeague must be at least 1".into());
        }
        if self.unit_weight <= 0 {
            return invalid(format!("unitWeight must be positive, got {}", self.unit_weight));
        }
        if self.newborn_weight <= 0 {
            return invalid(format!(
                "newbornWeight must be positive, got {}",
                self.newborn_weight
            ));
        }
        if self.leagues.is_empty() {
            return invalid("no leagues configured".into());
        }
        for league in &self.leagues {
            if league.kinds.is_empty() {
                return invalid(format!("league `{}` has no unit kinds", league.name));
            }
            if league.start_kind_index().is_none() {
                return invalid(format!(
                    "league `{}`: start kind `{}` is not among its unit kinds",
                    league.name, league.start_kind
                ));
            }
        }

        let cells = usize::from(self.columns) * usize::from(self.rows);
        if self.initial_units() > cells {
            return invalid(format!(
                "too many units requested: {} leagues x {} units do not fit on {} cells",
                self.leagues.len(),
                self.units_per_league,
                cells
            ));
        }
        Ok(())
    }
}

fn read_root(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_root(&contents, path)
}

fn parse_root(json: &str, origin: &Path) -> Result<Map<String, Value>, ConfigError> {
    let value: Value = serde_json::from_str(json).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Invalid(format!(
            "{}: the root must be an object",
            origin.display()
        ))),
    }
}

fn resolve_league<R: rand::Rng + ?Sized>(
    base_dir: &Path,
    name: String,
    league: LeagueFile,
    rng: &mut R,
) -> Result<LeagueConfig, ConfigError> {
    let directory = base_dir.join(league.directory.as_deref().unwrap_or(&name));

    let default_sprite = match league.default_sprite.as_deref() {
        Some(s) => parse_sprite(s, &directory, &format!("leagues.{name}.defaultSprite"))?,
        None => Sprite::Color(Rgb::random(rng)),
    };

    let kinds = league
        .unit_kinds
        .into_iter()
        .map(|(kind, file)| {
            if file.exec.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "leagues.{name}.unitKinds.{kind}.exec must not be empty"
                )));
            }
            let sprite = match file.sprite.as_deref() {
                Some(s) => {
                    parse_sprite(s, &directory, &format!("leagues.{name}.unitKinds.{kind}.sprite"))?
                }
                None => default_sprite.clone(),
            };
            Ok(KindConfig {
                exec: directory.join(&file.exec),
                name: kind,
                sprite,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LeagueConfig {
        name,
        directory,
        start_kind: league.start_kind,
        kinds,
    })
}

fn parse_sprite(s: &str, directory: &Path, member: &str) -> Result<Sprite, ConfigError> {
    Sprite::parse(s, directory).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "member {member} must be either a valid RGB value or a path to an image file, got `{s}`"
        ))
    })
}
