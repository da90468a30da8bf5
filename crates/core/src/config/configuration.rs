use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::imaging::grayscale_method::GrayscaleMethod;
use crate::library::domain::skip_policy::{SkipPolicy, SkipPolicyError};
use crate::shared::constants::CONFIG_FILE_EXTENSION;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no .conf file found in '{0}'")]
    NoConfigFile(PathBuf),
    #[error("line {line}: expected 'key = value', got '{text}'")]
    Syntax { line: usize, text: String },
    #[error("line {line}: '{key}' is set more than once")]
    DuplicateKey { line: usize, key: String },
    #[error("missing setting '{0}'")]
    Missing(&'static str),
    #[error("cannot parse setting '{key}' = '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("setting '{key}' = '{value}' is out of the permitted range")]
    OutOfRange { key: &'static str, value: String },
    #[error(transparent)]
    Skip(#[from] SkipPolicyError),
}

/// Player settings read from the first `.conf` file of the configuration
/// directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub vcom: f64,
    pub screen_width: u32,
    pub screen_height: u32,
    pub refresh_timeout: Duration,
    pub video_directory: PathBuf,
    pub skip: SkipPolicy,
    pub grayscale_method: GrayscaleMethod,
    pub random_frame: bool,
}

impl Configuration {
    /// Loads the first `.conf` file (by name) in `config_directory`.
    pub fn load(config_directory: &Path) -> Result<Self, ConfigError> {
        let path = first_config_file(config_directory)?;
        log::info!("Loading configuration from {}", path.display());
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let settings = Settings::parse(text)?;

        let vcom: f64 = settings.parsed("vcom")?;
        if !vcom.is_finite() {
            return Err(settings.out_of_range("vcom"));
        }

        let resolution = settings.required("display_resolution")?;
        let (screen_width, screen_height) =
            parse_resolution(resolution).ok_or_else(|| ConfigError::Invalid {
                key: "display_resolution",
                value: resolution.to_string(),
            })?;
        if screen_width == 0 || screen_height == 0 {
            return Err(settings.out_of_range("display_resolution"));
        }

        let refresh_seconds: f64 = settings.parsed("refresh_timeout")?;
        let refresh_timeout = Duration::try_from_secs_f64(refresh_seconds)
            .map_err(|_| settings.out_of_range("refresh_timeout"))?;

        let video_directory = settings.required("video_directory")?;
        if video_directory.is_empty() {
            return Err(settings.out_of_range("video_directory"));
        }

        let frame_skip: Option<i64> = settings.optional("frame_skip")?;
        let time_skip: Option<f64> = settings.optional("time_skip")?;
        let skip = match (time_skip, frame_skip) {
            (Some(millis), _) if millis != 0.0 => SkipPolicy::time_skip(millis)?,
            (_, Some(frames)) if frames != 0 => SkipPolicy::frame_skip(frames)?,
            _ => SkipPolicy::default(),
        };

        let grayscale_method = settings
            .get("grayscale_method")
            .map(GrayscaleMethod::from_name)
            .unwrap_or_default();

        let random_frame = match settings.get("random_frame") {
            None => false,
            Some(value) => parse_bool(value).ok_or_else(|| ConfigError::Invalid {
                key: "random_frame",
                value: value.to_string(),
            })?,
        };

        Ok(Self {
            vcom,
            screen_width,
            screen_height,
            refresh_timeout,
            video_directory: PathBuf::from(video_directory),
            skip,
            grayscale_method,
            random_frame,
        })
    }
}

/// Raw `key = value` pairs with enclosing quotes removed.
struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            let split = line
                .find(['=', ':'])
                .ok_or_else(|| ConfigError::Syntax {
                    line: i + 1,
                    text: line.to_string(),
                })?;
            let key = line[..split].trim();
            if key.is_empty() {
                return Err(ConfigError::Syntax {
                    line: i + 1,
                    text: line.to_string(),
                });
            }
            let value = strip_enclosing_quotes(line[split + 1..].trim());
            if values
                .insert(key.to_string(), value.to_string())
                .is_some()
            {
                return Err(ConfigError::DuplicateKey {
                    line: i + 1,
                    key: key.to_string(),
                });
            }
        }
        Ok(Self { values })
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn required(&self, key: &'static str) -> Result<&str, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T: std::str::FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
        let value = self.required(key)?;
        value.parse().map_err(|_| ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }

    fn optional<T: std::str::FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.parsed(key).map(Some),
        }
    }

    fn out_of_range(&self, key: &'static str) -> ConfigError {
        ConfigError::OutOfRange {
            key,
            value: self.get(key).unwrap_or_default().to_string(),
        }
    }
}

fn first_config_file(directory: &Path) -> Result<PathBuf, ConfigError> {
    let entries = fs::read_dir(directory).map_err(|source| ConfigError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .map(|ext| ext == CONFIG_FILE_EXTENSION)
                    .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::NoConfigFile(directory.to_path_buf()))
}

fn strip_enclosing_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() > 1 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// `<width><sep><height>` where the separator is one of `x X , ;` or blank
/// space, optionally padded with spaces or tabs.
fn parse_resolution(value: &str) -> Option<(u32, u32)> {
    let is_blank = |c: char| c == ' ' || c == '\t';

    let width_end = value.find(|c: char| !c.is_ascii_digit())?;
    let (width, rest) = value.split_at(width_end);

    let after_blank = rest.trim_start_matches(is_blank);
    let padded = after_blank.len() < rest.len();
    let after_sep = match after_blank.strip_prefix(['x', 'X', ',', ';']) {
        Some(stripped) => stripped,
        None if padded => after_blank,
        None => return None,
    };
    let height = after_sep.trim_start_matches(is_blank);

    if width.is_empty() || height.is_empty() || !height.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((width.parse().ok()?, height.parse().ok()?))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
