//! Configuration loading for the tutor.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.tutor/config.toml`)
//! 3. User config (`~/.tutor/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TutorError};
use crate::storage::write_atomic;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scheduling and session composition.
    pub scheduler: SchedulerConfig,
    /// Default BKT calibration for fresh records.
    pub bkt: BktConfig,
    /// Spaced-repetition memory model.
    pub memory: MemoryConfig,
    /// Exercise generation.
    pub exercises: ExercisesConfig,
    /// Content and state file locations.
    pub paths: PathsConfig,
}

/// Scheduling and session composition configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Knowledge probability at which an item counts as mastered.
    pub mastery_threshold: f64,
    /// Knowledge probability lost per week without practice (learning mode only).
    pub decay_rate_per_week: f64,
    /// Target share of learning items in a composed session.
    pub learning_ratio: f64,
    /// Default number of items in a composed session.
    pub session_size: usize,
    /// Exercises between topic menus in interleaved mode.
    pub menu_interval: u32,
}

/// Default mastery threshold.
pub const MASTERY_THRESHOLD: f64 = 0.95;

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: MASTERY_THRESHOLD,
            decay_rate_per_week: 0.05,
            learning_ratio: 0.7,
            session_size: 10,
            menu_interval: 10,
        }
    }
}

/// Check that a value is a finite probability in [0.0, 1.0].
pub fn is_valid_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

impl SchedulerConfig {
    /// Check if a decay rate is valid (finite and non-negative).
    pub fn is_valid_decay_rate(value: f64) -> bool {
        value.is_finite() && value >= 0.0
    }

    /// Check if a session size is valid (at least one item).
    pub fn is_valid_session_size(value: usize) -> bool {
        value >= 1
    }
}

/// BKT calibration applied to records created on first access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BktConfig {
    /// Prior knowledge probability.
    pub p_init: f64,
    /// Probability of learning on each attempt.
    pub p_transit: f64,
    /// Probability of answering wrong despite knowing.
    pub p_slip: f64,
    /// Probability of answering right without knowing.
    pub p_guess: f64,
}

impl Default for BktConfig {
    fn default() -> Self {
        Self {
            p_init: 0.0,
            p_transit: 0.3,
            p_slip: 0.1,
            p_guess: 0.2,
        }
    }
}

impl BktConfig {
    /// Check all four parameters are probabilities.
    pub fn is_valid(&self) -> bool {
        [self.p_init, self.p_transit, self.p_slip, self.p_guess]
            .iter()
            .all(|p| is_valid_probability(*p))
    }
}

/// Memory model configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MemoryConfig {
    /// Recall probability at which a review falls due.
    pub desired_retention: f64,
    /// Longest interval the calculator may schedule, in days.
    pub maximum_interval_days: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            desired_retention: 0.9,
            maximum_interval_days: 36500,
        }
    }
}

impl MemoryConfig {
    /// Desired retention must lie strictly inside (0, 1).
    pub fn is_valid_retention(value: f64) -> bool {
        value.is_finite() && value > 0.0 && value < 1.0
    }
}

/// Exercise generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExercisesConfig {
    /// Multiple-choice generator settings.
    pub multiple_choice: ChoiceConfig,
    /// Fill-in-the-blank generator settings.
    pub fill_blank: ChoiceConfig,
    /// Fixed RNG seed for reproducible sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Option-count settings shared by the choice-based generators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChoiceConfig {
    /// Options shown, correct answer included.
    pub total_options: usize,
    /// Fewest distractors to use when available.
    pub min_distractors: usize,
    /// Most distractors to use.
    pub max_distractors: usize,
    /// Shuffle options before display.
    pub shuffle: bool,
}

/// Answer letters accepted by the handler bound the option count.
pub const MAX_OPTIONS: usize = 6;

impl Default for ChoiceConfig {
    fn default() -> Self {
        Self {
            total_options: 4,
            min_distractors: 1,
            max_distractors: 3,
            shuffle: true,
        }
    }
}

impl ChoiceConfig {
    /// Check the option count fits the answer grammar and the distractor
    /// bounds are ordered.
    pub fn is_valid(&self) -> bool {
        (2..=MAX_OPTIONS).contains(&self.total_options)
            && self.min_distractors <= self.max_distractors
    }
}

/// File locations. Unset paths resolve relative to the project or tutor home.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the content JSON files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Mastery record file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration with full precedence chain from the current directory.
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config.sanitize();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();
        config.sanitize();
        config
    }

    /// Load user config from `~/.tutor/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = tutor_home()?;
        let config_path = home.join("config.toml");
        Self::load_optional(&config_path)
    }

    /// Load project config from `.tutor/config.toml` under the project root.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let config_path = project_tutor_dir(cwd).join("config.toml");
        Self::load_optional(&config_path)
    }

    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| TutorError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| TutorError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // TUTOR_MASTERY_THRESHOLD
        if let Ok(val) = env::var("TUTOR_MASTERY_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if is_valid_probability(n) => self.scheduler.mastery_threshold = n,
                _ => tracing::warn!(
                    "Invalid TUTOR_MASTERY_THRESHOLD value '{}'. \
                    Must be in range [0.0, 1.0]. Using '{}'.",
                    val, self.scheduler.mastery_threshold
                ),
            }
        }

        // TUTOR_DECAY_RATE
        if let Ok(val) = env::var("TUTOR_DECAY_RATE") {
            match val.parse::<f64>() {
                Ok(n) if SchedulerConfig::is_valid_decay_rate(n) => {
                    self.scheduler.decay_rate_per_week = n
                }
                _ => tracing::warn!(
                    "Invalid TUTOR_DECAY_RATE value '{}'. \
                    Expected a non-negative number. Using '{}'.",
                    val, self.scheduler.decay_rate_per_week
                ),
            }
        }

        // TUTOR_LEARNING_RATIO
        if let Ok(val) = env::var("TUTOR_LEARNING_RATIO") {
            match val.parse::<f64>() {
                Ok(n) if is_valid_probability(n) => self.scheduler.learning_ratio = n,
                _ => tracing::warn!(
                    "Invalid TUTOR_LEARNING_RATIO value '{}'. \
                    Must be in range [0.0, 1.0]. Using '{}'.",
                    val, self.scheduler.learning_ratio
                ),
            }
        }

        // TUTOR_SESSION_SIZE
        if let Ok(val) = env::var("TUTOR_SESSION_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if SchedulerConfig::is_valid_session_size(n) => {
                    self.scheduler.session_size = n
                }
                _ => tracing::warn!(
                    "Invalid TUTOR_SESSION_SIZE value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val, self.scheduler.session_size
                ),
            }
        }

        // TUTOR_SEED
        if let Ok(val) = env::var("TUTOR_SEED") {
            match val.parse::<u64>() {
                Ok(n) => self.exercises.seed = Some(n),
                Err(_) => tracing::warn!(
                    "Invalid TUTOR_SEED value '{}'. \
                    Expected an unsigned integer. Ignoring.",
                    val
                ),
            }
        }

        // TUTOR_DATA_DIR
        if let Ok(val) = env::var("TUTOR_DATA_DIR") {
            if !val.is_empty() {
                self.paths.data_dir = Some(PathBuf::from(val));
            }
        }

        // TUTOR_STATE_FILE
        if let Ok(val) = env::var("TUTOR_STATE_FILE") {
            if !val.is_empty() {
                self.paths.state_file = Some(PathBuf::from(val));
            }
        }
    }

    /// Reset any section that a config file left in an unusable state.
    fn sanitize(&mut self) {
        let default_sched = SchedulerConfig::default();
        let sched = &mut self.scheduler;
        if !is_valid_probability(sched.mastery_threshold) {
            tracing::warn!(
                value = sched.mastery_threshold,
                "invalid scheduler.mastery_threshold, using default"
            );
            sched.mastery_threshold = default_sched.mastery_threshold;
        }
        if !is_valid_probability(sched.learning_ratio) {
            tracing::warn!(
                value = sched.learning_ratio,
                "invalid scheduler.learning_ratio, using default"
            );
            sched.learning_ratio = default_sched.learning_ratio;
        }
        if !SchedulerConfig::is_valid_decay_rate(sched.decay_rate_per_week) {
            tracing::warn!(
                value = sched.decay_rate_per_week,
                "invalid scheduler.decay_rate_per_week, using default"
            );
            sched.decay_rate_per_week = default_sched.decay_rate_per_week;
        }
        if !SchedulerConfig::is_valid_session_size(sched.session_size) {
            tracing::warn!("scheduler.session_size must be at least 1, using default");
            sched.session_size = default_sched.session_size;
        }

        if !self.bkt.is_valid() {
            tracing::warn!("invalid [bkt] calibration, using defaults");
            self.bkt = BktConfig::default();
        }
        if !MemoryConfig::is_valid_retention(self.memory.desired_retention) {
            tracing::warn!("invalid memory.desired_retention, using default");
            self.memory.desired_retention = MemoryConfig::default().desired_retention;
        }
        for (name, choice) in [
            ("multiple_choice", &mut self.exercises.multiple_choice),
            ("fill_blank", &mut self.exercises.fill_blank),
        ] {
            if !choice.is_valid() {
                tracing::warn!("invalid [exercises.{}] settings, using defaults", name);
                *choice = ChoiceConfig::default();
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field: every value in
    /// `other` that differs from the default replaces the value in `self`.
    ///
    /// # Limitation
    ///
    /// A layer cannot set a value back to its default once a lower layer has
    /// changed it, since "unset" and "explicitly default" look the same here.
    fn merge(mut self, other: Config) -> Self {
        let default_sched = SchedulerConfig::default();
        if other.scheduler.mastery_threshold != default_sched.mastery_threshold {
            self.scheduler.mastery_threshold = other.scheduler.mastery_threshold;
        }
        if other.scheduler.decay_rate_per_week != default_sched.decay_rate_per_week {
            self.scheduler.decay_rate_per_week = other.scheduler.decay_rate_per_week;
        }
        if other.scheduler.learning_ratio != default_sched.learning_ratio {
            self.scheduler.learning_ratio = other.scheduler.learning_ratio;
        }
        if other.scheduler.session_size != default_sched.session_size {
            self.scheduler.session_size = other.scheduler.session_size;
        }
        if other.scheduler.menu_interval != default_sched.menu_interval {
            self.scheduler.menu_interval = other.scheduler.menu_interval;
        }

        let default_bkt = BktConfig::default();
        if other.bkt.p_init != default_bkt.p_init {
            self.bkt.p_init = other.bkt.p_init;
        }
        if other.bkt.p_transit != default_bkt.p_transit {
            self.bkt.p_transit = other.bkt.p_transit;
        }
        if other.bkt.p_slip != default_bkt.p_slip {
            self.bkt.p_slip = other.bkt.p_slip;
        }
        if other.bkt.p_guess != default_bkt.p_guess {
            self.bkt.p_guess = other.bkt.p_guess;
        }

        let default_memory = MemoryConfig::default();
        if other.memory.desired_retention != default_memory.desired_retention {
            self.memory.desired_retention = other.memory.desired_retention;
        }
        if other.memory.maximum_interval_days != default_memory.maximum_interval_days {
            self.memory.maximum_interval_days = other.memory.maximum_interval_days;
        }

        self.exercises.multiple_choice =
            merge_choice(self.exercises.multiple_choice, other.exercises.multiple_choice);
        self.exercises.fill_blank =
            merge_choice(self.exercises.fill_blank, other.exercises.fill_blank);
        if other.exercises.seed.is_some() {
            self.exercises.seed = other.exercises.seed;
        }

        if other.paths.data_dir.is_some() {
            self.paths.data_dir = other.paths.data_dir;
        }
        if other.paths.state_file.is_some() {
            self.paths.state_file = other.paths.state_file;
        }

        self
    }

    /// Save configuration to `.tutor/config.toml` under `cwd`.
    pub fn save_project(&self, cwd: &Path) -> Result<()> {
        let config_path = cwd.join(".tutor").join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| TutorError::config(e.to_string()))?;
        write_atomic(&config_path, &content)
    }

    /// Content directory: configured path, else `<project_root>/data`.
    pub fn data_dir(&self, cwd: &Path) -> PathBuf {
        match &self.paths.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => find_project_root(cwd).join("data"),
        }
    }

    /// Mastery state file: configured path, else `<tutor_home>/mastery.json`.
    pub fn state_file(&self, cwd: &Path) -> PathBuf {
        match &self.paths.state_file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => cwd.join(file),
            None => tutor_home()
                .unwrap_or_else(fallback_tutor_home)
                .join("mastery.json"),
        }
    }
}

fn merge_choice(mut base: ChoiceConfig, other: ChoiceConfig) -> ChoiceConfig {
    let default = ChoiceConfig::default();
    if other.total_options != default.total_options {
        base.total_options = other.total_options;
    }
    if other.min_distractors != default.min_distractors {
        base.min_distractors = other.min_distractors;
    }
    if other.max_distractors != default.max_distractors {
        base.max_distractors = other.max_distractors;
    }
    if other.shuffle != default.shuffle {
        base.shuffle = other.shuffle;
    }
    base
}

/// Get the tutor home directory.
///
/// Checks `TUTOR_HOME` first, then falls back to `~/.tutor`. An empty
/// `TUTOR_HOME` is ignored.
pub fn tutor_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("TUTOR_HOME") {
        if home.is_empty() {
            tracing::warn!("TUTOR_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("TUTOR_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".tutor"));
    }

    let fallback_path = fallback_tutor_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

fn fallback_tutor_home() -> PathBuf {
    env::temp_dir().join("tutor")
}

/// Find the project root: the nearest ancestor holding a `.tutor/` or
/// `data/` directory, else `cwd` itself.
pub fn find_project_root(cwd: &Path) -> PathBuf {
    for ancestor in cwd.ancestors() {
        if ancestor.join(".tutor").is_dir() {
            return ancestor.to_path_buf();
        }
    }
    for ancestor in cwd.ancestors() {
        if ancestor.join("data").is_dir() {
            return ancestor.to_path_buf();
        }
    }
    cwd.to_path_buf()
}

/// Get the project `.tutor/` directory for a working directory.
pub fn project_tutor_dir(cwd: &Path) -> PathBuf {
    find_project_root(cwd).join(".tutor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "TUTOR_MASTERY_THRESHOLD",
        "TUTOR_DECAY_RATE",
        "TUTOR_LEARNING_RATIO",
        "TUTOR_SESSION_SIZE",
        "TUTOR_SEED",
        "TUTOR_DATA_DIR",
        "TUTOR_STATE_FILE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!((config.scheduler.mastery_threshold - 0.95).abs() < f64::EPSILON);
        assert!((config.scheduler.learning_ratio - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.scheduler.session_size, 10);
        assert_eq!(config.scheduler.menu_interval, 10);

        assert_eq!(config.bkt.p_init, 0.0);
        assert!((config.bkt.p_transit - 0.3).abs() < f64::EPSILON);
        assert!((config.bkt.p_slip - 0.1).abs() < f64::EPSILON);
        assert!((config.bkt.p_guess - 0.2).abs() < f64::EPSILON);

        assert!((config.memory.desired_retention - 0.9).abs() < f64::EPSILON);

        let mc = config.exercises.multiple_choice;
        assert_eq!(mc.total_options, 4);
        assert_eq!(mc.min_distractors, 1);
        assert_eq!(mc.max_distractors, 3);
        assert!(mc.shuffle);
        assert_eq!(config.exercises.seed, None);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[scheduler]
session_size = 20
learning_ratio = 0.5

[exercises.multiple_choice]
total_options = 5
shuffle = false
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.scheduler.session_size, 20);
        assert!((config.scheduler.learning_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.exercises.multiple_choice.total_options, 5);
        assert!(!config.exercises.multiple_choice.shuffle);
        // Untouched sections keep defaults
        assert_eq!(config.exercises.fill_blank, ChoiceConfig::default());
        assert_eq!(config.bkt, BktConfig::default());
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(TutorError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(TutorError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let tutor_dir = dir.path().join(".tutor");
        fs::create_dir_all(&tutor_dir).unwrap();
        fs::write(
            tutor_dir.join("config.toml"),
            "[scheduler]\nsession_size = 7\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.scheduler.session_size, 7);
        assert!((config.scheduler.learning_ratio - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    #[serial]
    fn test_project_config_out_of_range_scheduler_values_reset() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let tutor_dir = dir.path().join(".tutor");
        fs::create_dir_all(&tutor_dir).unwrap();
        fs::write(
            tutor_dir.join("config.toml"),
            "[scheduler]\n\
             mastery_threshold = 1.5\n\
             learning_ratio = -3.0\n\
             decay_rate_per_week = -1.0\n\
             session_size = 0\n\
             menu_interval = 4\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());
        let defaults = SchedulerConfig::default();

        assert_eq!(config.scheduler.mastery_threshold, defaults.mastery_threshold);
        assert_eq!(config.scheduler.learning_ratio, defaults.learning_ratio);
        assert_eq!(config.scheduler.decay_rate_per_week, defaults.decay_rate_per_week);
        assert_eq!(config.scheduler.session_size, defaults.session_size);
        // Valid neighbours survive
        assert_eq!(config.scheduler.menu_interval, 4);
    }

    #[test]
    fn test_sanitize_rejects_nan_threshold() {
        let mut config = Config::default();
        config.scheduler.mastery_threshold = f64::NAN;
        config.sanitize();
        assert_eq!(config.scheduler.mastery_threshold, MASTERY_THRESHOLD);
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let tutor_dir = dir.path().join(".tutor");
        fs::create_dir_all(&tutor_dir).unwrap();
        fs::write(
            tutor_dir.join("config.toml"),
            "[scheduler]\nsession_size = 7\n",
        )
        .unwrap();

        env::set_var("TUTOR_SESSION_SIZE", "12");
        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config.scheduler.session_size, 12);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        clear_env();
        env::set_var("TUTOR_MASTERY_THRESHOLD", "0.9");
        env::set_var("TUTOR_DECAY_RATE", "0.1");
        env::set_var("TUTOR_LEARNING_RATIO", "0.5");
        env::set_var("TUTOR_SEED", "42");
        env::set_var("TUTOR_DATA_DIR", "/srv/content");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert!((config.scheduler.mastery_threshold - 0.9).abs() < f64::EPSILON);
        assert!((config.scheduler.decay_rate_per_week - 0.1).abs() < f64::EPSILON);
        assert!((config.scheduler.learning_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.exercises.seed, Some(42));
        assert_eq!(config.paths.data_dir, Some(PathBuf::from("/srv/content")));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_ignored() {
        clear_env();
        env::set_var("TUTOR_MASTERY_THRESHOLD", "1.5");
        env::set_var("TUTOR_SESSION_SIZE", "0");
        env::set_var("TUTOR_DECAY_RATE", "fast");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.scheduler, SchedulerConfig::default());

        clear_env();
    }

    #[test]
    fn test_merge_field_by_field() {
        let mut user = Config::default();
        user.scheduler.session_size = 15;
        user.exercises.multiple_choice.total_options = 6;

        let mut project = Config::default();
        project.scheduler.learning_ratio = 0.6;
        project.exercises.multiple_choice.shuffle = false;

        let merged = Config::default().merge(user).merge(project);

        assert_eq!(merged.scheduler.session_size, 15);
        assert!((merged.scheduler.learning_ratio - 0.6).abs() < f64::EPSILON);
        assert_eq!(merged.exercises.multiple_choice.total_options, 6);
        assert!(!merged.exercises.multiple_choice.shuffle);
    }

    #[test]
    fn test_sanitize_resets_invalid_sections() {
        let mut config = Config::default();
        config.bkt.p_slip = 1.5;
        config.exercises.fill_blank.total_options = 9;
        config.memory.desired_retention = 1.0;

        config.sanitize();

        assert_eq!(config.bkt, BktConfig::default());
        assert_eq!(config.exercises.fill_blank, ChoiceConfig::default());
        assert!((config.memory.desired_retention - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_choice_config_validation() {
        assert!(ChoiceConfig::default().is_valid());
        let too_many = ChoiceConfig {
            total_options: 7,
            ..ChoiceConfig::default()
        };
        assert!(!too_many.is_valid());
        let inverted = ChoiceConfig {
            min_distractors: 3,
            max_distractors: 1,
            ..ChoiceConfig::default()
        };
        assert!(!inverted.is_valid());
    }

    #[test]
    fn test_save_project_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.scheduler.session_size = 25;
        config.exercises.seed = Some(7);

        config.save_project(dir.path()).unwrap();
        let loaded = Config::load_from_file(&dir.path().join(".tutor/config.toml")).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_data_dir_resolution() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        let nested = dir.path().join("lessons");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::default();
        assert_eq!(config.data_dir(&nested), dir.path().join("data"));

        let mut custom = Config::default();
        custom.paths.data_dir = Some(PathBuf::from("content"));
        assert_eq!(custom.data_dir(&nested), nested.join("content"));
    }

    #[test]
    #[serial]
    fn test_tutor_home_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("TUTOR_HOME", dir.path());
        assert_eq!(tutor_home(), Some(dir.path().to_path_buf()));

        let config = Config::default();
        assert_eq!(
            config.state_file(dir.path()),
            dir.path().join("mastery.json")
        );
        env::remove_var("TUTOR_HOME");
    }
}
