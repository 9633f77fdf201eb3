use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::database::Database;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TOAST_SECS: u64 = 3;

/// Runtime settings: defaults, then the config table, then environment, then CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub toast: Duration,
    pub kanban_data: Option<PathBuf>,
    pub request_timeout: Option<Duration>,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Settings {
            base_url: DEFAULT_BASE_URL.to_string(),
            toast: Duration::from_secs(DEFAULT_TOAST_SECS),
            kanban_data: None,
            request_timeout: None,
            log_file: PathBuf::from(home_dir).join(".gear-guard").join("gear-guard.log"),
        }
    }
}

/// Values that override stored config for one run.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub kanban_data: Option<PathBuf>,
}

/// Whole seconds from a stored value; unparseable values are skipped with a warning.
fn parse_secs(key: &str, raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            log::warn!("ignoring config '{}': expected whole seconds, got '{}'", key, raw);
            None
        }
    }
}

impl Settings {
    pub fn load(db: &Database, overrides: &Overrides) -> Result<Self> {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self::resolve(db, overrides, env)
    }

    fn resolve(db: &Database, overrides: &Overrides, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();

        if let Some(url) = db.get_config("base_url")? {
            settings.base_url = url;
        }
        if let Some(toast) = db.get_config("toast_secs")?.and_then(|raw| parse_secs("toast_secs", &raw)) {
            settings.toast = toast;
        }
        if let Some(path) = db.get_config("kanban_data")? {
            settings.kanban_data = Some(PathBuf::from(path));
        }
        if let Some(raw) = db.get_config("request_timeout_secs")? {
            settings.request_timeout = parse_secs("request_timeout_secs", &raw);
        }
        if let Some(path) = db.get_config("log_file")? {
            settings.log_file = PathBuf::from(path);
        }

        if let Some(url) = env("GEARGUARD_BASE_URL") {
            settings.base_url = url;
        }
        if let Some(path) = env("GEARGUARD_KANBAN_DATA") {
            settings.kanban_data = Some(PathBuf::from(path));
        }

        if let Some(url) = &overrides.base_url {
            settings.base_url = url.clone();
        }
        if let Some(path) = &overrides.kanban_data {
            settings.kanban_data = Some(path.clone());
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_when_nothing_is_stored() {
        let db = Database::in_memory().unwrap();
        let s = Settings::resolve(&db, &Overrides::default(), no_env).unwrap();
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.toast, Duration::from_secs(3));
        assert_eq!(s.kanban_data, None);
        assert_eq!(s.request_timeout, None);
    }

    #[test]
    fn stored_values_apply() {
        let db = Database::in_memory().unwrap();
        db.set_config("toast_secs", "7").unwrap();
        db.set_config("request_timeout_secs", "15").unwrap();
        db.set_config("kanban_data", "/tmp/board.json").unwrap();
        let s = Settings::resolve(&db, &Overrides::default(), no_env).unwrap();
        assert_eq!(s.toast, Duration::from_secs(7));
        assert_eq!(s.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(s.kanban_data, Some(PathBuf::from("/tmp/board.json")));
    }

    #[test]
    fn env_beats_table_and_flags_beat_env() {
        let db = Database::in_memory().unwrap();
        db.set_config("base_url", "http://table").unwrap();
        let env = |name: &str| (name == "GEARGUARD_BASE_URL").then(|| "http://env".to_string());

        let s = Settings::resolve(&db, &Overrides::default(), env).unwrap();
        assert_eq!(s.base_url, "http://env");

        let flags = Overrides { base_url: Some("http://flag".into()), kanban_data: None };
        let s = Settings::resolve(&db, &flags, env).unwrap();
        assert_eq!(s.base_url, "http://flag");
    }

    #[test]
    fn bad_stored_number_falls_back_to_default() {
        let db = Database::in_memory().unwrap();
        db.set_config("toast_secs", "9").unwrap();
        db.set_config("request_timeout_secs", "20").unwrap();
        db.raw_set("toast_secs", "soon");
        db.raw_set("request_timeout_secs", "never");
        let s = Settings::resolve(&db, &Overrides::default(), no_env).unwrap();
        assert_eq!(s.toast, Duration::from_secs(DEFAULT_TOAST_SECS));
        assert_eq!(s.request_timeout, None);
    }
}
