use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{Locale, TimeZone, Utc};

/// Order of the day and month numerals in `A/B` style dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `15/1` is the 15th of January.
    DayFirst,
    /// `1/15` is the 15th of January.
    MonthFirst,
}

static SYSTEM_DATE_ORDER: OnceLock<DateOrder> = OnceLock::new();

impl DateOrder {
    /// Formats 2000-01-15 with the locale's short date pattern and checks
    /// whether the month (1) or the day (15) comes out first.
    ///
    /// Locale names may carry an encoding or modifier (`de_DE.UTF-8@euro`).
    /// Unknown names fall back to POSIX, which is month first.
    pub fn probe(locale_name: &str) -> DateOrder {
        let base = locale_name
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .replace('-', "_");
        let locale = Locale::try_from(base.as_str()).unwrap_or(Locale::POSIX);

        let reference = match Utc.with_ymd_and_hms(2000, 1, 15, 12, 0, 0).single() {
            Some(dt) => dt,
            None => return DateOrder::MonthFirst,
        };
        let rendered = reference.format_localized("%x", locale).to_string();
        Self::from_rendered(&rendered)
    }

    /// Scans numeric fields left to right; the first one that is 1 or 15 decides.
    fn from_rendered(rendered: &str) -> DateOrder {
        for field in rendered.split(|c: char| !c.is_ascii_digit()) {
            match field.parse::<u32>() {
                Ok(1) => return DateOrder::MonthFirst,
                Ok(15) => return DateOrder::DayFirst,
                _ => continue,
            }
        }
        DateOrder::MonthFirst
    }

    /// Process-wide order derived from `LC_ALL`, `LC_TIME` or `LANG`.
    ///
    /// Computed on first use and reused afterwards.
    pub fn system() -> DateOrder {
        *SYSTEM_DATE_ORDER.get_or_init(|| {
            let name = ["LC_ALL", "LC_TIME", "LANG"]
                .iter()
                .filter_map(|key| std::env::var(key).ok())
                .find(|v| !v.is_empty())
                .unwrap_or_else(|| "POSIX".to_string());
            let order = DateOrder::probe(&name);
            tracing::debug!(locale = %name, ?order, "probed numeric date order");
            order
        })
    }

    /// Parses the `PLANUST_DATE_ORDER` override.
    pub fn from_setting(value: &str) -> Option<DateOrder> {
        match value.trim().to_lowercase().as_str() {
            "dmy" | "day" | "day-first" => Some(DateOrder::DayFirst),
            "mdy" | "month" | "month-first" => Some(DateOrder::MonthFirst),
            _ => None,
        }
    }
}

/// Runtime settings for the command line front end.
#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the JSON task database.
    pub db_path: PathBuf,
    /// How numeric dates such as `3/4` are read.
    pub date_order: DateOrder,
}

impl Config {
    /// Resolves the configuration from the environment.
    ///
    /// 1. `PLANUST_DB` overrides the database path, otherwise
    ///    `<data dir>/planust/tasks.json` (`./tasks.json` as a last resort).
    /// 2. `PLANUST_DATE_ORDER` (`dmy`/`mdy`) overrides the locale probe.
    pub fn from_env() -> Config {
        let db_path = std::env::var("PLANUST_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        let date_order = std::env::var("PLANUST_DATE_ORDER")
            .ok()
            .and_then(|v| {
                let parsed = DateOrder::from_setting(&v);
                if parsed.is_none() {
                    tracing::warn!(value = %v, "ignoring unrecognized PLANUST_DATE_ORDER");
                }
                parsed
            })
            .unwrap_or_else(DateOrder::system);

        Config { db_path, date_order }
    }
}

fn default_db_path() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("planust");
    p.push("tasks.json");
    p
}
