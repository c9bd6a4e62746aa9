//! Conversion of free text and shorthand into concrete dates and times.
//!
//! Every parser here is total: input that cannot be understood yields `None`
//! rather than a guess.

use std::ops::Range;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, Weekday};
use regex::{Captures, Regex};

use crate::config::DateOrder;

/// A date found inside a larger piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    /// The exact substring that produced the date.
    pub matched: String,
    /// Input with the match removed and whitespace collapsed.
    pub remaining: String,
}

/// Adds (or subtracts) calendar months, clamping to the end of shorter months.
pub fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// Zero-padded 24-hour `HH:MM`.
pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Compact duration such as `45m`, `2h` or `1h 30m`. Zero is empty.
pub fn format_estimate(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, 0) => String::new(),
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Parses loosely typed times of day.
///
/// Accepts `9`, `930`, `0930`, `2:30`, `230 pm`, `9am` and `12am`.
pub fn parse_flexible_time(input: &str) -> Option<NaiveTime> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let (digits, meridiem) = if let Some(rest) = compact.strip_suffix("am") {
        (rest, Some(false))
    } else if let Some(rest) = compact.strip_suffix("pm") {
        (rest, Some(true))
    } else if let Some(rest) = compact.strip_suffix('a') {
        (rest, Some(false))
    } else if let Some(rest) = compact.strip_suffix('p') {
        (rest, Some(true))
    } else {
        (compact.as_str(), None)
    };

    let (hour, minute) = match digits.split_once(':') {
        Some((h, m)) => {
            if h.is_empty() || h.len() > 2 || m.len() != 2 {
                return None;
            }
            (parse_digits(h)?, parse_digits(m)?)
        }
        None if !digits.chars().all(|c| c.is_ascii_digit()) => return None,
        None => match digits.len() {
            1 | 2 => (parse_digits(digits)?, 0),
            3 => (parse_digits(&digits[..1])?, parse_digits(&digits[1..])?),
            4 => (parse_digits(&digits[..2])?, parse_digits(&digits[2..])?),
            _ => return None,
        },
    };

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (pm, hour) {
                (false, 12) => 0,
                (true, 12) => 12,
                (true, h) => h + 12,
                (false, h) => h,
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// [`parse_flexible_time`] rendered as `HH:MM`, or the empty string.
pub fn normalize_time(input: &str) -> String {
    parse_flexible_time(input).map(format_hhmm).unwrap_or_default()
}

fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Date parser bound to a reference day and a numeric date order.
#[derive(Debug, Clone, Copy)]
pub struct TemporalParser {
    today: NaiveDate,
    order: DateOrder,
}

impl TemporalParser {
    pub fn new(today: NaiveDate, order: DateOrder) -> Self {
        TemporalParser { today, order }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Parses `T`, `D`, `W` or `M` followed by an optional signed offset.
    ///
    /// `T` and `D` count days, `W` weeks and `M` calendar months. `T` alone is today.
    pub fn parse_shorthand(&self, token: &str) -> Option<NaiveDate> {
        let caps = shorthand_re().captures(token.trim())?;
        let unit = caps[1].to_ascii_uppercase();
        let offset: i64 = match (caps.get(2), caps.get(3)) {
            (Some(sign), Some(n)) => {
                let n: i64 = n.as_str().parse().ok()?;
                if sign.as_str() == "-" {
                    -n
                } else {
                    n
                }
            }
            _ => 0,
        };

        match unit.as_str() {
            "T" | "D" => self.today.checked_add_signed(Duration::try_days(offset)?),
            "W" => self
                .today
                .checked_add_signed(Duration::try_weeks(offset)?),
            "M" => add_months(self.today, offset),
            _ => None,
        }
    }

    /// Finds the first recognizable date phrase in `text`.
    ///
    /// Patterns are tried in a fixed order and the first one that yields a
    /// date wins: relative keywords, weekday names (optionally with `next`),
    /// `in N days/weeks/months`, `next week/month`, `end of week/month`,
    /// then numeric `A/B[/Y]` dates.
    pub fn parse_natural_language_date(&self, text: &str) -> Option<DateMatch> {
        let lowered = text.to_lowercase();
        let (span, date) = self
            .find_phrase(&lowered)
            .or_else(|| self.find_numeric(&lowered))?;

        // Lowercasing can shift byte offsets for some scripts; fall back to
        // the lowered text in that case.
        let source = if lowered.len() == text.len()
            && text.is_char_boundary(span.start)
            && text.is_char_boundary(span.end)
        {
            text
        } else {
            lowered.as_str()
        };
        let matched = source[span.clone()].to_string();
        let remaining = collapse_whitespace(&format!(
            "{} {}",
            &source[..span.start],
            &source[span.end..]
        ));
        Some(DateMatch {
            date,
            matched,
            remaining,
        })
    }

    fn find_phrase(&self, lowered: &str) -> Option<(Range<usize>, NaiveDate)> {
        let resolvers: [(&Regex, fn(&Self, &Captures) -> Option<NaiveDate>); 5] = [
            (relative_re(), Self::resolve_relative),
            (weekday_re(), Self::resolve_weekday),
            (in_n_re(), Self::resolve_in_n),
            (next_period_re(), Self::resolve_next_period),
            (end_of_re(), Self::resolve_end_of),
        ];
        resolvers.into_iter().find_map(|(re, resolve)| {
            re.captures_iter(lowered).find_map(|caps| {
                let date = resolve(self, &caps)?;
                Some((caps.get(0)?.range(), date))
            })
        })
    }

    /// Numeric dates only count as a whole whitespace-separated token.
    ///
    /// Inside longer text the yearless form needs a slash, so ranges like
    /// `2-3` and prices like `1.99` stay part of the title. A token that does
    /// not form a real date is skipped and the search goes on.
    fn find_numeric(&self, lowered: &str) -> Option<(Range<usize>, NaiveDate)> {
        let trimmed = lowered.trim();
        let standalone = !trimmed.is_empty() && !trimmed.contains(char::is_whitespace);

        token_re().find_iter(lowered).find_map(|token| {
            let core = token.as_str().trim_end_matches([',', ';', '!', '?']);
            let caps = numeric_re().captures(core)?;
            let sep = caps.get(2)?.as_str();
            let date = match caps.get(5) {
                Some(year) => {
                    if caps.get(4).map(|m| m.as_str()) != Some(sep) {
                        return None;
                    }
                    self.resolve_numeric(&caps[1], &caps[3], Some(year.as_str()))?
                }
                None if !standalone && sep != "/" => return None,
                None => self.resolve_numeric(&caps[1], &caps[3], None)?,
            };
            Some((token.start()..token.start() + core.len(), date))
        })
    }

    /// ISO `YYYY-MM-DD`, then shorthand, then natural language.
    pub fn parse_date_input(&self, input: &str) -> Option<NaiveDate> {
        let trimmed = input.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .or_else(|| self.parse_shorthand(trimmed))
            .or_else(|| self.parse_natural_language_date(trimmed).map(|m| m.date))
    }

    fn resolve_relative(&self, caps: &Captures) -> Option<NaiveDate> {
        match &caps[1] {
            "today" => Some(self.today),
            "tomorrow" => self.today.succ_opt(),
            "yesterday" => self.today.pred_opt(),
            _ => None,
        }
    }

    fn resolve_weekday(&self, caps: &Captures) -> Option<NaiveDate> {
        let target = weekday_from_name(&caps[2])?;
        let current = self.today.weekday().num_days_from_monday() as i64;
        let wanted = target.num_days_from_monday() as i64;
        let mut ahead = (wanted - current).rem_euclid(7);
        if ahead == 0 {
            ahead = 7;
        }
        if caps.get(1).is_some() {
            // "next" skips past the nearest occurrence.
            ahead += 7;
        }
        self.today.checked_add_signed(Duration::try_days(ahead)?)
    }

    fn resolve_in_n(&self, caps: &Captures) -> Option<NaiveDate> {
        let n: i64 = caps[1].parse().ok()?;
        let unit = &caps[2];
        if unit.starts_with("day") {
            self.today.checked_add_signed(Duration::try_days(n)?)
        } else if unit.starts_with("week") {
            self.today.checked_add_signed(Duration::try_weeks(n)?)
        } else {
            add_months(self.today, n)
        }
    }

    fn resolve_next_period(&self, caps: &Captures) -> Option<NaiveDate> {
        match &caps[1] {
            "week" => self.today.checked_add_signed(Duration::try_days(7)?),
            _ => add_months(self.today, 1),
        }
    }

    fn resolve_end_of(&self, caps: &Captures) -> Option<NaiveDate> {
        match &caps[1] {
            // End of the work week: the coming Friday, today if it is Friday.
            "week" => {
                let weekday = self.today.weekday().num_days_from_monday() as i64;
                let friday = Weekday::Fri.num_days_from_monday() as i64;
                let to_friday = (friday - weekday).rem_euclid(7);
                self.today.checked_add_signed(Duration::try_days(to_friday)?)
            }
            _ => {
                let first = self.today.with_day(1)?;
                add_months(first, 1)?.pred_opt()
            }
        }
    }

    fn resolve_numeric(&self, first: &str, second: &str, year: Option<&str>) -> Option<NaiveDate> {
        let a: u32 = first.parse().ok()?;
        let b: u32 = second.parse().ok()?;
        let (day, month) = match self.order {
            DateOrder::DayFirst => (a, b),
            DateOrder::MonthFirst => (b, a),
        };
        match year {
            Some(y) => {
                let mut year: i32 = y.parse().ok()?;
                if y.len() == 2 {
                    year += 2000;
                } else if y.len() != 4 {
                    return None;
                }
                NaiveDate::from_ymd_opt(year, month, day)
            }
            None => {
                let this_year = NaiveDate::from_ymd_opt(self.today.year(), month, day);
                match this_year {
                    Some(d) if d >= self.today => Some(d),
                    _ => NaiveDate::from_ymd_opt(self.today.year() + 1, month, day),
                }
            }
        }
    }
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    let day = match name {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tues" | "tue" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" | "thurs" | "thur" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        "sunday" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static date pattern compiles"))
}

fn shorthand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^(?i)([TDWM])(?:([+-])(\d{1,4}))?$")
}

fn relative_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\b(today|tomorrow|yesterday)\b")
}

fn weekday_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(
        &RE,
        // No `wed`, `sat` or `sun`: those are ordinary words in a title.
        r"\b(next\s+)?(monday|mon|tuesday|tues|tue|wednesday|thursday|thurs|thur|thu|friday|fri|saturday|sunday)\b",
    )
}

fn in_n_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\bin\s+(\d{1,4})\s+(days?|weeks?|months?)\b")
}

fn next_period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\bnext\s+(week|month)\b")
}

fn end_of_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\bend\s+of\s+(?:the\s+)?(week|month)\b")
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"^(\d{1,2})([/.\-])(\d{1,2})(?:([/.\-])(\d{4}|\d{2}))?$")
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"\S+")
}
