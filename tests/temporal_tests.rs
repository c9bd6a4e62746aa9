mod common;

use chrono::{Datelike, Duration, Weekday};
use common::{hm, today, ymd};
use planust::config::DateOrder;
use planust::temporal::{
    add_months, format_estimate, normalize_time, parse_flexible_time, TemporalParser,
};
use proptest::prelude::*;

fn parser() -> TemporalParser {
    TemporalParser::new(today(), DateOrder::DayFirst)
}

#[test]
fn test_shorthand_units() {
    let p = parser();
    assert_eq!(p.parse_shorthand("T"), Some(today()));
    assert_eq!(p.parse_shorthand("T+3"), Some(ymd(2026, 10, 17)));
    assert_eq!(p.parse_shorthand("D-2"), Some(ymd(2026, 10, 12)));
    assert_eq!(p.parse_shorthand("W+1"), Some(ymd(2026, 10, 21)));
    assert_eq!(p.parse_shorthand("W-1"), Some(ymd(2026, 10, 7)));
    assert_eq!(p.parse_shorthand("M+1"), Some(ymd(2026, 11, 14)));
    assert_eq!(p.parse_shorthand("M-1"), Some(ymd(2026, 9, 14)));
    assert_eq!(p.parse_shorthand("t+3"), Some(ymd(2026, 10, 17)));
}

#[test]
fn test_shorthand_rejects_garbage() {
    let p = parser();
    for token in ["", "X+1", "T+", "T3", "TT", "W+x", "+3"] {
        assert_eq!(p.parse_shorthand(token), None, "token {:?}", token);
    }
}

proptest! {
    #[test]
    fn shorthand_offsets_match_units(n in 0i64..500, unit in prop::sample::select(vec!['T', 'D', 'W'])) {
        let p = parser();
        for (sign, factor) in [('+', 1i64), ('-', -1i64)] {
            let token = format!("{}{}{}", unit, sign, n);
            let days = if unit == 'W' { n * 7 } else { n };
            prop_assert_eq!(p.parse_shorthand(&token), Some(today() + Duration::days(days * factor)));
        }
    }
}

#[test]
fn test_next_weekday_skips_nearest_occurrence() {
    // 2026-10-14 is a Wednesday; the nearest Monday is 10-19.
    let found = parser().parse_natural_language_date("next monday").unwrap();
    assert_eq!(found.date, ymd(2026, 10, 26));
    assert_eq!(found.date.weekday(), Weekday::Mon);
    assert_ne!(found.date, ymd(2026, 10, 19));
}

#[test]
fn test_bare_weekday_is_nearest_future_occurrence() {
    let p = parser();
    assert_eq!(p.parse_natural_language_date("monday").unwrap().date, ymd(2026, 10, 19));
    assert_eq!(p.parse_natural_language_date("fri").unwrap().date, ymd(2026, 10, 16));
    // Same weekday as today means a week out.
    assert_eq!(p.parse_natural_language_date("wednesday").unwrap().date, ymd(2026, 10, 21));
}

#[test]
fn test_weekday_phrases_on_that_weekday() {
    let monday = TemporalParser::new(ymd(2026, 10, 12), DateOrder::DayFirst);
    assert_eq!(monday.parse_natural_language_date("monday").unwrap().date, ymd(2026, 10, 19));
    assert_eq!(monday.parse_natural_language_date("next monday").unwrap().date, ymd(2026, 10, 26));
}

#[test]
fn test_match_and_remaining_text() {
    let found = parser().parse_natural_language_date("Call mom tomorrow please").unwrap();
    assert_eq!(found.date, ymd(2026, 10, 15));
    assert_eq!(found.matched, "tomorrow");
    assert_eq!(found.remaining, "Call mom please");

    let found = parser().parse_natural_language_date("Dentist Next Friday").unwrap();
    assert_eq!(found.date, ymd(2026, 10, 23));
    assert_eq!(found.matched, "Next Friday");
    assert_eq!(found.remaining, "Dentist");
}

#[test]
fn test_relative_and_period_phrases() {
    let p = parser();
    let date = |s: &str| p.parse_natural_language_date(s).map(|m| m.date);
    assert_eq!(date("today"), Some(today()));
    assert_eq!(date("yesterday"), Some(ymd(2026, 10, 13)));
    assert_eq!(date("in 3 days"), Some(ymd(2026, 10, 17)));
    assert_eq!(date("in 1 day"), Some(ymd(2026, 10, 15)));
    assert_eq!(date("in 2 weeks"), Some(ymd(2026, 10, 28)));
    assert_eq!(date("in 1 month"), Some(ymd(2026, 11, 14)));
    assert_eq!(date("next week"), Some(ymd(2026, 10, 21)));
    assert_eq!(date("next month"), Some(ymd(2026, 11, 14)));
    assert_eq!(date("end of week"), Some(ymd(2026, 10, 16)));
    assert_eq!(date("end of month"), Some(ymd(2026, 10, 31)));
    assert_eq!(date("end of the month"), Some(ymd(2026, 10, 31)));
}

#[test]
fn test_end_of_week_is_friday() {
    let on = |d| {
        TemporalParser::new(d, DateOrder::DayFirst)
            .parse_natural_language_date("end of week")
            .map(|m| m.date)
    };
    assert_eq!(on(ymd(2026, 10, 16)), Some(ymd(2026, 10, 16)));
    assert_eq!(on(ymd(2026, 10, 17)), Some(ymd(2026, 10, 23)));
    assert_eq!(on(ymd(2026, 10, 18)), Some(ymd(2026, 10, 23)));
}

#[test]
fn test_first_pattern_wins() {
    let p = parser();
    let found = p.parse_natural_language_date("tomorrow or next friday").unwrap();
    assert_eq!(found.date, ymd(2026, 10, 15));
    assert_eq!(found.remaining, "or next friday");

    let found = p.parse_natural_language_date("pay rent 1/11 today").unwrap();
    assert_eq!(found.date, today());
}

#[test]
fn test_no_date_in_text() {
    let p = parser();
    assert_eq!(p.parse_natural_language_date("buy milk"), None);
    assert_eq!(p.parse_natural_language_date("monthly report"), None);
    assert_eq!(p.parse_natural_language_date(""), None);
}

#[test]
fn test_numeric_dates_follow_date_order() {
    let dmy = TemporalParser::new(today(), DateOrder::DayFirst);
    let mdy = TemporalParser::new(today(), DateOrder::MonthFirst);

    assert_eq!(dmy.parse_natural_language_date("3/4/2027").unwrap().date, ymd(2027, 4, 3));
    assert_eq!(mdy.parse_natural_language_date("3/4/2027").unwrap().date, ymd(2027, 3, 4));
    assert_eq!(dmy.parse_natural_language_date("3.4.27").unwrap().date, ymd(2027, 4, 3));

    // No year and already past this year: next year.
    assert_eq!(dmy.parse_natural_language_date("15/1").unwrap().date, ymd(2027, 1, 15));
    assert_eq!(mdy.parse_natural_language_date("1/15").unwrap().date, ymd(2027, 1, 15));
    // Still ahead this year.
    assert_eq!(dmy.parse_natural_language_date("20/12").unwrap().date, ymd(2026, 12, 20));
}

#[test]
fn test_impossible_numeric_date_is_no_match() {
    let dmy = TemporalParser::new(today(), DateOrder::DayFirst);
    assert_eq!(dmy.parse_natural_language_date("31/2/2027"), None);
    assert_eq!(dmy.parse_natural_language_date("15/13"), None);
}

#[test]
fn test_unresolvable_candidate_does_not_stop_the_search() {
    let p = parser();
    let found = p.parse_natural_language_date("v1.99 due 3/4").unwrap();
    assert_eq!(found.date, ymd(2027, 4, 3));
    assert_eq!(found.remaining, "v1.99 due");

    let found = p.parse_natural_language_date("not 31/2 but 3/4").unwrap();
    assert_eq!(found.date, ymd(2027, 4, 3));
    assert_eq!(found.matched, "3/4");
    assert_eq!(found.remaining, "not 31/2 but");
}

#[test]
fn test_numeric_tokens_inside_words_are_ignored() {
    let p = parser();
    assert_eq!(p.parse_natural_language_date("Order 2-3 chairs"), None);
    assert_eq!(p.parse_natural_language_date("release 1.2"), None);
    assert_eq!(p.parse_natural_language_date("room a3/4b"), None);
    assert_eq!(p.parse_natural_language_date("Fix sun roof"), None);
    assert_eq!(p.parse_natural_language_date("Lunch w Sam"), None);
    // A mixed-separator year form is not a date.
    assert_eq!(p.parse_natural_language_date("3/4-27"), None);
    // On its own the token is unambiguous.
    assert_eq!(p.parse_natural_language_date("3-4").unwrap().date, ymd(2027, 4, 3));
}

#[test]
fn test_parse_date_input() {
    let p = parser();
    assert_eq!(p.parse_date_input("2026-12-01"), Some(ymd(2026, 12, 1)));
    assert_eq!(p.parse_date_input(" T+1 "), Some(ymd(2026, 10, 15)));
    assert_eq!(p.parse_date_input("next week"), Some(ymd(2026, 10, 21)));
    assert_eq!(p.parse_date_input("whenever"), None);
}

#[test]
fn test_flexible_times() {
    let cases = [
        ("9", hm(9, 0)),
        ("930", hm(9, 30)),
        ("0930", hm(9, 30)),
        ("2:30", hm(2, 30)),
        ("230 pm", hm(14, 30)),
        ("9am", hm(9, 0)),
        ("9 AM", hm(9, 0)),
        ("12am", hm(0, 0)),
        ("12pm", hm(12, 0)),
        ("12:45pm", hm(12, 45)),
        ("23:59", hm(23, 59)),
        ("7p", hm(19, 0)),
    ];
    for (input, expected) in cases {
        assert_eq!(parse_flexible_time(input), Some(expected), "input {:?}", input);
    }
}

#[test]
fn test_flexible_time_sentinel() {
    for input in ["", "25", "2400", "9:7", "abc", "13pm", "0am", "12345", ":30", "9:300"] {
        assert_eq!(parse_flexible_time(input), None, "input {:?}", input);
    }
    assert_eq!(normalize_time("930"), "09:30");
    assert_eq!(normalize_time("230 pm"), "14:30");
    assert_eq!(normalize_time("nope"), "");
}

#[test]
fn test_add_months_clamps_to_month_end() {
    assert_eq!(add_months(ymd(2026, 1, 31), 1), Some(ymd(2026, 2, 28)));
    assert_eq!(add_months(ymd(2026, 3, 31), -1), Some(ymd(2026, 2, 28)));
    assert_eq!(add_months(ymd(2026, 10, 14), 0), Some(ymd(2026, 10, 14)));
}

#[test]
fn test_locale_probe() {
    assert_eq!(DateOrder::probe("en_US"), DateOrder::MonthFirst);
    assert_eq!(DateOrder::probe("en_US.UTF-8"), DateOrder::MonthFirst);
    assert_eq!(DateOrder::probe("en_GB.UTF-8"), DateOrder::DayFirst);
    assert_eq!(DateOrder::probe("de_DE@euro"), DateOrder::DayFirst);
    assert_eq!(DateOrder::probe("ja_JP"), DateOrder::MonthFirst);
    assert_eq!(DateOrder::probe("not-a-locale"), DateOrder::MonthFirst);
}

#[test]
fn test_system_date_order_is_cached() {
    let first = DateOrder::system();
    for _ in 0..3 {
        assert_eq!(DateOrder::system(), first);
    }
}

#[test]
fn test_date_order_setting() {
    assert_eq!(DateOrder::from_setting("dmy"), Some(DateOrder::DayFirst));
    assert_eq!(DateOrder::from_setting(" MDY "), Some(DateOrder::MonthFirst));
    assert_eq!(DateOrder::from_setting("ymd"), None);
}

#[test]
fn test_format_estimate() {
    assert_eq!(format_estimate(0), "");
    assert_eq!(format_estimate(45), "45m");
    assert_eq!(format_estimate(120), "2h");
    assert_eq!(format_estimate(90), "1h 30m");
}
