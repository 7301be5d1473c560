//! Lexeme-to-`Value` promotion.
//!
//! A naked lexeme is tried, in order, against a number grammar, the
//! boolean/null/undefined keywords, and two date grammars before falling
//! back to a plain string. Quoted lexemes skip all of this — they are
//! always `Value::String`.

use calku_common::{ResolvedTimeZone, Value};
use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::token::LiteralStyle;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d*(\.\d+)?$").unwrap());
static BOOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(true|false)$").unwrap());
static NULLISH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(null|undefined)$").unwrap());

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^
        (?P<y>\d{4})-(?P<mo>\d{2})-(?P<d>\d{2})
        (?:[T\ ](?P<h>\d{2}):(?P<mi>\d{2})(?::(?P<s>\d{2})(?:\.(?P<f>\d{1,3}))?)?)?
        (?:
            \ ?GMT(?P<gofs>[+-]\d{2}:\d{2})
            | (?P<z>Z)
            | (?P<tofs>[+-]\d{2}:\d{2})
        )?
        $",
    )
    .unwrap()
});

static US_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)(?i)^
        (?P<mo>\d{1,2})/(?P<d>\d{1,2})/(?P<y>\d{4})
        (?:\ (?P<h>\d{1,2}):(?P<mi>\d{2})(?::(?P<s>\d{2})(?:\.(?P<f>\d{1,3}))?)?\ ?(?P<ampm>am|pm))?
        (?:\ ?GMT(?P<gofs>[+-]\d{2}:\d{2})|(?P<z>z))?
        $",
    )
    .unwrap()
});

/// Promotes a raw lexeme into a typed `Value`.
pub fn promote(lexeme: &str, style: LiteralStyle, tz: &ResolvedTimeZone) -> Value {
    if style == LiteralStyle::Quoted {
        return Value::String(lexeme.to_string());
    }

    if NUMBER_RE.is_match(lexeme) {
        if let Ok(n) = lexeme.parse::<f64>() {
            if !n.is_nan() {
                return Value::Number(n);
            }
        }
    }

    if let Some(caps) = BOOL_RE.captures(lexeme) {
        let word = caps.get(1).unwrap().as_str();
        return Value::Boolean(word.eq_ignore_ascii_case("true"));
    }

    if let Some(caps) = NULLISH_RE.captures(lexeme) {
        let word = caps.get(1).unwrap().as_str();
        return if word.eq_ignore_ascii_case("null") {
            Value::Null
        } else {
            Value::Undefined
        };
    }

    if let Some(caps) = ISO_DATE_RE.captures(lexeme) {
        if let Some(date) = build_iso_date(&caps, tz) {
            return Value::Date(date);
        }
    }

    if let Some(caps) = US_DATE_RE.captures(lexeme) {
        if let Some(date) = build_us_date(&caps, tz) {
            return Value::Date(date);
        }
    }

    Value::String(lexeme.to_string())
}

fn num<'a>(caps: &regex::Captures<'a>, name: &str, default: u32) -> Option<u32> {
    match caps.name(name) {
        Some(m) => m.as_str().parse::<u32>().ok(),
        None => Some(default),
    }
}

fn millis_from_frac(caps: &regex::Captures, name: &str) -> u32 {
    match caps.name(name) {
        Some(m) => {
            let mut digits = m.as_str().to_string();
            while digits.len() < 3 {
                digits.push('0');
            }
            digits.truncate(3);
            digits.parse::<u32>().unwrap_or(0)
        }
        None => 0,
    }
}

fn embedded_offset(caps: &regex::Captures, gmt_group: &str, z_group: &str, plain_group: &str) -> Option<FixedOffset> {
    if caps.name(z_group).is_some() {
        return Some(FixedOffset::east_opt(0).unwrap());
    }
    let raw = caps
        .name(gmt_group)
        .or_else(|| caps.name(plain_group))
        .map(|m| m.as_str())?;
    parse_offset(raw)
}

fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let body = &raw[1..];
    let mut parts = body.split(':');
    let hours: i32 = parts.next()?.parse().ok()?;
    let minutes: i32 = parts.next()?.parse().ok()?;
    let total = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(total)
}

fn build_iso_date(caps: &regex::Captures, tz: &ResolvedTimeZone) -> Option<chrono::DateTime<FixedOffset>> {
    let year: i32 = caps.name("y")?.as_str().parse().ok()?;
    let month = num(caps, "mo", 1)?;
    let day = num(caps, "d", 1)?;
    let hour = num(caps, "h", 0)?;
    let minute = num(caps, "mi", 0)?;
    let second = num(caps, "s", 0)?;
    let millis = millis_from_frac(caps, "f");

    let naive_date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive_time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    let naive = naive_date.and_time(naive_time);

    match embedded_offset(caps, "gofs", "z", "tofs") {
        Some(offset) => offset.from_local_datetime(&naive).single(),
        None => tz.offset.from_local_datetime(&naive).single(),
    }
}

fn build_us_date(caps: &regex::Captures, tz: &ResolvedTimeZone) -> Option<chrono::DateTime<FixedOffset>> {
    let year: i32 = caps.name("y")?.as_str().parse().ok()?;
    let month = num(caps, "mo", 1)?;
    let day = num(caps, "d", 1)?;
    let mut hour = num(caps, "h", 0)?;
    let minute = num(caps, "mi", 0)?;
    let second = num(caps, "s", 0)?;
    let millis = millis_from_frac(caps, "f");

    if let Some(ampm) = caps.name("ampm") {
        let is_pm = ampm.as_str().eq_ignore_ascii_case("pm");
        hour %= 12;
        if is_pm {
            hour += 12;
        }
    }

    let naive_date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive_time = NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?;
    let naive = naive_date.and_time(naive_time);

    match embedded_offset(caps, "gofs", "z", "z") {
        Some(offset) => offset.from_local_datetime(&naive).single(),
        None => tz.offset.from_local_datetime(&naive).single(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> ResolvedTimeZone {
        ResolvedTimeZone::utc()
    }

    #[test]
    fn promotes_integers_and_decimals() {
        assert_eq!(promote("42", LiteralStyle::Naked, &utc()), Value::Number(42.0));
        assert_eq!(promote("-3.5", LiteralStyle::Naked, &utc()), Value::Number(-3.5));
    }

    #[test]
    fn quoted_never_retypes() {
        assert_eq!(
            promote("42", LiteralStyle::Quoted, &utc()),
            Value::String("42".to_string())
        );
    }

    #[test]
    fn promotes_booleans_and_nullish() {
        assert_eq!(promote("TRUE", LiteralStyle::Naked, &utc()), Value::Boolean(true));
        assert_eq!(promote("false", LiteralStyle::Naked, &utc()), Value::Boolean(false));
        assert_eq!(promote("null", LiteralStyle::Naked, &utc()), Value::Null);
        assert_eq!(promote("undefined", LiteralStyle::Naked, &utc()), Value::Undefined);
    }

    #[test]
    fn promotes_iso_date_with_offset() {
        let v = promote("2024-01-15T10:30:00+02:00", LiteralStyle::Naked, &utc());
        match v {
            Value::Date(d) => assert_eq!(d.offset().fix().local_minus_utc(), 7200),
            other => panic!("expected Date, got {other:?}"),
        }
    }

    #[test]
    fn promotes_iso_date_without_offset_using_configured_tz() {
        let honolulu = ResolvedTimeZone {
            name: "Pacific/Honolulu".to_string(),
            offset: FixedOffset::west_opt(10 * 3600).unwrap(),
        };
        let v = promote("2024-01-15", LiteralStyle::Naked, &honolulu);
        match v {
            Value::Date(d) => assert_eq!(d.offset().fix().local_minus_utc(), -10 * 3600),
            other => panic!("expected Date, got {other:?}"),
        }
    }

    #[test]
    fn promotes_us_date_with_ampm() {
        let v = promote("1/5/2024 11:30:00 PM", LiteralStyle::Naked, &utc());
        match v {
            Value::Date(d) => assert_eq!(d.hour(), 23),
            other => panic!("expected Date, got {other:?}"),
        }
    }

    #[test]
    fn non_matching_lexeme_is_a_plain_string() {
        assert_eq!(
            promote("hello", LiteralStyle::Naked, &utc()),
            Value::String("hello".to_string())
        );
    }
}
