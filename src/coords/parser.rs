use std::sync::LazyLock;

use regex::Regex;

use super::types::AngleFormat;
use crate::error::CoordinateError;

static SEXAGESIMAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])?(\d{1,3}):(\d{2}):(\d{2})$").unwrap());

static RIGHT_ASCENSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}$").unwrap());

static DECLINATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]\d{2}:\d{2}:\d{2}$").unwrap());

struct Fields {
    sign: Option<char>,
    units: u32,
    minutes: u32,
    seconds: u32,
}

impl Fields {
    fn value(&self) -> f64 {
        let magnitude =
            self.units as f64 + self.minutes as f64 / 60.0 + self.seconds as f64 / 3600.0;
        if self.sign == Some('-') {
            -magnitude
        } else {
            magnitude
        }
    }
}

fn parse_fields(input: &str) -> Result<Fields, CoordinateError> {
    let trimmed = input.trim();
    let caps = SEXAGESIMAL_REGEX
        .captures(trimmed)
        .ok_or_else(|| CoordinateError::Malformed(trimmed.to_string()))?;

    let number = |idx: usize| -> Result<u32, CoordinateError> {
        caps[idx]
            .parse::<u32>()
            .map_err(|_| CoordinateError::Malformed(trimmed.to_string()))
    };

    let fields = Fields {
        sign: caps.get(1).and_then(|m| m.as_str().chars().next()),
        units: number(2)?,
        minutes: number(3)?,
        seconds: number(4)?,
    };

    if fields.minutes >= 60 || fields.seconds >= 60 {
        return Err(CoordinateError::FieldOutOfRange(trimmed.to_string()));
    }

    Ok(fields)
}

/// Decode a `[±]D:MM:SS` string into a decimal value
///
/// This inverts [`format_sexagesimal`](super::format_sexagesimal) exactly for
/// whole-second values. A decimal value that went through the formatter comes
/// back without its sub-second part, since the formatter truncates.
pub fn parse_sexagesimal(input: &str) -> Result<f64, CoordinateError> {
    parse_fields(input).map(|fields| fields.value())
}

/// Check a right ascension string (`HH:MM:SS`, unsigned, below 24h)
pub fn validate_right_ascension(input: &str) -> Result<f64, CoordinateError> {
    let hours = parse_sexagesimal(input)?;
    if !RIGHT_ASCENSION_REGEX.is_match(input.trim()) {
        return Err(CoordinateError::Malformed(input.trim().to_string()));
    }

    if hours >= 24.0 {
        return Err(CoordinateError::RightAscensionOutOfRange(
            input.trim().to_string(),
        ));
    }

    Ok(hours)
}

/// Check a declination string (`±DD:MM:SS`, within ±90°)
pub fn validate_declination(input: &str) -> Result<f64, CoordinateError> {
    let degrees = parse_sexagesimal(input)?;
    let trimmed = input.trim();
    if !trimmed.starts_with(['+', '-']) {
        return Err(CoordinateError::MissingSign(trimmed.to_string()));
    }
    if !DECLINATION_REGEX.is_match(trimmed) {
        return Err(CoordinateError::Malformed(trimmed.to_string()));
    }

    if degrees.abs() > 90.0 {
        return Err(CoordinateError::DeclinationOutOfRange(
            input.trim().to_string(),
        ));
    }

    Ok(degrees)
}

/// Re-emit a loosely written sexagesimal string in the fixed layout
///
/// Works on the integer fields, so `5:35:17` becomes `05:35:17` without any
/// floating-point drift. Right ascension must be unsigned and below 24h;
/// signed values must stay within ±90° and gain `+` when unsigned.
pub fn normalize_sexagesimal(input: &str, format: AngleFormat) -> Result<String, CoordinateError> {
    let fields = parse_fields(input)?;
    let trimmed = input.trim();

    match format {
        AngleFormat::Hours => {
            if fields.sign.is_some() {
                return Err(CoordinateError::Malformed(trimmed.to_string()));
            }
            if fields.units >= 24 {
                return Err(CoordinateError::RightAscensionOutOfRange(
                    trimmed.to_string(),
                ));
            }
            Ok(format!(
                "{:02}:{:02}:{:02}",
                fields.units, fields.minutes, fields.seconds
            ))
        }
        AngleFormat::Signed => {
            if fields.value().abs() > 90.0 {
                return Err(CoordinateError::DeclinationOutOfRange(
                    trimmed.to_string(),
                ));
            }
            let sign = if fields.sign == Some('-') { '-' } else { '+' };
            Ok(format!(
                "{}{:02}:{:02}:{:02}",
                sign, fields.units, fields.minutes, fields.seconds
            ))
        }
        AngleFormat::Degrees => Ok(format!(
            "{:03}:{:02}:{:02}",
            fields.units, fields.minutes, fields.seconds
        )),
    }
}
