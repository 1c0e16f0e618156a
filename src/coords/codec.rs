use super::types::AngleFormat;

/// Convert a decimal angle to the fixed-width sexagesimal form the mount expects
///
/// Latitude-like values (declination, site latitude) become `±DD:MM:SS`,
/// longitude-like values become unsigned `DDD:MM:SS`.
pub fn decimal_to_sexagesimal(value: f64, latitude_like: bool) -> String {
    format_sexagesimal(value, AngleFormat::for_latitude_like(latitude_like))
}

/// Format a decimal value in the given sexagesimal layout
///
/// Every field is truncated, never rounded: whole units are taken from
/// `abs(value)` first, minutes from the fractional remainder, then seconds from
/// the minutes' remainder. Sub-second precision is dropped.
pub fn format_sexagesimal(value: f64, format: AngleFormat) -> String {
    let (units, minutes, seconds) = split(value.abs());

    match format {
        AngleFormat::Signed => {
            let sign = if value < 0.0 { '-' } else { '+' };
            format!("{}{:02}:{:02}:{:02}", sign, units, minutes, seconds)
        }
        AngleFormat::Degrees => format!("{:03}:{:02}:{:02}", units, minutes, seconds),
        AngleFormat::Hours => format!("{:02}:{:02}:{:02}", units, minutes, seconds),
    }
}

fn split(abs: f64) -> (u32, u32, u32) {
    let units = abs.floor();
    let minutes = ((abs - units) * 60.0).floor();
    let seconds = (((abs - units) * 60.0 - minutes) * 60.0).floor();

    (units as u32, minutes as u32, seconds as u32)
}
