// src/coordinates.rs
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Anything that can sit between the degree, minute and second parts of a DMS string.
static DMS_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:\s|°|º|'|′|"|″|:|d|m|s)+"#).expect("separator regex should parse"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    /// Sign for a hemisphere letter, or `None` if the letter does not belong to this axis.
    fn hemisphere_sign(self, c: char) -> Option<f64> {
        match (self, c) {
            (Axis::Latitude, 'N') | (Axis::Longitude, 'E') => Some(1.0),
            (Axis::Latitude, 'S') | (Axis::Longitude, 'W') => Some(-1.0),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("malformed {axis} {raw:?}")]
    Malformed { axis: Axis, raw: String },

    #[error("{axis} {value} out of range")]
    OutOfRange { axis: Axis, value: f64 },
}

/// Convert a latitude/longitude pair of free-form strings into decimal degrees.
///
/// Handles plain decimals (`-74.0060`), comma decimal separators (`40,7128`)
/// and degree/minute/second forms (`40°42'46.1"N`, `74d0m21.6sW`, `S 33 52 4`).
pub fn latlon_to_decimal(lat: &str, lon: &str) -> Result<(f64, f64), CoordinateError> {
    let lat = to_decimal(lat, Axis::Latitude)?;
    let lon = to_decimal(lon, Axis::Longitude)?;
    Ok((lat, lon))
}

/// Parse a single component and check it against the axis range.
pub fn to_decimal(raw: &str, axis: Axis) -> Result<f64, CoordinateError> {
    let malformed = || CoordinateError::Malformed {
        axis,
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(malformed());
    }

    let normalized = if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        trimmed.replace(',', ".")
    };

    let value = match normalized.parse::<f64>() {
        Ok(v) => v,
        Err(_) => parse_dms(&normalized, axis).ok_or_else(malformed)?,
    };

    if !value.is_finite() {
        return Err(malformed());
    }
    if value.abs() > axis.limit() {
        return Err(CoordinateError::OutOfRange { axis, value });
    }
    Ok(value)
}

fn parse_dms(s: &str, axis: Axis) -> Option<f64> {
    // hemisphere letter may lead or trail, never both
    let mut body = s;
    let mut hemisphere = None;
    if let Some(first) = body.chars().next().filter(|c| c.is_ascii_uppercase()) {
        hemisphere = Some(axis.hemisphere_sign(first)?);
        body = &body[first.len_utf8()..];
    }
    if let Some(last) = body.chars().last().filter(|c| c.is_ascii_uppercase()) {
        if hemisphere.is_some() {
            return None;
        }
        hemisphere = Some(axis.hemisphere_sign(last)?);
        body = &body[..body.len() - last.len_utf8()];
    }

    let body = body.trim();
    let (negative, body) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body.strip_prefix('+').unwrap_or(body)),
    };

    let parts: Vec<&str> = DMS_SEPARATOR
        .split(body)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut numbers = Vec::with_capacity(parts.len());
    for part in &parts {
        if !part.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return None;
        }
        numbers.push(part.parse::<f64>().ok()?);
    }

    let degrees = numbers[0];
    let minutes = numbers.get(1).copied().unwrap_or(0.0);
    let seconds = numbers.get(2).copied().unwrap_or(0.0);
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }

    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    let sign = match hemisphere {
        Some(sign) => sign,
        None if negative => -1.0,
        None => 1.0,
    };
    Some(sign * magnitude)
}
