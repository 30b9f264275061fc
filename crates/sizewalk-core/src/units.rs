//! Binary size units and size-string parsing.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One kibibyte.
pub const ONE_KB: u64 = 1024;
/// One mebibyte.
pub const ONE_MB: u64 = 1024 * ONE_KB;
/// One gibibyte.
pub const ONE_GB: u64 = 1024 * ONE_MB;

/// Unit for configured size thresholds (binary multiples).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeUnit {
    #[default]
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl SizeUnit {
    /// Number of bytes in one unit.
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::Kilobytes => ONE_KB,
            SizeUnit::Megabytes => ONE_MB,
            SizeUnit::Gigabytes => ONE_GB,
        }
    }

    /// Convert an amount of this unit to bytes, saturating on overflow.
    pub fn to_bytes(self, amount: u64) -> u64 {
        amount.saturating_mul(self.multiplier())
    }

    /// Parse a unit suffix such as `GB`, `g`, `MiB` or the empty string.
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_uppercase().as_str() {
            "" | "B" => Some(SizeUnit::Bytes),
            "K" | "KB" | "KIB" => Some(SizeUnit::Kilobytes),
            "M" | "MB" | "MIB" => Some(SizeUnit::Megabytes),
            "G" | "GB" | "GIB" => Some(SizeUnit::Gigabytes),
            _ => None,
        }
    }
}

/// Error parsing a size string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid size '{input}': expected a number with an optional B/KB/MB/GB suffix")]
pub struct ParseSizeError {
    input: String,
}

/// Parse a size string (e.g. `"10GB"`, `"512M"`, `"1.5k"`, `"42"`) into bytes.
pub fn parse_size(input: &str) -> Result<u64, ParseSizeError> {
    let err = || ParseSizeError {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    let unit = SizeUnit::from_suffix(suffix.trim()).ok_or_else(err)?;
    let amount: f64 = number.parse().map_err(|_| err())?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(err());
    }

    Ok((amount * unit.multiplier() as f64) as u64)
}

/// A size string with its unit, e.g. `"10GB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl FromStr for ByteSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_size(s).map(ByteSize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_multipliers() {
        assert_eq!(SizeUnit::Bytes.to_bytes(5), 5);
        assert_eq!(SizeUnit::Kilobytes.to_bytes(2), 2048);
        assert_eq!(SizeUnit::Megabytes.to_bytes(1), ONE_MB);
        assert_eq!(SizeUnit::Gigabytes.to_bytes(10), 10 * ONE_GB);
        assert_eq!(SizeUnit::Gigabytes.to_bytes(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("42").unwrap(), 42);
        assert_eq!(parse_size("42B").unwrap(), 42);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("1.5k").unwrap(), 1536);
        assert_eq!(parse_size("512M").unwrap(), 512 * ONE_MB);
        assert_eq!(parse_size(" 10GB ").unwrap(), 10 * ONE_GB);
        assert_eq!(parse_size("2GiB").unwrap(), 2 * ONE_GB);
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("GB").is_err());
        assert!(parse_size("10TB").is_err());
        assert!(parse_size("1.2.3MB").is_err());
        assert!("ten".parse::<ByteSize>().is_err());
    }
}
