//! Request timestamp and Lipa Na M-Pesa password derivation
//!
//! STK push and C2B simulate carry a `Timestamp` (UTC, `YYYYMMDDHHMMSS`) and a
//! `Password` equal to `Base64(shortCode || passKey || timestamp)`. The
//! timestamp is taken at dispatch time; both fields must come from the same
//! value.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;

/// 14-digit UTC timestamp in Daraja's `YYYYMMDDHHMMSS` format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current UTC time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.format(TIMESTAMP_FORMAT).to_string())
    }

    /// Accept an already formatted timestamp. Must be exactly 14 ASCII digits.
    pub fn parse(value: &str) -> Result<Self> {
        if value.len() != TIMESTAMP_LEN || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Validation(format!(
                "timestamp must be 14 digits (YYYYMMDDHHMMSS), got {value:?}"
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `Base64(short_code || pass_key || timestamp)`, no separators.
pub fn password(short_code: &str, pass_key: &str, timestamp: &Timestamp) -> String {
    STANDARD.encode(format!("{short_code}{pass_key}{}", timestamp.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SANDBOX_PASS_KEY: &str =
        "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919";

    #[test]
    fn password_matches_fixture() {
        let ts = Timestamp::parse("20250101120000").unwrap();
        assert_eq!(
            password("174379", SANDBOX_PASS_KEY, &ts),
            "MTc0Mzc5YmZiMjc5ZjlhYTliZGJjZjE1OGU5N2RkNzFhNDY3Y2QyZTBjODkzMDU5YjEwZjc4ZTZiNzJhZGExZWQyYzkxOTIwMjUwMTAxMTIwMDAw"
        );
    }

    #[test]
    fn password_for_second_fixture() {
        let ts = Timestamp::parse("20231010101010").unwrap();
        assert_eq!(
            password("174379", SANDBOX_PASS_KEY, &ts),
            "MTc0Mzc5YmZiMjc5ZjlhYTliZGJjZjE1OGU5N2RkNzFhNDY3Y2QyZTBjODkzMDU5YjEwZjc4ZTZiNzJhZGExZWQyYzkxOTIwMjMxMDEwMTAxMDEw"
        );
    }

    #[test]
    fn password_is_deterministic() {
        let ts = Timestamp::parse("20240229235959").unwrap();
        let a = password("600000", "passkey", &ts);
        let b = password("600000", "passkey", &ts);
        assert_eq!(a, b);
        assert_eq!(a, "NjAwMDAwcGFzc2tleTIwMjQwMjI5MjM1OTU5");
    }

    #[test]
    fn timestamp_formats_utc_datetime() {
        let at = Utc.with_ymd_and_hms(2023, 10, 10, 10, 10, 10).unwrap();
        assert_eq!(Timestamp::from_datetime(at).as_str(), "20231010101010");

        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 5).unwrap();
        assert_eq!(Timestamp::from_datetime(at).as_str(), "20250101000005");
    }

    #[test]
    fn timestamp_now_is_fourteen_digits() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_str().len(), 14);
        assert!(ts.as_str().bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn timestamp_parse_rejects_malformed() {
        assert!(Timestamp::parse("2025010112000").is_err());
        assert!(Timestamp::parse("202501011200000").is_err());
        assert!(Timestamp::parse("2025-01-01T120").is_err());
        assert!(Timestamp::parse("").is_err());
    }
}
