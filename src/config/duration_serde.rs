//! Common serde utilities for human-readable durations across configuration.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::{fmt, time::Duration};

/// Custom serde functions for Duration that support human-readable strings
pub mod duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration_str = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&duration_str)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a duration as milliseconds (number) or human-readable string (e.g., '100ms', '10s')",
                )
            }

            fn visit_u64<E>(self, millis: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::from_millis(millis))
            }

            fn visit_i64<E>(self, millis: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(millis)
                    .map(Duration::from_millis)
                    .map_err(|_| de::Error::custom("duration must not be negative"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                humantime::parse_duration(value)
                    .map_err(|e| de::Error::custom(format!("Invalid duration '{value}': {e}")))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Parse a default duration literal from `defaults.rs`
pub fn parse_default(value: &str) -> Duration {
    humantime::parse_duration(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "duration")]
        delay: Duration,
    }

    #[test]
    fn test_human_readable_duration() {
        let parsed: Wrapper = toml::from_str(r#"delay = "250ms""#).unwrap();
        assert_eq!(parsed.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_numeric_duration_is_millis() {
        let parsed: Wrapper = toml::from_str("delay = 100").unwrap();
        assert_eq!(parsed.delay, Duration::from_millis(100));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let original = Wrapper {
            delay: Duration::from_secs(10),
        };
        let text = toml::to_string(&original).unwrap();
        assert!(text.contains("10s"));
        let parsed: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_parse_default_literals() {
        assert_eq!(parse_default("100ms"), Duration::from_millis(100));
        assert_eq!(parse_default("garbage"), Duration::ZERO);
    }
}
