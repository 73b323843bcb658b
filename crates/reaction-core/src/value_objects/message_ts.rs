//! Message timestamp - the platform's `secs.micros` message identifier
//!
//! Timestamps are string-encoded on the wire (e.g. `"1700000000.000100"`) and double
//! as the message's primary key within a channel. They are strictly increasing within
//! a channel, so ordering is numeric on `(seconds, microseconds)` rather than lexical.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Platform message timestamp
#[derive(Debug, Clone)]
pub struct MessageTs {
    raw: String,
    secs: i64,
    micros: u32,
}

impl MessageTs {
    /// Parse from the wire representation
    pub fn parse(s: &str) -> Result<Self, MessageTsParseError> {
        let (secs_part, frac_part) = match s.split_once('.') {
            Some((secs, frac)) => (secs, frac),
            None => (s, ""),
        };

        if secs_part.is_empty() || !secs_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MessageTsParseError::InvalidFormat);
        }
        if frac_part.len() > 6 || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MessageTsParseError::InvalidFormat);
        }

        let secs = secs_part
            .parse::<i64>()
            .map_err(|_| MessageTsParseError::InvalidFormat)?;
        let micros = if frac_part.is_empty() {
            0
        } else {
            // "5" means 500000 microseconds
            let padded = format!("{frac_part:0<6}");
            padded
                .parse::<u32>()
                .map_err(|_| MessageTsParseError::InvalidFormat)?
        };

        Ok(Self {
            raw: s.to_string(),
            secs,
            micros,
        })
    }

    /// Build a timestamp from a point in time
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let secs = dt.timestamp();
        let micros = dt.timestamp_subsec_micros();
        Self {
            raw: format!("{secs}.{micros:06}"),
            secs,
            micros,
        }
    }

    /// Wire representation
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whole seconds since the Unix epoch
    #[inline]
    pub fn seconds(&self) -> i64 {
        self.secs
    }

    /// Convert to `DateTime<Utc>`
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.secs, self.micros * 1_000)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Error when parsing a message timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MessageTsParseError {
    #[error("invalid message timestamp format")]
    InvalidFormat,
}

impl PartialEq for MessageTs {
    fn eq(&self, other: &Self) -> bool {
        self.secs == other.secs && self.micros == other.micros
    }
}

impl Eq for MessageTs {}

impl Hash for MessageTs {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.secs.hash(state);
        self.micros.hash(state);
    }
}

impl PartialOrd for MessageTs {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MessageTs {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.secs, self.micros).cmp(&(other.secs, other.micros))
    }
}

impl fmt::Display for MessageTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for MessageTs {
    type Err = MessageTsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageTs::parse(s)
    }
}

impl Serialize for MessageTs {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for MessageTs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        MessageTs::parse(&raw).map_err(serde::de::Error::custom)
    }
}
