use crate::core::errors::ExchangeError;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// One item published on a stream's output channel.
///
/// At most one `Error` is ever published and nothing follows it.
#[derive(Debug)]
pub enum StreamEvent<T> {
    Event(T),
    Error(ExchangeError),
}

impl<T> StreamEvent<T> {
    pub fn event(&self) -> Option<&T> {
        match self {
            Self::Event(event) => Some(event),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ExchangeError> {
        match self {
            Self::Event(_) => None,
            Self::Error(err) => Some(err),
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn into_result(self) -> Result<T, ExchangeError> {
        match self {
            Self::Event(event) => Ok(event),
            Self::Error(err) => Err(err),
        }
    }
}

/// Convert milliseconds since the unix epoch into a UTC instant.
///
/// Values outside chrono's representable range collapse to the epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Serde adapter for integer millisecond timestamps
pub mod millis {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(value.timestamp_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        Utc.timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", millis)))
    }
}
