//! Serde helpers for custom serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use std::time::Duration;

/// A number of seconds: an integer when whole, a float otherwise.
#[derive(Serialize)]
#[serde(untagged)]
enum Seconds {
    Whole(u64),
    Fractional(f64),
}

impl From<Duration> for Seconds {
    fn from(duration: Duration) -> Self {
        if duration.subsec_nanos() == 0 {
            Seconds::Whole(duration.as_secs())
        } else {
            Seconds::Fractional(duration.as_secs_f64())
        }
    }
}

fn from_secs<E: Error>(secs: f64) -> Result<Duration, E> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| E::custom(format!("invalid duration {}: {}", secs, e)))
}

/// Serialization and deserialization for `Duration` as seconds. Fractions are
/// kept, so `0.2` is 200 milliseconds.
pub mod duration_secs {
    use super::*;

    /// Serialize a `Duration` as a number of seconds.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Seconds::from(*duration).serialize(serializer)
    }

    /// Deserialize a non-negative number of seconds into a `Duration`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        from_secs(f64::deserialize(deserializer)?)
    }
}

/// Same as [`duration_secs`] for an optional value.
pub mod option_duration_secs {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&Seconds::from(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(from_secs::<D::Error>)
            .transpose()
    }
}
