use crate::error::{
    Error,
    Result,
};
use alloy_primitives::U256;
use chrono::{
    DateTime,
    Utc,
};
use generated_abi::typing_stats_types::Score;
use serde::Serialize;

pub const MAX_ACCURACY: u64 = 100;

/// A leaderboard entry as handed to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub player: String,
    pub wpm: u64,
    pub accuracy: u64,
    pub timestamp: DateTime<Utc>,
    pub category: String,
}

impl ScoreRecord {
    /// Normalizes a tuple returned by the contract. The contract stamps scores in
    /// seconds; records carry millisecond instants.
    pub fn from_raw(raw: &Score) -> Result<Self> {
        let seconds = to_u64(raw.timestamp, "score timestamp")?;
        let timestamp = i64::try_from(seconds)
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| {
                Error::decode("score timestamp", format!("{seconds} is out of range"))
            })?;
        Ok(Self {
            player: raw.player.to_checksum(None),
            wpm: to_u64(raw.wpm, "score wpm")?,
            accuracy: to_u64(raw.accuracy, "score accuracy")?,
            timestamp,
            category: raw.category.clone(),
        })
    }
}

fn to_u64(value: U256, context: &'static str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(Error::decode(context, format!("{value} does not fit in 64 bits")));
    }
    Ok(value.to::<u64>())
}

/// Outbound payload of `addScore`. Player and timestamp are assigned on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub wpm: u64,
    pub accuracy: u64,
    pub category: String,
}

impl ScoreSubmission {
    pub fn new(wpm: u64, accuracy: u64, category: impl Into<String>) -> Result<Self> {
        if accuracy > MAX_ACCURACY {
            return Err(Error::InvalidScore(format!(
                "accuracy {accuracy} exceeds {MAX_ACCURACY}"
            )));
        }
        Ok(Self {
            wpm,
            accuracy,
            category: category.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use generated_abi::test_helpers::{
        player,
        raw_score,
    };

    #[test]
    fn from_raw__decimal_tuple__normalizes_integers_and_millis() {
        // given
        let raw = raw_score(player(7), "120", "97", "1700000000", "quote");

        // when
        let record = ScoreRecord::from_raw(&raw).unwrap();

        // then
        assert_eq!(120, record.wpm);
        assert_eq!(97, record.accuracy);
        assert_eq!(1_700_000_000_000, record.timestamp.timestamp_millis());
        assert_eq!("quote", record.category);
        assert_eq!(player(7).to_checksum(None), record.player);
    }

    #[test]
    fn from_raw__wpm_beyond_u64__errors() {
        let mut raw = raw_score(player(1), "1", "1", "1", "code");
        raw.wpm = U256::MAX;

        let result = ScoreRecord::from_raw(&raw);

        assert!(matches!(
            result,
            Err(Error::Decode {
                context: "score wpm",
                ..
            })
        ));
    }

    #[test]
    fn from_raw__timestamp_beyond_chrono_range__errors() {
        let raw = raw_score(player(1), "1", "1", "18446744073709551615", "code");

        let result = ScoreRecord::from_raw(&raw);

        assert!(result.is_err());
    }

    #[test]
    fn new__accuracy_over_hundred__is_rejected() {
        let result = ScoreSubmission::new(85, 101, "programming");

        assert!(matches!(result, Err(Error::InvalidScore(_))));
    }
}
