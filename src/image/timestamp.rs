use std::time::SystemTime;

/// Timestamp as a number of seconds that have elapsed since
/// January 1, 1970 (midnight UTC/GMT), not counting leap seconds
/// (in ISO 8601: 1970-01-01T00:00:00Z).
///
/// `newc` stores modification times as 32 bit unsigned values, so this does too.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// Returns the timestamp corresponding to “now”.
    pub fn now() -> Result<Self, TimestampError> {
        SystemTime::now().try_into()
    }

    /// Returns “now”, or `source_date` if that is earlier.
    pub fn clamped_now(source_date: Option<Timestamp>) -> Result<Self, TimestampError> {
        let now = Self::now()?;
        Ok(match source_date {
            Some(d) if d < now => d,
            _ => now,
        })
    }
}

#[derive(thiserror::Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TimestampError {
    #[error("time is before the UNIX epoch")]
    Underflow,
    #[error("time does not fit in 32 bits")]
    Overflow,
}

impl From<u32> for Timestamp {
    fn from(t: u32) -> Timestamp {
        Timestamp(t)
    }
}

impl From<Timestamp> for u32 {
    fn from(t: Timestamp) -> u32 {
        t.0
    }
}

impl TryFrom<u64> for Timestamp {
    type Error = TimestampError;

    fn try_from(t: u64) -> Result<Timestamp, Self::Error> {
        t.try_into()
            .map_err(|_| TimestampError::Overflow)
            .map(Timestamp)
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = TimestampError;

    fn try_from(st: SystemTime) -> Result<Timestamp, Self::Error> {
        st.duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|_| TimestampError::Underflow)
            .and_then(|t| t.as_secs().try_into())
    }
}
