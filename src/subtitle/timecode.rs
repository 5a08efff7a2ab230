use std::fmt;
use std::str::FromStr;

use crate::error::SubtransError;

/// SRT timestamp with millisecond precision (`HH:MM:SS,mmm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timecode(u64);

impl Timecode {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_parts(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Self {
        Self(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3_600_000;
        let minutes = (self.0 % 3_600_000) / 60_000;
        let secs = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

impl FromStr for Timecode {
    type Err = SubtransError;

    /// Accepts `HH:MM:SS,mmm`; a `.` millisecond separator is tolerated on input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SubtransError::malformed(0, format!("invalid timecode '{}'", s));

        let (clock, millis) = s.trim().split_once([',', '.']).ok_or_else(invalid)?;
        let mut parts = clock.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let number = |field: &str, max_len: usize| -> Result<u64, SubtransError> {
            let digits_only = field.bytes().all(|b| b.is_ascii_digit());
            if field.is_empty() || field.len() > max_len || !digits_only {
                return Err(invalid());
            }
            field.parse::<u64>().map_err(|_| invalid())
        };

        let hours = number(h, 4)?;
        let minutes = number(m, 2)?;
        let seconds = number(sec, 2)?;
        if millis.len() != 3 {
            return Err(invalid());
        }
        let millis = number(millis, 3)?;

        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        Ok(Self::from_parts(hours, minutes, seconds, millis))
    }
}

/// Parse a `start --> end` timing line. Positional settings after `end` are ignored.
pub fn parse_timing_line(line: &str) -> Option<(Timecode, Timecode)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    let start = start.trim().parse().ok()?;
    let end = end.parse().ok()?;
    Some((start, end))
}
