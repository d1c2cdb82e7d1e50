//! Scheduled producer outages as per-hour masks.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::SimError;
use crate::model::{HOURS, Producer, TimeInterval};

/// Non-leap year used to place `MM-DD` stamps on the hour axis.
const REFERENCE_YEAR: i32 = 2023;

/// Maps a `MM-DD HH:MM` or `MM-DD` stamp to an hour of the year.
///
/// A date-only stamp points at the start of that day, or at the following
/// midnight when `end_of_day` is set.
pub fn hour_index(stamp: &str, end_of_day: bool) -> Option<usize> {
    let full = format!("{REFERENCE_YEAR}-{}", stamp.trim());
    if let Ok(dt) = NaiveDateTime::parse_from_str(&full, "%Y-%m-%d %H:%M") {
        return Some(dt.ordinal0() as usize * 24 + dt.hour() as usize);
    }
    let date = NaiveDate::parse_from_str(&full, "%Y-%m-%d").ok()?;
    Some((date.ordinal0() as usize + usize::from(end_of_day)) * 24)
}

/// Half-open hour range `[start, end)` of an interval.
///
/// `end < start` means the interval wraps over the turn of the year.
pub fn hour_interval(interval: &TimeInterval) -> Result<(usize, usize), String> {
    let start = hour_index(&interval.start, false).ok_or_else(|| interval.start.clone())?;
    let end = hour_index(&interval.end, true).ok_or_else(|| interval.end.clone())?;
    Ok((start, end))
}

/// Hours during which a producer is forced off.
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptionMask {
    hours: Vec<bool>,
}

impl InterruptionMask {
    /// Builds the mask covering every interval.
    ///
    /// # Errors
    ///
    /// Returns the first stamp that cannot be parsed.
    pub fn build(intervals: &[TimeInterval]) -> Result<Self, String> {
        let mut hours = vec![false; HOURS];
        for interval in intervals {
            let (start, end) = hour_interval(interval)?;
            let mut mark = |range: std::ops::Range<usize>| {
                for h in range {
                    hours[h] = true;
                }
            };
            if start < end {
                mark(start..end.min(HOURS));
            } else if start > end {
                mark(start.min(HOURS)..HOURS);
                mark(0..end);
            }
        }
        Ok(Self { hours })
    }

    /// One optional mask per producer, `None` for producers without outages.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidInterval`] for an unparsable stamp.
    pub fn build_all(producers: &[Producer]) -> Result<Vec<Option<Self>>, SimError> {
        producers
            .iter()
            .map(|p| {
                if p.interruptions.is_empty() {
                    return Ok(None);
                }
                Self::build(&p.interruptions)
                    .map(Some)
                    .map_err(|value| SimError::InvalidInterval {
                        producer: p.id.clone(),
                        value,
                    })
            })
            .collect()
    }

    pub fn is_interrupted(&self, hour: usize) -> bool {
        self.hours.get(hour).copied().unwrap_or(false)
    }

    /// Number of interrupted hours.
    pub fn count(&self) -> usize {
        self.hours.iter().filter(|&&h| h).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProducerFunction;

    #[test]
    fn stamps_map_to_hours() {
        assert_eq!(hour_index("01-01 10:00", false), Some(10));
        assert_eq!(hour_index("01-02", false), Some(24));
        assert_eq!(hour_index("01-02", true), Some(48));
        assert_eq!(hour_index("12-31", true), Some(HOURS));
        assert_eq!(hour_index("02-30", false), None);
        assert_eq!(hour_index("noon", false), None);
    }

    #[test]
    fn mask_is_half_open() {
        let mask = InterruptionMask::build(&[TimeInterval::new("01-01 10:00", "01-01 20:00")])
            .expect("interval should parse");
        assert!(!mask.is_interrupted(9));
        assert!(mask.is_interrupted(10));
        assert!(mask.is_interrupted(19));
        assert!(!mask.is_interrupted(20));
        assert_eq!(mask.count(), 10);
    }

    #[test]
    fn date_only_end_includes_the_day() {
        let mask = InterruptionMask::build(&[TimeInterval::new("03-01", "03-02")])
            .expect("interval should parse");
        assert_eq!(mask.count(), 48);
    }

    #[test]
    fn wraps_over_new_year() {
        let mask = InterruptionMask::build(&[TimeInterval::new("12-31", "01-01")])
            .expect("interval should parse");
        assert_eq!(mask.count(), 48);
        assert!(mask.is_interrupted(0));
        assert!(mask.is_interrupted(HOURS - 1));
        assert!(!mask.is_interrupted(24));
    }

    #[test]
    fn build_all_skips_producers_without_outages() {
        let producers = vec![
            Producer::new("a", ProducerFunction::BaseLoad, 10.0),
            Producer::new("b", ProducerFunction::BaseLoad, 10.0)
                .with_interruption(TimeInterval::new("01-01 00:00", "01-01 05:00")),
        ];
        let masks = InterruptionMask::build_all(&producers).expect("interval should parse");
        assert!(masks[0].is_none());
        assert_eq!(masks[1].as_ref().map(InterruptionMask::count), Some(5));
    }

    #[test]
    fn build_all_reports_bad_stamp() {
        let producers = vec![
            Producer::new("a", ProducerFunction::BaseLoad, 10.0)
                .with_interruption(TimeInterval::new("13-01", "13-02")),
        ];
        assert_eq!(
            InterruptionMask::build_all(&producers),
            Err(SimError::InvalidInterval {
                producer: "a".into(),
                value: "13-01".into()
            })
        );
    }
}
