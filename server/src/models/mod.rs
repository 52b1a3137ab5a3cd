pub mod attachment;
pub mod event;
pub mod guest;
pub mod profile;
pub mod registration;
pub mod ticket;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Items split around "now" by the end instant of their event.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline<T> {
    pub upcoming: Vec<T>,
    pub past: Vec<T>,
}

impl<T> Timeline<T> {
    /// An item whose event ends at or after `now` is upcoming, otherwise past.
    pub fn partition<F>(items: Vec<T>, now: DateTime<Utc>, end_of: F) -> Self
    where
        F: Fn(&T) -> DateTime<Utc>,
    {
        let (upcoming, past) = items.into_iter().partition(|item| end_of(item) >= now);
        Self { upcoming, past }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_partition_is_exhaustive_and_disjoint() {
        let now = Utc::now();
        let ends = vec![
            now - Duration::days(2),
            now,
            now + Duration::hours(1),
            now - Duration::seconds(1),
        ];

        let timeline = Timeline::partition(ends.clone(), now, |end| *end);

        assert_eq!(timeline.upcoming.len() + timeline.past.len(), ends.len());
        assert_eq!(timeline.upcoming, vec![now, now + Duration::hours(1)]);
        assert_eq!(
            timeline.past,
            vec![now - Duration::days(2), now - Duration::seconds(1)]
        );
    }

    #[test]
    fn test_empty_partition() {
        let timeline: Timeline<DateTime<Utc>> = Timeline::partition(Vec::new(), Utc::now(), |e| *e);
        assert!(timeline.upcoming.is_empty() && timeline.past.is_empty());
    }
}
