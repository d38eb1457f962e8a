use crate::record::{Mode, Record};

/// A run of consecutive same-mode records, held as its first and latest snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub mode: Mode,
    pub first: Record,
    pub last: Record,
}

impl Episode {
    pub fn open(record: Record) -> Self {
        Self {
            mode: record.mode,
            first: record.clone(),
            last: record,
        }
    }

    /// Replace `last`; `first` and `mode` are kept.
    pub fn merge(self, record: Record) -> Self {
        Self {
            mode: self.mode,
            first: self.first,
            last: record,
        }
    }

    pub fn started_at(&self) -> i64 {
        self.first.timestamp
    }
}

/// Fold a record into an optional episode, opening one if none exists.
pub fn merge(episode: Option<Episode>, record: Record) -> Episode {
    match episode {
        Some(ep) => ep.merge(record),
        None => Episode::open(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(ts: i64, level: i64) -> Record {
        Record {
            usable_battery_level: Some(level),
            ..Record::new(ts, Mode::Charging)
        }
    }

    #[test]
    fn merge_into_nothing_opens_episode() {
        let ep = merge(None, rec(100, 50));
        assert_eq!(ep.mode, Mode::Charging);
        assert_eq!(ep.first, ep.last);
        assert_eq!(ep.started_at(), 100);
    }

    #[test]
    fn merge_keeps_first_and_replaces_last() {
        let ep = merge(None, rec(100, 50));
        let ep = merge(Some(ep), rec(200, 60));
        let ep = merge(Some(ep), rec(300, 70));
        assert_eq!(ep.first.timestamp, 100);
        assert_eq!(ep.last.timestamp, 300);
        assert_eq!(ep.last.usable_battery_level, Some(70));
    }

    #[test]
    fn merging_same_record_twice_is_latest_wins() {
        let r = rec(200, 60);
        let ep = merge(None, rec(100, 50));
        let once = merge(Some(ep), r.clone());
        assert_eq!(once.last, r);
        let twice = merge(Some(once), r.clone());
        assert_eq!(twice.last, r);
        assert_eq!(twice.first.timestamp, 100);
    }
}
