use crate::episode::{merge, Episode};
use crate::record::{Mode, Record};
use crate::summary::{has_deltas_base, summarize, Closing, Report};

/// Per-stream episode segmentation. One instance per vehicle stream; nothing
/// is shared between instances.
#[derive(Debug, Default)]
pub struct Segmenter {
    current: Option<Episode>,
    /// Last record of the most recently closed episode.
    baseline: Option<Record>,
    /// Latest Polling contact since the open episode began.
    last_contact: Option<i64>,
    closed: usize,
}

impl Segmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next record in arrival order. Returns a report when an
    /// episode closed and produced a line.
    pub fn feed(&mut self, record: Record) -> Option<Report> {
        if record.is_polling() {
            self.last_contact = Some(record.timestamp);
            return None;
        }

        let episode = match self.current.take() {
            Some(ep) if ep.mode != record.mode => ep,
            other => {
                if other.is_none() {
                    self.last_contact = None;
                }
                self.current = Some(merge(other, record));
                return None;
            }
        };

        if self.should_defer(&episode) {
            log::debug!(
                "{} episode from {} has no odometer yet, deferring",
                episode.mode,
                episode.started_at()
            );
            self.current = Some(episode.merge(record));
            return None;
        }

        let ended_at = match self.last_contact {
            Some(t) => t.max(episode.last.timestamp),
            None => episode.last.timestamp,
        };
        let report = summarize(&Closing {
            episode: &episode,
            baseline: self.baseline.as_ref(),
            transition: &record,
            ended_at,
        });

        self.closed += 1;
        self.baseline = Some(episode.last);
        self.last_contact = None;
        self.current = Some(Episode::open(record));
        report
    }

    /// A Driving episode needs an odometer reading to close.
    fn should_defer(&self, episode: &Episode) -> bool {
        let guarded = self
            .baseline
            .as_ref()
            .is_some_and(has_deltas_base);
        guarded && episode.mode == Mode::Driving && episode.last.odometer.is_none()
    }

    pub fn current(&self) -> Option<&Episode> {
        self.current.as_ref()
    }

    /// Number of episodes closed so far.
    pub fn closed(&self) -> usize {
        self.closed
    }
}
