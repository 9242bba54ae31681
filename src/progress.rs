//! Completion status and row progress reporting.

use enough::{Stop, StopReason};

/// How a decode or encode ended.
///
/// A stopped operation is not an error: the partial raster (or the bytes
/// already written) remain usable.
#[derive(Clone, Debug)]
pub enum Completion {
    Complete,
    Aborted(StopReason),
}

impl Completion {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completion::Complete)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Completion::Aborted(_))
    }
}

/// Notifications passed to a progress callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgressEvent {
    Started,
    /// Percentage of output rows finished, 0.0..=100.0, never decreasing.
    Percent(f32),
    Completed,
    Aborted,
}

/// Row counter driving a progress callback.
pub(crate) struct RowProgress<'p> {
    callback: &'p mut dyn FnMut(ProgressEvent),
    rows: u32,
}

impl<'p> RowProgress<'p> {
    pub(crate) fn start(callback: &'p mut dyn FnMut(ProgressEvent), rows: u32) -> Self {
        callback(ProgressEvent::Started);
        Self { callback, rows }
    }

    pub(crate) fn rows_done(&mut self, done: u32) {
        let pct = if self.rows == 0 {
            100.0
        } else {
            100.0 * done as f32 / self.rows as f32
        };
        (self.callback)(ProgressEvent::Percent(pct.min(100.0)));
    }

    pub(crate) fn finish(self, completion: &Completion) {
        (self.callback)(match completion {
            Completion::Complete => ProgressEvent::Completed,
            Completion::Aborted(_) => ProgressEvent::Aborted,
        });
    }
}

/// Poll the stop token; `Some` when the caller asked to stop.
#[inline]
pub(crate) fn poll(stop: &dyn Stop) -> Option<StopReason> {
    stop.check().err()
}

/// Progress sink that ignores everything.
pub(crate) fn ignore(_: ProgressEvent) {}
