use crate::error::TrackerError;
use crate::export::{write_csv_report, ExportSummary};
use crate::period::{lookup_period, PeriodKey};
use crate::store::AttendanceStore;
use crate::view::{AttendanceView, Selection, ViewModel};
use std::path::Path;

/// Drives one attendance screen against a backing store.
///
/// Every mutation is followed by a full refetch of the open period, and the
/// view only ever shows what the most recent fetch returned.
pub struct AttendanceTracker<S: AttendanceStore> {
    store: S,
    view: AttendanceView,
}

impl<S: AttendanceStore> AttendanceTracker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            view: AttendanceView::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &AttendanceView {
        &self.view
    }

    pub fn render(&self) -> ViewModel {
        self.view.render()
    }

    /// Opens `group_id` at `period` and loads it.
    pub fn open(&mut self, group_id: &str, period: PeriodKey) -> Result<(), TrackerError> {
        if period.catalogue_label().is_none() {
            return Err(TrackerError::UnknownPeriod(format!(
                "period {} is not selectable",
                period.key()
            )));
        }
        self.load(Selection {
            group_id: group_id.to_string(),
            period,
        })
    }

    pub fn select_period(&mut self, raw: &str) -> Result<(), TrackerError> {
        let period = lookup_period(raw).map_err(TrackerError::UnknownPeriod)?;
        let group_id = self
            .view
            .selection()
            .map(|s| s.group_id.clone())
            .ok_or(TrackerError::NoGroup)?;
        self.load(Selection { group_id, period })
    }

    pub fn refresh(&mut self) -> Result<(), TrackerError> {
        let selection = self.view.selection().cloned().ok_or(TrackerError::NoGroup)?;
        self.load(selection)
    }

    fn load(&mut self, selection: Selection) -> Result<(), TrackerError> {
        let range = selection.period.range();
        let ticket = self.view.begin_load(selection);
        let result = self
            .store
            .fetch_period(&ticket.selection.group_id, &range);
        self.view.apply(ticket, result).map(|_| ())
    }

    /// Writes `!current_presence` for (session, student), then refetches the
    /// whole period.
    ///
    /// `current_presence` must be the value currently displayed. Calling this
    /// twice with the same value before the first resync lands flips the
    /// record twice.
    ///
    /// When the write fails nothing is retried, but the period is still
    /// refetched so the display does not drift from the backend.
    pub fn commit_toggle_and_resync(
        &mut self,
        session_id: &str,
        student_id: &str,
        current_presence: bool,
    ) -> Result<(), TrackerError> {
        let selection = self.view.selection().cloned().ok_or(TrackerError::NoGroup)?;
        let target = !current_presence;
        match self.store.set_presence(session_id, student_id, target) {
            Ok(()) => {
                tracing::info!(session_id, student_id, present = target, "attendance updated");
                self.load(selection)
            }
            Err(e) => {
                tracing::error!(
                    session_id,
                    student_id,
                    present = target,
                    error = %e,
                    "attendance update failed"
                );
                if let Err(resync) = self.load(selection) {
                    tracing::warn!(error = %resync, "resync after failed update also failed");
                }
                let err = TrackerError::MutationFailure(e);
                self.view.record_error(err.to_string());
                Err(err)
            }
        }
    }

    /// Exports the loaded period. `Ok(None)` means there was nothing to export.
    pub fn export_csv(&self, out_dir: &Path) -> Result<Option<ExportSummary>, TrackerError> {
        let Some(loaded) = self.view.loaded() else {
            return Ok(None);
        };
        let summary = write_csv_report(&loaded.snapshot, &loaded.selection.period, out_dir)
            .map_err(TrackerError::Export)?;
        if let Some(s) = &summary {
            tracing::info!(path = %s.path.display(), rows = s.row_count, "attendance csv exported");
        }
        Ok(summary)
    }
}
