use crate::calc::{student_totals, AttendanceIndex, Band};
use crate::error::{StoreError, TrackerError};
use crate::model::AttendanceSnapshot;
use crate::period::{PeriodKey, PeriodOption};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Group and month the view is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub group_id: String,
    pub period: PeriodKey,
}

/// Handed out by `begin_load`; only the newest ticket may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub selection: Selection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Discarded,
}

#[derive(Debug, Clone)]
pub struct LoadedPeriod {
    pub selection: Selection,
    pub snapshot: AttendanceSnapshot,
    pub index: AttendanceIndex,
}

/// View state owned by one attendance screen.
///
/// Transitions: `idle -> loading -> loaded | error`, and back to `loading` on
/// every reselect, refresh or toggle resync. The last successfully fetched
/// period stays in `loaded` across failures.
///
/// The IPC loop applies each fetch before reading the next request, so a
/// ticket is never stale there. The generation check matters for hosts that
/// run fetches on another thread and apply results as they arrive: only the
/// newest ticket's result may land.
#[derive(Debug, Default)]
pub struct AttendanceView {
    selection: Option<Selection>,
    generation: u64,
    phase: Option<Phase>,
    last_error: Option<String>,
    loaded: Option<LoadedPeriod>,
}

impl AttendanceView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase.unwrap_or(Phase::Idle)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn loaded(&self) -> Option<&LoadedPeriod> {
        self.loaded.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a fetch for `selection`. Any ticket issued earlier becomes stale.
    pub fn begin_load(&mut self, selection: Selection) -> FetchTicket {
        self.generation += 1;
        self.selection = Some(selection.clone());
        self.phase = Some(Phase::Loading);
        FetchTicket {
            generation: self.generation,
            selection,
        }
    }

    /// Applies a fetch result. Results for a superseded ticket are dropped
    /// without touching state.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<AttendanceSnapshot, StoreError>,
    ) -> Result<ApplyOutcome, TrackerError> {
        if ticket.generation != self.generation {
            tracing::debug!(
                group_id = %ticket.selection.group_id,
                period = %ticket.selection.period.key(),
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale attendance fetch"
            );
            return Ok(ApplyOutcome::Discarded);
        }
        match result {
            Ok(snapshot) => {
                let index = AttendanceIndex::build(&snapshot.attendance_by_student);
                self.loaded = Some(LoadedPeriod {
                    selection: ticket.selection,
                    snapshot,
                    index,
                });
                self.phase = Some(Phase::Loaded);
                self.last_error = None;
                Ok(ApplyOutcome::Applied)
            }
            Err(e) => {
                tracing::warn!(
                    group_id = %ticket.selection.group_id,
                    period = %ticket.selection.period.key(),
                    error = %e,
                    "attendance fetch failed; keeping last loaded state"
                );
                self.phase = Some(Phase::Error);
                self.last_error = Some(e.to_string());
                Err(TrackerError::FetchFailure(e))
            }
        }
    }

    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub fn is_present(&self, student_id: &str, session_id: &str) -> bool {
        self.loaded
            .as_ref()
            .map(|l| l.index.is_present(student_id, session_id))
            .unwrap_or(false)
    }

    pub fn render(&self) -> ViewModel {
        let selection = self
            .loaded
            .as_ref()
            .map(|l| &l.selection)
            .or(self.selection.as_ref());
        let mut model = ViewModel {
            state: self.phase(),
            group_id: selection.map(|s| s.group_id.clone()),
            period: selection.map(|s| s.period.option()),
            error: self.last_error.clone(),
            empty_state: false,
            export_enabled: false,
            sessions: Vec::new(),
            rows: Vec::new(),
        };
        let Some(loaded) = self.loaded.as_ref() else {
            return model;
        };
        let snapshot = &loaded.snapshot;
        model.export_enabled = !snapshot.attendance_by_student.is_empty();
        if snapshot.schedules.is_empty() {
            model.empty_state = true;
            return model;
        }

        model.sessions = snapshot
            .schedules
            .iter()
            .map(|s| SessionColumn {
                id: s.id.clone(),
                date: s.date.format("%Y-%m-%d").to_string(),
                label: s.date.format("%d.%m").to_string(),
            })
            .collect();
        model.rows = snapshot
            .attendance_by_student
            .iter()
            .map(|item| {
                let totals = student_totals(item, &loaded.index, &snapshot.schedules);
                StudentRow {
                    student_id: item.student.id.clone(),
                    display_name: item.student.display_name(),
                    cells: snapshot
                        .schedules
                        .iter()
                        .map(|s| Cell {
                            session_id: s.id.clone(),
                            present: loaded.index.is_present(&item.student.id, &s.id),
                        })
                        .collect(),
                    attended: totals.attended,
                    total_lessons: totals.total_lessons,
                    totals_label: format!("{}/{}", totals.attended, totals.total_lessons),
                    percentage: totals.percentage,
                    band: totals.band,
                }
            })
            .collect();
        model
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub state: Phase,
    pub group_id: Option<String>,
    pub period: Option<PeriodOption>,
    pub error: Option<String>,
    pub empty_state: bool,
    pub export_enabled: bool,
    pub sessions: Vec<SessionColumn>,
    pub rows: Vec<StudentRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionColumn {
    pub id: String,
    pub date: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub student_id: String,
    pub display_name: String,
    pub cells: Vec<Cell>,
    pub attended: u32,
    pub total_lessons: u32,
    pub totals_label: String,
    pub percentage: u32,
    pub band: Band,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub session_id: String,
    pub present: bool,
}
