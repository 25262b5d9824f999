// ── Apply / rollback workflow ──
//
// Two states: idle, or busy with one apply/rollback. The flag is advisory
// (for disabling buttons); it never locks out concurrent calls or local
// edits. Alongside it sits an advisory "draft differs from what was last
// applied" flag.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowOp {
    Apply,
    Rollback,
}

impl fmt::Display for WorkflowOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => f.write_str("apply"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkflowState {
    Idle,
    Busy(WorkflowOp),
}

pub(crate) struct Workflow {
    state: watch::Sender<WorkflowState>,
    draft_dirty: watch::Sender<bool>,
}

/// Returns the workflow to `Idle` when dropped, whatever the outcome.
pub(crate) struct BusyGuard<'a> {
    workflow: &'a Workflow,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.workflow.state.send_replace(WorkflowState::Idle);
    }
}

impl Workflow {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        let (draft_dirty, _) = watch::channel(false);
        Self { state, draft_dirty }
    }

    pub(crate) fn begin(&self, op: WorkflowOp) -> BusyGuard<'_> {
        self.state.send_replace(WorkflowState::Busy(op));
        BusyGuard { workflow: self }
    }

    pub(crate) fn state(&self) -> WorkflowState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    pub(crate) fn is_busy(&self) -> bool {
        matches!(self.state(), WorkflowState::Busy(_))
    }

    pub(crate) fn mark_dirty(&self) {
        self.draft_dirty.send_if_modified(|dirty| !std::mem::replace(dirty, true));
    }

    pub(crate) fn mark_clean(&self) {
        self.draft_dirty.send_if_modified(|dirty| std::mem::replace(dirty, false));
    }

    pub(crate) fn is_dirty(&self) -> bool {
        *self.draft_dirty.borrow()
    }

    pub(crate) fn subscribe_dirty(&self) -> watch::Receiver<bool> {
        self.draft_dirty.subscribe()
    }
}
