//! Per-screen view-state lifecycle.
//!
//! Every screen slice goes through the same loading/error/success cycle.
//! `ViewState` owns that cycle for one slice and guards it against two
//! hazards of fire-and-await UI code: re-entry (a second operation started
//! while one is in flight) and stale completions (a response arriving after
//! a newer operation superseded it).

use crate::error::CrocialError;

/// Proof that an operation was admitted by [`ViewState::begin`].
///
/// Carries the sequence number of the admitting state; completions are
/// applied only while that sequence is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpToken {
    seq: u64,
}

/// Whether a completion was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    Stale,
}

impl Applied {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Mutable state of one screen slice with consistent lifecycle semantics.
///
/// - `begin` admits at most one in-flight operation (reject-reentry).
/// - `fail` records the error but never erases the previous successful
///   result, so stale-but-valid data stays visible.
/// - completions from superseded operations are discarded.
#[derive(Debug)]
pub struct ViewState<T> {
    result: Option<T>,
    error: Option<CrocialError>,
    loading: bool,
    seq: u64,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            result: None,
            error: None,
            loading: false,
            seq: 0,
        }
    }
}

impl<T> ViewState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new operation under the reject-reentry policy.
    ///
    /// Returns `None` while another operation is in flight; the caller must
    /// treat that as a no-op, not an error. On admission the error is
    /// cleared, loading is set, and the returned token binds completions to
    /// this operation.
    pub fn begin(&mut self) -> Option<OpToken> {
        if self.loading {
            return None;
        }
        self.seq += 1;
        self.loading = true;
        self.error = None;
        Some(OpToken { seq: self.seq })
    }

    /// Starts a new operation, superseding any in-flight one.
    ///
    /// The prior operation's completion will be discarded as stale. Used
    /// where restart semantics are required instead of reject-reentry.
    pub fn begin_superseding(&mut self) -> OpToken {
        self.seq += 1;
        self.loading = true;
        self.error = None;
        OpToken { seq: self.seq }
    }

    /// Applies a successful completion, unless the token is stale.
    pub fn succeed(&mut self, token: &OpToken, value: T) -> Applied {
        if token.seq != self.seq {
            return Applied::Stale;
        }
        self.result = Some(value);
        self.error = None;
        self.loading = false;
        Applied::Applied
    }

    /// Applies a failed completion, unless the token is stale.
    ///
    /// The previous successful result is left untouched.
    pub fn fail(&mut self, token: &OpToken, error: CrocialError) -> Applied {
        if token.seq != self.seq {
            return Applied::Stale;
        }
        self.error = Some(error);
        self.loading = false;
        Applied::Applied
    }

    /// Clears the dismissible error without touching result or loading.
    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Drops all state, e.g. when the backing identity changes.
    ///
    /// Any in-flight completion becomes stale.
    pub fn reset(&mut self) {
        self.result = None;
        self.error = None;
        self.loading = false;
        self.seq += 1;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn result_mut(&mut self) -> Option<&mut T> {
        self.result.as_mut()
    }

    pub fn error(&self) -> Option<&CrocialError> {
        self.error.as_ref()
    }
}

/// Owned copy of a slice's state, for presentation layers and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot<T> {
    pub result: Option<T>,
    pub error: Option<CrocialError>,
    pub loading: bool,
}

impl<T: Clone> ViewState<T> {
    pub fn snapshot(&self) -> ViewSnapshot<T> {
        ViewSnapshot {
            result: self.result.clone(),
            error: self.error.clone(),
            loading: self.loading,
        }
    }
}
