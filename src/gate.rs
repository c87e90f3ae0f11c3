//! Biometric quick-login gate.
//!
//! Decides whether the login surface offers "use biometric" from three
//! inputs: the device capability probe, the stored biometric preference and
//! the presence of a last-session record. The state is re-evaluated on every
//! [`AuthGate::refresh`] (screen focus) and never cached across focuses.
//!
//! Probes and challenges may suspend. Each refresh takes a ticket from a
//! monotonic counter and a result is only applied if no newer ticket has
//! been applied first. Challenge results are only committed while the
//! caller's [`Liveness`] is still active.

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::biometric::{AuthChallenge, BiometricKind, CapabilityProbe, ChallengeOutcome, ProbeResult};
use crate::lockout::{FailureTracker, LockoutConfig};
use crate::models::SessionRecord;
use crate::session::SessionContext;
use crate::store::Preferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GateState {
    /// Not evaluated yet
    Unknown,
    /// No compatible hardware or nothing enrolled; feature hidden
    Unavailable,
    AvailableDisabled,
    AvailableEnabledNoSession,
    AvailableEnabledWithSession,
}

impl GateState {
    pub fn evaluate(probe: &ProbeResult, enabled: bool, has_session: bool) -> Self {
        match (probe.available, enabled, has_session) {
            (false, _, _) => GateState::Unavailable,
            (true, false, _) => GateState::AvailableDisabled,
            (true, true, false) => GateState::AvailableEnabledNoSession,
            (true, true, true) => GateState::AvailableEnabledWithSession,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, GateState::Unknown | GateState::Unavailable)
    }

    pub fn is_enabled(&self) -> bool {
        matches!(
            self,
            GateState::AvailableEnabledNoSession | GateState::AvailableEnabledWithSession
        )
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GateError {
    #[error("Biometric authentication is not available on this device")]
    Unavailable,

    #[error("Biometric login is not enabled")]
    NotEnabled,

    #[error("No saved session to restore; sign in with your credentials")]
    NoSavedSession,

    #[error("Biometric authentication failed: {reason}")]
    ChallengeFailed { reason: String, attempts_remaining: u32 },

    #[error("Too many failed attempts; biometric login is locked for {remaining_seconds}s, sign in with your credentials")]
    LockedOut { remaining_seconds: i64 },

    #[error("The screen that started this request is no longer active")]
    Stale,
}

/// Liveness flag of the screen or modal waiting on a challenge
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Liveness(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Screen dismissed or navigated away
    pub fn deactivate(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// What the login surface needs to render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateSnapshot {
    pub state: GateState,
    pub kind: Option<BiometricKind>,
    pub method_name: Option<&'static str>,
    /// Show the "use biometric" affordance
    pub offer_biometric_login: bool,
    /// Display name from the last-session record, for "Welcome back"
    pub saved_user: Option<String>,
    pub locked_out_seconds: Option<i64>,
}

/// Result of enabling or disabling biometrics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateUpdate {
    pub snapshot: GateSnapshot,
    /// User dismissed the challenge; nothing changed
    pub cancelled: bool,
    /// Non-fatal storage problem
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BiometricLogin {
    Restored(SessionRecord),
    /// User dismissed the prompt; no error is shown
    Cancelled,
}

#[derive(Debug)]
struct GateInner {
    state: GateState,
    kind: Option<BiometricKind>,
    applied_ticket: u64,
    failures: FailureTracker,
}

pub struct AuthGate {
    probe: Arc<dyn CapabilityProbe>,
    challenge: Arc<dyn AuthChallenge>,
    prefs: Preferences,
    tickets: AtomicU64,
    inner: Mutex<GateInner>,
}

impl AuthGate {
    pub fn new(
        probe: Arc<dyn CapabilityProbe>,
        challenge: Arc<dyn AuthChallenge>,
        prefs: Preferences,
        lockout: LockoutConfig,
    ) -> Self {
        AuthGate {
            probe,
            challenge,
            prefs,
            tickets: AtomicU64::new(0),
            inner: Mutex::new(GateInner {
                state: GateState::Unknown,
                kind: None,
                applied_ticket: 0,
                failures: FailureTracker::new(lockout),
            }),
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    // Never held across an await
    fn lock(&self) -> MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> GateState {
        self.lock().state
    }

    pub fn snapshot(&self) -> GateSnapshot {
        let inner = self.lock();
        let locked_out_seconds = inner.failures.remaining_lockout_seconds(Utc::now());
        let saved_user = if inner.state.is_enabled() {
            self.prefs.last_session().map(|record| record.display_name)
        } else {
            None
        };
        GateSnapshot {
            state: inner.state,
            kind: inner.kind,
            method_name: inner.kind.map(|kind| kind.method_name()),
            offer_biometric_login: inner.state == GateState::AvailableEnabledWithSession
                && locked_out_seconds.is_none(),
            saved_user,
            locked_out_seconds,
        }
    }

    /// Re-evaluate the gate. Called on every screen focus.
    pub async fn refresh(&self) -> GateSnapshot {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let probe = self.probe.probe().await;
        if let Some(reason) = &probe.error {
            tracing::debug!(ticket, reason = %reason, "Capability probe reported an error");
        }

        let state = GateState::evaluate(
            &probe,
            self.prefs.biometric_enabled(),
            self.prefs.has_last_session(),
        );

        {
            let mut inner = self.lock();
            if ticket < inner.applied_ticket {
                tracing::debug!(ticket, applied = inner.applied_ticket, "Discarding stale probe result");
            } else {
                if inner.state != state {
                    tracing::info!(from = ?inner.state, to = ?state, "Biometric gate transition");
                }
                inner.state = state;
                inner.kind = probe.available.then_some(probe.kind);
                inner.applied_ticket = ticket;
            }
        }
        self.snapshot()
    }

    /// Opt in to biometric login. The preference is only persisted after a
    /// successful challenge.
    pub async fn enable(&self, liveness: &Liveness) -> Result<GateUpdate, GateError> {
        let current = self.refresh().await;
        if !current.state.is_available() {
            return Err(GateError::Unavailable);
        }
        if current.state.is_enabled() {
            return Ok(GateUpdate { snapshot: current, cancelled: false, warning: None });
        }

        if !liveness.is_alive() {
            tracing::debug!("Not prompting for enable from an inactive screen");
            return Err(GateError::Stale);
        }

        let method = current.method_name.unwrap_or("biometrics");
        let prompt = format!("Confirm {} to enable quick login", method);
        let outcome = self.challenge.challenge(&prompt).await;
        if !liveness.is_alive() {
            tracing::debug!(?outcome, "Dropping enable result for inactive screen");
            return Err(GateError::Stale);
        }

        match outcome {
            ChallengeOutcome::Success => {
                let warning = match self.prefs.set_biometric_enabled(true) {
                    Ok(()) => {
                        tracing::info!("Biometric login enabled");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to persist biometric preference");
                        Some(format!("Biometric login could not be saved: {}", e))
                    }
                };
                Ok(GateUpdate { snapshot: self.refresh().await, cancelled: false, warning })
            }
            ChallengeOutcome::Cancelled => {
                tracing::info!("Biometric enable cancelled by user");
                Ok(GateUpdate { snapshot: self.snapshot(), cancelled: true, warning: None })
            }
            ChallengeOutcome::Failed(reason) => {
                tracing::warn!(reason = %reason, "Biometric enable challenge failed");
                Err(GateError::ChallengeFailed { reason, attempts_remaining: self.attempts_remaining() })
            }
        }
    }

    /// Clear the stored preference. The last-session record is kept; only
    /// logout erases it.
    pub async fn disable(&self) -> GateUpdate {
        let warning = match self.prefs.clear_biometric_preference() {
            Ok(()) => {
                tracing::info!("Biometric login disabled");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear biometric preference");
                Some(format!("Biometric preference could not be cleared: {}", e))
            }
        };
        GateUpdate { snapshot: self.refresh().await, cancelled: false, warning }
    }

    /// Re-authenticate with biometrics and restore the last-session record
    /// as the active session.
    pub async fn login(
        &self,
        session: &SessionContext,
        liveness: &Liveness,
    ) -> Result<BiometricLogin, GateError> {
        let current = self.refresh().await;
        match current.state {
            GateState::Unknown | GateState::Unavailable => return Err(GateError::Unavailable),
            GateState::AvailableDisabled => return Err(GateError::NotEnabled),
            GateState::AvailableEnabledNoSession => return Err(GateError::NoSavedSession),
            GateState::AvailableEnabledWithSession => {}
        }
        if let Some(remaining_seconds) = current.locked_out_seconds {
            tracing::warn!(remaining_seconds, "Biometric login attempted during lockout");
            return Err(GateError::LockedOut { remaining_seconds });
        }

        if !liveness.is_alive() {
            tracing::debug!("Not prompting for login from an inactive screen");
            return Err(GateError::Stale);
        }

        let method = current.method_name.unwrap_or("biometrics");
        let outcome = self.challenge.challenge(&format!("Sign in with {}", method)).await;
        if !liveness.is_alive() {
            tracing::debug!(?outcome, "Dropping login result for inactive screen");
            return Err(GateError::Stale);
        }

        match outcome {
            ChallengeOutcome::Success => {
                self.lock().failures.reset();
                let record = self.prefs.last_session().ok_or(GateError::NoSavedSession)?;
                session.establish(record.clone()).await;
                tracing::info!(user_id = %record.user_id, "Session restored via biometric login");
                Ok(BiometricLogin::Restored(record))
            }
            ChallengeOutcome::Cancelled => {
                tracing::info!("Biometric login cancelled by user");
                Ok(BiometricLogin::Cancelled)
            }
            ChallengeOutcome::Failed(reason) => {
                let now = Utc::now();
                let mut inner = self.lock();
                inner.failures.record_failure(now);
                let failures = inner.failures.consecutive_failures();
                tracing::warn!(failures, reason = %reason, "Biometric login challenge failed");
                if let Some(remaining_seconds) = inner.failures.remaining_lockout_seconds(now) {
                    return Err(GateError::LockedOut { remaining_seconds });
                }
                drop(inner);
                Err(GateError::ChallengeFailed { reason, attempts_remaining: self.attempts_remaining() })
            }
        }
    }

    /// Credential sign-in succeeded; failed biometric attempts no longer count
    pub fn clear_failures(&self) {
        self.lock().failures.reset();
    }

    fn attempts_remaining(&self) -> u32 {
        let inner = self.lock();
        inner
            .failures
            .max_failures()
            .saturating_sub(inner.failures.consecutive_failures())
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
