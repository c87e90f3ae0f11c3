//! Biometric collaborators: the device capability probe and the
//! authentication challenge. The platform implementations live outside this
//! crate; [`SimulatedDevice`] stands in for them when running the host app.

use axum::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Biometric modality reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometricKind {
    Face,
    Fingerprint,
    Iris,
    #[default]
    Generic,
}

impl BiometricKind {
    /// Human-readable name for prompts and buttons
    pub fn method_name(&self) -> &'static str {
        match self {
            BiometricKind::Face => "Face ID",
            BiometricKind::Fingerprint => "Fingerprint",
            BiometricKind::Iris => "Iris",
            BiometricKind::Generic => "Biometric Authentication",
        }
    }
}

/// Result of probing the device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    /// Compatible hardware present and at least one credential enrolled
    pub available: bool,
    pub kind: BiometricKind,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn available(kind: BiometricKind) -> Self {
        ProbeResult { available: true, kind, error: None }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ProbeResult {
            available: false,
            kind: BiometricKind::Generic,
            error: Some(reason.into()),
        }
    }
}

/// Result of an authentication challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "error", rename_all = "camelCase")]
pub enum ChallengeOutcome {
    /// User successfully authenticated
    Success,
    /// User dismissed the prompt
    Cancelled,
    /// Any other failure (no match, hardware error, platform lockout)
    Failed(String),
}

#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn probe(&self) -> ProbeResult;
}

#[async_trait]
pub trait AuthChallenge: Send + Sync {
    async fn challenge(&self, prompt: &str) -> ChallengeOutcome;
}

/// Configured stand-in for a device.
///
/// Probe results come from the hardware/enrollment flags. Challenges pop
/// queued outcomes first and otherwise return the default outcome.
#[derive(Debug)]
pub struct SimulatedDevice {
    kind: BiometricKind,
    hardware_present: bool,
    enrolled: bool,
    default_outcome: ChallengeOutcome,
    queued: Mutex<VecDeque<ChallengeOutcome>>,
}

impl SimulatedDevice {
    pub fn new(kind: BiometricKind, hardware_present: bool, enrolled: bool) -> Self {
        SimulatedDevice {
            kind,
            hardware_present,
            enrolled,
            default_outcome: ChallengeOutcome::Success,
            queued: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_default_outcome(mut self, outcome: ChallengeOutcome) -> Self {
        self.default_outcome = outcome;
        self
    }

    /// Queue the outcome of the next challenge
    pub fn push_outcome(&self, outcome: ChallengeOutcome) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(outcome);
        }
    }
}

#[async_trait]
impl CapabilityProbe for SimulatedDevice {
    async fn probe(&self) -> ProbeResult {
        if !self.hardware_present {
            return ProbeResult::unavailable("No compatible biometric hardware");
        }
        if !self.enrolled {
            return ProbeResult::unavailable(format!("{} is not enrolled", self.kind.method_name()));
        }
        ProbeResult::available(self.kind)
    }
}

#[async_trait]
impl AuthChallenge for SimulatedDevice {
    async fn challenge(&self, prompt: &str) -> ChallengeOutcome {
        let queued = self.queued.lock().ok().and_then(|mut queued| queued.pop_front());
        let outcome = queued.unwrap_or_else(|| self.default_outcome.clone());
        tracing::debug!(prompt, ?outcome, "Simulated biometric challenge");
        outcome
    }
}
