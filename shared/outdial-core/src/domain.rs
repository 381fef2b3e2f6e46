//! Core domain types shared by the dialing services

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Contact dialing state.
///
/// Exactly one status at any time. `Pending` is the import/initial state;
/// the dispatcher writes `Calling`/`Failed`, the webhook handler writes the
/// terminal outcomes. `Exhausted` and `Dnc` permanently exclude a contact
/// from dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Pending,
    Calling,
    Answered,
    NoAnswer,
    Voicemail,
    Failed,
    Exhausted,
    Dnc,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Calling => "calling",
            Self::Answered => "answered",
            Self::NoAnswer => "no_answer",
            Self::Voicemail => "voicemail",
            Self::Failed => "failed",
            Self::Exhausted => "exhausted",
            Self::Dnc => "dnc",
        }
    }

    /// Statuses from which the dispatcher may start a new attempt.
    pub fn dialable(&self) -> bool {
        matches!(
            self,
            Self::Pending | Self::Failed | Self::NoAnswer | Self::Voicemail
        )
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "calling" => Ok(Self::Calling),
            "answered" => Ok(Self::Answered),
            "no_answer" => Ok(Self::NoAnswer),
            "voicemail" => Ok(Self::Voicemail),
            "failed" => Ok(Self::Failed),
            "exhausted" => Ok(Self::Exhausted),
            "dnc" => Ok(Self::Dnc),
            other => Err(format!("unknown contact status: {other}")),
        }
    }
}

/// Canonical outcome of a completed call attempt, mapped from the
/// provider's `endedReason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Answered,
    NoAnswer,
    Voicemail,
    Failed,
}

impl CallOutcome {
    /// Map a provider ended reason to the canonical outcome.
    ///
    /// The reasons that indicate a live conversation map to `Answered`;
    /// anything unrecognized is `Failed`.
    pub fn from_ended_reason(reason: &str) -> Self {
        match reason {
            "customer-ended-call"
            | "assistant-ended-call"
            | "assistant-ended-call-after-message-spoken" => Self::Answered,
            "voicemail" => Self::Voicemail,
            "customer-did-not-answer" | "customer-busy" => Self::NoAnswer,
            _ => Self::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::NoAnswer => "no_answer",
            Self::Voicemail => "voicemail",
            Self::Failed => "failed",
        }
    }

    /// The contact status this outcome maps to when the contact is not
    /// yet exhausted.
    pub fn contact_status(&self) -> ContactStatus {
        match self {
            Self::Answered => ContactStatus::Answered,
            Self::NoAnswer => ContactStatus::NoAnswer,
            Self::Voicemail => ContactStatus::Voicemail,
            Self::Failed => ContactStatus::Failed,
        }
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            other => Err(format!("unknown campaign status: {other}")),
        }
    }
}
