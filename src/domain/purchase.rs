//! Delivery status of a skin purchase.
//!
//! The client only observes this state machine, it never drives it.
//! Observations can arrive out of order when polls overlap, so the tracker
//! refuses to move backwards and a terminal status is final.

use crate::domain::models::PurchaseStatusResponse;
use crate::mvi::{Intent, Reducer, ViewState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStatus {
    Requested,
    Sent,
    Success,
    Failed,
    NotClaimed,
}

impl PurchaseStatus {
    /// Parse a status string reported by the service.
    ///
    /// Anything unrecognised is treated as still being processed.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sent" => Self::Sent,
            "success" | "delivered" => Self::Success,
            "failed" | "error" => Self::Failed,
            "not_claimed" | "notclaimed" | "expired" => Self::NotClaimed,
            _ => Self::Requested,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::NotClaimed)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Requested => 0,
            Self::Sent => 1,
            Self::Success | Self::Failed | Self::NotClaimed => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Requested => "processing",
            Self::Sent => "sent",
            Self::Success => "delivered",
            Self::Failed => "failed",
            Self::NotClaimed => "not claimed",
        }
    }
}

impl std::fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl PurchaseStatusResponse {
    /// `delivery_status` is the more specific field when both are present.
    pub fn effective_status(&self) -> PurchaseStatus {
        self.delivery_status
            .as_deref()
            .or(self.status.as_deref())
            .map(PurchaseStatus::parse)
            .unwrap_or(PurchaseStatus::Requested)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PurchaseState {
    pub purchase_id: Option<i64>,
    pub status: Option<PurchaseStatus>,
    pub skin_name: Option<String>,
    pub error: Option<String>,
    /// Last poll error; cleared by the next successful observation.
    pub poll_error: Option<String>,
}

impl ViewState for PurchaseState {}

impl PurchaseState {
    pub fn for_purchase(purchase_id: i64) -> Self {
        Self {
            purchase_id: Some(purchase_id),
            ..Self::default()
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status.is_some_and(PurchaseStatus::is_terminal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseIntent {
    Observed(PurchaseStatusResponse),
    PollFailed { message: String },
}

impl Intent for PurchaseIntent {}

pub struct PurchaseReducer;

impl Reducer for PurchaseReducer {
    type State = PurchaseState;
    type Intent = PurchaseIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            PurchaseIntent::Observed(response) => {
                let observed = response.effective_status();
                let current_rank = state.status.map(PurchaseStatus::rank);

                if state.is_settled() || current_rank.is_some_and(|r| observed.rank() < r) {
                    tracing::trace!(
                        current = ?state.status,
                        observed = ?observed,
                        "Ignoring stale purchase observation"
                    );
                    return state;
                }

                PurchaseState {
                    purchase_id: response.purchase_id.or(state.purchase_id),
                    status: Some(observed),
                    skin_name: response.skin_name.or(state.skin_name),
                    error: response.error.or(state.error),
                    poll_error: None,
                }
            }

            PurchaseIntent::PollFailed { message } => PurchaseState {
                poll_error: Some(message),
                ..state
            },
        }
    }
}
