//! External account linking as seen from this client.
//!
//! The OAuth redirect completes in another browser context, so the only
//! evidence of success is a later profile fetch reporting the account as
//! linked. Request failures while authorizing are terminal for the
//! attempt; poll failures while waiting are not.

use crate::mvi::{Intent, Reducer, ViewState};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LinkState {
    #[default]
    Unlinked,
    /// Redirect URL requested from the service.
    Authorizing,
    /// The URL was handed to an external opener; waiting for the profile.
    PendingConfirmation { url: String },
    Linked { login: Option<String> },
    Failed { error: String },
}

impl ViewState for LinkState {}

impl LinkState {
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. })
    }

    /// Whether the client should keep polling the profile.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Authorizing | Self::PendingConfirmation { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkIntent {
    Start,
    UrlReceived { url: String },
    RequestFailed { message: String },
    ProfileObserved { linked: bool, login: Option<String> },
    Cancel,
}

impl Intent for LinkIntent {}

pub struct LinkReducer;

impl Reducer for LinkReducer {
    type State = LinkState;
    type Intent = LinkIntent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            LinkIntent::Start => match state {
                LinkState::Unlinked | LinkState::Failed { .. } => LinkState::Authorizing,
                other => other,
            },

            LinkIntent::UrlReceived { url } => match state {
                LinkState::Authorizing => LinkState::PendingConfirmation { url },
                other => other,
            },

            LinkIntent::RequestFailed { message } => match state {
                LinkState::Authorizing => LinkState::Failed { error: message },
                other => other,
            },

            // The service is the source of truth, whatever we thought.
            LinkIntent::ProfileObserved {
                linked: true,
                login,
            } => LinkState::Linked { login },

            LinkIntent::ProfileObserved { linked: false, .. } => match state {
                LinkState::Linked { .. } => LinkState::Unlinked,
                other => other,
            },

            LinkIntent::Cancel => match state {
                LinkState::Authorizing | LinkState::PendingConfirmation { .. } => {
                    LinkState::Unlinked
                }
                other => other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce_all(intents: Vec<LinkIntent>) -> LinkState {
        intents
            .into_iter()
            .fold(LinkState::default(), LinkReducer::reduce)
    }

    #[test]
    fn unlinked_is_default() {
        assert_eq!(LinkState::default(), LinkState::Unlinked);
    }

    #[test]
    fn happy_path_reaches_linked_via_profile() {
        let state = reduce_all(vec![
            LinkIntent::Start,
            LinkIntent::UrlReceived {
                url: "https://id.twitch.tv/oauth2/authorize".into(),
            },
            LinkIntent::ProfileObserved {
                linked: false,
                login: None,
            },
        ]);
        assert!(state.is_waiting());

        let state = LinkReducer::reduce(
            state,
            LinkIntent::ProfileObserved {
                linked: true,
                login: Some("viewer42".into()),
            },
        );
        assert_eq!(
            state,
            LinkState::Linked {
                login: Some("viewer42".into())
            }
        );
    }

    #[test]
    fn url_request_failure_fails_attempt() {
        let state = reduce_all(vec![
            LinkIntent::Start,
            LinkIntent::RequestFailed {
                message: "No authorize URL received".into(),
            },
        ]);
        assert_eq!(state.error_message(), Some("No authorize URL received"));

        // A new attempt is allowed after failure.
        assert_eq!(
            LinkReducer::reduce(state, LinkIntent::Start),
            LinkState::Authorizing
        );
    }

    #[test]
    fn failures_while_pending_do_not_abort() {
        let state = reduce_all(vec![
            LinkIntent::Start,
            LinkIntent::UrlReceived { url: "u".into() },
            LinkIntent::RequestFailed {
                message: "poll timeout".into(),
            },
        ]);
        assert_eq!(state, LinkState::PendingConfirmation { url: "u".into() });
    }

    #[test]
    fn start_is_ignored_when_already_linked() {
        let linked = LinkState::Linked { login: None };
        assert_eq!(LinkReducer::reduce(linked.clone(), LinkIntent::Start), linked);
    }

    #[test]
    fn remote_unlink_is_observed() {
        let state = LinkReducer::reduce(
            LinkState::Linked { login: None },
            LinkIntent::ProfileObserved {
                linked: false,
                login: None,
            },
        );
        assert_eq!(state, LinkState::Unlinked);
    }

    #[test]
    fn cancel_returns_to_unlinked() {
        let state = reduce_all(vec![LinkIntent::Start, LinkIntent::Cancel]);
        assert_eq!(state, LinkState::Unlinked);
    }
}
