use serde::{Deserialize, Serialize};
use strum::Display;

/// Actions that can be triggered by user input or internal events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Quit,
    Error(String),
    Help,

    // Chain state
    Refresh,

    // Purchase flow
    Purchase,
    DismissError,
    TogglePaymentMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(Action::DismissError.to_string(), "dismiss_error");
        assert_eq!(
            serde_json::from_str::<Action>("\"Purchase\"").unwrap(),
            Action::Purchase
        );
        // Terminal housekeeping is handled by the tui directly
        assert!(serde_json::from_str::<Action>("\"ClearScreen\"").is_err());
        assert!(serde_json::from_str::<Action>("\"Resume\"").is_err());
    }
}
