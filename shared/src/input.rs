use serde::{Deserialize, Serialize};
use tracing::trace;

/// How a tap on an item reached the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapInput {
    Touch,
    /// `from_touch` is set when the platform reports the click was
    /// synthesized from a touch sequence.
    Click { from_touch: bool },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TapState {
    #[default]
    Idle,
    /// The touch on `item_id` may still be followed by its echo click.
    AwaitingSecondTap { item_id: String, until_ms: u64 },
}

/// Touch screens deliver a touch tap followed by a compatibility click for the
/// same gesture. This lets the first through and swallows the echo. A click
/// on a different item is a separate gesture and always counts.
#[derive(Debug, Clone)]
pub struct TapFilter {
    window_ms: u64,
    state: TapState,
}

impl TapFilter {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            state: TapState::Idle,
        }
    }

    pub fn state(&self) -> &TapState {
        &self.state
    }

    pub fn set_window(&mut self, window_ms: u64) {
        self.window_ms = window_ms;
        self.state = TapState::Idle;
    }

    /// Returns whether the input counts as a tap.
    pub fn accept(&mut self, item_id: &str, input: TapInput, now_ms: u64) -> bool {
        match input {
            TapInput::Touch => {
                self.state = TapState::AwaitingSecondTap {
                    item_id: item_id.to_string(),
                    until_ms: now_ms.saturating_add(self.window_ms),
                };
                true
            }
            TapInput::Click { from_touch: true } => {
                trace!("dropping click synthesized from touch");
                false
            }
            TapInput::Click { from_touch: false } => match &self.state {
                TapState::AwaitingSecondTap { item_id: touched, until_ms }
                    if touched == item_id && now_ms <= *until_ms =>
                {
                    trace!("dropping click echo after touch");
                    self.state = TapState::Idle;
                    false
                }
                _ => {
                    self.state = TapState::Idle;
                    true
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLICK: TapInput = TapInput::Click { from_touch: false };

    #[test]
    fn plain_clicks_pass() {
        let mut filter = TapFilter::new(500);
        assert!(filter.accept("a", CLICK, 0));
        assert!(filter.accept("a", CLICK, 10));
    }

    #[test]
    fn click_echo_after_touch_is_swallowed_once() {
        let mut filter = TapFilter::new(500);
        assert!(filter.accept("a", TapInput::Touch, 1_000));
        assert!(!filter.accept("a", CLICK, 1_200));
        assert_eq!(filter.state(), &TapState::Idle);
        assert!(filter.accept("a", CLICK, 1_300));
    }

    #[test]
    fn late_click_counts() {
        let mut filter = TapFilter::new(500);
        filter.accept("a", TapInput::Touch, 1_000);
        assert!(filter.accept("a", CLICK, 1_501));
    }

    #[test]
    fn click_on_another_item_counts() {
        let mut filter = TapFilter::new(500);
        assert!(filter.accept("a", TapInput::Touch, 1_000));
        assert!(filter.accept("b", CLICK, 1_100));
        assert_eq!(filter.state(), &TapState::Idle);
    }

    #[test]
    fn flagged_clicks_never_count() {
        let mut filter = TapFilter::new(500);
        assert!(!filter.accept("a", TapInput::Click { from_touch: true }, 0));
        assert!(filter.accept("a", TapInput::Touch, 10));
        assert!(filter.accept("b", TapInput::Touch, 20));
    }
}
