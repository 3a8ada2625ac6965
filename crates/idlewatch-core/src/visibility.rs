//! Page visibility tracking.
//!
//! Document visibility and window focus arrive as independent signals. The
//! monitor folds them into a single visible flag: any hide-type signal hides
//! a visible view, any show-type signal reveals a hidden one, and redundant
//! signals are ignored so the hidden timestamp is not reset by a blur that
//! follows a document hide.
//!
//! Document visibility is also tracked on its own: only a hidden document
//! suspends inactivity tracking, while focus changes merely feed the
//! refresh-on-return latch.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilitySignal {
    DocumentHidden,
    DocumentVisible,
    WindowBlur,
    WindowFocus,
}

impl VisibilitySignal {
    pub fn hides(&self) -> bool {
        matches!(
            self,
            VisibilitySignal::DocumentHidden | VisibilitySignal::WindowBlur
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilitySignal::DocumentHidden => "hide",
            VisibilitySignal::DocumentVisible => "show",
            VisibilitySignal::WindowBlur => "blur",
            VisibilitySignal::WindowFocus => "focus",
        }
    }
}

impl fmt::Display for VisibilitySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilitySignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hide" => Ok(VisibilitySignal::DocumentHidden),
            "show" => Ok(VisibilitySignal::DocumentVisible),
            "blur" => Ok(VisibilitySignal::WindowBlur),
            "focus" => Ok(VisibilitySignal::WindowFocus),
            other => Err(format!(
                "Unknown visibility signal '{}'. Valid: hide, show, blur, focus",
                other
            )),
        }
    }
}

/// A change of the unified visible flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityTransition {
    Hidden,
    Visible { hidden_for: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityState {
    pub is_visible: bool,
    /// One-shot latch: set when the view is hidden, cleared by the consumer.
    pub was_hidden: bool,
    pub last_hidden_at: Option<Instant>,
}

impl Default for VisibilityState {
    fn default() -> Self {
        Self {
            is_visible: true,
            was_hidden: false,
            last_hidden_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisibilityMonitor {
    state: VisibilityState,
    last_hidden_duration: Option<Duration>,
    document_hidden: bool,
}

impl VisibilityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, signal: VisibilitySignal, now: Instant) -> Option<VisibilityTransition> {
        match signal {
            VisibilitySignal::DocumentHidden => self.document_hidden = true,
            VisibilitySignal::DocumentVisible => self.document_hidden = false,
            VisibilitySignal::WindowBlur | VisibilitySignal::WindowFocus => {}
        }

        if signal.hides() {
            if !self.state.is_visible {
                return None;
            }
            self.state.is_visible = false;
            self.state.was_hidden = true;
            self.state.last_hidden_at = Some(now);
            return Some(VisibilityTransition::Hidden);
        }

        if self.state.is_visible {
            return None;
        }

        let hidden_for = self
            .state
            .last_hidden_at
            .map(|hidden_at| now.saturating_duration_since(hidden_at))
            .unwrap_or_default();

        self.state.is_visible = true;
        self.last_hidden_duration = Some(hidden_for);
        Some(VisibilityTransition::Visible { hidden_for })
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible
    }

    /// Document visibility alone, ignoring window focus.
    pub fn is_document_hidden(&self) -> bool {
        self.document_hidden
    }

    pub fn was_hidden(&self) -> bool {
        self.state.was_hidden
    }

    /// True once the view is visible again after having been hidden.
    pub fn needs_attention(&self) -> bool {
        self.state.is_visible && self.state.was_hidden
    }

    pub fn clear_was_hidden(&mut self) {
        self.state.was_hidden = false;
    }

    /// Time spent hidden so far; zero while visible.
    pub fn time_away(&self, now: Instant) -> Duration {
        match (self.state.is_visible, self.state.last_hidden_at) {
            (false, Some(hidden_at)) => now.saturating_duration_since(hidden_at),
            _ => Duration::ZERO,
        }
    }

    /// Length of the most recently completed hidden period.
    pub fn last_hidden_duration(&self) -> Option<Duration> {
        self.last_hidden_duration
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_visible() {
        let monitor = VisibilityMonitor::new();
        assert!(monitor.is_visible());
        assert!(!monitor.was_hidden());
        assert!(!monitor.needs_attention());
    }

    #[test]
    fn test_hide_then_show_reports_duration() {
        let start = Instant::now();
        let mut monitor = VisibilityMonitor::new();

        assert_eq!(
            monitor.apply(VisibilitySignal::DocumentHidden, start),
            Some(VisibilityTransition::Hidden)
        );
        assert_eq!(
            monitor.time_away(start + Duration::from_secs(30)),
            Duration::from_secs(30)
        );

        let transition = monitor.apply(
            VisibilitySignal::DocumentVisible,
            start + Duration::from_secs(90),
        );
        assert_eq!(
            transition,
            Some(VisibilityTransition::Visible {
                hidden_for: Duration::from_secs(90)
            })
        );
        assert!(monitor.needs_attention());
        assert_eq!(
            monitor.last_hidden_duration(),
            Some(Duration::from_secs(90))
        );
        assert_eq!(
            monitor.time_away(start + Duration::from_secs(100)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_redundant_hide_keeps_first_timestamp() {
        let start = Instant::now();
        let mut monitor = VisibilityMonitor::new();

        monitor.apply(VisibilitySignal::WindowBlur, start);
        assert_eq!(
            monitor.apply(
                VisibilitySignal::DocumentHidden,
                start + Duration::from_secs(5)
            ),
            None
        );

        let transition = monitor.apply(VisibilitySignal::WindowFocus, start + Duration::from_secs(60));
        assert_eq!(
            transition,
            Some(VisibilityTransition::Visible {
                hidden_for: Duration::from_secs(60)
            })
        );
        // The matching visibilitychange afterwards is ignored
        assert_eq!(
            monitor.apply(
                VisibilitySignal::DocumentVisible,
                start + Duration::from_secs(61)
            ),
            None
        );
    }

    #[test]
    fn test_document_hidden_ignores_focus() {
        let start = Instant::now();
        let mut monitor = VisibilityMonitor::new();

        monitor.apply(VisibilitySignal::WindowBlur, start);
        assert!(!monitor.is_visible());
        assert!(!monitor.is_document_hidden());

        monitor.apply(VisibilitySignal::DocumentHidden, start + Duration::from_secs(1));
        assert!(monitor.is_document_hidden());

        // Focus reveals the view but the document stays hidden
        monitor.apply(VisibilitySignal::WindowFocus, start + Duration::from_secs(2));
        assert!(monitor.is_visible());
        assert!(monitor.is_document_hidden());

        monitor.apply(VisibilitySignal::DocumentVisible, start + Duration::from_secs(3));
        assert!(!monitor.is_document_hidden());
    }

    #[test]
    fn test_latch_cleared_by_consumer() {
        let start = Instant::now();
        let mut monitor = VisibilityMonitor::new();
        monitor.apply(VisibilitySignal::DocumentHidden, start);
        assert!(monitor.was_hidden());
        assert!(!monitor.needs_attention());

        monitor.apply(VisibilitySignal::DocumentVisible, start + Duration::from_secs(1));
        assert!(monitor.needs_attention());

        monitor.clear_was_hidden();
        assert!(!monitor.needs_attention());
        assert!(monitor.state().last_hidden_at.is_some());
    }

    #[test]
    fn test_show_while_visible_is_ignored() {
        let mut monitor = VisibilityMonitor::new();
        assert_eq!(
            monitor.apply(VisibilitySignal::WindowFocus, Instant::now()),
            None
        );
        assert!(monitor.last_hidden_duration().is_none());
    }

    #[test]
    fn test_signal_parse() {
        assert_eq!(
            "blur".parse::<VisibilitySignal>().unwrap(),
            VisibilitySignal::WindowBlur
        );
        assert!("minimize".parse::<VisibilitySignal>().is_err());
    }
}
