#![forbid(unsafe_code)]

//! Observation configuration.

use crate::margin::RootMargin;

/// Default visible-area ratio required to count as visible.
const DEFAULT_THRESHOLD: f64 = 0.1;

/// Default margin added around the viewport before intersection is computed.
const DEFAULT_ROOT_MARGIN_PX: i32 = 100;

/// Configuration for one intersection observation.
///
/// Immutable for the lifetime of the tracker it is given to. Defaults match
/// the common lazy-section case: activate slightly before the element
/// scrolls on screen, and stop observing after the first activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationConfig {
    /// Minimum visible-area ratio (0.0..=1.0) required to count as visible.
    pub threshold: f64,

    /// Extra margin around the viewport bounds. A positive margin triggers
    /// activation before the element is actually on screen.
    pub root_margin: RootMargin,

    /// Stop observing permanently after the first visibility event.
    pub trigger_once: bool,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::uniform(DEFAULT_ROOT_MARGIN_PX),
            trigger_once: true,
        }
    }
}

impl ObservationConfig {
    /// Create a config with the default threshold, margin, and trigger-once.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the visibility threshold, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the root margin.
    #[must_use]
    pub fn with_root_margin(mut self, margin: RootMargin) -> Self {
        self.root_margin = margin;
        self
    }

    /// Set the trigger-once policy.
    #[must_use]
    pub fn with_trigger_once(mut self, trigger_once: bool) -> Self {
        self.trigger_once = trigger_once;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lazy_section_conventions() {
        let cfg = ObservationConfig::default();
        assert_eq!(cfg.threshold, 0.1);
        assert_eq!(cfg.root_margin, RootMargin::uniform(100));
        assert!(cfg.trigger_once);
    }

    #[test]
    fn threshold_is_clamped_to_unit_interval() {
        assert_eq!(ObservationConfig::new().with_threshold(1.5).threshold, 1.0);
        assert_eq!(ObservationConfig::new().with_threshold(-0.2).threshold, 0.0);
    }

    #[test]
    fn builders_compose() {
        let cfg = ObservationConfig::new()
            .with_threshold(0.5)
            .with_root_margin(RootMargin::uniform(200))
            .with_trigger_once(false);
        assert_eq!(cfg.threshold, 0.5);
        assert_eq!(cfg.root_margin, RootMargin::uniform(200));
        assert!(!cfg.trigger_once);
    }
}
