#![forbid(unsafe_code)]

//! Lazy section wrapper.
//!
//! Wraps arbitrary section content and defers producing it until the owning
//! tracker reports visibility. Until then the section renders a lightweight
//! placeholder, so off-screen sections cost nothing on initial paint.
//!
//! The wrapper governs render-mounting only. It performs no I/O; any data
//! loading inside the content thunk is the content's own concern.

use lazyvis_core::{ObservationConfig, VisibilityState};
use tracing::trace;

/// Default height of the blank placeholder box, in pixels.
///
/// Reserving vertical space keeps the page from collapsing (and the scroll
/// position from jumping) while a section is still a placeholder.
const DEFAULT_MIN_HEIGHT_PX: u32 = 200;

/// Class applied while content has never been visible.
const DEFAULT_HIDDEN_CLASS: &str = "opacity-0";

/// Entrance class applied once content first activates.
const DEFAULT_ENTRANCE_CLASS: &str = "animate-fade-in-up";

/// What a lazy section renders this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionContent<T> {
    /// A blank box reserving at least this much height.
    Blank { min_height_px: u32 },
    /// The caller-supplied placeholder.
    Fallback(T),
    /// The real section content.
    Content(T),
}

impl<T> SectionContent<T> {
    /// Whether this is the real content rather than a stand-in.
    #[must_use]
    pub fn is_content(&self) -> bool {
        matches!(self, Self::Content(_))
    }
}

/// Defers section content behind a visibility signal.
///
/// `T` is whatever node type the surrounding UI renders. Content and
/// fallback are thunks so nothing is built before activation.
pub struct LazySection<T> {
    config: ObservationConfig,
    content: Box<dyn Fn() -> T>,
    fallback: Option<Box<dyn Fn() -> T>>,
    min_height_px: u32,
    hidden_class: String,
    entrance_class: String,
    activated: bool,
    mounted: bool,
    swaps: u32,
}

impl<T> std::fmt::Debug for LazySection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySection")
            .field("config", &self.config)
            .field("has_fallback", &self.fallback.is_some())
            .field("activated", &self.activated)
            .field("swaps", &self.swaps)
            .finish()
    }
}

impl<T> LazySection<T> {
    /// Wrap a content thunk with the default observation config.
    #[must_use]
    pub fn new(content: impl Fn() -> T + 'static) -> Self {
        Self {
            config: ObservationConfig::default(),
            content: Box::new(content),
            fallback: None,
            min_height_px: DEFAULT_MIN_HEIGHT_PX,
            hidden_class: DEFAULT_HIDDEN_CLASS.to_string(),
            entrance_class: DEFAULT_ENTRANCE_CLASS.to_string(),
            activated: false,
            mounted: false,
            swaps: 0,
        }
    }

    /// Set the observation config used for this section's tracker.
    #[must_use]
    pub fn with_config(mut self, config: ObservationConfig) -> Self {
        self.config = config;
        self
    }

    /// Supply a placeholder thunk rendered until activation.
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Fn() -> T + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Height reserved by the blank placeholder when no fallback is given.
    #[must_use]
    pub fn with_min_height(mut self, px: u32) -> Self {
        self.min_height_px = px;
        self
    }

    /// Class reported before first activation.
    #[must_use]
    pub fn with_hidden_class(mut self, class: impl Into<String>) -> Self {
        self.hidden_class = class.into();
        self
    }

    /// Entrance class reported after first activation.
    #[must_use]
    pub fn with_entrance_class(mut self, class: impl Into<String>) -> Self {
        self.entrance_class = class.into();
        self
    }

    /// The observation config the owning tracker should use.
    #[must_use]
    pub fn config(&self) -> &ObservationConfig {
        &self.config
    }

    /// Whether the real content has ever been mounted.
    #[must_use]
    pub fn has_activated(&self) -> bool {
        self.activated
    }

    /// Number of placeholder-to-content swaps so far. With trigger-once this
    /// is 0 or 1 for the section's whole lifetime.
    #[must_use]
    pub fn swap_count(&self) -> u32 {
        self.swaps
    }

    /// Decide what to render for the given visibility state.
    ///
    /// Placeholder until the tracker reports visibility; afterwards the real
    /// content. With trigger-once the swap latches and is not reversible;
    /// in continuous mode the section reverts to its placeholder whenever
    /// the element is off screen.
    pub fn render(&mut self, visibility: &VisibilityState) -> SectionContent<T> {
        let active = if self.config.trigger_once {
            self.activated || visibility.has_ever_been_visible
        } else {
            visibility.is_visible
        };

        if active {
            if !self.mounted {
                self.swaps += 1;
                trace!(swaps = self.swaps, "lazy section mounted content");
            }
            self.mounted = true;
            self.activated = true;
            SectionContent::Content((self.content)())
        } else {
            self.mounted = false;
            match &self.fallback {
                Some(fallback) => SectionContent::Fallback(fallback()),
                None => SectionContent::Blank {
                    min_height_px: self.min_height_px,
                },
            }
        }
    }

    /// The animation class for the current state: hidden until the content
    /// first activates, the entrance class afterwards.
    ///
    /// Distinguishing the two keeps content that was visible on initial
    /// paint from replaying its entrance animation.
    #[must_use]
    pub fn animation_class(&self, visibility: &VisibilityState) -> &str {
        if self.activated || visibility.has_ever_been_visible {
            &self.entrance_class
        } else {
            &self.hidden_class
        }
    }
}
