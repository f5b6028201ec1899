#![forbid(unsafe_code)]

//! Deferred image loading.
//!
//! A [`LazyImage`] shows its placeholder source until the element first
//! becomes visible, then asks the host to fetch the real source exactly once.
//! The fetch itself happens outside this crate; the host reports back through
//! [`resolve`](LazyImage::resolve).

use lazyvis_core::{ObservationConfig, RootMargin, VisibilityState};
use tracing::debug;

/// Margin used for image observations: start the fetch shortly before the
/// image scrolls on screen.
const IMAGE_ROOT_MARGIN_PX: i32 = 100;

/// Load lifecycle of a lazy image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePhase {
    /// Not yet visible; nothing requested.
    Pending,
    /// Visible; the real source has been handed to the host.
    Requested,
    /// The host loaded the real source.
    Loaded,
    /// The host failed to load the real source.
    Failed,
}

/// A fetch the host should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub src: String,
}

/// Visibility-gated image source switcher.
#[derive(Debug)]
pub struct LazyImage {
    src: String,
    placeholder_src: Option<String>,
    phase: ImagePhase,
}

impl LazyImage {
    /// Create a lazy image for the given real source.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            placeholder_src: None,
            phase: ImagePhase::Pending,
        }
    }

    /// Source shown until the real one is loaded.
    #[must_use]
    pub fn with_placeholder(mut self, src: impl Into<String>) -> Self {
        self.placeholder_src = Some(src.into());
        self
    }

    /// Observation config for image trackers: any intersection counts
    /// (threshold 0), trigger once, fetch slightly ahead of the viewport.
    #[must_use]
    pub fn observation_config() -> ObservationConfig {
        ObservationConfig::new()
            .with_threshold(0.0)
            .with_root_margin(RootMargin::uniform(IMAGE_ROOT_MARGIN_PX))
            .with_trigger_once(true)
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> ImagePhase {
        self.phase
    }

    /// Whether the real source finished loading.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.phase == ImagePhase::Loaded
    }

    /// Check visibility and emit the fetch request the first time the image
    /// is visible. Returns `None` on every later call.
    pub fn poll(&mut self, visibility: &VisibilityState) -> Option<ImageRequest> {
        if self.phase != ImagePhase::Pending || !visibility.has_ever_been_visible {
            return None;
        }
        self.phase = ImagePhase::Requested;
        debug!(src = %self.src, "image fetch requested");
        Some(ImageRequest {
            src: self.src.clone(),
        })
    }

    /// Record the host's load outcome. Ignored unless a request is in flight.
    pub fn resolve(&mut self, loaded: bool) {
        if self.phase != ImagePhase::Requested {
            return;
        }
        self.phase = if loaded {
            ImagePhase::Loaded
        } else {
            ImagePhase::Failed
        };
    }

    /// The source to display right now: the real one once loaded, the
    /// placeholder (if any) before that.
    #[must_use]
    pub fn current_src(&self) -> Option<&str> {
        match self.phase {
            ImagePhase::Loaded => Some(&self.src),
            _ => self.placeholder_src.as_deref(),
        }
    }
}
