#![forbid(unsafe_code)]

//! lazyvis widgets
//!
//! Presentational wrappers that consume [`lazyvis_core`] visibility signals:
//!
//! - [`LazySection`] — placeholder-vs-content decision with an
//!   entrance-animation hint; at most one swap under trigger-once.
//! - [`LazyImage`] — deferred image source switching.
//!
//! Widgets hold no host handles. The caller owns the tracker and passes the
//! current [`VisibilityState`](lazyvis_core::VisibilityState) into each
//! render decision.

pub mod image;
pub mod section;

pub use image::{ImagePhase, ImageRequest, LazyImage};
pub use section::{LazySection, SectionContent};
