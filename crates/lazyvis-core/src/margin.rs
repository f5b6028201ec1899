#![forbid(unsafe_code)]

//! Root-margin parsing.
//!
//! Observation configs carry the margin in its CSS shorthand string form
//! (e.g. `"100px"`, `"0px 200px"`). The margin expands the viewport bounds
//! before intersection is computed, so a positive margin activates content
//! shortly before it scrolls on screen.
//!
//! Only pixel components are supported. One to four whitespace-separated
//! components expand per CSS shorthand rules:
//!
//! - 1 component: all four sides
//! - 2 components: vertical, horizontal
//! - 3 components: top, horizontal, bottom
//! - 4 components: top, right, bottom, left

use std::fmt;

/// Per-side margin in pixels added to the viewport bounds before computing
/// intersection. Negative values shrink the effective viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootMargin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl RootMargin {
    /// The same margin on all four sides.
    #[must_use]
    pub const fn uniform(px: i32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Zero margin on all sides.
    pub const ZERO: Self = Self::uniform(0);

    /// Parse a CSS-style margin shorthand such as `"100px"` or `"0px 200px"`.
    pub fn parse(input: &str) -> Result<Self, MarginParseError> {
        let components: Vec<i32> = input
            .split_whitespace()
            .map(parse_px)
            .collect::<Result<_, _>>()?;

        match components.as_slice() {
            [] => Err(MarginParseError::Empty),
            [all] => Ok(Self::uniform(*all)),
            [v, h] => Ok(Self {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            }),
            [t, h, b] => Ok(Self {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            }),
            [t, r, b, l] => Ok(Self {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }),
            _ => Err(MarginParseError::TooManyComponents(components.len())),
        }
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.top == self.right && self.top == self.bottom && self.top == self.left {
            write!(f, "{}px", self.top)
        } else {
            write!(
                f,
                "{}px {}px {}px {}px",
                self.top, self.right, self.bottom, self.left
            )
        }
    }
}

fn parse_px(component: &str) -> Result<i32, MarginParseError> {
    let digits = component
        .strip_suffix("px")
        .ok_or_else(|| MarginParseError::InvalidComponent(component.to_string()))?;
    digits
        .parse::<i32>()
        .map_err(|_| MarginParseError::InvalidComponent(component.to_string()))
}

/// Failure to parse a margin shorthand string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarginParseError {
    /// The input contained no components.
    Empty,
    /// More than four components were supplied.
    TooManyComponents(usize),
    /// A component was not of the form `<integer>px`.
    InvalidComponent(String),
}

impl fmt::Display for MarginParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "margin string is empty"),
            Self::TooManyComponents(n) => {
                write!(f, "margin shorthand takes at most 4 components, got {n}")
            }
            Self::InvalidComponent(c) => write!(f, "invalid margin component {c:?}"),
        }
    }
}

impl std::error::Error for MarginParseError {}
