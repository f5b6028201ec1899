#![forbid(unsafe_code)]

//! Core Web Vitals thresholds and grading.
//!
//! Each metric is graded against a documented good/poor pair and banded to
//! 100/50/0 for the overall score. Defaults follow the published Web Vitals
//! thresholds (FCP 1800/3000ms, LCP 2500/4000ms, FID 100/300ms,
//! CLS 0.1/0.25, TTFB 800/1800ms).

/// The vitals this crate knows how to grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// First Contentful Paint, ms.
    Fcp,
    /// Largest Contentful Paint, ms.
    Lcp,
    /// First Input Delay, ms.
    Fid,
    /// Cumulative Layout Shift, unitless.
    Cls,
    /// Time To First Byte, ms.
    Ttfb,
}

impl MetricKind {
    /// Stable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Fcp => "FCP",
            Self::Lcp => "LCP",
            Self::Fid => "FID",
            Self::Cls => "CLS",
            Self::Ttfb => "TTFB",
        }
    }
}

/// Grade band for one observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Good,
    NeedsImprovement,
    Poor,
}

impl Grade {
    /// Stable name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NeedsImprovement => "needs-improvement",
            Self::Poor => "poor",
        }
    }
}

/// A good/poor threshold pair. Values at or below `good` grade good; values
/// at or below `poor` need improvement; anything above is poor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub good: f64,
    pub poor: f64,
}

impl Threshold {
    /// Grade a value against this pair.
    #[must_use]
    pub fn grade(&self, value: f64) -> Grade {
        if value <= self.good {
            Grade::Good
        } else if value <= self.poor {
            Grade::NeedsImprovement
        } else {
            Grade::Poor
        }
    }

    /// Banded contribution to the overall score.
    #[must_use]
    pub fn banded_score(&self, value: f64) -> u32 {
        match self.grade(value) {
            Grade::Good => 100,
            Grade::NeedsImprovement => 50,
            Grade::Poor => 0,
        }
    }
}

/// Per-metric thresholds, overridable by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalsThresholds {
    pub fcp: Threshold,
    pub lcp: Threshold,
    pub fid: Threshold,
    pub cls: Threshold,
    pub ttfb: Threshold,
}

impl Default for VitalsThresholds {
    fn default() -> Self {
        Self {
            fcp: Threshold {
                good: 1800.0,
                poor: 3000.0,
            },
            lcp: Threshold {
                good: 2500.0,
                poor: 4000.0,
            },
            fid: Threshold {
                good: 100.0,
                poor: 300.0,
            },
            cls: Threshold {
                good: 0.1,
                poor: 0.25,
            },
            ttfb: Threshold {
                good: 800.0,
                poor: 1800.0,
            },
        }
    }
}

impl VitalsThresholds {
    /// The threshold pair for one metric.
    #[must_use]
    pub fn for_kind(&self, kind: MetricKind) -> Threshold {
        match kind {
            MetricKind::Fcp => self.fcp,
            MetricKind::Lcp => self.lcp,
            MetricKind::Fid => self.fid,
            MetricKind::Cls => self.cls,
            MetricKind::Ttfb => self.ttfb,
        }
    }
}
