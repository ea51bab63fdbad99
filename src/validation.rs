// SPDX-License-Identifier: AGPL-3.0-only

//! Pass/fail harness for the butterfly validation binary.
//!
//! Checks carry a hardcoded expected value and a tolerance from
//! [`crate::tolerances`]. The binary prints one line per check and exits 0
//! only when every check passed.

use std::fmt;
use std::process;

/// How a check compared its observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// |observed − expected| < tolerance
    Absolute,
    /// observed < threshold
    UpperBound,
    /// Integer counts, equal or not.
    Count,
    /// A predicate.
    Predicate,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "abs"),
            Self::UpperBound => write!(f, "<"),
            Self::Count => write!(f, "=="),
            Self::Predicate => write!(f, "bool"),
        }
    }
}

/// One recorded check.
#[derive(Debug, Clone)]
pub struct Check {
    /// Human-readable label.
    pub label: String,
    /// Outcome.
    pub passed: bool,
    /// Observed value.
    pub observed: f64,
    /// Expected value or threshold.
    pub expected: f64,
    /// Tolerance (0 for exact kinds).
    pub tolerance: f64,
    /// Comparison used.
    pub kind: CheckKind,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = if self.passed { "✓" } else { "✗" };
        match self.kind {
            CheckKind::Predicate => write!(f, "  {icon} {}", self.label),
            CheckKind::Count => write!(
                f,
                "  {icon} {}: observed={}, expected={}",
                self.label, self.observed, self.expected
            ),
            CheckKind::Absolute | CheckKind::UpperBound => write!(
                f,
                "  {icon} {}: observed={:.6e}, expected={:.6e}, tol={:.2e} ({})",
                self.label, self.observed, self.expected, self.tolerance, self.kind
            ),
        }
    }
}

/// Accumulates checks and turns them into an exit code.
#[derive(Debug, Default)]
#[must_use]
pub struct ValidationHarness {
    /// Name printed in the summary banner.
    pub name: String,
    /// Every check recorded so far.
    pub checks: Vec<Check>,
}

impl ValidationHarness {
    /// Harness for a named validation run.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    fn push(
        &mut self,
        label: &str,
        passed: bool,
        observed: f64,
        expected: f64,
        tolerance: f64,
        kind: CheckKind,
    ) {
        self.checks.push(Check {
            label: label.to_string(),
            passed,
            observed,
            expected,
            tolerance,
            kind,
        });
    }

    /// |observed − expected| < tolerance. NaN fails.
    pub fn check_abs(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = (observed - expected).abs() < tolerance;
        self.push(label, passed, observed, expected, tolerance, CheckKind::Absolute);
    }

    /// observed < threshold. NaN fails.
    pub fn check_upper(&mut self, label: &str, observed: f64, threshold: f64) {
        let passed = observed < threshold;
        self.push(label, passed, observed, threshold, threshold, CheckKind::UpperBound);
    }

    /// Exact equality of two counts.
    #[allow(clippy::cast_precision_loss)]
    pub fn check_count(&mut self, label: &str, observed: usize, expected: usize) {
        self.push(
            label,
            observed == expected,
            observed as f64,
            expected as f64,
            0.0,
            CheckKind::Count,
        );
    }

    /// A boolean outcome.
    pub fn check_bool(&mut self, label: &str, passed: bool) {
        let observed = f64::from(u8::from(passed));
        self.push(label, passed, observed, 1.0, 0.0, CheckKind::Predicate);
    }

    /// Checks that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Checks recorded.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.checks.len()
    }

    /// Whether every check passed (true for an empty harness).
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Labels of failed checks, in recording order.
    #[must_use]
    pub fn failed_labels(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.label.as_str())
            .collect()
    }

    /// The banner and one line per check.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "═══ {} validation: {}/{} checks passed ═══",
            self.name,
            self.passed_count(),
            self.total_count()
        )];
        lines.extend(self.checks.iter().map(ToString::to_string));
        lines.join("\n")
    }

    /// Print the summary and exit 0 if everything passed, 1 otherwise.
    pub fn finish(&self) -> ! {
        println!();
        println!("{}", self.summary());
        if self.all_passed() {
            println!("ALL CHECKS PASSED");
            process::exit(0);
        }
        println!("FAILED CHECKS: {}", self.failed_labels().join(", "));
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_pass_and_fail() {
        let mut h = ValidationHarness::new("bands");
        h.check_abs("edge", 1.0 + 1e-12, 1.0, 1e-10);
        h.check_abs("far edge", 1.1, 1.0, 1e-10);
        h.check_count("band count", 3, 3);
        h.check_count("wrong count", 2, 3);
        assert_eq!(h.passed_count(), 2);
        assert_eq!(h.total_count(), 4);
        assert_eq!(h.failed_labels(), vec!["far edge", "wrong count"]);
        assert!(!h.all_passed());
    }

    #[test]
    fn nan_never_passes() {
        let mut h = ValidationHarness::new("nan");
        h.check_abs("abs", f64::NAN, 0.0, 1.0);
        h.check_upper("upper", f64::NAN, 1.0);
        assert_eq!(h.passed_count(), 0);
    }

    #[test]
    fn upper_bound_is_strict() {
        let mut h = ValidationHarness::new("gap");
        h.check_upper("below", 0.5, 1.0);
        h.check_upper("at", 1.0, 1.0);
        assert!(h.checks[0].passed);
        assert!(!h.checks[1].passed);
    }

    #[test]
    fn empty_harness_passes() {
        let h = ValidationHarness::new("empty");
        assert!(h.all_passed());
        assert!(h.summary().contains("0/0"));
    }

    #[test]
    fn summary_lists_every_check() {
        let mut h = ValidationHarness::new("validate_butterfly");
        h.check_bool("reflection v ↔ −v", true);
        h.check_count("F_5 length", 9, 9);
        h.check_abs("1/3 low edge", -1.0, -1.0, 1e-10);
        let s = h.summary();
        assert!(s.contains("validate_butterfly validation: 3/3"));
        assert!(s.contains("reflection v ↔ −v"));
        assert!(s.contains("observed=9, expected=9"));
        assert!(s.contains("(abs)"));
        assert_eq!(s.lines().count(), 4);
    }

    #[test]
    fn kind_display() {
        assert_eq!(CheckKind::Absolute.to_string(), "abs");
        assert_eq!(CheckKind::UpperBound.to_string(), "<");
        assert_eq!(CheckKind::Count.to_string(), "==");
        assert_eq!(CheckKind::Predicate.to_string(), "bool");
    }
}
