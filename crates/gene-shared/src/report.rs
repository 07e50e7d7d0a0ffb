//! Verification results and the per-round verification bundle.

use crate::claim::Claim;
use serde::{Deserialize, Serialize};

/// Report text used when the verification budget runs out.
///
/// It has the same shape as a real finding once folded into a transcript.
pub const SENTINEL_FAILURE: &str = "Failed.";

/// How a single claim verification ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// The model produced a marked report within budget.
    Reported { report: String, passes: usize },
    /// Every pass was used without a marked report.
    Exhausted { passes: usize },
}

impl VerificationOutcome {
    /// Text folded into the transcript: the finding, or the sentinel.
    pub fn report_text(&self) -> &str {
        match self {
            Self::Reported { report, .. } => report,
            Self::Exhausted { .. } => SENTINEL_FAILURE,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn passes(&self) -> usize {
        match self {
            Self::Reported { passes, .. } | Self::Exhausted { passes } => *passes,
        }
    }
}

/// A claim paired with its verification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub claim: Claim,
    pub outcome: VerificationOutcome,
}

impl VerificationReport {
    pub fn report_text(&self) -> &str {
        self.outcome.report_text()
    }
}

/// Reports of one extraction round, in claim order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    reports: Vec<VerificationReport>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, report: VerificationReport) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[VerificationReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Number of claims whose verification ran out of budget.
    pub fn exhausted(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_exhausted())
            .count()
    }

    /// The literal payload handed to the next model call.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for report in &self.reports {
            out.push_str("Original_claim:");
            out.push_str(&report.claim.sanitized);
            out.push_str("Verified_claim:");
            out.push_str(report.report_text());
        }
        out
    }
}

impl FromIterator<VerificationReport> for Transcript {
    fn from_iter<I: IntoIterator<Item = VerificationReport>>(iter: I) -> Self {
        Self {
            reports: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reported(claim: &str, report: &str) -> VerificationReport {
        VerificationReport {
            claim: Claim::new(claim),
            outcome: VerificationOutcome::Reported {
                report: report.to_string(),
                passes: 1,
            },
        }
    }

    #[test]
    fn test_render_single() {
        let transcript: Transcript = vec![reported("X holds for A,B,C", "supported")]
            .into_iter()
            .collect();
        assert_eq!(
            transcript.render(),
            "Original_claim:X holds for A,B,CVerified_claim:supported"
        );
    }

    #[test]
    fn test_render_keeps_order_and_sentinel() {
        let mut transcript = Transcript::new();
        transcript.push(reported("first", "yes"));
        transcript.push(VerificationReport {
            claim: Claim::new("second "),
            outcome: VerificationOutcome::Exhausted { passes: 10 },
        });

        assert_eq!(
            transcript.render(),
            "Original_claim:firstVerified_claim:yesOriginal_claim:second_Verified_claim:Failed."
        );
        assert_eq!(transcript.exhausted(), 1);
    }

    #[test]
    fn test_empty_render() {
        assert_eq!(Transcript::new().render(), "");
    }

    #[test]
    fn test_outcome_passes() {
        let outcome = VerificationOutcome::Exhausted { passes: 10 };
        assert_eq!(outcome.passes(), 10);
        assert_eq!(outcome.report_text(), SENTINEL_FAILURE);
    }
}
