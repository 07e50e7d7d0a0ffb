//! Claim sanitization tests.
//!
//! Sanitized claims are embedded verbatim in verification prompts and in the
//! verification bundle, so these pin the exact rewriting rules.

use gene_shared::claim::{is_allowed, sanitize, Claim, PLACEHOLDER};
use gene_shared::report::{Transcript, VerificationOutcome, VerificationReport};
use proptest::prelude::*;

const ALLOWED_SAMPLES: &[&str] = &[
    "TP53",
    "TP53,MDM2,CDKN1A",
    "apoptosis;regulation.",
    "does(it)?yes!",
    "a*b_c-d",
    "0123456789",
];

const TRAILING_SAMPLES: &[(&str, &str)] = &[
    ("TP53 regulates apoptosis ", "TP53 regulates apoptosis"),
    ("KRAS is an oncogene \u{2026}", "KRAS is an oncogene"),
    ("MYC;MAX bind DNA\t\n", "MYC;MAX bind DNA"),
    ("EGFR@@##", "EGFR"),
];

#[test]
fn test_allowed_claims_are_identity() {
    for claim in ALLOWED_SAMPLES {
        assert!(is_allowed(claim));
        assert_eq!(sanitize(claim), *claim);
    }
}

#[test]
fn test_trailing_run_becomes_one_placeholder() {
    for (raw, prefix) in TRAILING_SAMPLES {
        let expected = format!("{}{}", prefix, PLACEHOLDER);
        assert_eq!(sanitize(raw), expected, "raw = {:?}", raw);
    }
}

#[test]
fn test_sanitize_is_idempotent() {
    let all = ALLOWED_SAMPLES
        .iter()
        .copied()
        .chain(TRAILING_SAMPLES.iter().map(|(raw, _)| *raw));
    for raw in all {
        let once = sanitize(raw);
        assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn test_transcript_uses_sanitized_form() {
    let transcript: Transcript = vec![VerificationReport {
        claim: Claim::new("EGFR@@##"),
        outcome: VerificationOutcome::Reported {
            report: "EGFR is a receptor tyrosine kinase.".to_string(),
            passes: 3,
        },
    }]
    .into_iter()
    .collect();

    assert_eq!(
        transcript.render(),
        "Original_claim:EGFR_Verified_claim:EGFR is a receptor tyrosine kinase."
    );
}

// -- Properties over generated claims --
//
// Prefixes end in an allowed character (or are empty) so the generated
// disallowed suffix is exactly the trailing run.

const ALLOWED_CLASS: &str = "[a-zA-Z0-9,.;?!*()_-]";

fn allowed_claim() -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("{}{{1,40}}", ALLOWED_CLASS)).unwrap()
}

fn prefix() -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("([a-zA-Z0-9 ,.;?!*()_:-]{{0,30}}{})?", ALLOWED_CLASS))
        .unwrap()
}

fn disallowed_run() -> impl Strategy<Value = String> {
    "[ \t\n@#%:é→\u{3b1}]{1,6}"
}

proptest! {
    #[test]
    fn allowed_claims_pass_unchanged(claim in allowed_claim()) {
        prop_assert!(is_allowed(&claim));
        prop_assert_eq!(sanitize(&claim), claim);
    }

    #[test]
    fn trailing_run_becomes_single_placeholder(head in prefix(), tail in disallowed_run()) {
        let raw = format!("{}{}", head, tail);
        prop_assert_eq!(sanitize(&raw), format!("{}{}", head, PLACEHOLDER));
    }

    #[test]
    fn sanitize_idempotent_on_any_text(raw in "\\PC{0,40}") {
        let once = sanitize(&raw);
        prop_assert_eq!(sanitize(&once), once.clone());
        prop_assert!(once.chars().count() <= raw.chars().count().max(1));
    }
}
