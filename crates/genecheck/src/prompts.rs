//! Prompt templates for every model call in the cascade.
//!
//! Each stage pairs a task prompt with an instruction block; the two are
//! concatenated into a single user turn.

/// System role of the running (generation/revision) conversation.
pub const ANALYST_SYSTEM: &str =
    "You are an efficient and insightful assistant to a molecular biologist.";

/// System role of the claim-extraction calls.
pub const FACT_CHECKER_SYSTEM: &str =
    "You are a helpful and objective fact-checker to verify the summary of gene set.";

/// System role of the verification agent.
pub const VERIFIER_SYSTEM: &str = "You are a helpful fact-checker. Your task is to verify the claim using the provided tools. \
If you have finished the verification, please start a message with \"Report:\" and return your findings at the beginning along with the evidence.";

/// Reminder sent when the agent answers without the report marker.
pub const REPORT_REMINDER: &str = "If you have finished the verification, please start a message with \"Report:\" \
and return your findings at the beginning along with the evidence.";

/// Prefix of the label line at the top of every narrative.
pub const LABEL_PREFIX: &str = "Process: ";

pub fn baseline(subjects: &str) -> String {
    format!(
        r#"
Write a critical analysis of the biological processes performed by this system of interacting proteins.
Propose a brief name for the most prominent biological process performed by the system.
Put the name at the top of the analysis as "Process: <name>".
Be concise, do not use unnecessary words.
Be textual, do not use any format symbols such as "*", "-" or other tokens.
Be specific, avoid overly general statements such as "the proteins are involved in various cellular processes".
Be factual, do not editorialize.
For each important point, describe your reasoning and supporting information.
For each biological function name, show the corresponding gene names.
Here is the gene set: {subjects}
"#
    )
}

pub fn label_claims(subjects: &str, label: &str) -> String {
    format!(
        r#"
Here is the original process name for the gene set {subjects}:
{label}
However, the process name might be false. Please generate decontextualized claims for the process name that need to be verified.
Only return a list that contains all generated claim strings, for example, ["claim_1", "claim_2"]
"#
    )
}

pub const LABEL_FOCUS: &str = r#"
Only generate claims with affirmative sentences for the entire gene set.
The gene set should only be separated by commas, e.g., "a,b,c".
Don't generate claims for a single gene or an incomplete gene set.
Don't generate hypothesis claims over the previous analysis.
Replace statements like 'these genes' or 'this system' with the core genes in the given gene set.
"#;

pub fn narrative_claims(narrative: &str) -> String {
    format!(
        r#"
Here is the summary of the given gene set:
{narrative}
However, the gene analysis in the summary might not support the updated process name.
Please generate several decontextualized claims for the analytical narratives that need to be verified.
Only return a list that contains all generated claim strings, for example, ["claim_1", "claim_2"]
"#
    )
}

pub const NARRATIVE_FOCUS: &str = r#"
Generate claims for genes and their biological functions around the updated process name.
Don't generate claims for the entire gene set or 'this system'.
Don't generate unworthy claims such as the summarization and reasoning over the previous analysis.
Claims must contain the gene names and their biological process functions.
"#;

pub fn revision(transcript: &str) -> String {
    format!(
        r#"
I have finished the verification for the process name. Here is the verification report:
{transcript}
You should only consider the successfully verified claims.
If claims are supported, you should retain the original process name and only make a minor grammar revision.
If claims are partially supported, you should discard the unsupported part.
If claims are refuted, you must replace the original process name with the most significant (i.e., top-1) biological function term summarized from the verification report.
Meanwhile, revise the original summaries using the verified (or updated) process name. Do not use sentences like "There is no direct evidence to..."
"#
    )
}

pub const REVISION_INSTRUCTION: &str = r#"
Put the updated process name at the top of the analysis as "Process: <name>".
Be concise, do not use unnecessary words.
Be textual, do not use any format symbols such as "*", "-" or other tokens. All modified sentences should be encoded in utf-8.
Be specific, avoid overly general statements such as "the proteins are involved in various cellular processes".
Be factual, do not editorialize.
You must retain the gene names of each updated biological function in the new summary.
"#;

pub fn finalize(transcript: &str) -> String {
    format!(
        r#"
I have finished the verification for the revised summary. Here is the verification report:
{transcript}
Please modify the summary according to the verification report again.
"#
    )
}

pub const FINALIZE_INSTRUCTION: &str = r#"
If the analytical narratives of genes can't directly support or relate to the updated process name, you must propose a new brief biological process name from the analytical texts.
Otherwise, you must retain the updated process name and only make a grammar revision.
If a claim is supported, complement the narratives using the standard evidence of gene set functions (or gene summaries) in the verification report, but don't change the updated process name.
If a claim is not supported, do not mention any statement like "... was not directly confirmed by..."
Be concise, do not use unnecessary formatting like **, only return the concise text.
"#;

pub fn verifier_claim(claim: &str) -> String {
    format!(
        "\nHere is the claim:\n{claim}\n The verification for the biological function should be factual."
    )
}
