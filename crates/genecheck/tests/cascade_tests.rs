//! Cascade and batch behavior against scripted models.

use gene_shared::{Conversation, Message, ModelError, Role, WorkItem};
use genecheck::cascade::{CascadeController, ItemOutcome, Stage};
use genecheck::llm::FakeModelClient;
use genecheck::prompts;
use genecheck::sink::{ArtifactSink, Channel, MemorySink, SinkRecord};
use genecheck::tools::ToolRegistry;
use genecheck::verifier::AgentSettings;
use genecheck::BatchDriver;
use std::io;
use std::sync::Arc;

fn is_extraction(conversation: &Conversation) -> bool {
    conversation.messages()[0].content == prompts::FACT_CHECKER_SYSTEM
}

fn last_user(conversation: &Conversation) -> String {
    conversation
        .last_from(Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

/// Generator that labels every gene set "X" and extracts one claim per round.
/// Round-1 extraction for any subject set in `broken` returns prose.
fn generator(broken: &'static [&'static str]) -> FakeModelClient {
    FakeModelClient::from_fn(move |conversation, _| {
        if is_extraction(conversation) {
            let prompt = last_user(conversation);
            if prompt.contains("original process name") {
                if broken.iter().any(|set| prompt.contains(&format!("gene set {}:", set))) {
                    return Ok(Message::assistant("Sure! Here are the claims you asked for."));
                }
                let subjects = prompt
                    .split("gene set ")
                    .nth(1)
                    .and_then(|rest| rest.split(':').next())
                    .unwrap_or_default();
                return Ok(Message::assistant(format!("[\"X holds for {}\"]", subjects)));
            }
            return Ok(Message::assistant("[\"A performs Y\"]"));
        }

        let reply = match conversation.count(Role::User) {
            1 => "Process: X\nA, B and C jointly do X.",
            2 => "Process: X\nA performs Y; B and C support it.",
            _ => "Process: X\nA performs Y.",
        };
        Ok(Message::assistant(reply))
    })
}

fn controller(
    generator: Arc<FakeModelClient>,
    verifier: Arc<FakeModelClient>,
    sink: Arc<MemorySink>,
) -> CascadeController {
    CascadeController::new(generator, verifier, Arc::new(ToolRegistry::new()), sink)
        .with_settings(AgentSettings::immediate(10))
}

#[tokio::test]
async fn test_transcript_reaches_revision_turn() {
    let generator = Arc::new(generator(&[]));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let controller = controller(generator.clone(), verifier.clone(), sink.clone());

    let artifact = controller
        .process(&WorkItem::from_raw("go-1", "A/B C"))
        .await
        .unwrap();

    assert_eq!(artifact.label, "X");
    assert_eq!(
        artifact.label_round.render(),
        "Original_claim:X holds for A,B,CVerified_claim:supported"
    );
    assert_eq!(artifact.final_label.as_deref(), Some("X"));

    let revision_call = generator
        .calls()
        .into_iter()
        .find(|call| !is_extraction(&call.conversation) && call.conversation.count(Role::User) == 2)
        .unwrap();
    assert!(last_user(&revision_call.conversation)
        .contains("Original_claim:X holds for A,B,CVerified_claim:supported"));

    // One verification per extracted claim
    assert_eq!(verifier.call_count(), 2);
}

#[tokio::test]
async fn test_running_conversation_accumulates_stages() {
    let generator = Arc::new(generator(&[]));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let controller = controller(generator.clone(), verifier, sink);

    let artifact = controller
        .process(&WorkItem::from_raw("go-1", "A,B,C"))
        .await
        .unwrap();

    let roles: Vec<Role> = artifact.conversation.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant
        ]
    );
    assert_eq!(artifact.conversation.messages()[2].content, artifact.baseline);
    assert!(artifact.conversation.messages()[5]
        .content
        .contains("Original_claim:A performs YVerified_claim:supported"));

    // Extraction never shares the running conversation
    for call in generator.calls().iter().filter(|c| is_extraction(&c.conversation)) {
        assert_eq!(call.conversation.len(), 2);
        assert!(call.tools.is_none());
    }
}

#[tokio::test]
async fn test_sink_records_in_order() {
    let generator = Arc::new(generator(&[]));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let controller = controller(generator, verifier, sink.clone());

    let outcome = controller.run_item(&WorkItem::from_raw("go-1", "A,B,C")).await;
    assert!(outcome.is_completed());

    assert_eq!(
        sink.contents(Channel::Verification),
        "[\"X holds for A,B,C\"]\n&&\nX holds for A,B,C\nsupported\n&&\n\
         [\"A performs Y\"]\n&&\nA performs Y\nsupported\n&&\n////\n"
    );
    assert_eq!(
        sink.contents(Channel::Baseline),
        "Process: X\nA, B and C jointly do X.\n//\n"
    );
    assert_eq!(sink.contents(Channel::Final), "Process: X\nA performs Y.\n//\n");
}

#[tokio::test]
async fn test_exhausted_claims_render_sentinel() {
    let generator = Arc::new(generator(&[]));
    let verifier = Arc::new(FakeModelClient::always_text("still looking"));
    let sink = Arc::new(MemorySink::new());
    let controller = CascadeController::new(
        generator,
        verifier.clone(),
        Arc::new(ToolRegistry::new()),
        sink,
    )
    .with_settings(AgentSettings::immediate(3));

    let artifact = controller
        .process(&WorkItem::from_raw("go-1", "A,B,C"))
        .await
        .unwrap();

    assert_eq!(
        artifact.label_round.render(),
        "Original_claim:X holds for A,B,CVerified_claim:Failed."
    );
    assert_eq!(artifact.label_round.exhausted(), 1);
    assert_eq!(verifier.call_count(), 6);
}

#[tokio::test]
async fn test_missing_label_fails_generate_stage() {
    let generator = Arc::new(FakeModelClient::always_text("These genes do many things."));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let controller = controller(generator.clone(), verifier.clone(), sink.clone());

    let outcome = controller.run_item(&WorkItem::from_raw("7", "A")).await;
    match outcome {
        ItemOutcome::Failed(failure) => {
            assert_eq!(failure.stage, Stage::Generate);
            assert_eq!(failure.item_id, "7");
        }
        ItemOutcome::Completed(_) => panic!("item should have failed"),
    }

    assert_eq!(generator.call_count(), 1);
    assert_eq!(verifier.call_count(), 0);
    assert_eq!(
        sink.contents(Channel::Baseline),
        "These genes do many things.\n//\n"
    );
    assert!(sink.contents(Channel::Final).starts_with("7\t==== error: generate: "));
}

#[tokio::test]
async fn test_model_failure_during_revision() {
    let generator = Arc::new(FakeModelClient::from_fn(|conversation, _| {
        if is_extraction(conversation) {
            return Ok(Message::assistant("[]"));
        }
        match conversation.count(Role::User) {
            1 => Ok(Message::assistant("Process: X\nbody")),
            _ => Err(ModelError::Status {
                status: 429,
                body: "rate limited".to_string(),
            }),
        }
    }));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let controller = controller(generator, verifier.clone(), sink.clone());

    match controller.run_item(&WorkItem::from_raw("9", "A,B")).await {
        ItemOutcome::Failed(failure) => assert_eq!(failure.stage, Stage::Revise),
        ItemOutcome::Completed(_) => panic!("item should have failed"),
    }

    // Empty claim list: nothing to verify
    assert_eq!(verifier.call_count(), 0);
    assert!(!sink.contents(Channel::Verification).contains("////"));
}

#[tokio::test]
async fn test_batch_isolates_item_failures() {
    let generator = Arc::new(generator(&["D,E"]));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let driver = BatchDriver::new(controller(generator, verifier, sink.clone()));

    let items = vec![
        WorkItem::from_raw("1", "A,B,C"),
        WorkItem::from_raw("2", "D/E"),
        WorkItem::from_raw("3", "F G"),
    ];
    let summary = driver.run(&items).await;

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, vec!["2".to_string()]);
    assert_eq!(summary.total(), 3);

    let finals: Vec<SinkRecord> = sink
        .records()
        .into_iter()
        .filter(|r| r.channel() == Channel::Final)
        .collect();
    assert_eq!(finals.len(), 3);
    assert!(matches!(&finals[0], SinkRecord::Final { .. }));
    match &finals[1] {
        SinkRecord::Failure { item_id, message } => {
            assert_eq!(item_id, "2");
            assert!(message.starts_with("verify-label: claim list is not a JSON list of strings"));
        }
        other => panic!("expected failure record, got {:?}", other),
    }
    assert!(matches!(&finals[2], SinkRecord::Final { .. }));

    // Only completed items close their verification block
    assert_eq!(sink.contents(Channel::Verification).matches("////").count(), 2);
    assert_eq!(sink.contents(Channel::Baseline).matches("//\n").count(), 3);
}

/// Sink that rejects the end-of-item marker and keeps everything else.
#[derive(Default)]
struct RejectItemEnd {
    inner: MemorySink,
}

impl ArtifactSink for RejectItemEnd {
    fn append(&self, record: &SinkRecord) -> io::Result<()> {
        if *record == SinkRecord::ItemEnd {
            return Err(io::Error::other("disk full"));
        }
        self.inner.append(record)
    }
}

#[tokio::test]
async fn test_item_end_write_failure_keeps_item_completed() {
    let generator = Arc::new(generator(&[]));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(RejectItemEnd::default());
    let controller = CascadeController::new(
        generator,
        verifier,
        Arc::new(ToolRegistry::new()),
        sink.clone(),
    )
    .with_settings(AgentSettings::immediate(10));

    let outcome = controller.run_item(&WorkItem::from_raw("7", "A,B,C")).await;
    assert!(outcome.is_completed());
    assert_eq!(outcome.item_id(), "7");

    // Exactly one final record for the item, and it is the artifact
    assert_eq!(
        sink.inner.contents(Channel::Final),
        "Process: X\nA performs Y.\n//\n"
    );
}

#[tokio::test]
async fn test_claim_list_logs_raw_claims() {
    let generator = Arc::new(FakeModelClient::from_fn(|conversation, _| {
        if is_extraction(conversation) {
            return Ok(Message::assistant("[\"A binds B \u{2192} \"]"));
        }
        Ok(Message::assistant("Process: X\nbody"))
    }));
    let verifier = Arc::new(FakeModelClient::always_text("Report: supported"));
    let sink = Arc::new(MemorySink::new());
    let controller = controller(generator, verifier.clone(), sink.clone());

    let artifact = controller
        .process(&WorkItem::from_raw("1", "A,B"))
        .await
        .unwrap();

    let report = &artifact.label_round.reports()[0];
    assert_eq!(report.claim.raw, "A binds B \u{2192} ");
    assert_eq!(report.claim.sanitized, "A binds B_");

    // Audit keeps what the model returned; the check lines use the sanitized form
    let log = sink.contents(Channel::Verification);
    assert!(log.starts_with("[\"A binds B \u{2192} \"]\n&&\nA binds B_\nsupported\n&&\n"));

    // The verifier saw only the sanitized claim
    let first = &verifier.calls()[0].conversation;
    assert!(first.messages()[1].content.contains("A binds B_"));
}
