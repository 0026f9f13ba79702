//! Integration tests for DDT publication and session sharing.
//!
//! These tests verify the end-to-end flow:
//! 1. A raw YAML descriptor is assembled, validated and stored as JSON
//! 2. A second service instance loads the stored DDT from disk
//! 3. Concurrent sessions share one immutable DDT and keep separate state
//! 4. Republishing swaps the DDT for new sessions only

use std::sync::Arc;
use tempfile::TempDir;

use ddt_engine::adapters::{
    InMemoryDdtRepository, JsonFileDdtRepository, KeywordTemplateMatcher, RuleBasedParser,
};
use ddt_engine::application::DdtService;
use ddt_engine::domain::assembler::{disassemble, AssemblyRequest, DdtAssembler};
use ddt_engine::domain::foundation::{DdtId, ErrorCode, SequentialIds};
use ddt_engine::domain::runtime::{EngineConfig, TurnOutcome};
use ddt_engine::ports::DdtRepository;

const CONTACT_YAML: &str = r#"
ddtId: contact
label: Contact details
root:
  variable: contact
  type: text
  label: Contact
  subData:
    - variable: email
      type: email
      label: E-mail address
      constraints:
        - type: email
      nextStepId: contact/age
    - variable: age
      type: number
      label: Age
      required: false
      constraints:
        - type: positiveNumber
messages:
  steps:
    start: [["Let's collect your contact details."]]
  subData:
    - steps:
        start: [["What is your e-mail address?"]]
        noMatch: [["That does not look like an e-mail address."], ["Please type something like anna@example.com."]]
        success: [["Noted."]]
    - steps:
        start: [["How old are you?"]]
"#;

fn request() -> AssemblyRequest {
    serde_yaml::from_str(CONTACT_YAML).unwrap()
}

fn service(repository: Arc<dyn DdtRepository>) -> DdtService {
    DdtService::new(
        repository,
        Arc::new(RuleBasedParser::new()),
        DdtAssembler::default(),
        EngineConfig::default(),
    )
}

fn contact_id() -> DdtId {
    DdtId::new("contact").unwrap()
}

// =============================================================================
// Assembly -> validation -> persistence
// =============================================================================

#[tokio::test]
async fn yaml_descriptor_is_published_and_reloaded_from_disk() {
    let dir = TempDir::new().unwrap();

    let published = service(Arc::new(JsonFileDdtRepository::new(dir.path())))
        .publish_with(request(), &mut SequentialIds::new())
        .await
        .unwrap();
    assert!(dir.path().join("contact.json").exists());
    assert_eq!(published.label, "Contact details");
    assert_eq!(published.node_ids().len(), 3);

    let fresh = service(Arc::new(JsonFileDdtRepository::new(dir.path())));
    let reloaded = fresh.get(&contact_id()).await.unwrap();
    assert_eq!(**reloaded, **published);
    assert_eq!(fresh.list().await.unwrap(), vec![contact_id()]);
}

#[tokio::test]
async fn stored_ddt_round_trips_through_disassembly() {
    let service = service(Arc::new(InMemoryDdtRepository::new()));
    let first = service
        .publish_with(request(), &mut SequentialIds::new())
        .await
        .unwrap();

    let again = service
        .publish_with(disassemble(&first).unwrap(), &mut SequentialIds::new())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_string(&**first).unwrap(),
        serde_json::to_string(&**again).unwrap()
    );
}

#[tokio::test]
async fn sub_node_dialogue_follows_successor_edges() {
    let service = service(Arc::new(InMemoryDdtRepository::new()));
    service.publish(request()).await.unwrap();

    let mut session = service.open_session(&contact_id()).await.unwrap();
    // Skip the greeting node
    session.state.current_node_id = "contact/email".into();

    let turn = session.reply("not an address").await.unwrap();
    assert_eq!(turn.bot_texts(), vec!["That does not look like an e-mail address."]);
    let turn = session.reply("still not").await.unwrap();
    assert_eq!(turn.bot_texts(), vec!["Please type something like anna@example.com."]);

    let turn = session.reply("anna@example.com").await.unwrap();
    assert_eq!(turn.bot_texts(), vec!["Noted.", "How old are you?"]);

    let turn = session.reply("-4").await.unwrap();
    assert!(matches!(turn.outcome, TurnOutcome::ConstraintFailed { .. }));
    let turn = session.reply("42").await.unwrap();
    assert!(matches!(turn.outcome, TurnOutcome::Transitioned { terminal: true, .. }));
    assert!(session.is_finished());
}

// =============================================================================
// Session sharing
// =============================================================================

#[tokio::test]
async fn concurrent_sessions_share_one_ddt() {
    let service = Arc::new(service(Arc::new(InMemoryDdtRepository::new())));
    service.publish(request()).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let mut session = service.open_session(&contact_id()).await.unwrap();
            session.state.current_node_id = "contact/email".into();
            let answer = if n % 2 == 0 { "nope" } else { "anna@example.com" };
            session.reply(answer).await.unwrap();
            session
        }));
    }

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap());
    }

    let shared = sessions[0].engine.ddt().clone();
    for (n, session) in sessions.iter().enumerate() {
        assert!(Arc::ptr_eq(session.engine.ddt(), &shared));
        let expected = if n % 2 == 0 { "contact/email" } else { "contact/age" };
        assert_eq!(session.state.current_node_id.as_str(), expected);
    }
}

#[tokio::test]
async fn republished_ddt_only_reaches_new_sessions() {
    let service = service(Arc::new(InMemoryDdtRepository::new()));
    service.publish(request()).await.unwrap();
    let running = service.open_session(&contact_id()).await.unwrap();

    let mut edited = request();
    edited.label = Some("Contact details v2".into());
    service.publish(edited).await.unwrap();
    let fresh = service.open_session(&contact_id()).await.unwrap();

    assert_eq!(running.engine.ddt().label, "Contact details");
    assert_eq!(fresh.engine.ddt().label, "Contact details v2");
}

#[tokio::test]
async fn opening_utterance_selects_the_template() {
    let matcher = KeywordTemplateMatcher::new().with_template(contact_id(), ["email", "contact"]);
    let service =
        service(Arc::new(InMemoryDdtRepository::new())).with_matcher(Arc::new(matcher));
    service.publish(request()).await.unwrap();

    let session = service
        .open_session_for_utterance("I want to update my contact email")
        .await
        .unwrap();
    assert_eq!(
        session.state.bot_messages().collect::<Vec<_>>(),
        vec!["Let's collect your contact details."]
    );

    let err = service
        .open_session_for_utterance("what's the weather")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TemplateNotMatched);
}
