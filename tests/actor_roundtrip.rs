//! Engine actor driven through its mailbox

use confluo_core::{Engine, EngineConfig, EngineError, EngineHandle};
use confluo_protocol::{CompletionState, Context, Inbound, Outbound, SourceConfig};

fn state(typed: &str) -> CompletionState {
    CompletionState::new(Context::new("text", typed).with_reltime(1.0))
        .with_source(SourceConfig::new("buffer").with_complete_length(2))
}

#[tokio::test]
async fn test_request_then_delivery_round_trip() {
    let (handle, mut outbox) = EngineHandle::spawn(Engine::new(EngineConfig::default()));

    handle
        .send(Inbound::Complete {
            state: state("wo"),
            manual: false,
        })
        .unwrap();

    let request = match outbox.recv().await {
        Some(Outbound::RequestRefresh { mut requests }) => requests.remove(0),
        other => panic!("unexpected message: {:?}", other),
    };

    handle
        .send(Inbound::Deliver {
            context: request.context,
            startccol: 1,
            matches: vec!["world".into(), "word".into(), "other".into()],
            refresh: false,
            state: None,
        })
        .unwrap();

    match outbox.recv().await {
        Some(Outbound::RenderPopup(render)) => {
            let words: Vec<_> = render.matches.iter().map(|m| m.word.as_str()).collect();
            assert_eq!(words, vec!["world", "word"]);
        }
        other => panic!("unexpected message: {:?}", other),
    }

    let engine = handle.shutdown().await.unwrap();
    assert_eq!(engine.cache().len(), 1);
}

#[tokio::test]
async fn test_messages_are_processed_in_order() {
    let (handle, mut outbox) = EngineHandle::spawn(Engine::default());

    handle.send(Inbound::UpdateState { state: state("wo") }).unwrap();
    handle
        .send(Inbound::Deliver {
            context: Context::new("text", "wo").with_source("buffer"),
            startccol: 1,
            matches: vec!["word".into()],
            refresh: false,
            state: None,
        })
        .unwrap();
    handle.send(Inbound::Reset).unwrap();

    assert!(matches!(outbox.recv().await, Some(Outbound::RenderPopup(_))));

    let engine = handle.shutdown().await.unwrap();
    assert!(engine.cache().is_empty());
    assert!(outbox.recv().await.is_none());
}

#[tokio::test]
async fn test_engine_runs_without_listener() {
    let (handle, outbox) = EngineHandle::spawn(Engine::default());
    drop(outbox);

    handle.send(Inbound::Reset).unwrap();
    handle.send(Inbound::Warmup { state: state("") }).unwrap();
    let engine = handle.shutdown().await.unwrap();
    assert!(engine.state().is_none());

    let err = EngineError::ChannelClosed;
    assert_eq!(err.to_string(), "Engine mailbox closed");
}
