//! Bot driver scenarios end to end over a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use roombot_core::{
    action, filter, Bot, BotError, Client, ConnectionError, Event, Handler, HandlerFailure,
    TransportError, WebApiConnection,
};
use roombot_testing::{chat_event, test_config, user, Recorder, ScriptedConnector, ScriptedTransport};
use serde_json::json;

fn bot(connector: ScriptedConnector, root: Handler) -> (Bot, Arc<ScriptedTransport>) {
    let transport = connector.transport();
    let connection = WebApiConnection::with_connector(test_config(), Arc::new(connector));
    let client = Arc::new(Client::new(Arc::new(connection)));
    (Bot::new(client, root), transport)
}

fn said(text: &'static str) -> impl roombot_core::Filter {
    filter::from_fn(move |event, _| {
        matches!(event, Event::ChatEvent { message, .. } if message == text)
    })
}

#[tokio::test]
async fn replies_pong_to_ping() {
    let root = Handler::new();
    root.child(said("ping"))(action::from_async(|_event, ctx| async move {
        ctx.client().chat("pong").await?;
        Ok::<_, anyhow::Error>(())
    }));

    let (bot, transport) = bot(ScriptedConnector::new(), root);
    transport.push(chat_event("u1", "ping"));
    transport.push(chat_event("u1", "hello"));
    transport.end();

    let err = bot.start().await.unwrap_err();
    assert!(matches!(err, BotError::Connection(ConnectionError::Closed)));

    let chats = transport.sent_of_kind("ChatRequest");
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["message"], "pong");
}

#[tokio::test]
async fn action_awaits_correlated_response() {
    let seen = Recorder::new();
    let root = Handler::new();
    root.child(said("wave"))(action::from_async(|_event, ctx| async move {
        ctx.client().emote("emote-hello", None).await?;
        ctx.client().chat("waved").await?;
        Ok::<_, anyhow::Error>(())
    }));
    root.child(filter::kind("ChatEvent"))(seen.clone());

    let (bot, transport) = bot(ScriptedConnector::new(), root);
    transport.push(chat_event("u1", "wave"));

    let server = {
        let transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let sent = transport.wait_for_sent(1).await;
            // Arrives while the first pass is still waiting on the emote.
            transport.push(chat_event("u1", "meanwhile"));
            transport.respond(&sent[0], json!({ "_type": "EmoteResponse" }));
            transport.end();
        })
    };

    let result = tokio::time::timeout(Duration::from_secs(5), bot.start())
        .await
        .expect("bot stalled waiting for the emote response");
    server.await.unwrap();

    assert!(matches!(
        result,
        Err(BotError::Connection(ConnectionError::Closed))
    ));
    let chats = transport.sent_of_kind("ChatRequest");
    assert_eq!(chats.len(), 1);
    assert_eq!(chats[0]["message"], "waved");

    let messages: Vec<String> = seen
        .events()
        .into_iter()
        .filter_map(|event| match event {
            Event::ChatEvent { message, .. } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(messages, ["wave", "meanwhile"]);
}

#[tokio::test]
async fn events_dispatch_in_arrival_order() {
    let recorder = Recorder::new();
    let root = Handler::new();
    root.set_action(recorder.clone());

    let (bot, transport) = bot(ScriptedConnector::new(), root);
    transport.push(json!({ "_type": "UserJoinedEvent", "user": user("u1"), "position": { "x": 0.0, "y": 0.0, "z": 0.0 } }));
    transport.push(chat_event("u1", "hi"));
    transport.push(json!({ "_type": "UserLeftEvent", "user": user("u1") }));
    transport.end();

    let _ = bot.start().await;

    assert_eq!(
        recorder.kinds(),
        vec!["UserJoinedEvent", "ChatEvent", "UserLeftEvent"]
    );
}

#[tokio::test]
async fn unknown_events_are_skipped() {
    let recorder = Recorder::new();
    let root = Handler::new();
    root.set_action(recorder.clone());

    let (bot, transport) = bot(ScriptedConnector::new(), root);
    transport.push(json!({ "_type": "WeatherChangedEvent", "sky": "grey" }));
    transport.push(chat_event("u1", "still here"));
    transport.end();

    let _ = bot.start().await;

    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn each_event_finishes_before_the_next() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let root = Handler::new();
    let sink = Arc::clone(&log);
    root.set_action(action::from_async(move |event: Event, _ctx| {
        let sink = Arc::clone(&sink);
        async move {
            let Event::ChatEvent { message, .. } = event else {
                return Ok::<_, anyhow::Error>(());
            };
            sink.lock().push(format!("start {message}"));
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            sink.lock().push(format!("end {message}"));
            Ok::<_, anyhow::Error>(())
        }
    }));

    let (bot, transport) = bot(ScriptedConnector::new(), root);
    transport.push(chat_event("u1", "a"));
    transport.push(chat_event("u1", "b"));
    transport.end();

    let _ = bot.start().await;

    assert_eq!(*log.lock(), vec!["start a", "end a", "start b", "end b"]);
}

#[tokio::test]
async fn failing_dispatch_stops_the_bot() {
    let after = Recorder::new();
    let root = Handler::new();
    root.add_child({
        let node = Handler::named("explode");
        node.set_filter(said("boom"));
        node.set_action(action::from_async(|_event, _ctx| async {
            Err::<(), _>(anyhow!("kaboom"))
        }));
        node
    })
    .unwrap();
    root.child(filter::kind("ChatEvent"))(after.clone());

    let (bot, transport) = bot(ScriptedConnector::new(), root);
    transport.push(chat_event("u1", "first"));
    transport.push(chat_event("u1", "boom"));
    transport.push(chat_event("u1", "never dispatched"));

    let err = bot.start().await.unwrap_err();

    let BotError::Dispatch(dispatch) = err else {
        panic!("expected dispatch failure");
    };
    assert_eq!(dispatch.failures.len(), 1);
    assert!(matches!(
        &dispatch.failures[0],
        HandlerFailure::Action { path, .. } if path == "root/explode"
    ));
    // The sibling still saw the failing event.
    assert_eq!(after.count(), 2);
}

#[tokio::test]
async fn connect_failure_stops_the_bot() {
    let (bot, _transport) = bot(ScriptedConnector::failing("refused"), Handler::new());

    let err = bot.start().await.unwrap_err();
    assert!(matches!(
        err,
        BotError::Connection(ConnectionError::Transport(TransportError::Connect(_)))
    ));
}

#[tokio::test]
async fn handler_tree_is_reachable_from_bot() {
    let root = Handler::named("bot-root");
    let (bot, _transport) = bot(ScriptedConnector::new(), root.clone());

    assert!(bot.handler().ptr_eq(&root));
    assert_eq!(bot.handler().path(), "bot-root");
}
