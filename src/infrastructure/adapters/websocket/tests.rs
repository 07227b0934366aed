//! Connection holder tests against a scripted connector

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::*;

struct FakeTransport {
    incoming: mpsc::UnboundedReceiver<String>,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv_text(&mut self) -> Option<Result<String, ConnectionError>> {
        self.incoming.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out scripted results and records when each attempt happened
#[derive(Default)]
struct FakeConnector {
    script: Mutex<VecDeque<Result<FakeTransport, ConnectionError>>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

/// Server end of a scripted connection; dropping `tx` closes it
struct ServerSide {
    tx: mpsc::UnboundedSender<String>,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl ServerSide {
    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl FakeConnector {
    /// Queue a live transport
    fn accept(&self) -> ServerSide {
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closes = Arc::new(AtomicUsize::new(0));
        self.script.lock().unwrap().push_back(Ok(FakeTransport {
            incoming: rx,
            sent: sent.clone(),
            closes: closes.clone(),
        }));
        ServerSide { tx, sent, closes }
    }

    fn refuse(&self) {
        self.script.lock().unwrap().push_back(Err(ConnectionError::Connect {
            url: "ws://test".into(),
            reason: "refused".into(),
        }));
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Transport = FakeTransport;

    async fn connect(&self, url: &str) -> Result<FakeTransport, ConnectionError> {
        self.attempts.lock().unwrap().push(Instant::now());
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ConnectionError::Connect {
                url: url.to_string(),
                reason: "script exhausted".into(),
            })
        })
    }
}

struct Harness {
    outbound: mpsc::UnboundedSender<Outbound>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    task: tokio::task::JoinHandle<()>,
}

fn spawn(connector: FakeConnector) -> Harness {
    let attempts = connector.attempts.clone();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (ev_tx, ev_rx) = mpsc::unbounded_channel();
    let supervisor = ConnectionSupervisor::new(connector, "ws://test");
    let task = tokio::spawn(supervisor.run(out_rx, ev_tx));
    Harness {
        outbound: out_tx,
        events: ev_rx,
        attempts,
        task,
    }
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_exactly_three_seconds_after_close() {
    let connector = FakeConnector::default();
    let server = connector.accept();
    let _next = connector.accept();
    let mut h = spawn(connector);

    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Connecting { attempt: 1 }));
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));

    drop(server.tx);
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Closed));
    let closed_at = Instant::now();

    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Connecting { attempt: 2 }));
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));

    let attempts = h.attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].duration_since(closed_at), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_failed_attempts_retry_at_fixed_interval() {
    let connector = FakeConnector::default();
    connector.refuse();
    connector.refuse();
    connector.refuse();
    let _server = connector.accept();
    let mut h = spawn(connector);

    let mut opened = false;
    while let Some(event) = h.events.recv().await {
        if event == ConnectionEvent::Opened {
            opened = true;
            break;
        }
    }
    assert!(opened);

    let attempts = h.attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 4);
    for pair in attempts.windows(2) {
        assert_eq!(pair[1].duration_since(pair[0]), Duration::from_secs(3));
    }
}

#[tokio::test(start_paused = true)]
async fn test_failure_reports_error_then_closed() {
    let connector = FakeConnector::default();
    connector.refuse();
    let mut h = spawn(connector);

    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Connecting { attempt: 1 }));
    match h.events.recv().await {
        Some(ConnectionEvent::Error(reason)) => assert!(reason.contains("refused")),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Closed));
}

#[tokio::test(start_paused = true)]
async fn test_frames_flow_both_ways() {
    let connector = FakeConnector::default();
    let server = connector.accept();
    let mut h = spawn(connector);

    h.events.recv().await;
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));

    h.outbound.send(Outbound::typing("ana", true)).unwrap();
    server.tx.send(r#"{"type":"users_count","count":2}"#.to_string()).unwrap();

    assert_eq!(
        h.events.recv().await,
        Some(ConnectionEvent::Message(r#"{"type":"users_count","count":2}"#.to_string()))
    );

    tokio::task::yield_now().await;
    assert_eq!(server.sent(), vec![r#"{"type":"typing","username":"ana","typing":true}"#.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_frames_sent_while_disconnected_are_discarded() {
    let connector = FakeConnector::default();
    connector.refuse();
    let server = connector.accept();
    let mut h = spawn(connector);

    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Connecting { attempt: 1 }));
    h.events.recv().await; // error
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Closed));

    h.outbound.send(Outbound::join("ana")).unwrap();

    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Connecting { attempt: 2 }));
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));
    tokio::task::yield_now().await;
    assert!(server.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_client_drops_sender() {
    let connector = FakeConnector::default();
    let server = connector.accept();
    let mut h = spawn(connector);

    h.events.recv().await;
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));

    drop(h.outbound);
    h.task.await.unwrap();
    assert_eq!(server.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_queued_frames_written_before_shutdown() {
    let connector = FakeConnector::default();
    let server = connector.accept();
    let mut h = spawn(connector);

    h.events.recv().await;
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));

    h.outbound.send(Outbound::join("ana")).unwrap();
    h.outbound.send(Outbound::message("ana", "bye")).unwrap();
    drop(h.outbound);
    h.task.await.unwrap();

    let sent = server.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains(r#""type":"join""#));
    assert!(sent[1].contains(r#""content":"bye""#));
    assert_eq!(server.closes(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_closed_when_server_hangs_up() {
    let connector = FakeConnector::default();
    let server = connector.accept();
    let mut h = spawn(connector);

    h.events.recv().await;
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Opened));

    let ServerSide { tx, sent: _, closes } = server;
    drop(tx);
    assert_eq!(h.events.recv().await, Some(ConnectionEvent::Closed));
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stops_during_reconnect_wait() {
    let connector = FakeConnector::default();
    connector.refuse();
    let mut h = spawn(connector);

    while let Some(event) = h.events.recv().await {
        if event == ConnectionEvent::Closed {
            break;
        }
    }
    drop(h.outbound);
    h.task.await.unwrap();
    assert_eq!(h.attempts.lock().unwrap().len(), 1);
}
