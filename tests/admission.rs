//! Admission-control behavior across concurrent tasks.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use socket_gate::config::ServerSettings;
use socket_gate::net::{Listener, ListenerError};
use socket_gate::AdmissionGate;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::yield_now;

#[tokio::test(flavor = "current_thread")]
async fn waiters_admitted_in_arrival_order() {
    let gate = Arc::new(AdmissionGate::bounded(1));
    let held = gate.acquire().await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut waiters = Vec::new();
    for i in 0..3 {
        let gate = Arc::clone(&gate);
        let tx = tx.clone();
        waiters.push(tokio::spawn(async move {
            let permit = gate.acquire().await;
            tx.send(i).unwrap();
            drop(permit);
        }));
        // Let waiter i reach the gate before the next one is spawned.
        yield_now().await;
    }

    drop(held);
    for waiter in waiters {
        waiter.await.unwrap();
    }

    let mut order = Vec::new();
    while let Ok(i) = rx.try_recv() {
        order.push(i);
    }
    assert_eq!(order, vec![0, 1, 2]);
}

#[tokio::test(flavor = "current_thread")]
async fn two_accept_slots_admit_two_of_three() {
    let mut settings = ServerSettings::default();
    settings.set_max_outstanding_accepts(2).unwrap();
    let gate = Arc::new(settings.create_accept_gate());

    let first = gate.acquire().now_or_never().expect("first accept proceeds");
    let _second = gate
        .acquire()
        .now_or_never()
        .expect("second accept proceeds");

    let third = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move {
            let _permit = gate.acquire().await;
        }
    });
    yield_now().await;
    assert!(!third.is_finished(), "third accept should be waiting");

    // Completing one of the first two admits the third immediately.
    drop(first);
    third.await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn cancelled_waiter_does_not_leak_a_slot() {
    let gate = Arc::new(AdmissionGate::bounded(1));
    let held = gate.acquire().await;

    let waiter = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move {
            let _permit = gate.acquire().await;
            std::future::pending::<()>().await;
        }
    });
    yield_now().await;
    waiter.abort();
    let _ = waiter.await;

    drop(held);
    assert_eq!(gate.available(), Some(1));
    let _permit = gate
        .acquire()
        .now_or_never()
        .expect("slot freed by the cancelled waiter");
}

#[tokio::test(flavor = "current_thread")]
async fn cancelled_holder_returns_its_permit() {
    let gate = Arc::new(AdmissionGate::bounded(1));

    let holder = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move {
            let _permit = gate.acquire().await;
            std::future::pending::<()>().await;
        }
    });
    yield_now().await;
    assert_eq!(gate.available(), Some(0));

    holder.abort();
    let _ = holder.await;
    assert_eq!(gate.available(), Some(1));
}

#[tokio::test]
async fn deadline_composes_around_acquire() {
    let gate = AdmissionGate::bounded(1);
    let held = gate.acquire().await;

    let waited = tokio::time::timeout(Duration::from_millis(20), gate.acquire()).await;
    assert!(waited.is_err(), "saturated gate should outlast the deadline");

    // The timed-out wait must not consume the slot.
    drop(held);
    assert_eq!(gate.available(), Some(1));
}

#[tokio::test]
async fn listener_admits_and_releases_request_slots() {
    socket_gate::observability::init_logging();

    let mut settings = ServerSettings::default();
    settings.set_max_active_requests(2).unwrap();
    settings.set_receive_timeout_ms(5_000);
    settings.set_send_timeout_ms(5_000);

    let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), settings).unwrap();
    let addr = listener.local_addr().unwrap();

    let client = TcpStream::connect(addr).await.unwrap();
    let admitted = listener.accept().await.unwrap();
    assert_eq!(admitted.peer_addr, client.local_addr().unwrap());
    assert_eq!(listener.available_request_slots(), Some(1));

    // Finishing the request (dropping its permit) frees the slot.
    drop(admitted);
    assert_eq!(listener.available_request_slots(), Some(2));
}

#[tokio::test]
async fn listener_refuses_invalid_settings() {
    // Deserialization bypasses the setters; bind must still refuse.
    let settings: ServerSettings = toml::from_str("max_outstanding_accepts = 0").unwrap();
    let err = Listener::bind("127.0.0.1:0".parse().unwrap(), settings).unwrap_err();
    assert!(matches!(err, ListenerError::Settings(_)));
}

#[tokio::test]
async fn unthrottled_listener_reports_no_request_limit() {
    let settings = socket_gate::config::parse_settings("max_active_requests = 65535").unwrap();
    let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), settings).unwrap();
    assert_eq!(listener.available_request_slots(), None);
    assert_eq!(listener.available_accept_slots(), 16);
}
