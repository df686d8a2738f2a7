//! Transport-level tests against a scripted endpoint: handshake, correlation, events, teardown.

use jdwp_client::commands::virtual_machine;
use jdwp_client::{JdwpClient, JdwpError};
use jdwp_mock::{replies, HandshakeBehavior, MockAnswer, MockVm};
use jdwp_types::{RequestId, SuspendPolicy, ThreadId};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::unbounded_channel;

async fn connect(mock: &MockVm) -> Result<JdwpClient, JdwpError> {
    let stream = TcpStream::connect(mock.addr()).await.expect("connects");
    JdwpClient::create(stream).await
}

#[test_log::test(tokio::test)]
async fn test_handshake_round_trip() {
    let mock = MockVm::spawn(|_, _, _| MockAnswer::Ignore).await.unwrap();
    let client = connect(&mock).await.expect("handshake must succeed");
    drop(client);
}

#[test_log::test(tokio::test)]
async fn test_handshake_mismatch_is_fatal() {
    let mock = MockVm::spawn_with(HandshakeBehavior::Garble, |_, _, _| MockAnswer::Ignore)
        .await
        .unwrap();
    let error = connect(&mock).await.expect_err("garbled handshake");
    assert!(matches!(error, JdwpError::HandshakeMismatch));
}

#[test_log::test(tokio::test)]
async fn test_version_and_id_sizes() {
    let mock = MockVm::spawn(|data, _, _| match (data.command_set(), data.command()) {
        (1, 1) => MockAnswer::Reply(replies::version("Dalvik", "2.1.0")),
        (1, 7) => MockAnswer::Reply(replies::id_sizes()),
        // a reply to a fire-and-forget command must be dropped without fuss
        (1, 8) => MockAnswer::Reply(bytes::Bytes::new()),
        _ => MockAnswer::Error(99),
    })
    .await
    .unwrap();

    let client = connect(&mock).await.unwrap();
    client.send(virtual_machine::Suspend).await.unwrap();

    let id_sizes = client.negotiate_id_sizes().await.unwrap();
    assert_eq!(id_sizes.object_id_size, 8);
    assert_eq!(client.id_sizes().object_id_size(), 8);

    let version = client.send(virtual_machine::Version).await.unwrap();
    assert_eq!(version.vm_name, "Dalvik");
    assert_eq!(version.jdwp_major, 1);
}

#[test_log::test(tokio::test)]
async fn test_concurrent_commands_correlate_by_id() {
    let mock = MockVm::spawn(|data, _, _| match (data.command_set(), data.command()) {
        (1, 1) => MockAnswer::Reply(replies::version("Dalvik", "2.1.0")),
        (1, 4) => MockAnswer::Reply(replies::all_threads(&[ThreadId::new(0x77)])),
        _ => MockAnswer::Error(99),
    })
    .await
    .unwrap();

    let client = Arc::new(connect(&mock).await.unwrap());
    let (version, threads) = tokio::join!(
        client.send(virtual_machine::Version),
        client.send(virtual_machine::AllThreads),
    );
    assert_eq!(version.unwrap().vm_name, "Dalvik");
    assert_eq!(threads.unwrap().threads, vec![ThreadId::new(0x77)]);
}

#[test_log::test(tokio::test)]
async fn test_protocol_errors_are_returned_not_fatal() {
    let mock = MockVm::spawn(|data, _, _| match (data.command_set(), data.command()) {
        (1, 1) => MockAnswer::Error(112), // VM_DEAD
        (1, 7) => MockAnswer::Reply(replies::id_sizes()),
        _ => MockAnswer::Error(99),
    })
    .await
    .unwrap();

    let client = connect(&mock).await.unwrap();
    let error = client
        .send(virtual_machine::Version)
        .await
        .expect_err("scripted failure");
    assert!(error.is_protocol(jdwp_types::ErrorConstant::VmDead));
    assert!(error.to_string().contains("VirtualMachine.Version"));

    // the session is still alive
    client.negotiate_id_sizes().await.expect("session survives");
}

#[test_log::test(tokio::test)]
async fn test_composite_events_reach_their_handler() {
    let mock = MockVm::spawn(|_, _, _| MockAnswer::Ignore).await.unwrap();
    let client = connect(&mock).await.unwrap();

    let (tx, mut rx) = unbounded_channel();
    let request_id = RequestId::new(42);
    client.dispatcher().register_fn(request_id, move |event, composite| {
        let tx = tx.clone();
        async move {
            tx.send((event, composite)).unwrap();
        }
    });

    let thread = ThreadId::new(0x1001);
    mock.send_composite(
        SuspendPolicy::None,
        &[
            replies::thread_start_event(request_id, thread),
            replies::thread_start_event(RequestId::new(777), thread),
        ],
    );

    let (event, composite) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("event within two seconds")
        .expect("channel open");
    assert_eq!(event.request_id(), Some(request_id));
    assert_eq!(event.thread(), Some(thread));
    assert_eq!(composite.suspend_policy, SuspendPolicy::None);
    assert_eq!(composite.events.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_disconnect_fails_pending_requests() {
    // Version never gets a reply, so the await is left hanging until the peer goes away.
    let mock = MockVm::spawn(|_, _, _| MockAnswer::Ignore).await.unwrap();
    let client = connect(&mock).await.unwrap();

    let pending = client.send(virtual_machine::Version);
    let killer = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(mock);
    };
    let (result, ()) = tokio::join!(pending, killer);
    let error = result.expect_err("connection went away");
    assert!(
        matches!(error, JdwpError::Disconnected),
        "got {error:?} instead"
    );
}
