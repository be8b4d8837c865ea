//! Client-level integration tests driven against the in-memory loopback
//! transport in `support`, covering request/response correlation,
//! notification dispatch, and disconnect semantics without needing a real
//! editor process.

mod support;

use std::sync::{Arc, Mutex};
use std::thread;

use nvim_msgpack_rpc::client::{Client, ConnectionOptions};
use nvim_msgpack_rpc::error::RpcError;
use nvim_msgpack_rpc::rpc::{encode_notification, encode_response, DecodeOutcome, Message, StreamDecoder};
use nvim_msgpack_rpc::transport::TransportKind;
use nvim_msgpack_rpc::value::{self, array, int, string, Value};

use support::mock_pair;

fn connected_client() -> (Arc<Client>, support::MockPeer) {
    let (transport, peer) = mock_pair();
    let client = Arc::new(Client::with_transport(TransportKind::None, Box::new(transport), ConnectionOptions::new().skip_api_info(true)));
    client.connect().unwrap();
    (client, peer)
}

#[test]
fn request_response_roundtrip() {
    let (client, peer) = connected_client();
    let responder = thread::spawn(move || {
        let written = peer.take_written(1);
        assert!(!written.is_empty());
        peer.push(&encode_response(0, None, Some(&int(2))));
    });
    let result = client.request("nvim_eval", array(vec![string("1+1")])).unwrap();
    assert_eq!(result, int(2));
    responder.join().unwrap();
}

#[test]
fn nvim_error_response_does_not_disconnect() {
    let (client, peer) = connected_client();
    let responder = thread::spawn(move || {
        peer.take_written(1);
        peer.push(&encode_response(0, Some(&string("E117: Unknown function")), None));
    });
    let err = client.request("nonexistent_method", array(vec![])).unwrap_err();
    assert!(matches!(err, RpcError::NvimError(Value::Str(_))));
    responder.join().unwrap();
    assert!(client.is_connected());
}

#[test]
fn notification_dispatched_while_request_pending() {
    let (client, peer) = connected_client();
    let received = Arc::new(Mutex::new(Vec::new()));
    {
        let received = received.clone();
        client.set_event_handler(Some(move |method: &str, params: &Value| {
            received.lock().unwrap().push((method.to_string(), params.clone()));
        }));
    }

    let responder = thread::spawn(move || {
        peer.take_written(1);
        peer.push(&encode_notification("redraw", &array(vec![string("flush")])));
        peer.push(&encode_response(0, None, Some(&int(42))));
    });

    let result = client.request("nvim_eval", array(vec![string("6*7")])).unwrap();
    assert_eq!(result, int(42));
    responder.join().unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "redraw");
}

#[test]
fn disconnect_fails_all_pending_requests() {
    let (client, _peer) = connected_client();
    let client_for_disconnect = client.clone();
    let disconnector = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(50));
        client_for_disconnect.disconnect();
    });

    let err = client.request("nvim_eval", array(vec![string("1+1")])).unwrap_err();
    assert!(matches!(err, RpcError::Transport(_)));
    disconnector.join().unwrap();
    assert!(!client.is_connected());
}

#[test]
fn concurrent_requests_from_multiple_threads() {
    let (client, peer) = connected_client();

    let responder = thread::spawn(move || {
        let mut dec = StreamDecoder::new();
        let mut answered = 0usize;
        while answered < 8 {
            let chunk = peer.take_written(1);
            dec.feed(&chunk);
            loop {
                match dec.poll().unwrap() {
                    DecodeOutcome::Message(Message::Request { msgid, .. }) => {
                        peer.push(&encode_response(msgid, None, Some(&int(i64::from(msgid)))));
                        answered += 1;
                    }
                    DecodeOutcome::Message(other) => panic!("unexpected frame from client: {other:?}"),
                    DecodeOutcome::NeedMoreData => break,
                }
            }
        }
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            thread::spawn(move || client.request("nvim_eval", array(vec![string("noop")])).unwrap())
        })
        .collect();

    let mut results: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).map(|v| value::expect_i64(&v).unwrap()).collect();
    results.sort_unstable();
    assert_eq!(results, (0..8).collect::<Vec<_>>());
    responder.join().unwrap();
}
