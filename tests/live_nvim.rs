//! End-to-end scenarios against a real `nvim --embed` process.
//!
//! These are `#[ignore]`d by default since they require an `nvim` binary on
//! `PATH`; run with `cargo test -- --ignored` on a machine that has one.

use nvim_msgpack_rpc::client::{Client, ConnectionOptions};
use nvim_msgpack_rpc::error::RpcError;
use nvim_msgpack_rpc::value::{array, expect_i64, string};

fn spawn_client() -> Client {
    let client = Client::init(ConnectionOptions::new().spawn_process(true)).expect("transport selection");
    client.connect().expect("nvim --embed should start and complete the handshake");
    client
}

#[test]
#[ignore = "requires an nvim binary on PATH"]
fn eval_simple_expression() {
    let client = spawn_client();
    let result = client.request("nvim_eval", array(vec![string("1+1")])).unwrap();
    assert_eq!(expect_i64(&result).unwrap(), 2);
    client.disconnect();
}

#[test]
#[ignore = "requires an nvim binary on PATH"]
fn error_response_does_not_kill_the_connection() {
    let client = spawn_client();
    let err = client.request("nonexistent_method", array(vec![])).unwrap_err();
    assert!(matches!(err, RpcError::NvimError(_)));

    let result = client.request("nvim_eval", array(vec![string("1+1")])).unwrap();
    assert_eq!(expect_i64(&result).unwrap(), 2);
    client.disconnect();
}

#[test]
#[ignore = "requires an nvim binary on PATH"]
fn two_clients_evaluate_concurrently() {
    use std::thread;

    let handles: Vec<_> = (0..2i64)
        .map(|thread_id| {
            thread::spawn(move || {
                let client = spawn_client();
                for i in 0..100i64 {
                    let expr = format!("{thread_id}*{i}");
                    let result = client.request("nvim_eval", array(vec![string(expr)])).unwrap();
                    assert_eq!(expect_i64(&result).unwrap(), thread_id * i);
                }
                client.disconnect();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
#[ignore = "requires an nvim binary on PATH"]
fn reconnect_preserves_message_id_sequence() {
    let client = spawn_client();
    let first = client.request("nvim_eval", array(vec![string("1+1")])).unwrap();
    assert_eq!(expect_i64(&first).unwrap(), 2);
    let msgid_after_first = client.next_message_id();
    client.disconnect();

    client.connect().unwrap();
    let second = client.request("nvim_eval", array(vec![string("2+2")])).unwrap();
    assert_eq!(expect_i64(&second).unwrap(), 4);
    assert!(client.next_message_id() > msgid_after_first);
    client.disconnect();
}
