//! An in-memory loopback transport for exercising the `Client` demultiplex
//! loop without a real editor process.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use nvim_msgpack_rpc::error::TransportError;
use nvim_msgpack_rpc::transport::Transport;

struct Shared {
    inbound: Mutex<VecDeque<u8>>,
    inbound_wake: Condvar,
    outbound: Mutex<Vec<u8>>,
    outbound_wake: Condvar,
    closed: AtomicBool,
}

/// The peer side of a [`MockTransport`]: push frames for the client to read,
/// and observe frames the client wrote.
#[derive(Clone)]
pub struct MockPeer(Arc<Shared>);

impl MockPeer {
    /// Queues raw bytes for the client's next `read` calls to return.
    pub fn push(&self, bytes: &[u8]) {
        let mut inbound = self.0.inbound.lock().unwrap();
        inbound.extend(bytes.iter().copied());
        drop(inbound);
        self.0.inbound_wake.notify_all();
    }

    /// Simulates the peer closing the connection: subsequent client reads
    /// observe EOF once the queued bytes are drained.
    pub fn close(&self) {
        self.0.closed.store(true, Ordering::SeqCst);
        self.0.inbound_wake.notify_all();
    }

    /// Blocks until at least `min_len` bytes have been written by the
    /// client, then drains and returns them.
    pub fn take_written(&self, min_len: usize) -> Vec<u8> {
        let mut outbound = self.0.outbound.lock().unwrap();
        while outbound.len() < min_len {
            outbound = self.0.outbound_wake.wait_timeout(outbound, Duration::from_millis(200)).unwrap().0;
        }
        outbound.drain(..).collect()
    }
}

/// The client side of the loopback pair; implements [`Transport`].
pub struct MockTransport {
    shared: Arc<Shared>,
    connected: bool,
}

/// Builds a connected client/peer pair sharing one in-memory byte pipe.
pub fn mock_pair() -> (MockTransport, MockPeer) {
    let shared = Arc::new(Shared {
        inbound: Mutex::new(VecDeque::new()),
        inbound_wake: Condvar::new(),
        outbound: Mutex::new(Vec::new()),
        outbound_wake: Condvar::new(),
        closed: AtomicBool::new(false),
    });
    (MockTransport { shared: shared.clone(), connected: false }, MockPeer(shared))
}

impl Transport for MockTransport {
    fn connect(&mut self, _address: &str, _timeout: Duration) -> Result<(), TransportError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Mirrors a real blocking socket with a short read timeout: waits a
    /// bounded amount of time for bytes, and returns `Timeout` rather than
    /// blocking forever if none arrive, so a thread polling `is_connected`
    /// (or waiting to take the client lock, as `disconnect` does) is never
    /// starved behind an idle connection.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut inbound = self.shared.inbound.lock().unwrap();
        if inbound.is_empty() && !self.shared.closed.load(Ordering::SeqCst) {
            inbound = self.shared.inbound_wake.wait_timeout(inbound, Duration::from_millis(20)).unwrap().0;
        }
        if !inbound.is_empty() {
            let n = inbound.len().min(buf.len());
            for (slot, byte) in buf[..n].iter_mut().zip(inbound.drain(..n)) {
                *slot = byte;
            }
            return Ok(n);
        }
        if self.shared.closed.load(Ordering::SeqCst) {
            return Ok(0);
        }
        Err(TransportError::Timeout)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut outbound = self.shared.outbound.lock().unwrap();
        outbound.extend_from_slice(bytes);
        drop(outbound);
        self.shared.outbound_wake.notify_all();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
