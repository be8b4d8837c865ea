//! The pending-response table: one waitable slot per outstanding `msgid`.
//!
//! Modeled the way `interprocess`'s own blocking primitives pair a `Mutex`
//! with a `Condvar` rather than reaching for an async channel — this crate
//! has no async runtime to hand a waker to (`SPEC_FULL.md` §5).

use std::collections::HashMap;
use std::sync::{Condvar, Mutex};

use crate::value::Value;

/// The eventual outcome of one outstanding request.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    /// The peer responded; `error` and/or `result` came straight off the wire.
    Completed { error: Option<Value>, result: Option<Value> },
    /// The connection was torn down before a response arrived.
    ConnectionClosed,
}

/// A slot starts `None` (outstanding, no answer yet) and is filled in place
/// once a response or a disconnect completes it.
type Slot = Option<Outcome>;

#[derive(Default)]
struct Slots {
    table: HashMap<u32, Slot>,
}

/// A table of one-shot slots keyed by `msgid`, shared between the thread
/// that issued a request and whichever thread happens to be draining the
/// read buffer when the matching response arrives.
pub(crate) struct PendingTable {
    slots: Mutex<Slots>,
    wake: Condvar,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self { slots: Mutex::new(Slots::default()), wake: Condvar::new() }
    }

    /// Registers `msgid` as outstanding. Must be called before the request
    /// bytes are written, so a same-thread-reentrant response can never race
    /// ahead of the registration.
    pub(crate) fn register(&self, msgid: u32) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.table.insert(msgid, None);
    }

    /// Blocks the calling thread until `msgid`'s slot is completed by
    /// [`complete`](Self::complete) or [`fail_all`](Self::fail_all), driven
    /// by `drive_one_round`, which the Client calls to read and dispatch
    /// more frames while holding the client lock. `drive_one_round` returns
    /// `true` if it made progress (so the caller should check the slot
    /// again without re-blocking on the condvar).
    pub(crate) fn wait_for(&self, msgid: u32, mut drive_one_round: impl FnMut() -> bool) -> Outcome {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if let Some(slot) = slots.table.get_mut(&msgid) {
                if let Some(outcome) = slot.take() {
                    slots.table.remove(&msgid);
                    return outcome;
                }
            }
            drop(slots);
            let progressed = drive_one_round();
            slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            if !progressed {
                let (guard, _timeout) = self.wake.wait_timeout(slots, std::time::Duration::from_millis(5)).unwrap_or_else(|e| e.into_inner());
                slots = guard;
            }
        }
    }

    /// Completes `msgid`'s slot and wakes any thread waiting on it. A no-op
    /// if `msgid` is not (or no longer) registered — this happens when a
    /// stray response arrives for a request nobody is waiting on anymore.
    pub(crate) fn complete(&self, msgid: u32, error: Option<Value>, result: Option<Value>) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = slots.table.get_mut(&msgid) {
            *slot = Some(Outcome::Completed { error, result });
        }
        drop(slots);
        self.wake.notify_all();
    }

    /// Fails every still-outstanding slot, used on disconnect.
    pub(crate) fn fail_all(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        for slot in slots.table.values_mut() {
            if slot.is_none() {
                *slot = Some(Outcome::ConnectionClosed);
            }
        }
        drop(slots);
        self.wake.notify_all();
    }
}
