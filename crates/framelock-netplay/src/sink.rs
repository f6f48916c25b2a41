//! Outbound message port.
//!
//! Engines never talk to a socket; they emit [`Message`]s through a sink
//! injected at construction. The embedding application supplies a sink that
//! frames and writes to its channel; tests supply [`MemorySink`].

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use framelock_netproto::messages::Message;

/// Capability to emit outbound messages toward the session's peers.
pub trait MessageSink {
    fn send(&mut self, message: Message);
}

/// Adapter turning a closure into a sink, for callers that already have a
/// send function in hand.
pub struct FnSink<F: FnMut(Message)>(pub F);

impl<F: FnMut(Message)> MessageSink for FnSink<F> {
    fn send(&mut self, message: Message) {
        (self.0)(message)
    }
}

/// In-memory queue sink.
///
/// Clones share the same queue, so one handle can be given to an engine
/// while another drains it, which is the standard wiring for loopback
/// tests. The
/// engine is single-threaded by design, so a plain `Rc<RefCell<..>>` is all
/// the sharing needed.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    queue: Rc<RefCell<VecDeque<Message>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued messages, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, message: Message) {
        self.queue.borrow_mut().push_back(message);
    }
}
