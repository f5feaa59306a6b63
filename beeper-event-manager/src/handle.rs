//! Single-shot command results and long-lived channel listeners
//!
//! Both types wrap the host's [`ResultSink`] for one command invocation. They
//! are deliberately not `Clone`: a [`CommandContext`] is consumed by its one
//! final result, and a [`ListenerHandle`] lives inside exactly one registry
//! entry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use beeper_api::{Payload, PluginResult, ResultSink};

use crate::registry::Channel;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Result destination for one host command
///
/// Consumed by `success`, `error` or `into_listener`, so a command can never
/// answer twice. Dropping a context without answering is allowed and sends
/// nothing.
pub struct CommandContext {
    action: String,
    sink: Arc<dyn ResultSink>,
}

impl CommandContext {
    pub fn new(action: impl Into<String>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            action: action.into(),
            sink,
        }
    }

    /// Name of the command this context answers
    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn success(self, payload: Payload) {
        tracing::trace!("{} -> success", self.action);
        self.sink.send(PluginResult::ok(payload));
    }

    pub fn error(self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("{} -> error: {}", self.action, message);
        self.sink.send(PluginResult::error(message));
    }

    /// Turn this command into the long-lived listener of `channel`
    pub fn into_listener(self, channel: Channel) -> ListenerHandle {
        ListenerHandle {
            id: ListenerId::next(),
            channel,
            sink: self.sink,
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("action", &self.action)
            .finish()
    }
}

/// A destination registered against a channel
///
/// Receives events only through the registry that owns it, and at most one
/// terminal status through [`ListenerHandle::finish`].
pub struct ListenerHandle {
    id: ListenerId,
    channel: Channel,
    sink: Arc<dyn ResultSink>,
}

impl ListenerHandle {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub(crate) fn emit(&self, payload: Payload) {
        self.sink.send(PluginResult::ok(payload).keep());
    }

    /// Close the destination with a `NoResult` terminal status
    pub fn finish(self) {
        tracing::debug!("Closing {} on {:?}", self.id, self.channel);
        self.sink.send(PluginResult::no_result());
    }

    /// Close the destination with an error terminal status
    pub fn fail(self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!("Failing {} on {:?}: {}", self.id, self.channel, message);
        self.sink.send(PluginResult::error(message));
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::queue_sink;
    use beeper_api::ResultStatus;

    #[test]
    fn test_context_answers_once() {
        let (sink, results) = queue_sink();
        let ctx = CommandContext::new("bluetoothState", sink);
        assert_eq!(ctx.action(), "bluetoothState");

        ctx.success(Payload::text("ok"));

        let first = results.try_recv().unwrap();
        assert_eq!(first.status, ResultStatus::Ok);
        assert!(first.is_final());
        assert!(results.try_recv().is_none());
    }

    #[test]
    fn test_listener_keeps_callback_until_finished() {
        let (sink, results) = queue_sink();
        let handle = CommandContext::new("searchDevices", sink).into_listener(Channel::DeviceEvents);

        handle.emit(Payload::text("one"));
        handle.emit(Payload::text("two"));
        handle.finish();

        let collected: Vec<_> = results.try_iter().collect();
        assert_eq!(collected.len(), 3);
        assert!(!collected[0].is_final());
        assert!(!collected[1].is_final());
        assert_eq!(collected[2].status, ResultStatus::NoResult);
        assert!(collected[2].is_final());
    }

    #[test]
    fn test_listener_fail_is_terminal_error() {
        let (sink, results) = queue_sink();
        let handle = CommandContext::new("searchDevices", sink).into_listener(Channel::DeviceEvents);

        handle.fail("scanner busy");

        let result = results.try_recv().unwrap();
        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.payload, Payload::text("scanner busy"));
        assert!(result.is_final());
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let (sink, _results) = queue_sink();
        let a = CommandContext::new("a", sink.clone()).into_listener(Channel::LogEvents);
        let b = CommandContext::new("b", sink).into_listener(Channel::LogEvents);
        assert_ne!(a.id(), b.id());
        assert!(a.id().to_string().starts_with("listener-"));
    }
}
