//! Channel registry: at most one live listener per channel
//!
//! Delivery happens while the registry entry is read-locked, and replacing or
//! removing an entry takes the write lock. Once `register` or `unregister`
//! returns, the previous listener cannot receive anything else through the
//! registry, even if a callback was racing with the call.
//!
//! Sinks must not call back into the registry from `ResultSink::send`.

use std::fmt;

use beeper_api::Payload;
use dashmap::DashMap;

use crate::handle::{ListenerHandle, ListenerId};

/// Logical event streams exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Locker device discovery and state changes
    DeviceEvents,
    /// Shop entered/exit notifications
    LocationEvents,
    /// Bluetooth adapter on/off
    BluetoothStateEvents,
    /// SDK log lines
    LogEvents,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::DeviceEvents,
        Channel::LocationEvents,
        Channel::BluetoothStateEvents,
        Channel::LogEvents,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::DeviceEvents => "DeviceEvents",
            Channel::LocationEvents => "LocationEvents",
            Channel::BluetoothStateEvents => "BluetoothStateEvents",
            Channel::LogEvents => "LogEvents",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Thread-safe map from channel to its current listener
#[derive(Default)]
pub struct ChannelRegistry {
    entries: DashMap<Channel, ListenerHandle>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` for `channel`, replacing any previous listener
    ///
    /// The replaced listener is returned without having been notified. It is
    /// no longer reachable through the registry; the caller may `finish` it or
    /// simply drop it.
    pub fn register(&self, channel: Channel, handle: ListenerHandle) -> Option<ListenerHandle> {
        self.register_with(channel, handle, std::iter::empty())
    }

    /// Register `handle` and deliver `snapshot` to it before any other event
    ///
    /// The snapshot is emitted while the entry is still write-locked, so a
    /// concurrent `deliver` for the same channel waits until every snapshot
    /// payload has gone out.
    pub fn register_with<I>(
        &self,
        channel: Channel,
        handle: ListenerHandle,
        snapshot: I,
    ) -> Option<ListenerHandle>
    where
        I: IntoIterator<Item = Payload>,
    {
        let new_id = handle.id();
        let (previous, delivered) = match self.entries.entry(channel) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(handle);
                let delivered = emit_all(occupied.get(), snapshot);
                (Some(previous), delivered)
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let entry = vacant.insert(handle);
                let delivered = emit_all(entry.value(), snapshot);
                (None, delivered)
            }
        };

        match &previous {
            Some(old) => tracing::debug!(
                "{}: {} replaced by {} ({} snapshot events)",
                channel,
                old.id(),
                new_id,
                delivered
            ),
            None => tracing::debug!(
                "{}: registered {} ({} snapshot events)",
                channel,
                new_id,
                delivered
            ),
        }

        previous
    }

    /// Remove and return the listener of `channel`, if any
    pub fn unregister(&self, channel: Channel) -> Option<ListenerHandle> {
        let removed = self.entries.remove(&channel).map(|(_, handle)| handle);
        match &removed {
            Some(handle) => tracing::debug!("{}: unregistered {}", channel, handle.id()),
            None => tracing::trace!("{}: unregister on empty channel", channel),
        }
        removed
    }

    /// ID of the listener currently registered for `channel`
    pub fn current(&self, channel: Channel) -> Option<ListenerId> {
        self.entries.get(&channel).map(|entry| entry.id())
    }

    pub fn is_subscribed(&self, channel: Channel) -> bool {
        self.entries.contains_key(&channel)
    }

    /// Deliver `payload` to the listener of `channel`
    ///
    /// Returns `false` and drops the payload when nobody listens.
    pub fn deliver(&self, channel: Channel, payload: Payload) -> bool {
        match self.entries.get(&channel) {
            Some(entry) => {
                entry.emit(payload);
                true
            }
            None => {
                tracing::trace!("{}: no listener, event dropped", channel);
                false
            }
        }
    }

    /// Deliver a sequence of payloads in order under one read lock
    ///
    /// Returns how many were delivered (zero when nobody listens).
    pub fn deliver_all<I>(&self, channel: Channel, payloads: I) -> usize
    where
        I: IntoIterator<Item = Payload>,
    {
        match self.entries.get(&channel) {
            Some(entry) => emit_all(entry.value(), payloads),
            None => {
                tracing::trace!("{}: no listener, batch dropped", channel);
                0
            }
        }
    }

    /// Channels that currently have a listener, in declaration order
    pub fn subscribed_channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.entries.iter().map(|e| *e.key()).collect();
        channels.sort();
        channels
    }
}

fn emit_all<I>(handle: &ListenerHandle, payloads: I) -> usize
where
    I: IntoIterator<Item = Payload>,
{
    let mut count = 0;
    for payload in payloads {
        handle.emit(payload);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::CommandContext;
    use crate::queue::{queue_sink, ResultQueue};

    fn listener(channel: Channel) -> (ListenerHandle, ResultQueue) {
        let (sink, results) = queue_sink();
        (CommandContext::new("test", sink).into_listener(channel), results)
    }

    #[test]
    fn test_deliver_without_listener_drops() {
        let registry = ChannelRegistry::new();
        assert!(!registry.deliver(Channel::LogEvents, Payload::text("lost")));
        assert!(!registry.is_subscribed(Channel::LogEvents));
        assert!(registry.current(Channel::LogEvents).is_none());
    }

    #[test]
    fn test_register_and_deliver() {
        let registry = ChannelRegistry::new();
        let (handle, results) = listener(Channel::LogEvents);
        let id = handle.id();

        assert!(registry.register(Channel::LogEvents, handle).is_none());
        assert_eq!(registry.current(Channel::LogEvents), Some(id));

        assert!(registry.deliver(Channel::LogEvents, Payload::text("a: b")));
        let result = results.try_recv().unwrap();
        assert_eq!(result.payload, Payload::text("a: b"));
        assert!(result.keep_callback);
    }

    #[test]
    fn test_replaced_listener_is_inert() {
        let registry = ChannelRegistry::new();
        let (first, first_results) = listener(Channel::DeviceEvents);
        let (second, second_results) = listener(Channel::DeviceEvents);
        let first_id = first.id();
        let second_id = second.id();

        registry.register(Channel::DeviceEvents, first);
        let replaced = registry.register(Channel::DeviceEvents, second);
        assert_eq!(replaced.map(|h| h.id()), Some(first_id));
        assert_eq!(registry.current(Channel::DeviceEvents), Some(second_id));

        registry.deliver(Channel::DeviceEvents, Payload::text("after"));

        // Replacement sends nothing to the old listener, and later events skip it.
        assert!(first_results.try_recv().is_none());
        assert_eq!(second_results.try_iter().count(), 1);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let registry = ChannelRegistry::new();
        let (handle, results) = listener(Channel::LocationEvents);
        registry.register(Channel::LocationEvents, handle);

        assert!(registry.unregister(Channel::LocationEvents).is_some());
        assert!(registry.unregister(Channel::LocationEvents).is_none());
        assert!(!registry.deliver(Channel::LocationEvents, Payload::text("late")));
        assert!(results.try_recv().is_none());
    }

    #[test]
    fn test_snapshot_precedes_live_events() {
        let registry = ChannelRegistry::new();
        let (handle, results) = listener(Channel::DeviceEvents);

        registry.register_with(
            Channel::DeviceEvents,
            handle,
            vec![Payload::text("snap-1"), Payload::text("snap-2")],
        );
        registry.deliver(Channel::DeviceEvents, Payload::text("live"));

        let payloads: Vec<_> = results.try_iter().map(|r| r.payload).collect();
        assert_eq!(
            payloads,
            vec![
                Payload::text("snap-1"),
                Payload::text("snap-2"),
                Payload::text("live")
            ]
        );
    }

    #[test]
    fn test_deliver_all_preserves_order() {
        let registry = ChannelRegistry::new();
        let (handle, results) = listener(Channel::DeviceEvents);
        registry.register(Channel::DeviceEvents, handle);

        let sent = registry.deliver_all(
            Channel::DeviceEvents,
            ["d1", "d2", "d3"].into_iter().map(Payload::text),
        );
        assert_eq!(sent, 3);

        let payloads: Vec<_> = results.try_iter().map(|r| r.payload.to_wire()).collect();
        assert_eq!(payloads, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn test_channels_are_independent() {
        let registry = ChannelRegistry::new();
        let (log, _log_results) = listener(Channel::LogEvents);
        let (bt, _bt_results) = listener(Channel::BluetoothStateEvents);
        registry.register(Channel::LogEvents, log);
        registry.register(Channel::BluetoothStateEvents, bt);

        assert_eq!(
            registry.subscribed_channels(),
            vec![Channel::BluetoothStateEvents, Channel::LogEvents]
        );

        registry.unregister(Channel::LogEvents);
        assert_eq!(
            registry.subscribed_channels(),
            vec![Channel::BluetoothStateEvents]
        );
    }

    #[test]
    fn test_concurrent_delivery_never_reaches_removed_listener() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(ChannelRegistry::new());
        let (handle, results) = listener(Channel::DeviceEvents);
        registry.register(Channel::DeviceEvents, handle);

        let producer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..1000 {
                    registry.deliver(Channel::DeviceEvents, Payload::text(i.to_string()));
                }
            })
        };

        let removed = registry.unregister(Channel::DeviceEvents);
        let seen_at_removal = results.try_iter().count();
        producer.join().unwrap();

        assert!(removed.is_some());
        // Nothing arrives once unregister has returned.
        assert_eq!(results.try_iter().count(), 0);
        assert!(seen_at_removal <= 1000);
    }
}
