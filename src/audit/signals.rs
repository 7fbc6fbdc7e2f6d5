//! Pre-write event bus
//!
//! Request scopes connect a transient subscriber here; the change tracker
//! emits to it from its before-hooks so subscribers can add context to the
//! pending [`AuditMeta`]. Subscribers are keyed by a [`DispatchKey`] and only
//! fire for writes on the thread that connected them, since each worker
//! handles one request at a time.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use crate::models::{EntityType, RequestToken};

use super::meta::AuditMeta;

/// Which write a pre-write event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    Save,
    Delete,
}

/// Emitted before a tracked entity is written or deleted
///
/// Subscribers can use the fields to limit what they contribute, for example
/// only tagging deletes or only one entity type. `entity_pk` is `None` for an
/// entity that has not been saved yet.
#[derive(Debug, Clone, Copy)]
pub struct PresaveEvent<'a> {
    pub entity_type: &'a EntityType,
    pub entity_pk: Option<&'a str>,
    pub phase: WritePhase,
}

/// Unique key for a transient subscriber
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    namespace: String,
    request: RequestToken,
}

impl DispatchKey {
    pub fn new(namespace: impl Into<String>, request: RequestToken) -> Self {
        Self {
            namespace: namespace.into(),
            request,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.request)
    }
}

pub type PresaveHandler = Arc<dyn Fn(&PresaveEvent<'_>, &mut AuditMeta) + Send + Sync>;

struct Subscriber {
    key: DispatchKey,
    owner: ThreadId,
    handler: PresaveHandler,
}

/// Registry of pre-write subscribers
#[derive(Default)]
pub struct PresaveBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl fmt::Debug for PresaveBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresaveBus")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

impl PresaveBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a subscriber owned by the current thread
    ///
    /// Returns `false` and leaves the existing subscriber in place if the key
    /// is already connected.
    pub fn connect(&self, key: DispatchKey, handler: PresaveHandler) -> bool {
        let mut subscribers = self.write();
        if subscribers.iter().any(|s| s.key == key) {
            return false;
        }
        tracing::debug!(key = %key, "connected pre-write subscriber");
        subscribers.push(Subscriber {
            key,
            owner: thread::current().id(),
            handler,
        });
        true
    }

    /// Disconnect a subscriber; returns whether one was removed
    pub fn disconnect(&self, key: &DispatchKey) -> bool {
        let mut subscribers = self.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.key != *key);
        let removed = subscribers.len() != before;
        if removed {
            tracing::debug!(key = %key, "disconnected pre-write subscriber");
        }
        removed
    }

    /// Run every subscriber owned by the current thread
    pub fn emit(&self, event: &PresaveEvent<'_>, meta: &mut AuditMeta) {
        let current = thread::current().id();
        // Handlers run outside the lock so they may connect or disconnect
        let handlers: Vec<PresaveHandler> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.owner == current)
            .map(|s| Arc::clone(&s.handler))
            .collect();

        for handler in handlers {
            handler(event, meta);
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_connected(&self, key: &DispatchKey) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|s| s.key == *key)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::meta::ChangeContext;
    use crate::models::InboundRequest;

    fn remote_handler(addr: &'static str) -> PresaveHandler {
        Arc::new(move |_event: &PresaveEvent<'_>, meta: &mut AuditMeta| {
            meta.update_context(&ChangeContext {
                remote_addr: Some(addr.to_string()),
                ..ChangeContext::default()
            });
        })
    }

    fn event(entity_type: &EntityType) -> PresaveEvent<'_> {
        PresaveEvent {
            entity_type,
            entity_pk: None,
            phase: WritePhase::Save,
        }
    }

    #[test]
    fn test_connect_emit_disconnect() {
        let bus = PresaveBus::new();
        let key = DispatchKey::new("AUDIT_LOG", InboundRequest::new("GET", "/").token());
        let entity_type = EntityType::from("shop.item");

        assert!(bus.connect(key.clone(), remote_handler("1.2.3.4")));
        assert_eq!(bus.receiver_count(), 1);

        let mut meta = AuditMeta::enabled();
        bus.emit(&event(&entity_type), &mut meta);
        assert_eq!(meta.context().remote_addr.as_deref(), Some("1.2.3.4"));

        assert!(bus.disconnect(&key));
        assert!(!bus.disconnect(&key));
        assert_eq!(bus.receiver_count(), 0);

        let mut meta = AuditMeta::enabled();
        bus.emit(&event(&entity_type), &mut meta);
        assert!(meta.context().is_empty());
    }

    #[test]
    fn test_duplicate_key_is_ignored() {
        let bus = PresaveBus::new();
        let key = DispatchKey::new("AUDIT_LOG", InboundRequest::new("GET", "/").token());

        assert!(bus.connect(key.clone(), remote_handler("1.1.1.1")));
        assert!(!bus.connect(key.clone(), remote_handler("2.2.2.2")));

        let entity_type = EntityType::from("shop.item");
        let mut meta = AuditMeta::enabled();
        bus.emit(&event(&entity_type), &mut meta);
        assert_eq!(meta.context().remote_addr.as_deref(), Some("1.1.1.1"));
    }

    #[test]
    fn test_subscribers_are_thread_scoped() {
        let bus = Arc::new(PresaveBus::new());
        let key = DispatchKey::new("AUDIT_LOG", InboundRequest::new("GET", "/").token());
        bus.connect(key, remote_handler("9.9.9.9"));

        let other = Arc::clone(&bus);
        let seen = thread::spawn(move || {
            let entity_type = EntityType::from("shop.item");
            let mut meta = AuditMeta::enabled();
            other.emit(&event(&entity_type), &mut meta);
            meta.context().remote_addr.clone()
        })
        .join()
        .unwrap();

        assert!(seen.is_none());
    }
}
