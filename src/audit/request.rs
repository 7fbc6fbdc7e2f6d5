//! Request correlation
//!
//! A [`RequestAuditor`] wraps the handling of one inbound request. Entering
//! it connects a pre-write subscriber that injects the request's user,
//! origin and (for view auditing) request record into every change recorded
//! on this worker until the returned [`RequestScope`] is dropped.

use std::fmt;
use std::sync::Arc;

use crate::config::settings::AuditSettings;
use crate::error::{AuditError, AuditResult};
use crate::models::{InboundRequest, RequestRecord};
use crate::storage::AuditStore;

use super::meta::{AuditMeta, ChangeContext};
use super::signals::{DispatchKey, PresaveBus, PresaveEvent, PresaveHandler};

/// Appended to the dispatch namespace for view-level auditing
pub const VIEW_AUDIT_SUFFIX: &str = "_VIEW_AUDIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Context only: user and origin
    Middleware,
    /// Persist a request record and link changes to it
    View,
}

/// Correlates changes with the request being handled
#[derive(Clone)]
pub struct RequestAuditor {
    mode: Mode,
    settings: Arc<AuditSettings>,
    bus: Arc<PresaveBus>,
    store: Arc<dyn AuditStore>,
}

impl fmt::Debug for RequestAuditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuditor")
            .field("mode", &self.mode)
            .finish()
    }
}

impl RequestAuditor {
    pub(crate) fn middleware(
        settings: Arc<AuditSettings>,
        bus: Arc<PresaveBus>,
        store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            mode: Mode::Middleware,
            settings,
            bus,
            store,
        }
    }

    pub(crate) fn view(
        settings: Arc<AuditSettings>,
        bus: Arc<PresaveBus>,
        store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            mode: Mode::View,
            settings,
            bus,
            store,
        }
    }

    /// Start correlating changes with `request`
    ///
    /// For view auditing, the request record is written here, before any
    /// handler code runs. A store failure is returned and nothing is connected.
    pub fn enter(&self, request: &InboundRequest) -> AuditResult<RequestScope> {
        let namespace = match self.mode {
            Mode::Middleware => self.settings.dispatch_uid(),
            Mode::View => format!("{}{}", self.settings.dispatch_uid(), VIEW_AUDIT_SUFFIX),
        };
        let key = DispatchKey::new(namespace, request.token());

        let record = match self.mode {
            Mode::View if self.settings.request_logging() => {
                let record = RequestRecord::from_request(request);
                self.store.insert_request(&record)?;
                tracing::debug!(id = %record.id, request = %record, "recorded request");
                Some(record)
            }
            _ => None,
        };

        let should_connect = match self.mode {
            Mode::Middleware => self.settings.change_logging(),
            Mode::View => true,
        };

        let mut connected = false;
        if should_connect {
            let context = ChangeContext {
                user_id: request.user.clone(),
                remote_addr: request.remote_addr().map(str::to_string),
                remote_host: request.remote_host().map(str::to_string),
                request_id: record.as_ref().map(|r| r.id),
            };
            let handler: PresaveHandler =
                Arc::new(move |_event: &PresaveEvent<'_>, meta: &mut AuditMeta| {
                    meta.update_context(&context);
                });
            connected = self.bus.connect(key.clone(), handler);
            if !connected {
                tracing::debug!(key = %key, "request already has a subscriber; reusing it");
            }
        }

        Ok(RequestScope {
            bus: Arc::clone(&self.bus),
            key,
            connected,
            record,
        })
    }

    /// Run `handler` inside a request scope
    ///
    /// The subscriber is disconnected whether the handler returns `Ok`, `Err`
    /// or panics.
    pub fn dispatch<F, R, E>(&self, request: &InboundRequest, handler: F) -> Result<R, E>
    where
        F: FnOnce(&InboundRequest, Option<&RequestRecord>) -> Result<R, E>,
        E: From<AuditError>,
    {
        let scope = self.enter(request)?;
        handler(request, scope.record())
    }
}

/// Active correlation for one request; disconnects its subscriber on drop
#[must_use = "the request subscriber is disconnected when the scope is dropped"]
pub struct RequestScope {
    bus: Arc<PresaveBus>,
    key: DispatchKey,
    /// Whether this scope connected the subscriber and so must remove it
    connected: bool,
    record: Option<RequestRecord>,
}

impl fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestScope")
            .field("key", &self.key)
            .field("connected", &self.connected)
            .field("record", &self.record.as_ref().map(|r| r.id))
            .finish()
    }
}

impl RequestScope {
    /// The request record written on entry, if request logging was on
    pub fn record(&self) -> Option<&RequestRecord> {
        self.record.as_ref()
    }

    pub fn key(&self) -> &DispatchKey {
        &self.key
    }

    /// End the scope explicitly
    pub fn finish(self) {}
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        // Runs even if logging was turned off after the subscriber connected
        if self.connected {
            self.bus.disconnect(&self.key);
        }
    }
}
