//! Transient per-write audit state

use crate::models::{FieldMap, RequestId, UserId};

/// Context merged into a change record
///
/// Contributed by request subscribers during the pre-write event. Later
/// contributions overwrite earlier ones field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeContext {
    pub user_id: Option<UserId>,
    pub remote_addr: Option<String>,
    pub remote_host: Option<String>,
    pub request_id: Option<RequestId>,
}

impl ChangeContext {
    pub fn merge(&mut self, other: &ChangeContext) {
        if other.user_id.is_some() {
            self.user_id = other.user_id.clone();
        }
        if other.remote_addr.is_some() {
            self.remote_addr = other.remote_addr.clone();
        }
        if other.remote_host.is_some() {
            self.remote_host = other.remote_host.clone();
        }
        if other.request_id.is_some() {
            self.request_id = other.request_id;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// State carried from a before-hook to the matching after-hook
///
/// Returned by `before_write`/`before_delete` and consumed by
/// `after_write`/`after_delete`, so a snapshot never outlives its write.
#[derive(Debug, Clone, Default)]
#[must_use = "pass the meta to the matching after-hook"]
pub struct AuditMeta {
    pub(crate) enabled: bool,
    pub(crate) pre_save: Option<FieldMap>,
    pub(crate) context: ChangeContext,
}

impl AuditMeta {
    pub(crate) fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// A meta for a write that should not be recorded
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot captured before the write, if any
    pub fn pre_save(&self) -> Option<&FieldMap> {
        self.pre_save.as_ref()
    }

    pub fn context(&self) -> &ChangeContext {
        &self.context
    }

    /// Merge request context; ignored when auditing is off for this write
    pub fn update_context(&mut self, updates: &ChangeContext) {
        if self.enabled {
            self.context.merge(updates);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_present_fields() {
        let mut context = ChangeContext {
            user_id: Some(UserId::new("alice")),
            remote_addr: Some("10.0.0.1".into()),
            ..ChangeContext::default()
        };
        context.merge(&ChangeContext {
            user_id: Some(UserId::new("bob")),
            ..ChangeContext::default()
        });

        assert_eq!(context.user_id, Some(UserId::new("bob")));
        assert_eq!(context.remote_addr.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_disabled_meta_ignores_updates() {
        let mut meta = AuditMeta::disabled();
        meta.update_context(&ChangeContext {
            remote_addr: Some("1.2.3.4".into()),
            ..ChangeContext::default()
        });
        assert!(meta.context().is_empty());

        let mut meta = AuditMeta::enabled();
        meta.update_context(&ChangeContext {
            remote_addr: Some("1.2.3.4".into()),
            ..ChangeContext::default()
        });
        assert_eq!(meta.context().remote_addr.as_deref(), Some("1.2.3.4"));
    }
}
