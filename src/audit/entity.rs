//! Collaborator traits for tracked entities

use serde::Serialize;
use serde_json::Value;

use crate::error::{AuditError, AuditResult};
use crate::models::{EntityType, FieldMap};

/// An entity type that can be change-tracked
pub trait Auditable: Serialize {
    /// Stable identifier recorded as `entity_type`, e.g. `"shop.order"`
    const ENTITY_TYPE: &'static str;

    /// Assigned identity, or `None` before the first save
    fn primary_key(&self) -> Option<String>;

    /// Current field values
    ///
    /// Defaults to the entity's serde representation, which must be an object.
    fn field_values(&self) -> AuditResult<FieldMap> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(AuditError::Validation(format!(
                "{} must serialize to an object, got {}",
                Self::ENTITY_TYPE,
                other
            ))),
        }
    }

    fn entity_type() -> EntityType {
        EntityType::from(Self::ENTITY_TYPE)
    }
}

/// Reads the currently persisted row for a primary key
pub trait PersistedLookup<T> {
    fn load_persisted(&self, pk: &str) -> AuditResult<Option<T>>;
}

/// Field values of `entity` without the excluded fields
pub fn field_map<T: Auditable>(entity: &T, exclude: &[String]) -> AuditResult<FieldMap> {
    let mut fields = entity.field_values()?;
    for name in exclude {
        fields.remove(name);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Widget {
        id: u32,
        name: String,
        secret: String,
    }

    impl Auditable for Widget {
        const ENTITY_TYPE: &'static str = "shop.widget";

        fn primary_key(&self) -> Option<String> {
            Some(self.id.to_string())
        }
    }

    #[derive(Serialize)]
    struct Scalar(u32);

    impl Auditable for Scalar {
        const ENTITY_TYPE: &'static str = "shop.scalar";

        fn primary_key(&self) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_field_values_from_serde() {
        let widget = Widget {
            id: 3,
            name: "bolt".into(),
            secret: "s".into(),
        };
        let fields = widget.field_values().unwrap();
        assert_eq!(fields["id"], json!(3));
        assert_eq!(fields["name"], json!("bolt"));
        assert_eq!(Widget::entity_type().as_str(), "shop.widget");
    }

    #[test]
    fn test_field_map_excludes() {
        let widget = Widget {
            id: 3,
            name: "bolt".into(),
            secret: "s".into(),
        };
        let fields = field_map(&widget, &["secret".to_string()]).unwrap();
        assert!(!fields.contains_key("secret"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = Scalar(1).field_values().unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));
    }
}
