//! Per-field presentation classification
//!
//! Inspects each (key, value) pair of an entity and assigns it an
//! actionable category: an explorable navigation link, the entity's own
//! self link, a nested structure, or a plain primitive. Classification is
//! pure and total over any JSON value; it is recomputed at presentation
//! time and never stored.

use serde_json::Value;

/// Reserved suffix marking a field as a link to a related resource
pub const NAV_LINK_SUFFIX: &str = "@iot.navigationLink";
/// Reserved key holding the entity's own canonical URL
pub const SELF_LINK_KEY: &str = "@iot.selfLink";
/// Reserved key holding the entity's identifier
pub const ID_KEY: &str = "@iot.id";

/// Placeholder shown for null values
const NULL_PLACEHOLDER: &str = "\u{2014}";

/// Presentation category of one entity field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A link to a related resource or collection
    Navigation { label: String, target: String },
    /// The entity's own canonical URL
    SelfLink { target: String },
    /// Object or array, rendered as a structured dump
    Nested,
    /// Scalar or null
    Primitive,
}

/// Classify one (key, value) pair.
///
/// Decision order matters: a string-valued navigation-link key wins over
/// everything, then the self-link key, then structural nesting.
pub fn classify(key: &str, value: &Value) -> FieldKind {
    if let Some(stem) = key.strip_suffix(NAV_LINK_SUFFIX) {
        if let Some(target) = value.as_str() {
            return FieldKind::Navigation {
                label: navigation_label(stem),
                target: target.to_string(),
            };
        }
    }

    if key == SELF_LINK_KEY {
        if let Some(target) = value.as_str() {
            return FieldKind::SelfLink {
                target: target.to_string(),
            };
        }
    }

    if value.is_object() || value.is_array() {
        return FieldKind::Nested;
    }

    FieldKind::Primitive
}

/// Derive a display label from a navigation-link key stem.
///
/// Inserts a space between a lowercase/digit and an uppercase run, turns
/// underscores into spaces, and falls back to "Related" when nothing
/// readable remains.
fn navigation_label(stem: &str) -> String {
    let mut label = String::with_capacity(stem.len() + 4);
    let mut prev: Option<char> = None;

    for ch in stem.chars() {
        if ch == '_' {
            label.push(' ');
            prev = Some(' ');
            continue;
        }
        if ch.is_uppercase() {
            if let Some(p) = prev {
                if p.is_lowercase() || p.is_ascii_digit() {
                    label.push(' ');
                }
            }
        }
        label.push(ch);
        prev = Some(ch);
    }

    let label = label.trim();
    if label.is_empty() {
        "Related".to_string()
    } else {
        label.to_string()
    }
}

/// Render a primitive value for display
pub fn format_primitive(value: &Value) -> String {
    match value {
        Value::Null => NULL_PLACEHOLDER.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pick a display title for an entity.
///
/// Prefers a non-blank `name`, then an id field rendered with its key
/// prefix, then a non-blank `description`, then the caller's fallback.
pub fn title_for(entity: &Value, fallback: &str) -> String {
    if let Some(name) = entity.get("name").and_then(Value::as_str) {
        if !name.trim().is_empty() {
            return name.to_string();
        }
    }

    for key in [ID_KEY, "id"] {
        match entity.get(key) {
            Some(Value::Number(n)) => return format!("{}: {}", key, n),
            Some(Value::String(s)) if !s.trim().is_empty() => return format!("{}: {}", key, s),
            _ => {}
        }
    }

    if let Some(description) = entity.get("description").and_then(Value::as_str) {
        if !description.trim().is_empty() {
            return description.to_string();
        }
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_navigation_link() {
        assert_eq!(
            classify("Datastreams@iot.navigationLink", &json!("Datastreams(1)")),
            FieldKind::Navigation {
                label: "Datastreams".to_string(),
                target: "Datastreams(1)".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_self_link() {
        assert_eq!(
            classify("@iot.selfLink", &json!("http://h/v1/Things(1)")),
            FieldKind::SelfLink {
                target: "http://h/v1/Things(1)".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_primitive_and_nested() {
        assert_eq!(classify("name", &json!("x")), FieldKind::Primitive);
        assert_eq!(classify("count", &json!(3)), FieldKind::Primitive);
        assert_eq!(classify("active", &json!(null)), FieldKind::Primitive);
        assert_eq!(classify("properties", &json!({})), FieldKind::Nested);
        assert_eq!(classify("tags", &json!([])), FieldKind::Nested);
    }

    #[test]
    fn test_non_string_link_values_fall_through() {
        // Link keys only count when the value is actually a string URL
        assert_eq!(
            classify("Datastreams@iot.navigationLink", &json!({"url": "x"})),
            FieldKind::Nested
        );
        assert_eq!(classify("@iot.selfLink", &json!(7)), FieldKind::Primitive);
    }

    #[test]
    fn test_navigation_label_derivation() {
        assert_eq!(navigation_label("Datastreams"), "Datastreams");
        assert_eq!(navigation_label("ObservedProperty"), "Observed Property");
        assert_eq!(navigation_label("Multi_Datastreams"), "Multi Datastreams");
        assert_eq!(navigation_label("Tasking2Capabilities"), "Tasking2 Capabilities");
        assert_eq!(navigation_label(""), "Related");
        assert_eq!(navigation_label("_"), "Related");
    }

    #[test]
    fn test_format_primitive() {
        assert_eq!(format_primitive(&json!(null)), "\u{2014}");
        assert_eq!(format_primitive(&json!(true)), "true");
        assert_eq!(format_primitive(&json!(false)), "false");
        assert_eq!(format_primitive(&json!("text")), "text");
        assert_eq!(format_primitive(&json!(3.5)), "3.5");
    }

    #[test]
    fn test_title_for_preference_order() {
        assert_eq!(
            title_for(&json!({"name": "Thing A", "@iot.id": 1}), "fb"),
            "Thing A"
        );
        assert_eq!(
            title_for(&json!({"name": "  ", "@iot.id": 1}), "fb"),
            "@iot.id: 1"
        );
        assert_eq!(title_for(&json!({"id": "abc"}), "fb"), "id: abc");
        assert_eq!(
            title_for(&json!({"description": "a sensor"}), "fb"),
            "a sensor"
        );
        assert_eq!(title_for(&json!({}), "fb"), "fb");
    }
}
