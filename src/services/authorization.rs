use serde_json::Value;
use sqlx::PgPool;

use crate::repositories::users_data::{self, AssistantFlags};

/// The closed set of delegable course capabilities. The course owner
/// always holds all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capability {
    ModulesAndResources,
    Exams,
    Tasks,
    Feedbacks,
}

pub(crate) const PERMISSION_KEYS: &[&str] =
    &["modules_and_resources", "exams", "tasks", "feedbacks"];

/// Overlays a permissions object onto an existing flag set. Keys the
/// object does not mention keep their current value. In strict mode an
/// unknown key is an error and nothing may be persisted; otherwise
/// unknown keys are dropped. The historical CamelCase spellings of the
/// keys are accepted alongside the snake_case ones.
pub(crate) fn overlay_flags(
    mut flags: AssistantFlags,
    permissions: &Value,
    strict: bool,
) -> Result<AssistantFlags, String> {
    let Some(object) = permissions.as_object() else {
        return Err("permissions must be an object".to_string());
    };

    for (key, value) in object {
        let enabled = value.as_bool().ok_or_else(|| format!("permission '{key}' must be a boolean"))?;
        match key.as_str() {
            "modules_and_resources" | "ModulesAndResources" => {
                flags.modules_and_resources = enabled
            }
            "exams" | "Exams" => flags.exams = enabled,
            "tasks" | "Tasks" => flags.tasks = enabled,
            "feedbacks" | "Feedbacks" => flags.feedbacks = enabled,
            unknown if strict => {
                return Err(format!(
                    "unknown permission '{unknown}', expected one of: {}",
                    PERMISSION_KEYS.join(", ")
                ));
            }
            _ => {}
        }
    }

    Ok(flags)
}

pub(crate) fn flags_allow(flags: &AssistantFlags, capability: Capability) -> bool {
    match capability {
        Capability::ModulesAndResources => flags.modules_and_resources,
        Capability::Exams => flags.exams,
        Capability::Tasks => flags.tasks,
        Capability::Feedbacks => flags.feedbacks,
    }
}

/// Owner-or-assistant check every mutating operation goes through.
pub(crate) async fn authorize(
    pool: &PgPool,
    course_id: &str,
    owner_id: &str,
    user_id: &str,
    capability: Capability,
) -> Result<bool, sqlx::Error> {
    if user_id == owner_id {
        return Ok(true);
    }

    let assistant = users_data::find_assistant(pool, course_id, user_id).await?;
    Ok(assistant
        .map(|row| flags_allow(&AssistantFlags::from_row(&row), capability))
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strict_mode_rejects_unknown_keys() {
        let permissions = json!({"tasks": true, "grades": true});
        let err = overlay_flags(AssistantFlags::default(), &permissions, true).unwrap_err();
        assert!(err.contains("grades"));
    }

    #[test]
    fn lenient_mode_drops_unknown_keys() {
        let permissions = json!({"tasks": true, "grades": true});
        let flags = overlay_flags(AssistantFlags::default(), &permissions, false).expect("flags");
        assert!(flags.tasks);
        assert!(!flags.exams);
        assert!(!flags.modules_and_resources);
        assert!(!flags.feedbacks);
    }

    #[test]
    fn overlay_keeps_flags_the_object_does_not_mention() {
        let base = AssistantFlags { exams: true, feedbacks: true, ..Default::default() };
        let flags = overlay_flags(base, &json!({"tasks": true}), true).expect("flags");
        assert!(flags.tasks);
        assert!(flags.exams);
        assert!(flags.feedbacks);
        assert!(!flags.modules_and_resources);
    }

    #[test]
    fn overlay_can_revoke_a_granted_flag() {
        let base = AssistantFlags { exams: true, tasks: true, ..Default::default() };
        let flags = overlay_flags(base, &json!({"exams": false}), true).expect("flags");
        assert!(!flags.exams);
        assert!(flags.tasks);
    }

    #[test]
    fn historical_camel_case_keys_are_accepted() {
        let permissions = json!({"ModulesAndResources": true, "Exams": true});
        let flags = overlay_flags(AssistantFlags::default(), &permissions, true).expect("flags");
        assert!(flags.modules_and_resources);
        assert!(flags.exams);
        assert!(!flags.tasks);
    }

    #[test]
    fn non_boolean_permission_is_rejected() {
        let permissions = json!({"tasks": "yes"});
        assert!(overlay_flags(AssistantFlags::default(), &permissions, false).is_err());
    }

    #[test]
    fn non_object_permissions_are_rejected() {
        assert!(overlay_flags(AssistantFlags::default(), &json!([1, 2]), true).is_err());
    }

    #[test]
    fn every_known_key_maps_to_a_capability() {
        for key in PERMISSION_KEYS {
            let permissions = json!({ *key: true });
            let flags =
                overlay_flags(AssistantFlags::default(), &permissions, true).expect("known key");
            let capability = match *key {
                "modules_and_resources" => Capability::ModulesAndResources,
                "exams" => Capability::Exams,
                "tasks" => Capability::Tasks,
                "feedbacks" => Capability::Feedbacks,
                other => panic!("unmapped key {other}"),
            };
            assert!(flags_allow(&flags, capability));
        }
    }
}
