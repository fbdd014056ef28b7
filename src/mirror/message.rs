//! mirror::message
//!
//! Commit-message derivation policies.
//!
//! # Design
//!
//! Two policies exist, selected at construction time behind the
//! [`MessagePolicy`] strategy trait:
//!
//! - [`GenericMessagePolicy`] emits a fixed label per classification and
//!   inspects nothing.
//! - [`RichMessagePolicy`] reads the saved content (a small JSON record)
//!   and the canonical path to name the actor, the entity, and its type.
//!   Any derivation failure degrades to the generic message; message
//!   derivation can never fail a save.

use std::sync::Arc;

use crate::core::config::MessagePolicyKind;
use crate::core::paths;
use crate::core::types::ChangeKind;

/// Everything a policy may consult when composing a message.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// Add-vs-edit classification of the save.
    pub kind: ChangeKind,
    /// Canonical repository-relative path of the saved file.
    pub canonical_path: &'a str,
    /// The bytes that were saved.
    pub content: &'a [u8],
    /// Display name of the acting principal, if known.
    pub actor: Option<&'a str>,
}

/// Strategy for deriving a commit message from a save.
///
/// Implementations must be `Send + Sync`; one policy instance is shared
/// across concurrent saves.
pub trait MessagePolicy: Send + Sync {
    /// Compose the commit message. Never fails; policies degrade instead.
    fn compose(&self, ctx: &MessageContext<'_>) -> String;
}

/// Build the policy a configuration selects.
pub fn for_kind(kind: MessagePolicyKind) -> Arc<dyn MessagePolicy> {
    match kind {
        MessagePolicyKind::Generic => Arc::new(GenericMessagePolicy),
        MessagePolicyKind::Rich => Arc::new(RichMessagePolicy),
    }
}

/// Fixed messages with no content or actor context.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericMessagePolicy;

impl MessagePolicy for GenericMessagePolicy {
    fn compose(&self, ctx: &MessageContext<'_>) -> String {
        match ctx.kind {
            ChangeKind::Add => "Added from backoffice".to_string(),
            ChangeKind::Edit => "Changed from backoffice".to_string(),
        }
    }
}

/// Content-aware messages of the form
/// `{actor} {added|modified} {entityType} "{entityName}"`.
///
/// The entity name comes from the saved record's `name` field, falling
/// back to `id`; the entity type from the canonical path's parent
/// directory, lower-cased with a trailing plural `s` stripped
/// (`/Forms/x.json` saves a `form`). An unknown actor renders as
/// `Unknown user`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichMessagePolicy;

impl RichMessagePolicy {
    fn derive(ctx: &MessageContext<'_>) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(ctx.content).ok()?;
        let record = value.as_object()?;

        let entity_name = record
            .get("name")
            .filter(|v| !v.is_null())
            .or_else(|| record.get("id").filter(|v| !v.is_null()))
            .and_then(display_value)?;

        let directory = paths::parent_directory_name(ctx.canonical_path)?;
        let lowered = directory.to_lowercase();
        let entity_type = lowered.strip_suffix('s').unwrap_or(&lowered);

        let actor = ctx.actor.unwrap_or("Unknown user");
        let verb = match ctx.kind {
            ChangeKind::Add => "added",
            ChangeKind::Edit => "modified",
        };

        Some(format!("{actor} {verb} {entity_type} \"{entity_name}\""))
    }
}

impl MessagePolicy for RichMessagePolicy {
    fn compose(&self, ctx: &MessageContext<'_>) -> String {
        Self::derive(ctx).unwrap_or_else(|| GenericMessagePolicy.compose(ctx))
    }
}

/// Render a JSON value the way it should read inside the message.
fn display_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM_PATH: &str = "/App_Data/UmbracoForms/Data/Forms/b79a3cc8.json";

    fn ctx<'a>(
        kind: ChangeKind,
        path: &'a str,
        content: &'a [u8],
        actor: Option<&'a str>,
    ) -> MessageContext<'a> {
        MessageContext {
            kind,
            canonical_path: path,
            content,
            actor,
        }
    }

    #[test]
    fn rich_names_actor_entity_and_type() {
        let content = br#"{"id":"7b9487c3-7a66-4187-a049-e0213389e0a3", "name":"Fancy form"}"#;
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Add,
            FORM_PATH,
            content,
            Some("User X"),
        ));
        assert_eq!(message, "User X added form \"Fancy form\"");
    }

    #[test]
    fn rich_uses_modified_for_edits() {
        let content = br#"{"name":"Fancy form"}"#;
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Edit,
            FORM_PATH,
            content,
            Some("User X"),
        ));
        assert_eq!(message, "User X modified form \"Fancy form\"");
    }

    #[test]
    fn rich_falls_back_to_id_when_name_missing() {
        let content = br#"{"id":"7b9487c3-7a66-4187-a049-e0213389e0a3"}"#;
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Edit,
            "/App_Data/UmbracoForms/Data/Workflows/x.json",
            content,
            Some("User X"),
        ));
        assert_eq!(
            message,
            "User X modified workflow \"7b9487c3-7a66-4187-a049-e0213389e0a3\""
        );
    }

    #[test]
    fn rich_reports_unknown_user() {
        let content = br#"{"name":"Fancy form"}"#;
        let message = RichMessagePolicy.compose(&ctx(ChangeKind::Add, FORM_PATH, content, None));
        assert_eq!(message, "Unknown user added form \"Fancy form\"");
    }

    #[test]
    fn rich_degrades_on_malformed_content() {
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Add,
            FORM_PATH,
            b"<not json>",
            Some("User X"),
        ));
        assert_eq!(message, "Added from backoffice");
    }

    #[test]
    fn rich_degrades_when_no_name_or_id() {
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Edit,
            FORM_PATH,
            br#"{"other":"field"}"#,
            Some("User X"),
        ));
        assert_eq!(message, "Changed from backoffice");
    }

    #[test]
    fn rich_degrades_without_parent_directory() {
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Add,
            "/a.json",
            br#"{"name":"x"}"#,
            Some("User X"),
        ));
        assert_eq!(message, "Added from backoffice");
    }

    #[test]
    fn rich_strips_one_trailing_plural() {
        let content = br#"{"name":"Entry"}"#;
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Add,
            "/data/Statuses/x.json",
            content,
            Some("User X"),
        ));
        // Only the final 's' is stripped.
        assert_eq!(message, "User X added statuse \"Entry\"");
    }

    #[test]
    fn rich_renders_numeric_ids() {
        let message = RichMessagePolicy.compose(&ctx(
            ChangeKind::Add,
            FORM_PATH,
            br#"{"id":42}"#,
            Some("User X"),
        ));
        assert_eq!(message, "User X added form \"42\"");
    }

    #[test]
    fn generic_literals() {
        let content = b"ignored";
        assert_eq!(
            GenericMessagePolicy.compose(&ctx(ChangeKind::Add, FORM_PATH, content, None)),
            "Added from backoffice"
        );
        assert_eq!(
            GenericMessagePolicy.compose(&ctx(ChangeKind::Edit, FORM_PATH, content, None)),
            "Changed from backoffice"
        );
    }

    #[test]
    fn for_kind_selects_policy() {
        let content = br#"{"name":"x"}"#;
        let rich = for_kind(MessagePolicyKind::Rich);
        let generic = for_kind(MessagePolicyKind::Generic);

        assert_eq!(
            rich.compose(&ctx(ChangeKind::Add, FORM_PATH, content, Some("U"))),
            "U added form \"x\""
        );
        assert_eq!(
            generic.compose(&ctx(ChangeKind::Add, FORM_PATH, content, Some("U"))),
            "Added from backoffice"
        );
    }
}
