//! Per-platform extraction strategies.
//!
//! A strategy is a named, ordered list of extraction steps tuned to one
//! platform's typical markup — purely declarative data. The chain in
//! `extract.rs` supplies all control flow, so platform knowledge stays
//! isolated here and a markup change on one platform means editing one
//! table, not the mechanism.
//!
//! The platform-specific selectors mirror what the supported chat UIs
//! actually render; every strategy ends in the shared generic steps so
//! a markup drift degrades to heuristics instead of failing outright.

use crate::locate::ScanHints;
use crate::platform::PlatformId;
use crate::role::RoleRule;

/// One extraction attempt: where to look and how to read authorship.
#[derive(Debug, Clone)]
pub struct ExtractionStep {
    /// Name used in failure diagnostics.
    pub name: &'static str,
    pub hints: ScanHints,
    /// Selector for the node holding the message body inside a
    /// candidate. `None` reads the candidate's whole text.
    pub content_selector: Option<&'static str>,
    pub role_rule: RoleRule,
}

/// Ordered steps for one platform, most specific first.
pub fn strategy_for(platform: PlatformId) -> Vec<ExtractionStep> {
    let mut steps = match platform {
        PlatformId::ChatGpt => vec![ExtractionStep {
            name: "chatgpt-author-role",
            hints: ScanHints {
                marker_selector: Some("[data-message-author-role]".to_string()),
                content_node_selector: ".markdown, .prose, pre".to_string(),
                ..Default::default()
            },
            content_selector: Some(r#"div[data-message-text-content="true"]"#),
            role_rule: RoleRule::Attribute("data-message-author-role"),
        }],
        PlatformId::DeepSeek => vec![ExtractionStep {
            name: "deepseek-chat-message",
            hints: ScanHints {
                marker_selector: Some(".chat-content .chat-message".to_string()),
                ..Default::default()
            },
            content_selector: Some(".message-content"),
            role_rule: RoleRule::UserClass("user-message"),
        }],
        PlatformId::Monica => vec![ExtractionStep {
            name: "monica-message-item",
            hints: ScanHints {
                marker_selector: Some(".conversation-container .message-item".to_string()),
                ..Default::default()
            },
            content_selector: Some(".message-text"),
            role_rule: RoleRule::UserClass("user-message"),
        }],
    };
    steps.push(generic_step());
    steps
}

/// Shared last-resort step: no marker selector, so the locator runs its
/// heuristic passes (ancestor walk, structural scan, text blocks), and
/// authorship comes from the generic signal list. The marker selector
/// still catches bare `role=`/`data-role=` annotations some pages keep.
fn generic_step() -> ExtractionStep {
    ExtractionStep {
        name: "generic-fallback",
        hints: ScanHints {
            marker_selector: Some(
                r#"[data-message-author-role], [data-role], [role="user"], [role="assistant"]"#
                    .to_string(),
            ),
            ..Default::default()
        },
        content_selector: None,
        role_rule: RoleRule::Auto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_platform_ends_with_generic_fallback() {
        for platform in [PlatformId::ChatGpt, PlatformId::DeepSeek, PlatformId::Monica] {
            let steps = strategy_for(platform);
            assert!(steps.len() >= 2, "{:?} needs a tuned step plus fallback", platform);
            assert_eq!(steps.last().unwrap().name, "generic-fallback");
        }
    }

    #[test]
    fn test_platform_steps_carry_marker_selectors() {
        for platform in [PlatformId::ChatGpt, PlatformId::DeepSeek, PlatformId::Monica] {
            let steps = strategy_for(platform);
            assert!(
                steps[0].hints.marker_selector.is_some(),
                "{:?} first step should target explicit markup",
                platform
            );
        }
    }

    #[test]
    fn test_chatgpt_reads_author_role_attribute() {
        let steps = strategy_for(PlatformId::ChatGpt);
        assert!(matches!(
            steps[0].role_rule,
            RoleRule::Attribute("data-message-author-role")
        ));
    }
}
