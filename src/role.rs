//! Role classification from weak document signals.
//!
//! A candidate container rarely says outright who wrote it. The
//! classifier evaluates an explicit, prioritized rule list — strongest
//! signal first, each rule answering `Option<Role>` — and only falls
//! back to positional alternation when every stronger signal is absent.
//! Alternation assumes strict user/assistant turn-taking; consecutive
//! same-role turns will misclassify under it. Known limitation, kept
//! auditable here instead of hidden in extraction control flow.

use crate::locate::CandidateContainer;
use crate::models::Role;
use scraper::ElementRef;

/// Attributes that may carry an explicit role value.
const ROLE_ATTRIBUTES: &[&str] = &["data-message-author-role", "data-role", "role"];

/// How many ancestor levels the class/label signals inspect. Role
/// markers often sit on a wrapper a level or two above the text.
const SIGNAL_WALK_DEPTH: usize = 3;

/// Platform-specific role hint attached to an extraction step.
/// Consulted before the generic signal list.
#[derive(Debug, Clone)]
pub enum RoleRule {
    /// Read the role straight from a named attribute on the candidate.
    Attribute(&'static str),
    /// Candidates whose class list contains this token are user turns;
    /// everything else the step yields is an assistant turn.
    UserClass(&'static str),
    /// No platform-specific signal; rely on the generic priority list.
    Auto,
}

/// Classify one candidate given its position in the accepted sequence.
/// Never fails — the alternation fallback always produces an answer.
pub fn classify_role(candidate: &CandidateContainer, index: usize, rule: &RoleRule) -> Role {
    if let Some(role) = from_rule(candidate.element, rule) {
        return role;
    }

    from_role_attribute(candidate.element)
        .or_else(|| from_class_marker(candidate.element))
        .or_else(|| from_aria_label(candidate.element))
        .unwrap_or_else(|| alternation(index))
}

/// Apply the step's platform-specific rule, if any.
fn from_rule(element: ElementRef, rule: &RoleRule) -> Option<Role> {
    match rule {
        RoleRule::Attribute(name) => element.value().attr(name).and_then(parse_role_value),
        RoleRule::UserClass(token) => {
            if element.value().classes().any(|class| class == *token) {
                Some(Role::User)
            } else {
                Some(Role::Assistant)
            }
        }
        RoleRule::Auto => None,
    }
}

/// Signal (a): explicit role-bearing attribute on the element itself.
fn from_role_attribute(element: ElementRef) -> Option<Role> {
    ROLE_ATTRIBUTES
        .iter()
        .find_map(|name| element.value().attr(name).and_then(parse_role_value))
}

/// Signal (b): a class-name marker on the element or a near ancestor.
fn from_class_marker(element: ElementRef) -> Option<Role> {
    for el in self_and_ancestors(element) {
        for class in el.value().classes() {
            if let Some(role) = parse_class_token(class) {
                return Some(role);
            }
        }
    }
    None
}

/// Signal (c): an accessible label mentioning the author.
fn from_aria_label(element: ElementRef) -> Option<Role> {
    for el in self_and_ancestors(element) {
        if let Some(label) = el.value().attr("aria-label") {
            let lower = label.to_lowercase();
            if lower.contains("user") || lower.contains("you said") {
                return Some(Role::User);
            }
            if lower.contains("assistant") || lower.contains("bot") {
                return Some(Role::Assistant);
            }
        }
    }
    None
}

/// Signal (d): positional alternation. Even-indexed turns default to
/// the user — chats open with the human asking.
fn alternation(index: usize) -> Role {
    if index % 2 == 0 {
        Role::User
    } else {
        Role::Assistant
    }
}

fn parse_role_value(value: &str) -> Option<Role> {
    match value.trim().to_lowercase().as_str() {
        "user" | "human" => Some(Role::User),
        "assistant" | "bot" | "ai" | "model" => Some(Role::Assistant),
        _ => None,
    }
}

/// Interpret one class name. Checks hyphen/underscore-separated words
/// so `main` or `container` never reads as `ai`.
fn parse_class_token(class: &str) -> Option<Role> {
    let lower = class.to_lowercase();
    if lower.contains("user") || lower.contains("human") {
        return Some(Role::User);
    }
    if lower.contains("assistant") || lower.contains("bot") {
        return Some(Role::Assistant);
    }
    if lower.split(['-', '_']).any(|word| word == "ai") {
        return Some(Role::Assistant);
    }
    None
}

fn self_and_ancestors<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    std::iter::once(element).chain(
        element
            .ancestors()
            .take(SIGNAL_WALK_DEPTH)
            .filter_map(ElementRef::wrap),
    )
}
