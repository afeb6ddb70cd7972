//! Conversation extraction engine.
//!
//! One-shot, synchronous pipeline: detect the platform from the page
//! URL, run that platform's strategy chain against the parsed document,
//! sanitize and classify what the chain yields, and wrap the result in
//! a [`ConversationRecord`] — or a typed failure. Nothing here panics
//! across the boundary and nothing survives between calls.
//!
//! The chain is a small state machine: steps are evaluated in order,
//! the first step producing at least two non-empty messages terminates
//! it, and exhaustion is the only failure terminal. No backtracking,
//! no retries.

use crate::locate::{locate_candidates, CandidateContainer};
use crate::models::{ConversationRecord, Message};
use crate::platform::{detect_platform, host_of, PlatformId};
use crate::role::classify_role;
use crate::sanitize::sanitize_content;
use crate::strategy::{strategy_for, ExtractionStep};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use thiserror::Error;

/// A step succeeds only when it yields a verifiable two-party exchange;
/// a singleton could be any stray text block.
const MIN_MESSAGES: usize = 2;

/// Pages shorter than this never raise the partial-extraction flag.
const PARTIAL_MIN_PAGE_LEN: usize = 2000;

/// How many container samples a failure snapshot carries.
const DIAGNOSTIC_SAMPLE_LIMIT: usize = 5;

/// Terminal extraction failures. `PartialExtractionWarning` from the
/// design is not here on purpose — it is the `partial` flag on success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// Host not in the known platform table. Legitimate terminal
    /// outcome, not retried.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),
    /// Every heuristic level of every step located zero candidates.
    #[error("no conversation containers found on page")]
    NoContainerFound,
    /// Candidates were found but fewer than two survived sanitization
    /// and classification.
    #[error("could not extract a usable conversation from page")]
    EmptyExtraction,
}

/// Failure-path snapshot for offline troubleshooting. Advisory only —
/// never consumed programmatically and never produced on success.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub url: String,
    pub title: String,
    pub sample_containers: Vec<ContainerSample>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSample {
    pub class_name: String,
    pub child_count: usize,
    pub text_length: usize,
    pub first_words: String,
}

/// Result of one extraction invocation.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    Success {
        record: ConversationRecord,
        /// Advisory: extraction succeeded but recovered conspicuously
        /// little of the page's visible text.
        partial: bool,
    },
    Failure {
        error: ExtractionError,
        diagnostics: Diagnostics,
    },
}

/// Wire shape consumed by the popup/controller layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_data: Option<ConversationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    pub fn into_response(self) -> ExtractionResponse {
        match self {
            ExtractionOutcome::Success { record, .. } => ExtractionResponse {
                success: true,
                conversation_data: Some(record),
                error: None,
            },
            ExtractionOutcome::Failure { error, .. } => ExtractionResponse {
                success: false,
                conversation_data: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Extract the conversation from a saved chat page.
///
/// `html` is the serialized document, `page_url` the address it was
/// captured from (used only for platform detection and diagnostics).
/// Re-invoking with unchanged input yields an identical outcome — no
/// state is kept between calls.
pub fn extract_conversation(html: &str, page_url: &str) -> ExtractionOutcome {
    let Some(platform) = detect_platform(page_url) else {
        // Fail fast: no document scan for hosts we do not know.
        return ExtractionOutcome::Failure {
            error: ExtractionError::UnsupportedPlatform(host_of(page_url)),
            diagnostics: Diagnostics {
                url: page_url.to_string(),
                ..Default::default()
            },
        };
    };

    let document = Html::parse_document(html);

    match run_chain(&document, platform) {
        Ok(messages) => {
            let partial = is_partial(&document, &messages);
            ExtractionOutcome::Success {
                record: ConversationRecord::new(platform.name(), messages),
                partial,
            }
        }
        Err(error) => ExtractionOutcome::Failure {
            error,
            diagnostics: collect_diagnostics(&document, page_url),
        },
    }
}

/// Evaluate the platform's steps in order until one yields an
/// acceptable transcript.
fn run_chain(document: &Html, platform: PlatformId) -> Result<Vec<Message>, ExtractionError> {
    let mut located_any = false;

    for step in strategy_for(platform) {
        let candidates = locate_candidates(document, &step.hints);
        if candidates.is_empty() {
            continue;
        }
        located_any = true;

        let messages = extract_messages(&candidates, &step);
        if messages.len() >= MIN_MESSAGES {
            return Ok(messages);
        }
    }

    if located_any {
        Err(ExtractionError::EmptyExtraction)
    } else {
        Err(ExtractionError::NoContainerFound)
    }
}

/// Classify, sanitize, and drop empties, preserving document order.
/// Classification sees the candidate's position in the accepted
/// sequence, before empties are dropped.
fn extract_messages(candidates: &[CandidateContainer], step: &ExtractionStep) -> Vec<Message> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let role = classify_role(candidate, index, &step.role_rule);
            let content = sanitize_content(&candidate_text(candidate, step.content_selector));
            if content.is_empty() {
                None
            } else {
                Some(Message { role, content })
            }
        })
        .collect()
}

/// Raw text of a candidate: the step's content node when present,
/// otherwise the whole container. Fragments join on newlines so the
/// sanitizer can drop chrome lines individually.
fn candidate_text(candidate: &CandidateContainer, content_selector: Option<&str>) -> String {
    let element = content_selector
        .and_then(|s| Selector::parse(s).ok())
        .and_then(|selector| candidate.element.select(&selector).next())
        .unwrap_or(candidate.element);
    element_text(element)
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Low recovered-content ratio against a text-heavy page suggests the
/// heuristics only caught a corner of the conversation.
fn is_partial(document: &Html, messages: &[Message]) -> bool {
    let page_len = body_text_len(document);
    if page_len < PARTIAL_MIN_PAGE_LEN {
        return false;
    }
    let content_len: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    content_len * 10 < page_len
}

fn body_text_len(document: &Html) -> usize {
    let selector = Selector::parse("body").expect("static selector");
    document
        .select(&selector)
        .next()
        .map(|body| {
            body.text()
                .flat_map(|fragment| fragment.split_whitespace())
                .map(|word| word.chars().count() + 1)
                .sum::<usize>()
                .saturating_sub(1)
        })
        .unwrap_or(0)
}

/// Snapshot the page's container landscape for offline troubleshooting.
fn collect_diagnostics(document: &Html, page_url: &str) -> Diagnostics {
    let title_selector = Selector::parse("title").expect("static selector");
    let div_selector = Selector::parse("div").expect("static selector");

    let title = document
        .select(&title_selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let sample_containers = document
        .select(&div_selector)
        .filter_map(|element| {
            let text = element_text(element);
            if text.is_empty() {
                return None;
            }
            Some(ContainerSample {
                class_name: element.value().attr("class").unwrap_or_default().to_string(),
                child_count: element
                    .children()
                    .filter(|child| child.value().is_element())
                    .count(),
                text_length: text.chars().count(),
                first_words: text.split_whitespace().take(8).collect::<Vec<_>>().join(" "),
            })
        })
        .take(DIAGNOSTIC_SAMPLE_LIMIT)
        .collect();

    Diagnostics {
        url: page_url.to_string(),
        title,
        sample_containers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    const CHATGPT_URL: &str = "https://chatgpt.com/c/abc123";

    fn page(body: &str) -> String {
        format!(
            "<html><head><title>Chat</title></head><body>{}</body></html>",
            body
        )
    }

    #[test]
    fn test_explicit_role_markers_yield_exact_record() {
        let html = page(
            r#"<div role="user">Hello</div>
               <div role="assistant">Hi there</div>"#,
        );
        match extract_conversation(&html, CHATGPT_URL) {
            ExtractionOutcome::Success { record, partial } => {
                assert_eq!(record.platform, "ChatGPT");
                assert!(!partial);
                assert_eq!(
                    record.messages,
                    vec![
                        Message {
                            role: Role::User,
                            content: "Hello".to_string()
                        },
                        Message {
                            role: Role::Assistant,
                            content: "Hi there".to_string()
                        },
                    ]
                );
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_ordering_preserved() {
        let turns: String = (0..6)
            .map(|i| {
                let class = if i % 2 == 0 { "chat-message user-message" } else { "chat-message" };
                format!(
                    r#"<div class="{}"><div class="message-content">Turn number {} of the conversation.</div></div>"#,
                    class, i
                )
            })
            .collect();
        let html = page(&format!(r#"<div class="chat-content">{}</div>"#, turns));

        match extract_conversation(&html, "https://chat.deepseek.com/s/1") {
            ExtractionOutcome::Success { record, .. } => {
                assert_eq!(record.platform, "DeepSeek");
                assert_eq!(record.messages.len(), 6);
                for (i, message) in record.messages.iter().enumerate() {
                    assert!(message.content.contains(&format!("Turn number {}", i)));
                    let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
                    assert_eq!(message.role, expected, "turn {}", i);
                }
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_content_selector_excludes_sibling_chrome() {
        let html = page(
            r#"<div class="chat-content">
                 <div class="chat-message user-message">
                   <div class="message-content">How do I reverse a list in Python?</div>
                   <div class="actions">复制</div>
                 </div>
                 <div class="chat-message">
                   <div class="message-content">Use list.reverse() or slicing.</div>
                   <div class="actions">复制</div>
                 </div>
               </div>"#,
        );
        match extract_conversation(&html, "https://chat.deepseek.com/s/2") {
            ExtractionOutcome::Success { record, .. } => {
                assert_eq!(record.messages[0].content, "How do I reverse a list in Python?");
                assert_eq!(record.messages[1].content, "Use list.reverse() or slicing.");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_chrome_only_page_is_empty_extraction() {
        // Two chrome strings and one genuine message: only one message
        // survives sanitization, below the two-message minimum.
        let html = page(
            r#"<div role="user">copy</div>
               <div role="assistant">regenerate</div>
               <div role="user">Could you explain how async executors work?</div>"#,
        );
        match extract_conversation(&html, CHATGPT_URL) {
            ExtractionOutcome::Failure { error, diagnostics } => {
                assert_eq!(error, ExtractionError::EmptyExtraction);
                assert_eq!(diagnostics.url, CHATGPT_URL);
                assert_eq!(diagnostics.title, "Chat");
                assert!(!diagnostics.sample_containers.is_empty());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_chain_progression() {
        // No explicit markers anywhere: the marker pass finds nothing
        // and the ancestor walk from the code blocks recovers the turns.
        let html = page(
            r#"<div class="group">Here is my broken function, please take a look:
                 <pre>fn broken() { let x: i32 = "five"; }</pre></div>
               <div class="group">The type annotation does not match the value:
                 <pre>fn fixed() { let x: &str = "five"; }</pre></div>"#,
        );
        match extract_conversation(&html, CHATGPT_URL) {
            ExtractionOutcome::Success { record, .. } => {
                assert_eq!(record.messages.len(), 2);
                // no markers at all -> positional alternation
                assert_eq!(record.messages[0].role, Role::User);
                assert_eq!(record.messages[1].role, Role::Assistant);
                assert!(record.messages[0].content.contains("broken function"));
                assert!(record.messages[1].content.contains("type annotation"));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_host_fails_fast() {
        let html = page(r#"<div role="user">Hello</div><div role="assistant">Hi</div>"#);
        match extract_conversation(&html, "https://example.com/chat") {
            ExtractionOutcome::Failure { error, diagnostics } => {
                assert_eq!(
                    error,
                    ExtractionError::UnsupportedPlatform("example.com".to_string())
                );
                // fail-fast path never scanned the document
                assert!(diagnostics.sample_containers.is_empty());
                assert!(diagnostics.title.is_empty());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_no_container_found() {
        let html = page("<div>hi</div>");
        match extract_conversation(&html, CHATGPT_URL) {
            ExtractionOutcome::Failure { error, .. } => {
                assert_eq!(error, ExtractionError::NoContainerFound);
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_flag_on_text_heavy_page() {
        let filler = "lorem ipsum dolor sit amet consectetur adipiscing elit ".repeat(60);
        let html = page(&format!(
            r#"<div data-message-author-role="user">Short question?</div>
               <div data-message-author-role="assistant">Short answer.</div>
               <div class="sidebar">{}</div>"#,
            filler
        ));
        match extract_conversation(&html, CHATGPT_URL) {
            ExtractionOutcome::Success { record, partial } => {
                assert_eq!(record.messages.len(), 2);
                assert!(partial, "tiny transcript on a text-heavy page should warn");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_extraction_is_identical() {
        let html = page(
            r#"<div role="user">What is a trait object?</div>
               <div role="assistant">A dynamically dispatched trait value.</div>"#,
        );
        let first = extract_conversation(&html, CHATGPT_URL);
        let second = extract_conversation(&html, CHATGPT_URL);
        match (first, second) {
            (
                ExtractionOutcome::Success { record: a, partial: pa },
                ExtractionOutcome::Success { record: b, partial: pb },
            ) => {
                assert_eq!(a.messages, b.messages);
                assert_eq!(a.platform, b.platform);
                assert_eq!(pa, pb);
            }
            other => panic!("expected two successes, got {:?}", other),
        }
    }

    #[test]
    fn test_response_wire_shape() {
        let html = page(r#"<div role="user">Hello</div><div role="assistant">Hi there</div>"#);

        let ok = extract_conversation(&html, CHATGPT_URL).into_response();
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["conversationData"]["messages"][0]["content"], "Hello");
        assert!(json.get("error").is_none());

        let err = extract_conversation(&html, "https://example.com/").into_response();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("conversationData").is_none());
        assert!(json["error"].as_str().unwrap().contains("unsupported platform"));
    }
}
