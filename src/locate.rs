//! Candidate container locator.
//!
//! Given a parsed document and a set of structural hints, produce the
//! elements most plausibly representing one conversation turn each.
//! Four ranked passes run in priority order; each lower pass is tried
//! only while the previous one found fewer than two candidates (one
//! exchange needs at least two turns). The first pass reaching two
//! candidates wins and lower passes never run.
//!
//! Candidates borrow from the parsed document and live only within one
//! extraction call — nothing here is cached across calls, since the
//! underlying page may have changed between captures.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Minimum candidates for a pass to be accepted: a usable transcript
/// needs at least one exchange.
pub const MIN_CANDIDATES: usize = 2;

/// Which pass produced a candidate, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    /// Explicit role/testid-like marker matched verbatim.
    ExplicitMarker,
    /// Class- or role-bearing ancestor of a fine-grained content node.
    AncestorWalk,
    /// Generic container with plausible text and an avatar child.
    StructuralScan,
    /// Paragraph/code block in the plausible message-size band.
    TextBlock,
}

/// A document element hypothesized to represent exactly one turn.
/// Ephemeral — scoped to a single extraction call.
#[derive(Debug, Clone, Copy)]
pub struct CandidateContainer<'a> {
    pub element: ElementRef<'a>,
    pub confidence: Confidence,
}

/// Structural hints steering one locator run. Platform strategies fill
/// these in; the defaults describe a generic chat page.
#[derive(Debug, Clone)]
pub struct ScanHints {
    /// Selector for explicit turn markers (pass 1). `None` skips pass 1.
    pub marker_selector: Option<String>,
    /// Fine-grained content nodes to ancestor-walk from (pass 2).
    pub content_node_selector: String,
    /// How many ancestor levels to climb in pass 2 (empirically 3-4).
    pub ancestor_walk_depth: usize,
    /// Broad container selector for pass 3.
    pub container_selector: String,
    /// Text-length band a turn is expected to fall in. Too short is a
    /// UI label, too long is an entire page dump.
    pub min_text_len: usize,
    pub max_text_len: usize,
    /// Pass 3 keeps only containers with an image/vector-icon child —
    /// an avatar is a strong turn signal that layout chrome lacks.
    pub require_avatar: bool,
}

impl Default for ScanHints {
    fn default() -> Self {
        Self {
            marker_selector: None,
            content_node_selector: "pre, .markdown, .prose".to_string(),
            ancestor_walk_depth: 4,
            container_selector: "div, li, article, section".to_string(),
            min_text_len: 20,
            max_text_len: 20_000,
            require_avatar: true,
        }
    }
}

/// Run the ranked passes and return the first acceptable candidate set.
/// May return fewer than [`MIN_CANDIDATES`] (even zero) when every pass
/// under-produces — the caller decides what that means.
pub fn locate_candidates<'a>(document: &'a Html, hints: &ScanHints) -> Vec<CandidateContainer<'a>> {
    if let Some(marker) = &hints.marker_selector {
        let found = marker_scan(document, marker);
        if found.len() >= MIN_CANDIDATES {
            return found;
        }
    }

    let found = ancestor_walk(document, hints);
    if found.len() >= MIN_CANDIDATES {
        return found;
    }

    let found = structural_scan(document, hints);
    if found.len() >= MIN_CANDIDATES {
        return found;
    }

    text_block_scan(document, hints)
}

/// Pass 1: exact semantic markers, used verbatim.
fn marker_scan<'a>(document: &'a Html, marker: &str) -> Vec<CandidateContainer<'a>> {
    let Ok(selector) = Selector::parse(marker) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|element| CandidateContainer {
            element,
            confidence: Confidence::ExplicitMarker,
        })
        .collect()
}

/// Pass 2: walk up from fine-grained content nodes (code blocks,
/// markdown bodies) to the first ancestor that looks like a turn
/// boundary: carries a class or explicit role and holds non-trivial
/// text. Distinct content nodes inside the same turn collapse to one
/// candidate.
fn ancestor_walk<'a>(document: &'a Html, hints: &ScanHints) -> Vec<CandidateContainer<'a>> {
    let Ok(selector) = Selector::parse(&hints.content_node_selector) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for content_node in document.select(&selector) {
        let Some(boundary) = turn_boundary(content_node, hints) else {
            continue;
        };
        if seen.insert(boundary.id()) {
            out.push(CandidateContainer {
                element: boundary,
                confidence: Confidence::AncestorWalk,
            });
        }
    }

    out
}

/// Find the turn boundary for one content node: the nearest ancestor
/// within the walk depth that carries a class or role attribute and
/// holds enough text.
fn turn_boundary<'a>(content_node: ElementRef<'a>, hints: &ScanHints) -> Option<ElementRef<'a>> {
    for node in content_node.ancestors().take(hints.ancestor_walk_depth) {
        let Some(ancestor) = ElementRef::wrap(node) else {
            continue;
        };
        let value = ancestor.value();
        let labelled = value.attr("class").map(|c| !c.trim().is_empty()).unwrap_or(false)
            || value.attr("role").is_some();
        if labelled && text_len(ancestor) >= hints.min_text_len {
            return Some(ancestor);
        }
    }
    None
}

/// Pass 3: broad structural scan filtered by text-length band,
/// visibility, and avatar presence. Nested hits collapse to the
/// outermost matching container.
fn structural_scan<'a>(document: &'a Html, hints: &ScanHints) -> Vec<CandidateContainer<'a>> {
    let Ok(selector) = Selector::parse(&hints.container_selector) else {
        return Vec::new();
    };
    let avatar = Selector::parse("img, svg").expect("static selector");

    let mut out: Vec<CandidateContainer<'a>> = Vec::new();

    for element in document.select(&selector) {
        if !looks_visible(element) {
            continue;
        }
        let len = text_len(element);
        if len < hints.min_text_len || len > hints.max_text_len {
            continue;
        }
        if hints.require_avatar && element.select(&avatar).next().is_none() {
            continue;
        }
        if is_nested_in(&out, element) {
            continue;
        }
        out.push(CandidateContainer {
            element,
            confidence: Confidence::StructuralScan,
        });
    }

    out
}

/// Pass 4: last resort — any paragraph-like or code-like element whose
/// text falls in the plausible message-size band.
fn text_block_scan<'a>(document: &'a Html, hints: &ScanHints) -> Vec<CandidateContainer<'a>> {
    let selector = Selector::parse("p, pre, blockquote, li").expect("static selector");

    let mut out: Vec<CandidateContainer<'a>> = Vec::new();

    for element in document.select(&selector) {
        let len = text_len(element);
        if len < hints.min_text_len || len > hints.max_text_len {
            continue;
        }
        if is_nested_in(&out, element) {
            continue;
        }
        out.push(CandidateContainer {
            element,
            confidence: Confidence::TextBlock,
        });
    }

    out
}

/// Length of the element's text content with whitespace runs collapsed.
fn text_len(element: ElementRef) -> usize {
    element
        .text()
        .flat_map(|fragment| fragment.split_whitespace())
        .map(|word| word.chars().count() + 1)
        .sum::<usize>()
        .saturating_sub(1)
}

/// A static document has no layout, so rendered-geometry hints reduce
/// to rejecting elements inline-styled as invisible or zero-height.
fn looks_visible(element: ElementRef) -> bool {
    let Some(style) = element.value().attr("style") else {
        return true;
    };
    let compact: String = style.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    !(compact.contains("display:none")
        || compact.contains("visibility:hidden")
        || compact.contains("height:0"))
}

/// True if `element` sits inside an already-accepted candidate.
fn is_nested_in(accepted: &[CandidateContainer], element: ElementRef) -> bool {
    element
        .ancestors()
        .any(|node| accepted.iter().any(|c| c.element.id() == node.id()))
}
