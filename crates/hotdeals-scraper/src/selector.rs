//! Resolve [`SelectorDescriptor`]s against a parsed document.
//!
//! Matching is a pure function of the element and the descriptor. Only
//! descendants of the starting element are considered, in document order.

use hotdeals_core::SelectorDescriptor;
use scraper::ElementRef;

/// `true` if `element` satisfies every part of `descriptor`.
///
/// Tag names compare ASCII case-insensitively. A class of `"a b"` requires
/// both tokens. An empty descriptor never matches.
#[must_use]
pub fn matches(element: ElementRef<'_>, descriptor: &SelectorDescriptor) -> bool {
    if descriptor.is_empty() {
        return false;
    }
    let el = element.value();

    if let Some(tag) = &descriptor.tag {
        if !el.name().eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(class) = &descriptor.class {
        let mut wanted = class.split_ascii_whitespace().peekable();
        if wanted.peek().is_none() || !wanted.all(|token| el.classes().any(|c| c == token)) {
            return false;
        }
    }
    if let Some(id) = &descriptor.id {
        if el.id() != Some(id.as_str()) {
            return false;
        }
    }
    descriptor
        .attrs
        .iter()
        .all(|(name, predicate)| predicate.matches(el.attr(name)))
}

/// First descendant of `node` matching `descriptor`.
#[must_use]
pub fn find<'a>(node: ElementRef<'a>, descriptor: &SelectorDescriptor) -> Option<ElementRef<'a>> {
    descendants(node).find(|el| matches(*el, descriptor))
}

/// Every descendant of `node` matching `descriptor`, in document order.
#[must_use]
pub fn find_all<'a>(node: ElementRef<'a>, descriptor: &SelectorDescriptor) -> Vec<ElementRef<'a>> {
    descendants(node)
        .filter(|el| matches(*el, descriptor))
        .collect()
}

fn descendants(node: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    node.descendants().skip(1).filter_map(ElementRef::wrap)
}
