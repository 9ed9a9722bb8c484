//! Selector resolution: locating product cards on a page and reading
//! per-card field values through an ordered fallback chain.
//!
//! Cards are found by, in order: the site's explicit list selector, the
//! profile named by the platform hint, then every registry profile in
//! priority order. Fields are resolved by trying the explicit selector,
//! the active profile's candidates and the generic fallbacks against the
//! card, and only then the explicit and profile candidates against the
//! whole page.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use shopwatch_core::FieldSelector;
use url::Url;

use crate::profiles::{FieldRole, ProfileRegistry, SelectorProfile};
use crate::text::normalize_whitespace;

/// Reported when the site's own list selector matched.
pub const EXPLICIT_PROFILE: &str = "explicit";
/// Reported when nothing matched at all.
pub const NO_PROFILE: &str = "none";

/// Outcome of [`resolve_cards`].
#[derive(Debug)]
pub struct CardMatch<'a, 'r> {
    pub cards: Vec<ElementRef<'a>>,
    /// `"explicit"`, a profile name, or `"none"`.
    pub matched_by: &'static str,
    /// Profile whose field candidates apply to these cards. For explicit
    /// matches this is the hinted profile, else `generic`.
    pub profile: Option<&'r SelectorProfile>,
}

impl CardMatch<'_, '_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Locates product-card elements on `page`.
///
/// An empty result (reported as `"none"`) is not an error; callers treat it
/// as a signal to keep the page HTML for selector debugging.
#[must_use]
pub fn resolve_cards<'a, 'r>(
    page: &'a Html,
    explicit: Option<&FieldSelector>,
    platform_hint: Option<&str>,
    registry: &'r ProfileRegistry,
) -> CardMatch<'a, 'r> {
    let hinted = platform_hint.and_then(|hint| {
        let profile = registry.get(hint);
        if profile.is_none() {
            tracing::debug!(hint, "platform hint does not name a known profile");
        }
        profile
    });

    if let Some(selector) = explicit {
        let cards = select_cards(page, selector);
        if !cards.is_empty() {
            return CardMatch {
                cards,
                matched_by: EXPLICIT_PROFILE,
                profile: hinted.or_else(|| registry.generic()),
            };
        }
        tracing::debug!(selector = %selector, "explicit list selector matched nothing; trying profiles");
    }

    let ordered = hinted
        .into_iter()
        .chain(registry.iter().filter(|p| !hinted.is_some_and(|h| h.name() == p.name())));

    for profile in ordered {
        if let Some(cards) = profile
            .list()
            .iter()
            .map(|selector| select_cards(page, selector))
            .find(|cards| !cards.is_empty())
        {
            return CardMatch {
                cards,
                matched_by: profile.name(),
                profile: Some(profile),
            };
        }
    }

    CardMatch {
        cards: Vec::new(),
        matched_by: NO_PROFILE,
        profile: None,
    }
}

/// Selects card elements, dropping any match nested inside another match.
fn select_cards<'a>(page: &'a Html, selector: &FieldSelector) -> Vec<ElementRef<'a>> {
    let Some(css) = selector.css() else {
        return Vec::new();
    };
    let matched: Vec<ElementRef<'a>> = page.select(css).collect();
    let ids: HashSet<_> = matched.iter().map(|el| el.id()).collect();
    matched
        .into_iter()
        .filter(|el| !el.ancestors().any(|node| ids.contains(&node.id())))
        .collect()
}

/// Resolves field values for cards on one page.
pub struct FieldResolver<'a> {
    page: &'a Html,
    base_url: &'a Url,
    registry: &'a ProfileRegistry,
    profile: Option<&'a SelectorProfile>,
}

impl<'a> FieldResolver<'a> {
    #[must_use]
    pub fn new(
        page: &'a Html,
        base_url: &'a Url,
        registry: &'a ProfileRegistry,
        profile: Option<&'a SelectorProfile>,
    ) -> Self {
        Self {
            page,
            base_url,
            registry,
            profile,
        }
    }

    /// Returns the first non-empty value for `role`, or `None`.
    ///
    /// Link values are absolute URLs; a link selector without an
    /// `@attribute` suffix reads `href`.
    #[must_use]
    pub fn resolve(
        &self,
        card: ElementRef<'_>,
        role: FieldRole,
        explicit: Option<&FieldSelector>,
    ) -> Option<String> {
        let profile_candidates = self.profile.map_or(&[][..], |p| p.candidates(role));
        let primary = explicit.into_iter().chain(profile_candidates.iter());
        let card_chain = primary.clone().chain(self.registry.fallbacks(role).iter());

        self.first_match(card_chain, card, role).or_else(|| {
            if role.allows_page_scope() {
                self.first_match(primary, self.page.root_element(), role)
            } else {
                None
            }
        })
    }

    fn first_match<'s>(
        &self,
        mut candidates: impl Iterator<Item = &'s FieldSelector>,
        scope: ElementRef<'_>,
        role: FieldRole,
    ) -> Option<String> {
        candidates.find_map(|selector| select_value(scope, selector, role, self.base_url))
    }
}

/// Reads the first non-empty value `selector` yields within `scope`.
#[must_use]
pub fn select_value(
    scope: ElementRef<'_>,
    selector: &FieldSelector,
    role: FieldRole,
    base_url: &Url,
) -> Option<String> {
    let attribute = match (selector.attribute(), role) {
        (Some(attr), _) => Some(attr),
        (None, FieldRole::Link) => Some("href"),
        (None, _) => None,
    };
    match selector.css() {
        Some(css) => scope
            .select(css)
            .find_map(|el| element_value(el, attribute, base_url)),
        None => element_value(scope, attribute, base_url),
    }
}

fn element_value(el: ElementRef<'_>, attribute: Option<&str>, base_url: &Url) -> Option<String> {
    let value = match attribute {
        Some(attr) => {
            let raw = el.value().attr(attr)?;
            if is_url_attribute(attr) {
                return absolutize(base_url, raw);
            }
            normalize_whitespace(raw)
        }
        None => normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")),
    };
    (!value.is_empty()).then_some(value)
}

fn is_url_attribute(attr: &str) -> bool {
    matches!(
        attr.to_ascii_lowercase().as_str(),
        "href" | "src" | "data-href" | "data-url"
    )
}

/// Resolves `raw` against `base`. Fragment-only, `javascript:`, `mailto:`
/// and `tel:` targets are not navigable and yield `None`.
#[must_use]
pub fn absolutize(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    if raw.is_empty()
        || raw.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
    {
        return None;
    }
    base.join(raw).ok().map(String::from)
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
