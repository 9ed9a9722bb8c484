//! CSS selectors with an optional `@attribute` suffix.
//!
//! `"a.product-link@href"` selects `a.product-link` and reads its `href`
//! attribute; `".price"` reads the text content. A bare `"@data-sku"`
//! reads the attribute from the scope element itself.

use scraper::Selector;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid selector \"{selector}\": {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct FieldSelector {
    raw: String,
    css: Option<Selector>,
    attribute: Option<String>,
}

impl FieldSelector {
    /// Parses `spec` into a CSS selector plus optional attribute name.
    ///
    /// The attribute suffix is the text after the last `@`, accepted only
    /// when it looks like an attribute name. Anything else is treated as
    /// plain CSS.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] when the spec is empty or the CSS part does
    /// not parse.
    pub fn parse(spec: &str) -> Result<Self, SelectorError> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(SelectorError {
                selector: spec.to_owned(),
                reason: "selector is empty".to_owned(),
            });
        }

        let (css_part, attribute) = match trimmed.rsplit_once('@') {
            Some((css, attr)) if is_attribute_name(attr.trim()) => {
                (css.trim(), Some(attr.trim().to_owned()))
            }
            _ => (trimmed, None),
        };

        let css = if css_part.is_empty() {
            if attribute.is_none() {
                return Err(SelectorError {
                    selector: spec.to_owned(),
                    reason: "selector is empty".to_owned(),
                });
            }
            None
        } else {
            Some(Selector::parse(css_part).map_err(|e| SelectorError {
                selector: spec.to_owned(),
                reason: e.to_string(),
            })?)
        };

        Ok(Self {
            raw: trimmed.to_owned(),
            css,
            attribute,
        })
    }

    /// Returns a copy that reads `attribute` instead of text content.
    #[must_use]
    pub fn with_attribute(mut self, attribute: &str) -> Self {
        let attribute = attribute.trim();
        if !attribute.is_empty() {
            self.attribute = Some(attribute.to_owned());
        }
        self
    }

    /// `None` means "the scope element itself".
    #[must_use]
    pub fn css(&self) -> Option<&Selector> {
        self.css.as_ref()
    }

    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_attribute_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}
