//! Built-in selector profiles for common storefront platforms.
//!
//! A [`ProfileRegistry`] is an immutable, ordered list of named profiles
//! plus per-role generic fallbacks. It is built once and passed by
//! reference to resolution and extraction; nothing here is global state.

use shopwatch_core::FieldSelector;

/// Field roles resolved per product card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Name,
    Price,
    Link,
    Status,
    Sku,
}

impl FieldRole {
    /// Whether the role may fall back to the whole page when the card
    /// yields nothing. Status, SKU and link never do: a page-wide badge
    /// must not be attributed to every card, and a borrowed link would
    /// merge two products under one snapshot key.
    #[must_use]
    pub fn allows_page_scope(self) -> bool {
        matches!(self, FieldRole::Name | FieldRole::Price)
    }
}

#[derive(Debug, Clone)]
pub struct SelectorProfile {
    name: &'static str,
    list: Vec<FieldSelector>,
    title: Vec<FieldSelector>,
    price: Vec<FieldSelector>,
    link: Vec<FieldSelector>,
}

impl SelectorProfile {
    fn new(
        name: &'static str,
        list: &[&str],
        title: &[&str],
        price: &[&str],
        link: &[&str],
    ) -> Self {
        Self {
            name,
            list: compile(name, list),
            title: compile(name, title),
            price: compile(name, price),
            link: compile(name, link),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Card container candidates, in priority order.
    #[must_use]
    pub fn list(&self) -> &[FieldSelector] {
        &self.list
    }

    /// Role candidates, in priority order. Profiles carry no status or SKU
    /// candidates; those come from the registry fallbacks only.
    #[must_use]
    pub fn candidates(&self, role: FieldRole) -> &[FieldSelector] {
        match role {
            FieldRole::Name => &self.title,
            FieldRole::Price => &self.price,
            FieldRole::Link => &self.link,
            FieldRole::Status | FieldRole::Sku => &[],
        }
    }
}

#[derive(Debug, Clone)]
struct RoleFallbacks {
    name: Vec<FieldSelector>,
    price: Vec<FieldSelector>,
    link: Vec<FieldSelector>,
    status: Vec<FieldSelector>,
    sku: Vec<FieldSelector>,
}

#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<SelectorProfile>,
    fallbacks: RoleFallbacks,
}

pub const GENERIC_PROFILE: &str = "generic";

impl ProfileRegistry {
    /// The built-in profiles: platform-specific ones first, `generic` last.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = vec![
            SelectorProfile::new(
                "woocommerce",
                &["ul.products li.product", "li.product", ".products .product"],
                &[
                    ".woocommerce-loop-product__title",
                    "h2.product-title",
                    "h3",
                ],
                &[".price ins .amount", ".price .amount", ".price"],
                &[
                    "a.woocommerce-LoopProduct-link@href",
                    "a.woocommerce-loop-product__link@href",
                ],
            ),
            SelectorProfile::new(
                "shopify",
                &[
                    "li.grid__item .card-wrapper",
                    ".product-card",
                    ".grid-product",
                    ".product-item",
                ],
                &[
                    ".card__heading",
                    ".product-card__title",
                    ".grid-product__title",
                    ".product-item__title",
                ],
                &[
                    ".price-item--sale",
                    ".price__regular .price-item",
                    ".product-item__price",
                    ".money",
                ],
                &[
                    "a.full-unstyled-link@href",
                    "a.product-card__link@href",
                    "a.grid-product__link@href",
                    "a[href*='/products/']@href",
                ],
            ),
            SelectorProfile::new(
                "magento",
                &[
                    ".products-grid li.product-item",
                    ".product-items .product-item",
                    "li.product-item",
                ],
                &[".product-item-link", ".product-item-name"],
                &[
                    "[data-price-type=finalPrice]@data-price-amount",
                    ".price-box .price",
                ],
                &["a.product-item-link@href", "a.product-item-photo@href"],
            ),
            SelectorProfile::new(
                "opencart",
                &[".product-layout .product-thumb", ".product-thumb", ".product-layout"],
                &[".caption h4 a", ".caption h4", ".name a"],
                &[".price-new", ".price"],
                &[".caption h4 a@href", ".image a@href"],
            ),
            SelectorProfile::new(
                "salla",
                &["salla-product-card", ".s-product-card-entry", ".product-entry"],
                &[".s-product-card-content-title", ".product-entry__title"],
                &[
                    ".s-product-card-sale-price",
                    ".s-product-card-price",
                    ".product-entry__price",
                ],
                &[
                    ".s-product-card-content-title a@href",
                    "a.s-product-card-image@href",
                ],
            ),
            SelectorProfile::new(
                GENERIC_PROFILE,
                &[
                    "[itemtype*='schema.org/Product']",
                    ".product-card",
                    ".product-item",
                    "article.product",
                    ".product",
                ],
                &[
                    "[itemprop=name]",
                    ".product-title",
                    ".product-name",
                    ".product_title",
                ],
                &[
                    "[itemprop=price]@content",
                    ".product-price",
                    ".price",
                ],
                &["[itemprop=url]@href", "a[href*='/product']@href"],
            ),
        ];

        let fallbacks = RoleFallbacks {
            name: compile(
                "fallback",
                &["h2", "h3", ".product-title", ".title", "a[title]@title"],
            ),
            price: compile(
                "fallback",
                &[
                    "[itemprop=price]@content",
                    ".price",
                    ".product-price",
                    ".amount",
                    ".money",
                    "[data-price]@data-price",
                ],
            ),
            link: compile("fallback", &["a@href"]),
            status: compile(
                "fallback",
                &[
                    ".stock",
                    ".availability",
                    ".out-of-stock",
                    ".sold-out",
                    ".badge",
                    ".label",
                ],
            ),
            sku: compile(
                "fallback",
                &[
                    "[itemprop=sku]",
                    ".sku",
                    "[data-sku]@data-sku",
                    "[data-product-id]@data-product-id",
                    "a[data-product_id]@data-product_id",
                ],
            ),
        };

        Self {
            profiles,
            fallbacks,
        }
    }

    /// Looks up a profile by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SelectorProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    #[must_use]
    pub fn generic(&self) -> Option<&SelectorProfile> {
        self.get(GENERIC_PROFILE)
    }

    /// Profiles in resolution priority order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectorProfile> {
        self.profiles.iter()
    }

    /// Generic per-role candidates tried after the profile's own.
    #[must_use]
    pub fn fallbacks(&self, role: FieldRole) -> &[FieldSelector] {
        match role {
            FieldRole::Name => &self.fallbacks.name,
            FieldRole::Price => &self.fallbacks.price,
            FieldRole::Link => &self.fallbacks.link,
            FieldRole::Status => &self.fallbacks.status,
            FieldRole::Sku => &self.fallbacks.sku,
        }
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn compile(owner: &str, specs: &[&str]) -> Vec<FieldSelector> {
    specs
        .iter()
        .filter_map(|spec| match FieldSelector::parse(spec) {
            Ok(sel) => Some(sel),
            Err(e) => {
                tracing::error!(profile = owner, error = %e, "dropping built-in selector");
                None
            }
        })
        .collect()
}
