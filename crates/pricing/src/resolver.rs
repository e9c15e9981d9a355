use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;

use catalog_categories::CategoryId;
use catalog_core::DiscountRate;
use catalog_products::ProductId;

use crate::error::PricingError;
use crate::formula::DiscountFormula;
use crate::lookup::{CategoryLookup, ProductLookup, ProductRef};

/// Where the governing discount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiscountSource {
    /// The product's own override.
    Product { product_id: ProductId },
    /// An override on the attached category (depth 0) or one of its ancestors.
    Category { category_id: CategoryId, depth: usize },
    /// Nothing in the chain defines a discount.
    None,
}

/// Result of pricing one product for one amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountQuote {
    pub product_id: ProductId,
    pub amount: Decimal,
    pub discount: Option<DiscountRate>,
    pub source: DiscountSource,
    pub amount_after_discount: Decimal,
}

impl DiscountQuote {
    /// Wire value meaning "no applicable discount".
    pub const NO_DISCOUNT: Decimal = Decimal::NEGATIVE_ONE;

    /// The discount as exchanged with clients: the percentage, or `-1`.
    pub fn discount_or_sentinel(&self) -> Decimal {
        self.discount
            .map(|d| d.as_decimal())
            .unwrap_or(Self::NO_DISCOUNT)
    }
}

/// Resolves the effective discount of a product by walking its category chain.
///
/// The first override found wins: the product's own, then its category's,
/// then each ancestor's in order. A revisited category or a chain longer than
/// `max_depth` is reported as an error instead of looping.
#[derive(Debug, Clone)]
pub struct DiscountResolver<C, P> {
    categories: C,
    products: P,
    formula: DiscountFormula,
    max_depth: usize,
}

impl<C, P> DiscountResolver<C, P> {
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn new(categories: C, products: P) -> Self {
        Self {
            categories,
            products,
            formula: DiscountFormula::default(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_formula(mut self, formula: DiscountFormula) -> Self {
        self.formula = formula;
        self
    }

    /// Maximum number of categories visited in one walk (at least 1).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn formula(&self) -> DiscountFormula {
        self.formula
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl<C, P> DiscountResolver<C, P>
where
    C: CategoryLookup,
    P: ProductLookup,
{
    pub fn resolve(
        &self,
        product: &ProductRef,
        amount: Decimal,
    ) -> Result<DiscountQuote, PricingError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PricingError::InvalidAmount(format!(
                "amount must not be negative (got {amount})"
            )));
        }

        let link = self.products.product_link(product)?.ok_or_else(|| {
            tracing::debug!(product = %product, "discount lookup for unknown product");
            PricingError::ProductNotFound(product.clone())
        })?;

        let (discount, source) = match link.discount {
            Some(own) => (
                Some(own),
                DiscountSource::Product {
                    product_id: link.id,
                },
            ),
            None => match link.category {
                Some(category_id) => self.inherited(category_id)?,
                None => (None, DiscountSource::None),
            },
        };

        let amount_after_discount = match discount {
            Some(rate) => self.formula.apply(amount, rate).ok_or_else(|| {
                PricingError::InvalidAmount(format!("amount {amount} is too large"))
            })?,
            None => amount,
        };

        tracing::debug!(
            product_id = %link.id,
            discount = ?discount.map(|d| d.as_decimal()),
            source = ?source,
            %amount,
            %amount_after_discount,
            "discount resolved"
        );

        Ok(DiscountQuote {
            product_id: link.id,
            amount,
            discount,
            source,
            amount_after_discount,
        })
    }

    /// Effective discount of a category: its own override, else the nearest
    /// ancestor's.
    pub fn category_discount(
        &self,
        category_id: CategoryId,
    ) -> Result<(Option<DiscountRate>, DiscountSource), PricingError> {
        self.inherited(category_id)
    }

    fn inherited(
        &self,
        start: CategoryId,
    ) -> Result<(Option<DiscountRate>, DiscountSource), PricingError> {
        let mut visited = HashSet::new();
        let mut current = Some(start);
        let mut depth = 0usize;

        while let Some(category_id) = current {
            if !visited.insert(category_id) {
                tracing::warn!(%category_id, "category cycle detected during discount walk");
                return Err(PricingError::CategoryCycleDetected { category_id });
            }
            if depth >= self.max_depth {
                tracing::warn!(max_depth = self.max_depth, "category chain too deep");
                return Err(PricingError::CategoryDepthExceeded {
                    max_depth: self.max_depth,
                });
            }

            let link = self
                .categories
                .category_link(category_id)?
                .ok_or(PricingError::CategoryNotFound(category_id))?;

            if let Some(discount) = link.discount {
                return Ok((
                    Some(discount),
                    DiscountSource::Category { category_id, depth },
                ));
            }

            tracing::trace!(%category_id, depth, "no override, climbing to parent");
            current = link.parent;
            depth += 1;
        }

        Ok((None, DiscountSource::None))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use catalog_core::AggregateId;
    use rust_decimal::prelude::*;

    use super::*;
    use crate::lookup::{CategoryLink, LookupError, ProductLink};

    /// Minimal lookup fixture; mutable so tests can rewire the tree.
    #[derive(Default)]
    struct Catalog {
        categories: RwLock<HashMap<CategoryId, CategoryLink>>,
        products: RwLock<HashMap<ProductId, (String, ProductLink)>>,
    }

    impl Catalog {
        fn category(&self, discount: Option<u32>, parent: Option<CategoryId>) -> CategoryId {
            let id = CategoryId::new(AggregateId::new());
            self.categories.write().unwrap().insert(
                id,
                CategoryLink {
                    id,
                    discount: discount.map(rate),
                    parent,
                },
            );
            id
        }

        fn set_parent(&self, id: CategoryId, parent: Option<CategoryId>) {
            self.categories.write().unwrap().get_mut(&id).unwrap().parent = parent;
        }

        fn product(&self, code: &str, discount: Option<u32>, category: Option<CategoryId>) -> ProductId {
            let id = ProductId::new(AggregateId::new());
            self.products.write().unwrap().insert(
                id,
                (
                    code.to_string(),
                    ProductLink {
                        id,
                        discount: discount.map(rate),
                        category,
                    },
                ),
            );
            id
        }
    }

    impl CategoryLookup for Catalog {
        fn category_link(&self, id: CategoryId) -> Result<Option<CategoryLink>, LookupError> {
            Ok(self.categories.read().unwrap().get(&id).copied())
        }
    }

    impl ProductLookup for Catalog {
        fn product_link(&self, product: &ProductRef) -> Result<Option<ProductLink>, LookupError> {
            let products = self.products.read().unwrap();
            Ok(match product {
                ProductRef::Id(id) => products.get(id).map(|(_, l)| *l),
                ProductRef::Code(code) => products
                    .values()
                    .find(|(c, _)| c == code)
                    .map(|(_, l)| *l),
            })
        }
    }

    fn rate(p: u32) -> DiscountRate {
        DiscountRate::from_percent(p).unwrap()
    }

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn resolver(catalog: &std::sync::Arc<Catalog>) -> DiscountResolver<std::sync::Arc<Catalog>, std::sync::Arc<Catalog>> {
        DiscountResolver::new(catalog.clone(), catalog.clone())
    }

    fn setup() -> std::sync::Arc<Catalog> {
        std::sync::Arc::new(Catalog::default())
    }

    #[test]
    fn inherits_from_a_distant_root() {
        let catalog = setup();
        let root = catalog.category(Some(100), None);
        let mid = catalog.category(None, Some(root));
        let leaf = catalog.category(None, Some(mid));
        let p = catalog.product("P-1", None, Some(leaf));

        let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(250)).unwrap();
        assert_eq!(quote.discount, Some(rate(100)));
        assert_eq!(
            quote.source,
            DiscountSource::Category { category_id: root, depth: 2 }
        );
        assert_eq!(quote.amount_after_discount, Decimal::ZERO);
    }

    #[test]
    fn orphan_category_without_discount_yields_sentinel() {
        let catalog = setup();
        let orphan = catalog.category(None, None);
        let p = catalog.product("P-2", None, Some(orphan));

        let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(1000)).unwrap();
        assert_eq!(quote.discount, None);
        assert_eq!(quote.source, DiscountSource::None);
        assert_eq!(quote.discount_or_sentinel(), dec(-1));
        assert_eq!(quote.amount_after_discount, dec(1000));
    }

    #[test]
    fn product_override_uses_percentage_model() {
        let catalog = setup();
        let root = catalog.category(Some(50), None);
        let p = catalog.product("P-3", Some(5), Some(root));

        let quote = resolver(&catalog)
            .resolve(&ProductRef::Code("P-3".to_string()), dec(1000))
            .unwrap();
        assert_eq!(quote.discount, Some(rate(5)));
        assert_eq!(quote.source, DiscountSource::Product { product_id: p });
        assert_eq!(quote.amount_after_discount, dec(950));
    }

    #[test]
    fn flat_formula_subtracts_the_value() {
        let catalog = setup();
        let p = catalog.product("P-4", Some(5), None);

        let quote = resolver(&catalog)
            .with_formula(DiscountFormula::Flat)
            .resolve(&ProductRef::Id(p), dec(1000))
            .unwrap();
        assert_eq!(quote.amount_after_discount, dec(995));
    }

    #[test]
    fn closer_override_beats_ancestor() {
        let catalog = setup();
        let root = catalog.category(Some(40), None);
        let mid = catalog.category(Some(10), Some(root));
        let leaf = catalog.category(None, Some(mid));
        let p = catalog.product("P-5", None, Some(leaf));

        let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(100)).unwrap();
        assert_eq!(quote.discount, Some(rate(10)));
        assert_eq!(quote.amount_after_discount, dec(90));
    }

    #[test]
    fn zero_discount_is_terminal() {
        let catalog = setup();
        let root = catalog.category(Some(30), None);
        let zero = catalog.category(Some(0), Some(root));
        let p = catalog.product("P-6", None, Some(zero));

        let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(100)).unwrap();
        assert_eq!(quote.discount, Some(DiscountRate::zero()));
        assert_eq!(quote.discount_or_sentinel(), Decimal::ZERO);
        assert_eq!(quote.amount_after_discount, dec(100));
    }

    #[test]
    fn product_without_category_has_no_discount() {
        let catalog = setup();
        let p = catalog.product("P-7", None, None);

        let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(42)).unwrap();
        assert_eq!(quote.source, DiscountSource::None);
        assert_eq!(quote.amount_after_discount, dec(42));
    }

    #[test]
    fn unknown_product_is_not_found() {
        let catalog = setup();
        let err = resolver(&catalog)
            .resolve(&ProductRef::Code("missing".to_string()), dec(1))
            .unwrap_err();
        assert_eq!(err, PricingError::ProductNotFound(ProductRef::Code("missing".to_string())));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let catalog = setup();
        let p = catalog.product("P-8", Some(5), None);
        let err = resolver(&catalog).resolve(&ProductRef::Id(p), dec(-10)).unwrap_err();
        assert!(matches!(err, PricingError::InvalidAmount(_)));
    }

    #[test]
    fn cycle_is_detected_instead_of_looping() {
        let catalog = setup();
        let a = catalog.category(None, None);
        let b = catalog.category(None, Some(a));
        catalog.set_parent(a, Some(b));
        let p = catalog.product("P-9", None, Some(a));

        let err = resolver(&catalog).resolve(&ProductRef::Id(p), dec(10)).unwrap_err();
        assert_eq!(err, PricingError::CategoryCycleDetected { category_id: a });
    }

    #[test]
    fn discount_before_a_cycle_still_resolves() {
        let catalog = setup();
        let a = catalog.category(None, None);
        let b = catalog.category(Some(20), Some(a));
        catalog.set_parent(a, Some(b));
        let p = catalog.product("P-10", None, Some(a));

        let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(10)).unwrap();
        assert_eq!(quote.discount, Some(rate(20)));
    }

    #[test]
    fn depth_cap_is_enforced() {
        let catalog = setup();
        let mut parent = None;
        for _ in 0..5 {
            parent = Some(catalog.category(None, parent));
        }
        let p = catalog.product("P-11", None, parent);

        let err = resolver(&catalog)
            .with_max_depth(3)
            .resolve(&ProductRef::Id(p), dec(10))
            .unwrap_err();
        assert_eq!(err, PricingError::CategoryDepthExceeded { max_depth: 3 });

        let quote = resolver(&catalog)
            .with_max_depth(5)
            .resolve(&ProductRef::Id(p), dec(10))
            .unwrap();
        assert_eq!(quote.source, DiscountSource::None);
    }

    #[test]
    fn dangling_parent_is_reported() {
        let catalog = setup();
        let ghost = CategoryId::new(AggregateId::new());
        let leaf = catalog.category(None, Some(ghost));
        let p = catalog.product("P-12", None, Some(leaf));

        let err = resolver(&catalog).resolve(&ProductRef::Id(p), dec(10)).unwrap_err();
        assert_eq!(err, PricingError::CategoryNotFound(ghost));
    }

    /// Category side that always fails to read.
    struct Unreadable;

    impl CategoryLookup for Unreadable {
        fn category_link(&self, _id: CategoryId) -> Result<Option<CategoryLink>, LookupError> {
            Err(LookupError("store lock poisoned".to_string()))
        }
    }

    #[test]
    fn store_failure_is_not_reported_as_missing() {
        let catalog = setup();
        let leaf = CategoryId::new(AggregateId::new());
        let p = catalog.product("P-15", None, Some(leaf));

        let r = DiscountResolver::new(Unreadable, catalog.clone());
        let err = r.resolve(&ProductRef::Id(p), dec(10)).unwrap_err();
        assert!(matches!(err, PricingError::Store(_)), "{err:?}");
    }

    #[test]
    fn live_values_are_reread_on_each_call() {
        let catalog = setup();
        let root = catalog.category(Some(10), None);
        let other = catalog.category(Some(60), None);
        let leaf = catalog.category(None, Some(root));
        let p = catalog.product("P-13", None, Some(leaf));
        let r = resolver(&catalog);

        assert_eq!(r.resolve(&ProductRef::Id(p), dec(100)).unwrap().discount, Some(rate(10)));
        catalog.set_parent(leaf, Some(other));
        assert_eq!(r.resolve(&ProductRef::Id(p), dec(100)).unwrap().discount, Some(rate(60)));
    }

    #[test]
    fn category_discount_reports_nearest_ancestor() {
        let catalog = setup();
        let root = catalog.category(Some(15), None);
        let child = catalog.category(None, Some(root));

        let (discount, source) = resolver(&catalog).category_discount(child).unwrap();
        assert_eq!(discount, Some(rate(15)));
        assert_eq!(source, DiscountSource::Category { category_id: root, depth: 1 });
    }

    #[test]
    fn fractional_amounts_stay_exact() {
        let catalog = setup();
        let p = catalog.product("P-14", Some(15), None);
        let quote = resolver(&catalog)
            .resolve(&ProductRef::Id(p), Decimal::from_str("19.99").unwrap())
            .unwrap();
        assert_eq!(quote.amount_after_discount, Decimal::from_str("16.9915").unwrap());
    }

    #[test]
    fn source_serializes_with_kind_tag() {
        let v = serde_json::to_value(DiscountSource::None).unwrap();
        assert_eq!(v["kind"], "none");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: the nearest override in the chain wins; with none,
            /// the amount is unchanged.
            #[test]
            fn nearest_override_wins(
                chain in proptest::collection::vec(proptest::option::of(0u32..=100), 1..12),
                amount in 0i64..1_000_000,
            ) {
                let catalog = setup();
                // chain[0] is the root, the last entry is the attached category.
                let mut parent = None;
                for discount in &chain {
                    parent = Some(catalog.category(*discount, parent));
                }
                let p = catalog.product("PROP", None, parent);

                let quote = resolver(&catalog).resolve(&ProductRef::Id(p), dec(amount)).unwrap();
                let expected = chain.iter().rev().find_map(|d| *d);

                prop_assert_eq!(quote.discount, expected.map(rate));
                match expected {
                    None => prop_assert_eq!(quote.amount_after_discount, dec(amount)),
                    Some(d) => prop_assert_eq!(
                        quote.amount_after_discount,
                        (dec(amount) * dec(100 - d as i64) / dec(100)).normalize()
                    ),
                }
            }

            /// Property: an own override ignores the chain entirely, and
            /// repeated calls agree.
            #[test]
            fn own_override_is_independent_of_chain(
                own in 0u32..=100,
                chain in proptest::collection::vec(proptest::option::of(0u32..=100), 0..6),
            ) {
                let catalog = setup();
                let mut parent = None;
                for discount in &chain {
                    parent = Some(catalog.category(*discount, parent));
                }
                let p = catalog.product("OWN", Some(own), parent);
                let r = resolver(&catalog);

                let first = r.resolve(&ProductRef::Id(p), dec(500)).unwrap();
                let second = r.resolve(&ProductRef::Id(p), dec(500)).unwrap();
                prop_assert_eq!(first.discount, Some(rate(own)));
                prop_assert_eq!(first, second);
            }
        }
    }
}
