use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use catalog_categories::{
    Category, CategoryCommand, CategoryId, CreateCategory, UpdateCategory,
};
use catalog_core::{AggregateId, DiscountRate, Pagination};
use catalog_infra::{
    command_dispatcher::{CommandDispatcher, DispatchError},
    config::CatalogConfig,
    store::{AggregateStore, InMemoryCategoryStore, InMemoryProductStore},
};
use catalog_pricing::{DiscountQuote, DiscountResolver, DiscountSource, PricingError, ProductRef};
use catalog_products::{CreateProduct, Product, ProductCommand, ProductId, UpdateProduct};

type CategoryStore = Arc<InMemoryCategoryStore>;
type ProductStore = Arc<InMemoryProductStore>;

/// Input for a new category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub discount: Option<DiscountRate>,
    pub parent: Option<CategoryId>,
}

/// Partial category update; the outer `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub discount: Option<Option<DiscountRate>>,
    pub parent: Option<Option<CategoryId>>,
}

/// Input for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub discount: Option<DiscountRate>,
    pub category: Option<CategoryId>,
}

/// Partial product update; the outer `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub discount: Option<Option<DiscountRate>>,
    pub category: Option<Option<CategoryId>>,
}

/// Stores, write pipelines and the resolver shared by all handlers.
#[derive(Debug)]
pub struct AppServices {
    config: CatalogConfig,
    categories: CategoryStore,
    products: ProductStore,
    category_dispatcher: CommandDispatcher<CategoryStore>,
    product_dispatcher: CommandDispatcher<ProductStore>,
    resolver: DiscountResolver<CategoryStore, ProductStore>,
}

pub fn build_services(config: CatalogConfig) -> AppServices {
    let categories: CategoryStore = Arc::new(InMemoryCategoryStore::new());
    let products: ProductStore = Arc::new(InMemoryProductStore::new());

    let resolver = DiscountResolver::new(categories.clone(), products.clone())
        .with_formula(config.discount_formula)
        .with_max_depth(config.max_category_depth);

    tracing::info!(
        formula = %config.discount_formula,
        max_category_depth = config.max_category_depth,
        default_page_size = config.default_page_size,
        "catalog services ready"
    );

    AppServices {
        category_dispatcher: CommandDispatcher::new(categories.clone()),
        product_dispatcher: CommandDispatcher::new(products.clone()),
        categories,
        products,
        resolver,
        config,
    }
}

impl AppServices {
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn pagination(&self, page: Option<u32>, page_size: Option<u32>) -> Pagination {
        Pagination::new(page, page_size, self.config.default_page_size)
    }

    // -------------------------
    // Categories
    // -------------------------

    pub fn create_category(&self, input: NewCategory) -> Result<Category, DispatchError> {
        if let Some(parent) = input.parent {
            self.require_category(parent)?;
        }

        let category_id = CategoryId::new(AggregateId::new());
        let cmd = CategoryCommand::CreateCategory(CreateCategory {
            category_id,
            name: input.name,
            discount: input.discount,
            parent: input.parent,
            occurred_at: Utc::now(),
        });
        self.category_dispatcher
            .dispatch(category_id, cmd, Category::empty)
    }

    pub fn update_category(
        &self,
        category_id: CategoryId,
        changes: CategoryChanges,
    ) -> Result<Category, DispatchError> {
        if let Some(Some(parent)) = changes.parent {
            if parent != category_id {
                self.require_category(parent)?;
            }
        }

        let cmd = CategoryCommand::UpdateCategory(UpdateCategory {
            category_id,
            name: changes.name,
            discount: changes.discount,
            parent: changes.parent,
            occurred_at: Utc::now(),
        });
        self.category_dispatcher
            .dispatch(category_id, cmd, Category::empty)
    }

    pub fn get_category(&self, category_id: CategoryId) -> Result<Category, DispatchError> {
        self.categories
            .load(&category_id)?
            .ok_or(DispatchError::NotFound)
    }

    pub fn list_categories(&self, pagination: Pagination) -> Result<Vec<Category>, DispatchError> {
        Ok(self.categories.list(pagination)?)
    }

    /// Effective discount of a category, inherited from its ancestors when
    /// it has none of its own.
    pub fn category_discount(
        &self,
        category_id: CategoryId,
    ) -> Result<(Option<DiscountRate>, DiscountSource), PricingError> {
        self.resolver.category_discount(category_id)
    }

    fn require_category(&self, category_id: CategoryId) -> Result<(), DispatchError> {
        match self.categories.load(&category_id)? {
            Some(_) => Ok(()),
            None => {
                tracing::debug!(%category_id, "referenced category does not exist");
                Err(DispatchError::NotFound)
            }
        }
    }

    // -------------------------
    // Products
    // -------------------------

    pub fn create_product(&self, input: NewProduct) -> Result<Product, DispatchError> {
        let product_id = ProductId::new(AggregateId::new());
        self.products.ensure_code_available(&input.code, product_id)?;
        if let Some(category) = input.category {
            self.require_category(category)?;
        }

        let cmd = ProductCommand::CreateProduct(CreateProduct {
            product_id,
            code: input.code,
            name: input.name,
            discount: input.discount,
            category: input.category,
            occurred_at: Utc::now(),
        });
        self.product_dispatcher.dispatch(product_id, cmd, Product::empty)
    }

    pub fn update_product(
        &self,
        product_id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DispatchError> {
        if let Some(code) = &changes.code {
            self.products.ensure_code_available(code, product_id)?;
        }
        if let Some(Some(category)) = changes.category {
            self.require_category(category)?;
        }

        let cmd = ProductCommand::UpdateProduct(UpdateProduct {
            product_id,
            code: changes.code,
            name: changes.name,
            discount: changes.discount,
            category: changes.category,
            occurred_at: Utc::now(),
        });
        self.product_dispatcher.dispatch(product_id, cmd, Product::empty)
    }

    pub fn get_product(&self, product_id: ProductId) -> Result<Product, DispatchError> {
        self.products
            .load(&product_id)?
            .ok_or(DispatchError::NotFound)
    }

    pub fn get_product_by_code(&self, code: &str) -> Result<Product, DispatchError> {
        self.products
            .find_by_code(code)?
            .ok_or(DispatchError::NotFound)
    }

    pub fn list_products(&self, pagination: Pagination) -> Result<Vec<Product>, DispatchError> {
        Ok(self.products.list(pagination)?)
    }

    // -------------------------
    // Pricing
    // -------------------------

    pub fn resolve_discount(
        &self,
        product: &ProductRef,
        amount: Decimal,
    ) -> Result<DiscountQuote, PricingError> {
        self.resolver.resolve(product, amount)
    }
}
