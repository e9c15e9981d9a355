use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_categories::CategoryId;
use catalog_core::{Aggregate, AggregateId, AggregateRoot, DiscountRate, DomainError, Event};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    code: String,
    name: String,
    discount: Option<DiscountRate>,
    category: Option<CategoryId>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            code: String::new(),
            name: String::new(),
            discount: None,
            category: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    /// Unique human-readable code.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own discount override; `None` defers to the attached category.
    pub fn discount(&self) -> Option<DiscountRate> {
        self.discount
    }

    /// Category this product inherits its discount from.
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub discount: Option<DiscountRate>,
    pub category: Option<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProduct (partial).
///
/// For `discount` and `category`, the outer `None` keeps the current value and
/// `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub product_id: ProductId,
    pub code: Option<String>,
    pub name: Option<String>,
    pub discount: Option<Option<DiscountRate>>,
    pub category: Option<Option<CategoryId>>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    UpdateProduct(UpdateProduct),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub discount: Option<DiscountRate>,
    pub category: Option<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRecoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecoded {
    pub product_id: ProductId,
    pub code: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRenamed {
    pub product_id: ProductId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductDiscountChanged (`None` = override removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDiscountChanged {
    pub product_id: ProductId,
    pub discount: Option<DiscountRate>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductCategoryChanged (`None` = detached).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategoryChanged {
    pub product_id: ProductId,
    pub category: Option<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductRecoded(ProductRecoded),
    ProductRenamed(ProductRenamed),
    ProductDiscountChanged(ProductDiscountChanged),
    ProductCategoryChanged(ProductCategoryChanged),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "catalog.product.created",
            ProductEvent::ProductRecoded(_) => "catalog.product.recoded",
            ProductEvent::ProductRenamed(_) => "catalog.product.renamed",
            ProductEvent::ProductDiscountChanged(_) => "catalog.product.discount_changed",
            ProductEvent::ProductCategoryChanged(_) => "catalog.product.category_changed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductRecoded(e) => e.occurred_at,
            ProductEvent::ProductRenamed(e) => e.occurred_at,
            ProductEvent::ProductDiscountChanged(e) => e.occurred_at,
            ProductEvent::ProductCategoryChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.code = e.code.clone();
                self.name = e.name.clone();
                self.discount = e.discount;
                self.category = e.category;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            ProductEvent::ProductRecoded(e) => {
                self.code = e.code.clone();
            }
            ProductEvent::ProductRenamed(e) => {
                self.name = e.name.clone();
            }
            ProductEvent::ProductDiscountChanged(e) => {
                self.discount = e.discount;
            }
            ProductEvent::ProductCategoryChanged(e) => {
                self.category = e.category;
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::UpdateProduct(cmd) => self.handle_update(cmd),
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        let code = non_empty("code", &cmd.code)?;
        let name = non_empty("name", &cmd.name)?;

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            code,
            name,
            discount: cmd.discount,
            category: cmd.category,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        let mut events = Vec::new();

        if let Some(code) = &cmd.code {
            let code = non_empty("code", code)?;
            if code != self.code {
                events.push(ProductEvent::ProductRecoded(ProductRecoded {
                    product_id: cmd.product_id,
                    code,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        if let Some(name) = &cmd.name {
            let name = non_empty("name", name)?;
            if name != self.name {
                events.push(ProductEvent::ProductRenamed(ProductRenamed {
                    product_id: cmd.product_id,
                    name,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        if let Some(discount) = cmd.discount {
            if discount != self.discount {
                events.push(ProductEvent::ProductDiscountChanged(ProductDiscountChanged {
                    product_id: cmd.product_id,
                    discount,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        if let Some(category) = cmd.category {
            if category != self.category {
                events.push(ProductEvent::ProductCategoryChanged(ProductCategoryChanged {
                    product_id: cmd.product_id,
                    category,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        Ok(events)
    }
}
