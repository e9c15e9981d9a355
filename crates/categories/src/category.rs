use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::{Aggregate, AggregateId, AggregateRoot, DiscountRate, DomainError, Event};

/// Category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub AggregateId);

impl CategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for CategoryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Aggregate root: Category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    name: String,
    discount: Option<DiscountRate>,
    parent: Option<CategoryId>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Category {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: CategoryId) -> Self {
        Self {
            id,
            name: String::new(),
            discount: None,
            parent: None,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own discount override; `None` defers to the parent chain.
    pub fn discount(&self) -> Option<DiscountRate> {
        self.discount
    }

    /// Parent category; `None` means this is a root.
    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
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

impl AggregateRoot for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateCategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCategory {
    pub category_id: CategoryId,
    pub name: String,
    pub discount: Option<DiscountRate>,
    pub parent: Option<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCategory (partial).
///
/// For `discount` and `parent`, the outer `None` keeps the current value and
/// `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub category_id: CategoryId,
    pub name: Option<String>,
    pub discount: Option<Option<DiscountRate>>,
    pub parent: Option<Option<CategoryId>>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryCommand {
    CreateCategory(CreateCategory),
    UpdateCategory(UpdateCategory),
}

/// Event: CategoryCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCreated {
    pub category_id: CategoryId,
    pub name: String,
    pub discount: Option<DiscountRate>,
    pub parent: Option<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoryRenamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRenamed {
    pub category_id: CategoryId,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoryDiscountChanged (`None` = override removed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDiscountChanged {
    pub category_id: CategoryId,
    pub discount: Option<DiscountRate>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoryMoved (`None` = became a root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMoved {
    pub category_id: CategoryId,
    pub parent: Option<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryEvent {
    CategoryCreated(CategoryCreated),
    CategoryRenamed(CategoryRenamed),
    CategoryDiscountChanged(CategoryDiscountChanged),
    CategoryMoved(CategoryMoved),
}

impl Event for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::CategoryCreated(_) => "catalog.category.created",
            CategoryEvent::CategoryRenamed(_) => "catalog.category.renamed",
            CategoryEvent::CategoryDiscountChanged(_) => "catalog.category.discount_changed",
            CategoryEvent::CategoryMoved(_) => "catalog.category.moved",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CategoryEvent::CategoryCreated(e) => e.occurred_at,
            CategoryEvent::CategoryRenamed(e) => e.occurred_at,
            CategoryEvent::CategoryDiscountChanged(e) => e.occurred_at,
            CategoryEvent::CategoryMoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Category {
    type Command = CategoryCommand;
    type Event = CategoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CategoryEvent::CategoryCreated(e) => {
                self.id = e.category_id;
                self.name = e.name.clone();
                self.discount = e.discount;
                self.parent = e.parent;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            CategoryEvent::CategoryRenamed(e) => {
                self.name = e.name.clone();
            }
            CategoryEvent::CategoryDiscountChanged(e) => {
                self.discount = e.discount;
            }
            CategoryEvent::CategoryMoved(e) => {
                self.parent = e.parent;
            }
        }

        self.updated_at = Some(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CategoryCommand::CreateCategory(cmd) => self.handle_create(cmd),
            CategoryCommand::UpdateCategory(cmd) => self.handle_update(cmd),
        }
    }
}

fn normalize_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

impl Category {
    fn ensure_category_id(&self, category_id: CategoryId) -> Result<(), DomainError> {
        if self.id != category_id {
            return Err(DomainError::invariant("category_id mismatch"));
        }
        Ok(())
    }

    fn ensure_not_own_parent(
        category_id: CategoryId,
        parent: Option<CategoryId>,
    ) -> Result<(), DomainError> {
        if parent == Some(category_id) {
            return Err(DomainError::invariant("a category cannot be its own parent"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateCategory) -> Result<Vec<CategoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("category already exists"));
        }

        let name = normalize_name(&cmd.name)?;
        Self::ensure_not_own_parent(cmd.category_id, cmd.parent)?;

        Ok(vec![CategoryEvent::CategoryCreated(CategoryCreated {
            category_id: cmd.category_id,
            name,
            discount: cmd.discount,
            parent: cmd.parent,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateCategory) -> Result<Vec<CategoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_category_id(cmd.category_id)?;

        let mut events = Vec::new();

        if let Some(name) = &cmd.name {
            let name = normalize_name(name)?;
            if name != self.name {
                events.push(CategoryEvent::CategoryRenamed(CategoryRenamed {
                    category_id: cmd.category_id,
                    name,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        if let Some(discount) = cmd.discount {
            if discount != self.discount {
                events.push(CategoryEvent::CategoryDiscountChanged(CategoryDiscountChanged {
                    category_id: cmd.category_id,
                    discount,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        if let Some(parent) = cmd.parent {
            Self::ensure_not_own_parent(cmd.category_id, parent)?;
            if parent != self.parent {
                events.push(CategoryEvent::CategoryMoved(CategoryMoved {
                    category_id: cmd.category_id,
                    parent,
                    occurred_at: cmd.occurred_at,
                }));
            }
        }

        Ok(events)
    }
}
