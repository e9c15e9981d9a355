use std::collections::HashMap;
use std::sync::RwLock;

use catalog_categories::{Category, CategoryId};
use catalog_core::{AggregateRoot, ExpectedVersion, Pagination};
use catalog_pricing::{CategoryLink, CategoryLookup, LookupError};

use super::{AggregateStore, StoreError, check_version};

#[derive(Debug, Default)]
struct CategoryTable {
    by_id: HashMap<CategoryId, Category>,
    order: Vec<CategoryId>,
}

/// In-memory category store.
#[derive(Debug, Default)]
pub struct InMemoryCategoryStore {
    inner: RwLock<CategoryTable>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AggregateStore<Category> for InMemoryCategoryStore {
    fn load(&self, id: &CategoryId) -> Result<Option<Category>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.by_id.get(id).cloned())
    }

    fn save(&self, category: Category, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let id = category.id_typed();
        let current = table.by_id.get(&id).map(|c| c.version()).unwrap_or(0);
        check_version(expected, current)?;

        if current == 0 {
            table.order.push(id);
        }
        table.by_id.insert(id, category);
        Ok(())
    }

    fn list(&self, pagination: Pagination) -> Result<Vec<Category>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(pagination.apply(table.order.iter().filter_map(|id| table.by_id.get(id).cloned())))
    }
}

impl CategoryLookup for InMemoryCategoryStore {
    fn category_link(&self, id: CategoryId) -> Result<Option<CategoryLink>, LookupError> {
        let table = self
            .inner
            .read()
            .map_err(|_| LookupError(StoreError::Poisoned.to_string()))?;
        let Some(category) = table.by_id.get(&id) else {
            return Ok(None);
        };
        tracing::debug!(category_id = %id, discount = ?category.discount(), parent = ?category.parent(), "category lookup");
        Ok(Some(CategoryLink {
            id,
            discount: category.discount(),
            parent: category.parent(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use catalog_categories::{CategoryCommand, CreateCategory};
    use catalog_core::{Aggregate, AggregateId, DiscountRate};
    use chrono::Utc;

    fn new_category(name: &str, discount: Option<u32>, parent: Option<CategoryId>) -> Category {
        let id = CategoryId::new(AggregateId::new());
        let mut category = Category::empty(id);
        let events = category
            .handle(&CategoryCommand::CreateCategory(CreateCategory {
                category_id: id,
                name: name.to_string(),
                discount: discount.map(|d| DiscountRate::from_percent(d).unwrap()),
                parent,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for e in &events {
            category.apply(e);
        }
        category
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = InMemoryCategoryStore::new();
        let category = new_category("Books", Some(10), None);
        let id = category.id_typed();

        store.save(category.clone(), ExpectedVersion::Exact(0)).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(category));
    }

    #[test]
    fn stale_version_is_a_conflict() {
        let store = InMemoryCategoryStore::new();
        let category = new_category("Books", None, None);
        store.save(category.clone(), ExpectedVersion::Exact(0)).unwrap();

        let err = store.save(category, ExpectedVersion::Exact(0)).unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
    }

    #[test]
    fn list_keeps_creation_order() {
        let store = InMemoryCategoryStore::new();
        let names = ["a", "b", "c", "d"];
        for n in names {
            store
                .save(new_category(n, None, None), ExpectedVersion::Exact(0))
                .unwrap();
        }

        let page = store.list(Pagination::new(Some(2), Some(2), 10)).unwrap();
        let got: Vec<_> = page.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(got, vec!["c", "d"]);
    }

    #[test]
    fn lookup_exposes_discount_and_parent() {
        let store = InMemoryCategoryStore::new();
        let root = new_category("Root", Some(25), None);
        let child = new_category("Child", None, Some(root.id_typed()));
        store.save(root.clone(), ExpectedVersion::Any).unwrap();
        store.save(child.clone(), ExpectedVersion::Any).unwrap();

        let link = store.category_link(child.id_typed()).unwrap().unwrap();
        assert_eq!(link.discount, None);
        assert_eq!(link.parent, Some(root.id_typed()));
        assert_eq!(store.category_link(CategoryId::new(AggregateId::new())), Ok(None));
    }

    #[test]
    fn poisoned_lock_is_a_lookup_failure_not_a_miss() {
        let store = Arc::new(InMemoryCategoryStore::new());
        let category = new_category("Books", Some(10), None);
        let id = category.id_typed();
        store.save(category, ExpectedVersion::Exact(0)).unwrap();

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the category table");
        })
        .join();

        assert!(store.category_link(id).is_err());
        assert_eq!(store.load(&id), Err(StoreError::Poisoned));
    }
}
