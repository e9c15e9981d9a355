use std::collections::HashMap;
use std::sync::RwLock;

use catalog_core::{AggregateRoot, ExpectedVersion, Pagination};
use catalog_pricing::{LookupError, ProductLink, ProductLookup, ProductRef};
use catalog_products::{Product, ProductId};

use super::{AggregateStore, StoreError, check_version};

#[derive(Debug, Default)]
struct ProductTable {
    by_id: HashMap<ProductId, Product>,
    by_code: HashMap<String, ProductId>,
    order: Vec<ProductId>,
}

/// In-memory product store.
///
/// The code index and the records sit behind one lock, so the uniqueness
/// check and the write are a single atomic step.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<ProductTable>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_code(&self, code: &str) -> Result<Option<Product>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table
            .by_code
            .get(code.trim())
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    /// Fails with `DuplicateCode` if another product holds `code`.
    pub fn ensure_code_available(&self, code: &str, owner: ProductId) -> Result<(), StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        match table.by_code.get(code.trim()) {
            Some(existing) if *existing != owner => Err(StoreError::DuplicateCode(code.trim().to_string())),
            _ => Ok(()),
        }
    }
}

impl AggregateStore<Product> for InMemoryProductStore {
    fn load(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(table.by_id.get(id).cloned())
    }

    fn save(&self, product: Product, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut table = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let id = product.id_typed();

        if let Some(owner) = table.by_code.get(product.code()) {
            if *owner != id {
                return Err(StoreError::DuplicateCode(product.code().to_string()));
            }
        }

        let previous_code = match table.by_id.get(&id) {
            Some(previous) => {
                check_version(expected, previous.version())?;
                Some(previous.code().to_string())
            }
            None => {
                check_version(expected, 0)?;
                None
            }
        };

        match previous_code {
            Some(old) if old != product.code() => {
                table.by_code.remove(&old);
            }
            Some(_) => {}
            None => table.order.push(id),
        }

        table.by_code.insert(product.code().to_string(), id);
        table.by_id.insert(id, product);
        Ok(())
    }

    fn list(&self, pagination: Pagination) -> Result<Vec<Product>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(pagination.apply(table.order.iter().filter_map(|id| table.by_id.get(id).cloned())))
    }
}

impl ProductLookup for InMemoryProductStore {
    fn product_link(&self, product: &ProductRef) -> Result<Option<ProductLink>, LookupError> {
        let table = self
            .inner
            .read()
            .map_err(|_| LookupError(StoreError::Poisoned.to_string()))?;
        let record = match product {
            ProductRef::Id(id) => table.by_id.get(id),
            ProductRef::Code(code) => table
                .by_code
                .get(code.trim())
                .and_then(|id| table.by_id.get(id)),
        };
        let Some(record) = record else {
            return Ok(None);
        };
        tracing::debug!(product_id = %record.id_typed(), code = record.code(), "product lookup");
        Ok(Some(ProductLink {
            id: record.id_typed(),
            discount: record.discount(),
            category: record.category(),
        }))
    }
}
