//! Product Repository

use std::collections::HashMap;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use rust_decimal::Decimal;
use shared::models::{MAX_PORTION_PRICE, Product, ProductCreate};
use shared::util::{now_millis, snowflake_id};

use super::RepoResult;
use crate::db::StorageResult;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, ErrorCode};

/// Product documents: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("products");

pub(crate) fn create_tables(txn: &WriteTransaction) -> StorageResult<()> {
    let _ = txn.open_table(PRODUCTS_TABLE)?;
    Ok(())
}

#[derive(Clone)]
pub struct ProductRepository {
    db: Arc<Database>,
}

impl ProductRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, data: ProductCreate) -> RepoResult<Product> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&data.category, "category", MAX_NAME_LEN)?;
        if data.description.len() > MAX_NOTE_LEN {
            return Err(AppError::validation(format!(
                "description is too long ({} chars, max {MAX_NOTE_LEN})",
                data.description.len()
            ))
            .into());
        }
        validate_optional_text(&data.image_url, "imageUrl", MAX_URL_LEN)?;
        for (field, price) in [
            ("fullPortionPrice", data.full_portion_price),
            ("halfPortionPrice", data.half_portion_price),
        ] {
            if price < Decimal::ZERO || price > MAX_PORTION_PRICE {
                return Err(AppError::new(ErrorCode::ProductInvalidPrice)
                    .with_detail("field", field)
                    .with_detail("max", MAX_PORTION_PRICE.to_string())
                    .into());
            }
        }

        let product = Product {
            id: snowflake_id(),
            name: data.name.trim().to_string(),
            category: data.category.trim().to_string(),
            full_portion_price: data.full_portion_price,
            half_portion_price: data.half_portion_price,
            description: data.description,
            is_vegetarian: data.is_vegetarian,
            image_url: data.image_url.filter(|url| !url.trim().is_empty()),
            created_at: now_millis(),
        };

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(&product)?;
            table.insert(product.id, value.as_slice())?;
        }
        txn.commit()?;

        Ok(product)
    }

    pub fn find_by_id(&self, id: i64) -> RepoResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All products, grouped by category then name
    pub fn find_all(&self) -> RepoResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products: Vec<Product> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        products.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(products)
    }

    /// Load several products at once; missing IDs are simply absent
    pub fn find_many(&self, ids: &[i64]) -> RepoResult<HashMap<i64, Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = table.get(*id)? {
                let product: Product = serde_json::from_slice(value.value())?;
                products.insert(*id, product);
            }
        }
        Ok(products)
    }

    pub fn delete(&self, id: i64) -> RepoResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            table.remove(id)?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    fn paneer() -> ProductCreate {
        ProductCreate {
            name: "Paneer Tikka".into(),
            category: "Starters".into(),
            full_portion_price: Decimal::from(240),
            half_portion_price: Decimal::from(140),
            description: "Char-grilled cottage cheese".into(),
            is_vegetarian: true,
            image_url: None,
        }
    }

    #[test]
    fn test_create_and_find() {
        let repo = ProductRepository::new(DbService::open_in_memory().unwrap().db);
        let product = repo.create(paneer()).unwrap();

        assert_eq!(repo.find_by_id(product.id).unwrap(), Some(product.clone()));
        assert_eq!(repo.find_all().unwrap().len(), 1);

        let found = repo.find_many(&[product.id, 999]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&product.id));

        assert!(repo.delete(product.id).unwrap());
        assert!(!repo.delete(product.id).unwrap());
    }

    #[test]
    fn test_negative_price_rejected() {
        let repo = ProductRepository::new(DbService::open_in_memory().unwrap().db);
        let mut data = paneer();
        data.half_portion_price = Decimal::from(-1);
        let err: AppError = repo.create(data).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
    }

    #[test]
    fn test_price_above_limit_rejected() {
        let repo = ProductRepository::new(DbService::open_in_memory().unwrap().db);
        let mut data = paneer();
        data.full_portion_price = Decimal::MAX;
        let err: AppError = repo.create(data).unwrap_err().into();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
        assert!(repo.find_all().unwrap().is_empty());

        let mut at_limit = paneer();
        at_limit.full_portion_price = MAX_PORTION_PRICE;
        assert!(repo.create(at_limit).is_ok());
    }

    #[test]
    fn test_empty_description_allowed() {
        let repo = ProductRepository::new(DbService::open_in_memory().unwrap().db);
        let mut data = paneer();
        data.description = String::new();
        data.image_url = Some("  ".into());
        let product = repo.create(data).unwrap();
        assert!(product.image_url.is_none());
    }
}
