//! Order Sheet Aggregate
//!
//! In-memory, per-process state: the ordered list of extracted products plus
//! the per-variation quantity entries the operator fills in. Each item gets
//! a synthetic id at append time, and quantities key on `(item id, sku)`, so
//! removal never re-associates entries the way positional keys would.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::product::ProductData;

/// One extracted product on the sheet, with provenance.
#[derive(Clone, Debug, Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
    pub data: ProductData,
}

#[derive(Debug, Default)]
pub struct OrderSheet {
    items: Vec<OrderItem>,
    quantities: HashMap<(Uuid, String), String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSheetError {
    ItemNotFound,
}
impl std::error::Error for OrderSheetError {}
impl std::fmt::Display for OrderSheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item not found")
    }
}

impl OrderSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends a freshly extracted product and returns its sheet entry.
    pub fn add(&mut self, source_url: impl Into<String>, data: ProductData) -> OrderItem {
        let item = OrderItem {
            id: Uuid::new_v4(),
            source_url: source_url.into(),
            extracted_at: Utc::now(),
            data,
        };
        self.items.push(item.clone());
        item
    }

    /// Removes one item and its quantity entries. Other items keep their
    /// relative order and quantities.
    pub fn remove(&mut self, id: Uuid) -> Result<(), OrderSheetError> {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before {
            return Err(OrderSheetError::ItemNotFound);
        }
        self.quantities.retain(|(item_id, _), _| *item_id != id);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.quantities.clear();
    }

    /// Stores a free-text quantity for one variation. Entries are created
    /// lazily; a blank value deletes the entry.
    pub fn set_quantity(
        &mut self,
        id: Uuid,
        sku: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), OrderSheetError> {
        if !self.items.iter().any(|i| i.id == id) {
            return Err(OrderSheetError::ItemNotFound);
        }
        let value = value.into();
        if value.trim().is_empty() {
            self.quantities.remove(&(id, sku.into()));
        } else {
            self.quantities.insert((id, sku.into()), value);
        }
        Ok(())
    }

    pub fn quantity(&self, id: Uuid, sku: &str) -> Option<&str> {
        self.quantities
            .get(&(id, sku.to_string()))
            .map(String::as_str)
    }

    /// Sum of all quantity entries parsed as integers; non-numeric text
    /// counts as zero. Computed on demand, never stored.
    pub fn total_units(&self) -> i64 {
        self.quantities
            .values()
            .map(|v| v.trim().parse::<i64>().unwrap_or(0))
            .sum()
    }

    /// Bare product records in sheet order, for the copy-JSON export.
    pub fn export(&self) -> Vec<ProductData> {
        self.items.iter().map(|i| i.data.clone()).collect()
    }

    /// Serializable view of the whole sheet.
    pub fn snapshot(&self) -> OrderSheetView {
        OrderSheetView {
            items: self
                .items
                .iter()
                .map(|item| OrderItemView {
                    id: item.id,
                    source_url: item.source_url.clone(),
                    extracted_at: item.extracted_at,
                    data: item.data.clone(),
                    quantities: self
                        .quantities
                        .iter()
                        .filter(|((item_id, _), _)| *item_id == item.id)
                        .map(|((_, sku), qty)| (sku.clone(), qty.clone()))
                        .collect(),
                })
                .collect(),
            total_units: self.total_units(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderSheetView {
    pub items: Vec<OrderItemView>,
    pub total_units: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct OrderItemView {
    pub id: Uuid,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
    pub data: ProductData,
    pub quantities: HashMap<String, String>,
}
