//! Domain module
pub mod order;
pub mod product;

pub use order::{OrderItem, OrderItemView, OrderSheet, OrderSheetError, OrderSheetView};
pub use product::{ProductData, ProductType, Variation};
