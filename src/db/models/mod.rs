//! Database Models

// Serde helpers
pub mod serde_helpers;

// Catalog & addresses (externally owned, referenced by the core)
pub mod address;
pub mod product;

// Orders
pub mod order;

// Re-exports
pub use address::{Address, AddressCreate, AddressSnapshot};
pub use order::{
    CartItem, CreateOrderRequest, Order, OrderDetail, OrderItem, OrderStatus, PaymentStatus,
    StatusUpdate,
};
pub use product::{Product, ProductCreate};
