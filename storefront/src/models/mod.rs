// storefront/src/models/mod.rs

//! Data structures representing database entities and request payloads.

pub mod admin;
pub mod cart;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod product;
pub mod user;

pub use admin::Admin;
pub use cart::{CartItemInput, CartLine, PlaceOrderRequest, ValidatedCart, MAX_MONEY};
pub use order::{NewOrder, Order, OrderLineView, OrderStatus, OrderView};
pub use order_item::OrderItem;
pub use payment::{NewPayment, Payment, PaymentStatus};
pub use product::{NewProduct, Product, ProductPatch};
pub use user::{NewUser, ProfileUpdate, User};
