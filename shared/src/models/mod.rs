//! Domain entities shared between server and clients

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderStatus};
pub use product::Product;
pub use user::{Actor, Role, UserProfile};
