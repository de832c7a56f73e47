pub mod models;
pub mod store;
pub mod memory;
pub mod postgres;
pub mod connection;
pub mod migrations;

pub use models::*;
pub use store::*;
pub use memory::*;
pub use postgres::*;
pub use connection::*;
pub use migrations::*;
