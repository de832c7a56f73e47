pub mod types;
pub mod error;
pub mod config;
pub mod paging;
pub mod rating;

pub use types::*;
pub use error::*;
pub use config::*;
pub use paging::*;
pub use rating::*;
