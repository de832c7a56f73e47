pub mod jwt;
pub mod password;
pub mod bearer;

pub use jwt::*;
pub use password::*;
pub use bearer::*;
