pub mod common;
pub mod instance;
pub mod reports;
pub mod schema;

pub use common::*;
pub use instance::*;
pub use reports::*;
pub use schema::*;
