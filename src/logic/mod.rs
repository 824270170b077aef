pub mod labels;
pub mod resolve;
pub mod service;

pub use labels::*;
pub use resolve::*;
pub use service::*;
