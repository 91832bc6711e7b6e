pub mod common;
pub mod comparison;
pub mod comparison_type;
pub mod migration;
pub mod session;

pub use common::*;
pub use comparison::*;
pub use comparison_type::*;
pub use migration::*;
pub use session::*;
