pub mod memory;
pub mod payload_cache;
pub mod postgres;
pub mod traits;
pub mod type_registry;

pub use memory::*;
pub use payload_cache::*;
pub use postgres::*;
pub use traits::*;
pub use type_registry::*;
