//! SQL generation: identifiers from the entity catalog only, values as parameters.

mod builder;
pub mod dialect;
pub mod params;
pub use builder::*;
pub use dialect::translate;
pub use params::*;
