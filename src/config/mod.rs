pub mod entities;
pub mod settings;

pub use entities::*;
pub use settings::*;
