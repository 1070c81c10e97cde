pub mod actor;
pub mod kind;
pub mod record;

pub use actor::*;
pub use kind::*;
pub use record::*;
