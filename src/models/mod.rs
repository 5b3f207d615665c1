pub mod series;
pub mod snapshot;
pub mod target;

pub use series::*;
pub use snapshot::*;
pub use target::*;
