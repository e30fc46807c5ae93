pub mod core;
pub use self::core::*;

pub mod catalog;
pub use self::catalog::*;

pub mod calendar;
pub use self::calendar::*;

pub use super::schema;
