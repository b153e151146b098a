//! Database models split into domain-specific modules.

pub mod common;
pub mod friendship;
pub mod goal;
pub mod user;
pub mod workout;

pub use common::*;
pub use friendship::*;
pub use goal::*;
pub use user::*;
pub use workout::*;
