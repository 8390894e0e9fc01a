//! Sample models implementing the [`Model`](crate::framework::Model) trait.

pub mod comment;
pub mod shift;
pub mod team;
pub mod user;

pub use comment::*;
pub use shift::*;
pub use team::*;
pub use user::*;
