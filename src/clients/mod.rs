//! Query building and the transports that execute queries.

pub mod mock;
pub mod query;
pub mod service;
pub mod transport;

pub use query::*;
pub use service::*;
pub use transport::*;
