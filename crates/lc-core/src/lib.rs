pub mod client;
pub mod error;
pub mod types;
pub mod value;

pub use client::{NullClient, StoreClient, StoreCommand};
pub use error::LuaCallError;
pub use types::*;
pub use value::*;
