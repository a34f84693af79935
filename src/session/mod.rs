pub mod chain;
pub mod engine;
pub mod error;

pub use engine::SessionUnit;
pub use error::DispatchError;
