pub mod fetch;
pub mod retry;
pub mod symbol;
pub mod window;

pub use fetch::*;
pub use retry::RetryPolicy;
pub use symbol::Symbol;
pub use window::{BoundedWindow, Snapshot};
