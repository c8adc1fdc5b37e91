pub mod dispatch;
pub mod updates;

pub use dispatch::{DispatchError, EventDispatcher};
pub use updates::consume_updates;
