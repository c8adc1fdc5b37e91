pub mod content;
pub mod identifier;
pub mod retry;
pub mod size;

pub use content::ContentKind;
pub use identifier::{IdGenerator, Identifier, IdentifierError, RandomIdGenerator};
pub use size::human_size;
