pub mod directory;
pub mod driver;
pub mod error;
pub mod gate;
pub mod hash;
pub mod mask;
pub mod metadata;
pub mod node;
pub mod queue;
pub mod walker;

pub use error::{WalkError, XsumError};
pub use hash::HashProvider;
pub use mask::Mask;
pub use node::Node;
