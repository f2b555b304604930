// Observer system for side effects that follow committed writes

pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod traits;

// Re-export core types
pub use error::*;
pub use implementations::*;
pub use pipeline::*;
pub use traits::*;
