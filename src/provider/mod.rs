mod passthrough;
mod traits;
mod types;

pub use passthrough::PassthroughResolver;
pub use traits::Resolver;
pub use types::*;
