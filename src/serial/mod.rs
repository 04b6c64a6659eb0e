pub mod accumulator;
pub mod queue;
pub mod traits;

#[cfg(feature = "embedded")]
pub mod uart;

pub use accumulator::LineAccumulator;
pub use queue::{Line, LineQueue};
pub use traits::ByteSource;
