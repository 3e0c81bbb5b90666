pub mod programs;
pub mod project;
pub mod render;
pub mod runs;
pub mod slice;
pub mod util;

pub use programs::*;
pub use project::*;
pub use render::*;
pub use runs::*;
pub use slice::*;
pub use util::*;
