pub mod ai;
pub mod analysis;
pub mod project;
pub mod test_results;

pub use ai::*;
pub use analysis::*;
pub use project::*;
pub use test_results::*;

