pub mod playthrough;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use policy::GameplayStrategy;
pub use seeds::{resolve_seed_inputs, resolve_strategies, split_csv};
pub use tester::*;
