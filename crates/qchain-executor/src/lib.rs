pub mod evm;
pub mod executor;
pub mod precompiles;
pub mod view;

pub use evm::{BlockContext, EvmExecutor, ExecutionOutcome, NoopEvmExecutor};
pub use executor::apply;
pub use precompiles::run_precompile;
pub use view::StateView;
