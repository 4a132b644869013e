pub mod empty_dirs;
pub mod executor;
pub mod planner;

pub use empty_dirs::{remove_empty_dirs, simulate_empty_dirs, EmptyDirFilter, EmptyDirScope};
pub use executor::{CleanupExecutor, ExecutionReport};
pub use planner::{
    numbered_name, plan_duplicate_removal, plan_purge, CleanupPlanner, CollisionStyle,
    DestinationAllocator, DuplicateTarget, PlannerOptions,
};
