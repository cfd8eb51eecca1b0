mod cache;
mod queue;

pub use cache::MemCache;
pub use queue::ExecutionQueue;
