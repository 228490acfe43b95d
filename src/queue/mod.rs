//! Waiting pool for participants awaiting a team
//!
//! The pool is the only shared mutable state in the system. Formation passes
//! work on copies taken with [`WaitingPool::snapshot`] and hand back the
//! identities to remove.

pub mod pool;

pub use pool::WaitingPool;
