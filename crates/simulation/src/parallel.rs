//! Parallel execution helpers for the agent phases.
//!
//! The decision and revaluation phases iterate over the agent slots in
//! parallel when the `parallel` feature is enabled; the `cfg` split
//! lives here in ONE place so the runner reads the same either way.
//!
//! Order still matters: `map_mutex_slice` returns results in slot
//! order (rayon preserves it), so aggregation folds identically under
//! both execution modes, and every agent draws only from its own RNG
//! stream, so per-run determinism survives parallel scheduling.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use parking_lot::Mutex;

/// Map over a slice of Mutex-wrapped agents, locking each, and collect
/// the results in slot order.
#[inline]
pub fn map_mutex_slice<T, F, R>(slice: &[Mutex<T>], f: F) -> Vec<R>
where
    T: Send,
    F: Fn(&mut T) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        slice.par_iter().map(|m| f(&mut *m.lock())).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        slice.iter().map(|m| f(&mut *m.lock())).collect()
    }
}

/// Run a side-effecting closure over every Mutex-wrapped agent.
#[inline]
pub fn for_each_mutex_slice<T, F>(slice: &[Mutex<T>], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        slice.par_iter().for_each(|m| f(&mut *m.lock()));
    }

    #[cfg(not(feature = "parallel"))]
    {
        slice.iter().for_each(|m| f(&mut *m.lock()));
    }
}

/// Run a side-effecting closure for each listed index. Used where the
/// closure needs the slot index as well as the agent, e.g. opinion
/// delivery.
#[inline]
pub fn for_each_index<F>(indices: &[usize], f: F)
where
    F: Fn(usize) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        indices.par_iter().for_each(|&i| f(i));
    }

    #[cfg(not(feature = "parallel"))]
    {
        indices.iter().for_each(|&i| f(i));
    }
}
