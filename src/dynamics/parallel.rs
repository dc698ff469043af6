//! Data-parallel helpers for per-particle passes.
//!
//! With the `parallel` feature the closures run on the rayon thread pool; without it
//! they run sequentially. Both paths produce identical results because every output
//! slot is written by exactly one closure call.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Evaluates `f` for every index in `0..count` and collects the results in order.
pub fn map_indices<T, F>(count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..count).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..count).map(f).collect()
    }
}

/// [`map_indices`] when `enabled`, a plain sequential map otherwise.
pub fn map_indices_if<T, F>(enabled: bool, count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if enabled {
        map_indices(count, f)
    } else {
        (0..count).map(f).collect()
    }
}

/// Applies `f` to every element of `items`.
pub fn for_each_mut<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.par_iter_mut().for_each(f);
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter_mut().for_each(f);
    }
}
