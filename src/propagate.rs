//! Dependency-driven parallel tent propagation.
//!
//! [`run_parallel_dependency`] runs a closure once per tent such that every
//! DAG predecessor has returned before a tent is entered, and every
//! successor is entered only afterwards. Independent frontier tents execute
//! concurrently on the rayon pool; the atomic indegree decrement
//! (release/acquire) establishes the happens-before edge the shared
//! solution vectors rely on.
//!
//! A failing tent poisons the run: in-flight work drains, tents that have
//! not started are skipped (their dependency counts still propagate so the
//! drain terminates), and the first error is re-raised to the caller.
//! Without the `parallel` feature the tents run sequentially in a
//! topological order with identical semantics.

use crate::error::{Result, TentError};

/// Forward dependency table of a tent slab.
///
/// `dependents[i]` lists the tents that read tent `i`'s output; the table
/// is produced by tent pitching and is acyclic by construction (causality
/// orders the tents).
#[derive(Clone, Debug, Default)]
pub struct DependencyDag {
    pub dependents: Vec<Vec<usize>>,
}

impl DependencyDag {
    pub fn from_dependents(dependents: Vec<Vec<usize>>) -> Self {
        Self { dependents }
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    /// Incoming-edge count per tent.
    pub fn indegrees(&self) -> Vec<usize> {
        let mut indeg = vec![0usize; self.len()];
        for deps in &self.dependents {
            for &j in deps {
                indeg[j] += 1;
            }
        }
        indeg
    }

    /// Kahn topological order; a cycle is an invariant violation.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let n = self.len();
        let mut indeg = self.indegrees();
        let mut ready: Vec<usize> = (0..n).filter(|&i| indeg[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop() {
            order.push(i);
            for &j in &self.dependents[i] {
                indeg[j] -= 1;
                if indeg[j] == 0 {
                    ready.push(j);
                }
            }
        }
        if order.len() != n {
            return Err(TentError::InvariantViolation(format!(
                "tent dependency table has a cycle: {} of {} tents reachable",
                order.len(),
                n
            )));
        }
        Ok(order)
    }
}

/// Run `f(i)` for every node of the DAG, respecting all dependencies.
#[cfg(feature = "parallel")]
pub fn run_parallel_dependency<F>(dag: &DependencyDag, f: F) -> Result<()>
where
    F: Fn(usize) -> Result<()> + Sync,
{
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct Ctx<'a, F> {
        dag: &'a DependencyDag,
        f: F,
        remaining: Vec<AtomicUsize>,
        done: AtomicUsize,
        poisoned: AtomicBool,
        first_error: Mutex<Option<TentError>>,
    }

    fn execute<'s, F>(scope: &rayon::Scope<'s>, i: usize, ctx: &'s Ctx<'s, F>)
    where
        F: Fn(usize) -> Result<()> + Sync,
    {
        if !ctx.poisoned.load(Ordering::Acquire) {
            if let Err(e) = (ctx.f)(i) {
                ctx.poisoned.store(true, Ordering::Release);
                let mut slot = ctx.first_error.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(e);
                }
            } else {
                ctx.done.fetch_add(1, Ordering::Relaxed);
            }
        }
        // AcqRel pairs the completion of f(i) with the entry of every
        // dependent: release on the last decrement, acquire on the spawn.
        for &j in &ctx.dag.dependents[i] {
            if ctx.remaining[j].fetch_sub(1, Ordering::AcqRel) == 1 {
                scope.spawn(move |s| execute(s, j, ctx));
            }
        }
    }

    let n = dag.len();
    if n == 0 {
        return Ok(());
    }

    let ctx = Ctx {
        dag,
        f,
        remaining: dag.indegrees().into_iter().map(AtomicUsize::new).collect(),
        done: AtomicUsize::new(0),
        poisoned: AtomicBool::new(false),
        first_error: Mutex::new(None),
    };

    rayon::scope(|s| {
        for i in 0..n {
            if ctx.remaining[i].load(std::sync::atomic::Ordering::Relaxed) == 0 {
                let ctx_ref = &ctx;
                s.spawn(move |s| execute(s, i, ctx_ref));
            }
        }
    });

    if let Some(e) = ctx.first_error.into_inner().unwrap() {
        return Err(e);
    }
    let done = ctx.done.load(Ordering::Relaxed);
    if done != n {
        return Err(TentError::InvariantViolation(format!(
            "tent dependency table has a cycle: only {} of {} tents executed",
            done, n
        )));
    }
    Ok(())
}

/// Sequential fallback: identical contract, one worker.
#[cfg(not(feature = "parallel"))]
pub fn run_parallel_dependency<F>(dag: &DependencyDag, f: F) -> Result<()>
where
    F: Fn(usize) -> Result<()> + Sync,
{
    for i in dag.topological_order()? {
        f(i)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn chain(n: usize) -> DependencyDag {
        DependencyDag::from_dependents(
            (0..n)
                .map(|i| if i + 1 < n { vec![i + 1] } else { vec![] })
                .collect(),
        )
    }

    #[test]
    fn test_all_nodes_execute() {
        let dag = chain(50);
        let count = AtomicUsize::new(0);
        run_parallel_dependency(&dag, |_| {
            count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
        .unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 50);
    }

    #[test]
    fn test_chain_runs_in_order() {
        let dag = chain(20);
        let seen = Mutex::new(Vec::new());
        run_parallel_dependency(&dag, |i| {
            seen.lock().unwrap().push(i);
            Ok(())
        })
        .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_diamond_dependencies_respected() {
        // 0 -> {1, 2} -> 3
        let dag = DependencyDag::from_dependents(vec![vec![1, 2], vec![3], vec![3], vec![]]);
        let seen = Mutex::new(Vec::new());
        run_parallel_dependency(&dag, |i| {
            seen.lock().unwrap().push(i);
            Ok(())
        })
        .unwrap();
        let seen = seen.into_inner().unwrap();
        let pos = |x: usize| seen.iter().position(|&v| v == x).unwrap();
        assert!(pos(0) < pos(1));
        assert!(pos(0) < pos(2));
        assert!(pos(1) < pos(3));
        assert!(pos(2) < pos(3));
    }

    #[test]
    fn test_first_error_is_reraised() {
        let dag = chain(10);
        let err = run_parallel_dependency(&dag, |i| {
            if i == 3 {
                Err(TentError::InvariantViolation("tent 3 failed".into()))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("tent 3"));
    }

    #[test]
    fn test_cycle_is_detected() {
        let dag = DependencyDag::from_dependents(vec![vec![1], vec![0]]);
        assert!(dag.topological_order().is_err());
        let err = run_parallel_dependency(&dag, |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_empty_dag() {
        let dag = DependencyDag::default();
        run_parallel_dependency(&dag, |_| Ok(())).unwrap();
    }
}
