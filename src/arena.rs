//! Per-thread scratch arena for tent-local temporaries.
//!
//! Every matrix a tent kernel touches lives for at most one
//! `propagate_tent` call, so allocations are served from a fixed-capacity
//! bump allocator instead of the global heap. [`ScratchArena::mark`] returns
//! a position token and [`ScratchArena::reset`] releases everything
//! allocated since; sequentially nested mark/reset pairs compose.
//!
//! `alloc` hands out zeroed `&mut [f64]` slices through a shared borrow of
//! the arena, which lets a tent hold many live temporaries at once. The
//! borrow checker still rules out use-after-reset: `reset` takes
//! `&mut self`, so it cannot be called while any allocated slice is alive.
//!
//! Capacity is fixed at construction (10 MiB per worker unless configured
//! otherwise). Exhaustion is fatal: the caller sized the arena to the
//! largest tent working set, and running past it means that estimate — not
//! the solver state — is wrong.

use std::cell::{Cell, UnsafeCell};

/// Default arena capacity per worker thread: 10 MiB of `f64` storage.
pub const DEFAULT_ARENA_BYTES: usize = 10 * 1024 * 1024;

/// Position token returned by [`ScratchArena::mark`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(usize);

/// Fixed-capacity bump allocator over `f64` storage.
pub struct ScratchArena {
    buf: Box<[UnsafeCell<f64>]>,
    top: Cell<usize>,
}

// The arena is moved into exactly one worker thread and never shared across
// threads; `Send` is all the scheduler needs.
unsafe impl Send for ScratchArena {}

impl ScratchArena {
    /// Create an arena holding `bytes` of scratch storage (rounded down to
    /// whole `f64` slots).
    pub fn with_capacity_bytes(bytes: usize) -> Self {
        let len = bytes / std::mem::size_of::<f64>();
        let buf: Vec<UnsafeCell<f64>> = (0..len).map(|_| UnsafeCell::new(0.0)).collect();
        Self {
            buf: buf.into_boxed_slice(),
            top: Cell::new(0),
        }
    }

    /// Arena with the default per-thread capacity.
    pub fn with_default_capacity() -> Self {
        Self::with_capacity_bytes(DEFAULT_ARENA_BYTES)
    }

    /// Capacity in `f64` slots.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Slots currently in use.
    pub fn used(&self) -> usize {
        self.top.get()
    }

    /// Record the current allocation position.
    pub fn mark(&self) -> Mark {
        Mark(self.top.get())
    }

    /// Release every allocation made since `mark`.
    ///
    /// Requires `&mut self`: outstanding slices borrow the arena shared, so
    /// none can be alive across a reset.
    pub fn reset(&mut self, mark: Mark) {
        debug_assert!(mark.0 <= self.top.get(), "reset with a stale mark");
        self.top.set(mark.0);
    }

    /// Allocate a zeroed slice of `len` values.
    ///
    /// Panics when the request does not fit in the remaining capacity; an
    /// arena sized below the largest tent working set is a deployment error,
    /// not a recoverable condition.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc(&self, len: usize) -> &mut [f64] {
        if len == 0 {
            return &mut [];
        }
        let start = self.top.get();
        let end = start.checked_add(len).expect("arena request overflows");
        if end > self.buf.len() {
            panic!(
                "scratch arena exhausted: requested {} slots, {} of {} in use",
                len,
                start,
                self.buf.len()
            );
        }
        self.top.set(end);
        // SAFETY: [start, end) was exclusively claimed by bumping `top`
        // above; no other live slice covers it. The pointee is plain `f64`
        // behind `UnsafeCell`, and the returned borrow is tied to `&self`,
        // so `reset` (which takes `&mut self`) cannot invalidate it while
        // it lives.
        let slice = unsafe {
            std::slice::from_raw_parts_mut(self.buf[start].get(), len)
        };
        slice.fill(0.0);
        slice
    }
}

impl std::fmt::Debug for ScratchArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchArena")
            .field("capacity", &self.buf.len())
            .field("used", &self.top.get())
            .finish()
    }
}
