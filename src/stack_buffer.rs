//! Shared storage for the run stack and the preferred merge scratch.
//!
//! One fixed word buffer serves two tenants. Run end-offsets fill it from
//! the top downward, one `usize` per pending run plus a sentinel zero at
//! the very top. The bottom of the buffer doubles as scratch space for the
//! merge routine, which moves the shorter of two runs out of the slice
//! while interleaving. Offsets and scratch grow toward each other and
//! capacity checks keep them from meeting.
//!
//! Scratch elements are only ever live while a single merge is in flight;
//! the merge's hole guard moves every one of them back into the slice on
//! both normal return and unwind. Pushes happen strictly between merges,
//! so a new offset never lands on a live scratch element.

use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr;

use crate::cursor::{Cursor, Direction};

/// Buffer length in words.
///
/// The merge invariants force pending run lengths to grow at least as fast
/// as the Fibonacci numbers, so a word-sized input length can never stack
/// more than `word_bits / log2(phi)` runs, plus one slot for the sentinel.
/// The constant is 1 / log2(phi) in fixed point.
pub(crate) const RUN_STACK_CAP: usize =
    ((usize::BITS as u64 * 1_440_420_091) / 1_000_000_000) as usize + 2;

pub(crate) struct StackBuffer<T> {
    buf: [MaybeUninit<usize>; RUN_STACK_CAP],
    /// Next offset slot to write; offsets fill from the top end downward.
    top: usize,
    _elem: PhantomData<T>,
}

impl<T> StackBuffer<T> {
    pub(crate) fn new() -> Self {
        let mut this = Self {
            buf: [MaybeUninit::uninit(); RUN_STACK_CAP],
            top: RUN_STACK_CAP - 1,
            _elem: PhantomData,
        };
        // Sentinel: the bottom run always starts at offset 0.
        this.push(0);
        this
    }

    /// Number of offsets stored, sentinel included.
    fn offset_count(&self) -> usize {
        (RUN_STACK_CAP - 1) - self.top
    }

    /// Number of pending runs.
    pub(crate) fn run_count(&self) -> usize {
        self.offset_count() - 1
    }

    /// End offset of the run `depth` positions below the top of the stack.
    /// Depth 0 is the newest run; the run it denotes starts at the offset
    /// one depth further down.
    pub(crate) fn offset(&self, depth: usize) -> usize {
        debug_assert!(depth < self.offset_count());
        // SAFETY: every slot above `top` holds an initialized offset.
        unsafe { self.buf[self.top + 1 + depth].assume_init() }
    }

    /// Record the end offset of a newly found run.
    pub(crate) fn push(&mut self, run_end: usize) {
        debug_assert!(self.top > 0, "run stack overflow");
        self.buf[self.top].write(run_end);
        self.top -= 1;
    }

    /// Forget the boundary at `depth` after the run above it merged with
    /// the run below it. Shallower offsets slide one slot deeper.
    pub(crate) fn remove_run(&mut self, depth: usize) {
        debug_assert!((1..self.run_count()).contains(&depth));
        for d in (1..=depth).rev() {
            let shallower = self.offset(d - 1);
            self.buf[self.top + 1 + d].write(shallower);
        }
        self.top += 1;
    }

    /// Bytes between the buffer base and the first scratch slot that keep
    /// scratch elements aligned for `T`. The word-aligned buffer cannot
    /// promise more than `usize` alignment statically.
    fn scratch_pad_bytes(&self) -> usize {
        let addr = self.buf.as_ptr() as usize;
        addr.wrapping_neg() & (mem::align_of::<T>() - 1)
    }

    fn scratch_base(&mut self) -> *mut T {
        let pad = self.scratch_pad_bytes();
        // SAFETY: callers only reach scratch through a positive
        // can_acquire_merge_buffer answer, which accounts for the pad.
        unsafe { (self.buf.as_mut_ptr() as *mut u8).add(pad) as *mut T }
    }

    /// Elements of scratch currently available below the run stack.
    fn scratch_capacity(&self) -> usize {
        debug_assert!(mem::size_of::<T>() > 0);
        let free = (RUN_STACK_CAP - self.offset_count()) * mem::size_of::<usize>();
        free.saturating_sub(self.scratch_pad_bytes()) / mem::size_of::<T>()
    }

    /// True if a merge buffering `n` elements fits in the stack scratch.
    pub(crate) fn can_acquire_merge_buffer(&self, n: usize) -> bool {
        n <= self.scratch_capacity()
    }

    /// Move the directed `n`-element block at `src` into the stack scratch,
    /// preserving its traversal direction. The caller owns the buffered
    /// elements through the returned handle and must move every one of them
    /// back into the slice before its merge ends.
    ///
    /// SAFETY: `src` must be valid for `n` elements, `n` at least 1, and
    /// `can_acquire_merge_buffer(n)` must hold.
    pub(crate) unsafe fn move_to_merge_buffer<D: Direction>(
        &mut self,
        src: Cursor<T, D>,
        n: usize,
    ) -> Cursor<T, D> {
        debug_assert!(n >= 1 && self.can_acquire_merge_buffer(n));
        let base = self.scratch_base();
        ptr::copy_nonoverlapping(src.block_base(n), base, n);
        Cursor::into_scratch(base, n)
    }

    /// Third-from-top run no longer than the top two combined.
    pub(crate) fn merge_abc_case_1(&self) -> bool {
        self.offset(2) - self.offset(3) <= self.offset(0) - self.offset(2)
    }

    /// The same check one level deeper. Checking only the top three runs
    /// is the classic timsort stack bug: an invariant-violating run can
    /// stay buried and break the Fibonacci bound on the stack depth. See
    /// http://envisage-project.eu/wp-content/uploads/2015/02/sorting.pdf
    pub(crate) fn merge_abc_case_2(&self) -> bool {
        self.offset(3) - self.offset(4) <= self.offset(1) - self.offset(3)
    }

    /// Given that one of the two checks above fired, true if the deeper
    /// pair of runs should merge: the third-from-top run is shorter than
    /// the top one.
    pub(crate) fn merge_ab(&self) -> bool {
        self.offset(2) - self.offset(3) < self.offset(0) - self.offset(1)
    }

    /// Second-from-top run no longer than the top run.
    pub(crate) fn merge_bc(&self) -> bool {
        self.offset(1) - self.offset(2) <= self.offset(0) - self.offset(1)
    }
}
