//! Natural-run detection and the run-stack driver.

use std::slice;

use crate::gallop::GALLOP_WIN_DIST;
use crate::insert::finish_insertion_sort;
use crate::merge::merge_runs;
use crate::minrun::{compute_minrun, max_minrun};
use crate::stack_buffer::StackBuffer;

/// Sort dispatch. Slices no longer than the largest possible minrun are a
/// single insertion-sorted run and never build the engine state, which
/// also means no allocation for them under any circumstances.
pub(crate) fn timsort<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    if v.len() > max_minrun::<T>() {
        let mut sort = TimSort {
            base: v.as_mut_ptr(),
            len: v.len(),
            position: 0,
            minrun: compute_minrun::<T>(v.len()),
            min_gallop: GALLOP_WIN_DIST,
            stack: StackBuffer::new(),
            heap: Vec::new(),
        };
        sort.fill_run_stack(is_less);
        sort.collapse_run_stack(is_less);
    } else {
        finish_insertion_sort(v, 1, is_less);
    }
}

struct TimSort<T> {
    /// Start of the slice being sorted. The slice is exclusively borrowed
    /// for the whole sort; all access goes through this pointer.
    base: *mut T,
    len: usize,
    /// Scan frontier. [0, position) is covered by the pending runs on the
    /// stack, [position, len) is untouched.
    position: usize,
    /// Forced minimum run length for this input size.
    minrun: usize,
    /// Consecutive-win threshold at which merges switch into galloping
    /// mode. One value for the whole sort, so what the merges learn about
    /// the data carries over from one merge to the next.
    min_gallop: usize,
    stack: StackBuffer<T>,
    /// Fallback merge buffer for runs the stack scratch cannot hold.
    heap: Vec<T>,
}

impl<T> TimSort<T> {
    /// Keep pushing runs, restoring the stack invariants between pushes.
    fn fill_run_stack<F>(&mut self, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.push_next_run(is_less);
        if self.position == self.len {
            return;
        }
        self.push_next_run(is_less);
        while self.position < self.len {
            self.resolve_invariants(is_less);
            self.push_next_run(is_less);
        }
    }

    /// Merge the top two runs until only one remains.
    fn collapse_run_stack<F>(&mut self, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        for _ in 1..self.stack.run_count() {
            self.merge_bc(is_less);
        }
        debug_assert!(self.stack.run_count() == 1 && self.stack.offset(0) == self.len);
    }

    /// Detect the next natural run, reverse it if it starts strictly
    /// descending, force it to minrun length if it came up short, and push
    /// its end offset.
    fn push_next_run<F>(&mut self, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(self.position < self.len);
        let remain = self.len - self.position;
        if remain > 1 {
            // SAFETY: [position, len) is in bounds and not aliased; the
            // pending runs all lie below position.
            let v = unsafe { slice::from_raw_parts_mut(self.base.add(self.position), remain) };
            let mut idx = 2;
            if is_less(&v[1], &v[0]) {
                // Strictly descending start. Strictness matters: a run of
                // equal elements must not be reversed, or stability dies.
                while idx < remain && is_less(&v[idx], &v[idx - 1]) {
                    idx += 1;
                }
                v[..idx].reverse();
            }
            // The elements after a reversed prefix may continue it upward,
            // so the ascending scan always runs.
            while idx < remain && !is_less(&v[idx], &v[idx - 1]) {
                idx += 1;
            }
            if idx < remain && idx < self.minrun {
                let extend_to = self.minrun.min(remain);
                finish_insertion_sort(&mut v[..extend_to], idx, is_less);
                idx = extend_to;
            }
            self.position += idx;
        } else {
            self.position = self.len;
        }
        self.stack.push(self.position);
    }

    /// Restore the run-length invariants on top of the stack: with the
    /// topmost runs labelled ..., W, X, Y, Z, keep X > Y + Z, keep the
    /// same one level down (W > X + Y), and keep Y > Z. When one of the
    /// first two fails, Y merges with the smaller of X and Z.
    ///
    /// The one-level-down check is the fix for the classic timsort bug;
    /// enforcing the invariant only on the top three runs can leave a
    /// violating run buried in the stack.
    fn resolve_invariants<F>(&mut self, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        let mut run_count = self.stack.run_count();
        loop {
            if (run_count > 2 && self.stack.merge_abc_case_1())
                || (run_count > 3 && self.stack.merge_abc_case_2())
            {
                if self.stack.merge_ab() {
                    self.merge_ab(is_less);
                } else {
                    self.merge_bc(is_less);
                }
            } else if self.stack.merge_bc() {
                self.merge_bc(is_less);
            } else {
                break;
            }
            run_count -= 1;
            if run_count < 2 {
                break;
            }
        }
    }

    /// Merge the top two runs.
    fn merge_bc<F>(&mut self, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.merge_span(
            self.stack.offset(2),
            self.stack.offset(1),
            self.stack.offset(0),
            is_less,
        );
        self.stack.remove_run(1);
    }

    /// Merge the second and third runs from the top.
    fn merge_ab<F>(&mut self, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.merge_span(
            self.stack.offset(3),
            self.stack.offset(2),
            self.stack.offset(1),
            is_less,
        );
        self.stack.remove_run(2);
    }

    fn merge_span<F>(&mut self, lo: usize, mid: usize, hi: usize, is_less: &mut F)
    where
        F: FnMut(&T, &T) -> bool,
    {
        debug_assert!(lo < mid && mid < hi && hi <= self.len);
        // SAFETY: run-stack offsets are strictly increasing and bounded by
        // len, and each adjacent pair delimits a sorted run.
        unsafe {
            merge_runs(
                &mut self.stack,
                &mut self.heap,
                &mut self.min_gallop,
                self.base,
                lo,
                mid,
                hi,
                is_less,
            );
        }
    }
}
