//! Run merging: gallop trimming, scratch selection, and the two-mode
//! (linear / galloping) merge loop.

use std::ptr;

use crate::cursor::{relocate, relocate_disjoint, Backward, Cursor, Direction, Forward};
use crate::gallop::{gallop_upper_bound, lower_bound, upper_bound, GALLOP_WIN_DIST};
use crate::stack_buffer::StackBuffer;

/// Merge the adjacent sorted runs `v[lo..mid]` and `v[mid..hi]` in place.
///
/// Both ends are trimmed first: elements of the left run that already
/// precede the right run's head, and elements of the right run that do not
/// precede the left run's tail, are in their final positions and take no
/// further part. The smaller trimmed side is then buffered and the merge
/// runs toward the larger side, so the buffer never exceeds half the
/// merged span. Merging toward the right end reuses the forward routine
/// with backward handles and a reversed comparator.
///
/// SAFETY: `lo < mid < hi <=` slice length, and both subranges must be
/// sorted by `is_less`.
pub(crate) unsafe fn merge_runs<T, F>(
    stack: &mut StackBuffer<T>,
    heap: &mut Vec<T>,
    min_gallop: &mut usize,
    base: *mut T,
    lo: usize,
    mid: usize,
    hi: usize,
    is_less: &mut F,
) where
    F: FnMut(&T, &T) -> bool,
{
    debug_assert!(lo < mid && mid < hi);

    let lo = lo
        + gallop_upper_bound(
            Cursor::<T, Forward>::new(base.add(lo)),
            mid - lo,
            &*base.add(mid),
            is_less,
        );
    let hi = hi
        - gallop_upper_bound(
            Cursor::<T, Backward>::new(base.add(hi - 1)),
            hi - mid,
            &*base.add(mid - 1),
            &mut |a: &T, b: &T| is_less(b, a),
        );

    // The trims are coupled: when one empties its side the runs were
    // already in order and the other side empties too.
    if lo < mid && mid < hi {
        if hi - mid > mid - lo {
            do_merge::<T, Forward, _>(stack, heap, min_gallop, base, lo, mid, hi, is_less);
        } else {
            do_merge::<T, Backward, _>(
                stack,
                heap,
                min_gallop,
                base,
                lo,
                mid,
                hi,
                &mut |a: &T, b: &T| is_less(b, a),
            );
        }
    }
}

/// Buffer the side the merge consumes from (`[lo, mid)` going forward,
/// `[mid, hi)` going backward) and interleave the rest.
unsafe fn do_merge<T, D, C>(
    stack: &mut StackBuffer<T>,
    heap: &mut Vec<T>,
    min_gallop: &mut usize,
    base: *mut T,
    lo: usize,
    mid: usize,
    hi: usize,
    cmp: &mut C,
) where
    D: Direction,
    C: FnMut(&T, &T) -> bool,
{
    let (src, llen, right, rlen, dest) = if D::FORWARD {
        (
            Cursor::<T, D>::new(base.add(lo)),
            mid - lo,
            Cursor::<T, D>::new(base.add(mid)),
            hi - mid,
            Cursor::<T, D>::new(base.add(lo)),
        )
    } else {
        (
            Cursor::<T, D>::new(base.add(hi - 1)),
            hi - mid,
            Cursor::<T, D>::new(base.add(mid - 1)),
            mid - lo,
            Cursor::<T, D>::new(base.add(hi - 1)),
        )
    };

    let left = if stack.can_acquire_merge_buffer(llen) {
        stack.move_to_merge_buffer(src, llen)
    } else {
        move_to_heap_buffer(heap, src, llen)
    };

    gallop_merge(min_gallop, left, llen, right, rlen, dest, cmp);
}

/// Heap fallback for the merge buffer. The vector's length stays zero so
/// it can never drop buffered elements out from under the merge hole, even
/// when the comparator panics.
unsafe fn move_to_heap_buffer<T, D>(heap: &mut Vec<T>, src: Cursor<T, D>, n: usize) -> Cursor<T, D>
where
    D: Direction,
{
    debug_assert!(heap.is_empty());
    // reserve_exact sidesteps the doubling growth policy. The allocation
    // is kept for the rest of the sort, so it only ever grows to the
    // largest buffered run.
    heap.reserve_exact(n);
    let scratch = heap.as_mut_ptr();
    ptr::copy_nonoverlapping(src.block_base(n), scratch, n);
    Cursor::into_scratch(scratch, n)
}

/// Tracks the unconsumed buffered elements and the gap they belong in. The
/// merge loop keeps the gap ahead of `dest` exactly `lrem` elements wide;
/// dropping the hole moves the remainder back, which both flushes the tail
/// of the left run on normal exit and restores the slice to a permutation
/// of its input when the comparator panics.
struct MergeHole<T, D: Direction> {
    left: Cursor<T, D>,
    lrem: usize,
    dest: Cursor<T, D>,
}

impl<T, D: Direction> Drop for MergeHole<T, D> {
    fn drop(&mut self) {
        // SAFETY: the buffered block is disjoint from the slice and the
        // gap at dest is exactly lrem elements.
        unsafe { relocate_disjoint(self.left, self.dest, self.lrem) }
    }
}

#[derive(Clone, Copy)]
enum GallopSide {
    Left,
    Right,
}

/// Interleave the buffered left range with the in-place right range.
///
/// Linear mode is the classic two-finger merge, counting consecutive wins
/// per side. Once one side wins `min_gallop` times in a row the loop
/// switches to galloping on that side: probe exponentially for the
/// boundary, binary-search the last interval, move the whole winning block
/// at once, then gallop the other side, alternating until both gallops
/// come up shorter than `GALLOP_WIN_DIST`. Every continued gallop cycle
/// lowers `min_gallop` (floor 1) and every fallback to linear mode raises
/// it, so the mode choice adapts to how clustered equal-side elements are.
///
/// Trimming guarantees the final element comes from the left range, so
/// only right-side exhaustion ends the merge and the left remainder is
/// flushed by the hole guard. The `lrem` checks below do not fire for any
/// strict weak order; they keep comparators that violate one inside the
/// buffered block instead of reading past it.
///
/// SAFETY: `left` must own `llen` buffered elements disjoint from the
/// slice, `right`/`dest` must describe the trimmed gap layout produced by
/// `do_merge`, and both lengths must be nonzero.
unsafe fn gallop_merge<T, D, C>(
    min_gallop: &mut usize,
    left: Cursor<T, D>,
    llen: usize,
    mut right: Cursor<T, D>,
    mut rrem: usize,
    dest: Cursor<T, D>,
    cmp: &mut C,
) where
    D: Direction,
    C: FnMut(&T, &T) -> bool,
{
    debug_assert!(llen > 0 && rrem > 0);

    let mut hole = MergeHole {
        left,
        lrem: llen,
        dest,
    };
    let mut num_galloped = 0;

    loop {
        // Linear mode. A nonzero num_galloped means this is a re-entry
        // from galloping mode, which always hands over one left-side win.
        let mut lcount = (num_galloped > 0) as usize;
        let mut rcount = 0;
        let side = loop {
            if cmp(&*right.get(), &*hole.left.get()) {
                relocate_disjoint(right, hole.dest, 1);
                right.advance(1);
                hole.dest.advance(1);
                rrem -= 1;
                if rrem == 0 {
                    return;
                }
                rcount += 1;
                if rcount >= *min_gallop {
                    break GallopSide::Right;
                }
                lcount = 0;
            } else {
                relocate_disjoint(hole.left, hole.dest, 1);
                hole.left.advance(1);
                hole.dest.advance(1);
                hole.lrem -= 1;
                if hole.lrem == 0 {
                    return;
                }
                lcount += 1;
                if lcount >= *min_gallop {
                    break GallopSide::Left;
                }
                rcount = 0;
            }
        };

        // Galloping mode.
        num_galloped = 0;
        let mut side = side;
        loop {
            match side {
                GallopSide::Left => {
                    // Upper bound of the right head within the left range:
                    // equal elements stay left, keeping the merge stable.
                    let pivot = &*right.get();
                    while num_galloped < hole.lrem && !cmp(pivot, &*hole.left.at(num_galloped)) {
                        num_galloped = 2 * num_galloped + 1;
                    }
                    let bounded = hole.lrem.min(num_galloped);
                    let probe = num_galloped / 2;
                    let take =
                        probe + upper_bound(hole.left.skip(probe), bounded - probe, pivot, cmp);
                    relocate_disjoint(hole.left, hole.dest, take);
                    hole.left.advance(take);
                    hole.dest.advance(take);
                    hole.lrem -= take;
                    if hole.lrem == 0 {
                        return;
                    }
                    lcount = take;
                    // The left gallop stopped exactly where the right head
                    // precedes the left element, so the right gallop can
                    // start probing at index 1.
                    num_galloped = 1;
                    side = GallopSide::Right;
                }
                GallopSide::Right => {
                    // Strict lower bound of the left head within the right
                    // range, the mirror of the rule above.
                    let pivot = &*hole.left.get();
                    while num_galloped < rrem && cmp(&*right.at(num_galloped), pivot) {
                        num_galloped = 2 * num_galloped + 1;
                    }
                    let bounded = rrem.min(num_galloped);
                    let probe = num_galloped / 2;
                    let take = probe + lower_bound(right.skip(probe), bounded - probe, pivot, cmp);
                    // The gap may be narrower than the block; this move
                    // can overlap.
                    relocate(right, hole.dest, take);
                    right.advance(take);
                    hole.dest.advance(take);
                    rrem -= take;
                    if rrem == 0 {
                        return;
                    }
                    rcount = take;
                    if lcount < GALLOP_WIN_DIST && rcount < GALLOP_WIN_DIST {
                        break;
                    }
                    if *min_gallop > 1 {
                        *min_gallop -= 1;
                    }
                    num_galloped = 1;
                    side = GallopSide::Left;
                }
            }
        }

        // Both gallops came up short; linear mode is cheaper again. The
        // last right gallop proved the right head does not precede the
        // left head, so one left element moves without a comparison.
        *min_gallop += 1;
        relocate_disjoint(hole.left, hole.dest, 1);
        hole.left.advance(1);
        hole.dest.advance(1);
        hole.lrem -= 1;
        if hole.lrem == 0 {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge_halves(v: &mut Vec<i32>, mid: usize) -> usize {
        let mut stack = StackBuffer::new();
        let mut heap = Vec::new();
        let mut min_gallop = GALLOP_WIN_DIST;
        let len = v.len();
        unsafe {
            merge_runs(
                &mut stack,
                &mut heap,
                &mut min_gallop,
                v.as_mut_ptr(),
                0,
                mid,
                len,
                &mut |a: &i32, b: &i32| a < b,
            );
        }
        min_gallop
    }

    #[test]
    fn interleaved_runs() {
        let mut v: Vec<i32> = (0..50).map(|i| i * 2).chain((0..50).map(|i| i * 2 + 1)).collect();
        merge_halves(&mut v, 50);
        assert_eq!(v, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn disjoint_runs_trim_to_nothing() {
        let mut v: Vec<i32> = (0..100).collect();
        let comps_free = merge_halves(&mut v, 50);
        assert_eq!(v, (0..100).collect::<Vec<_>>());
        // Already-ordered runs never reach the merge loop, so the
        // adaptive threshold is untouched.
        assert_eq!(comps_free, GALLOP_WIN_DIST);
    }

    #[test]
    fn one_sided_runs_gallop() {
        // All of the right run lands inside one spot of the left run.
        let mut v: Vec<i32> = (0..90).map(|i| i * 10).collect();
        v.extend((0..30).map(|i| 451 + i));
        merge_halves(&mut v, 90);
        let mut expected: Vec<i32> = (0..90).map(|i| i * 10).collect();
        expected.extend((0..30).map(|i| 451 + i));
        expected.sort();
        assert_eq!(v, expected);
    }

    #[test]
    fn backward_merge_is_stable() {
        // Right run smaller, so the merge runs backward. Equal keys must
        // keep left-run elements first.
        let mut v: Vec<(i32, u8)> = Vec::new();
        v.extend((0..40).map(|i| (i / 2, 0u8)));
        v.extend((5..15).map(|i| (i, 1u8)));
        let mid = 40;
        let mut stack = StackBuffer::new();
        let mut heap = Vec::new();
        let mut min_gallop = GALLOP_WIN_DIST;
        let len = v.len();
        unsafe {
            merge_runs(
                &mut stack,
                &mut heap,
                &mut min_gallop,
                v.as_mut_ptr(),
                0,
                mid,
                len,
                &mut |a: &(i32, u8), b: &(i32, u8)| a.0 < b.0,
            );
        }
        let mut expected: Vec<(i32, u8)> = Vec::new();
        expected.extend((0..40).map(|i| (i / 2, 0u8)));
        expected.extend((5..15).map(|i| (i, 1u8)));
        expected.sort_by_key(|p| p.0);
        assert_eq!(v, expected);
    }

    #[test]
    fn heap_fallback_used_when_scratch_is_small() {
        // Runs far larger than the stack buffer force the heap path.
        let n = 20_000;
        let mut v: Vec<i32> = (0..n).map(|i| i * 2).chain((0..n).map(|i| i * 2 + 1)).collect();
        let mut stack = StackBuffer::new();
        let mut heap = Vec::new();
        let mut min_gallop = GALLOP_WIN_DIST;
        let len = v.len();
        unsafe {
            merge_runs(
                &mut stack,
                &mut heap,
                &mut min_gallop,
                v.as_mut_ptr(),
                0,
                n as usize,
                len,
                &mut |a: &i32, b: &i32| a < b,
            );
        }
        // Trimming shaves one element off each end before buffering.
        assert!(heap.capacity() >= n as usize - 1);
        assert_eq!(v, (0..2 * n).collect::<Vec<_>>());
    }
}
