//! Insertion sort used to complete short natural runs.

use std::mem::ManuallyDrop;
use std::ptr;

use crate::minrun::{max_minrun, use_linear_insertion};

/// Extend the sorted prefix `v[..offset]` until all of `v` is sorted.
///
/// Cheap-to-move value types always use the linear shifting insert; the
/// comparison there costs about as much as the move it saves, so a binary
/// search buys nothing. Other types insert linearly only near the front of
/// the run and switch to binary placement once the sorted prefix is long
/// enough for the search to pay for itself.
pub(crate) fn finish_insertion_sort<T, F>(v: &mut [T], offset: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    if len < 2 {
        return;
    }
    let offset = offset.max(1);

    if use_linear_insertion::<T>() {
        for i in offset..len {
            insert_tail(&mut v[..=i], is_less);
        }
    } else {
        let linear_limit = max_minrun::<T>() / 4;
        for i in offset..len {
            if i < linear_limit {
                insert_tail(&mut v[..=i], is_less);
            } else {
                insert_binary(&mut v[..=i], is_less);
            }
        }
    }
}

// When dropped, writes the lifted-out element back into the one empty slot.
// This is what keeps the slice a permutation of its input if a comparison
// panics mid-insert.
struct InsertionHole<T> {
    src: *const T,
    dest: *mut T,
}

impl<T> Drop for InsertionHole<T> {
    fn drop(&mut self) {
        // SAFETY: `src` holds the element lifted out of the slice and
        // `dest` is the slot currently not holding a live element.
        unsafe {
            ptr::copy_nonoverlapping(self.src, self.dest, 1);
        }
    }
}

/// Insert `v[v.len() - 1]` into the sorted prefix `v[..v.len() - 1]`,
/// walking the hole leftward one slot at a time.
fn insert_tail<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    debug_assert!(v.len() >= 2);

    let arr_ptr = v.as_mut_ptr();
    let i = v.len() - 1;

    // SAFETY: `i` is in bounds and at least 1, so `i - 1` is too.
    unsafe {
        let i_ptr = arr_ptr.add(i);

        // Compare through `i_ptr` while the element is still in place: if
        // it stays put, no copy of it was ever observed and nothing needs
        // writing back.
        if !is_less(&*i_ptr, &*i_ptr.sub(1)) {
            return;
        }

        // Lift the element out. Every later comparison must go through
        // `tmp`, the copy that the hole will write back.
        let tmp = ManuallyDrop::new(ptr::read(i_ptr));
        let mut hole = InsertionHole {
            src: &*tmp,
            dest: i_ptr.sub(1),
        };
        ptr::copy_nonoverlapping(hole.dest, i_ptr, 1);

        for j in (0..(i - 1)).rev() {
            let j_ptr = arr_ptr.add(j);
            if !is_less(&*tmp, &*j_ptr) {
                break;
            }

            hole.dest = j_ptr;
            ptr::copy_nonoverlapping(hole.dest, j_ptr.add(1), 1);
        }
        // `hole` drops here and fills its final slot with `tmp`.
    }
}

/// Insert `v[v.len() - 1]` into the sorted prefix by binary search and a
/// single rightward shift. The upper-bound search places the element after
/// every equal one, which is what keeps the sort stable.
fn insert_binary<T, F>(v: &mut [T], is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    debug_assert!(v.len() >= 2);

    let arr_ptr = v.as_mut_ptr();
    let i = v.len() - 1;

    // SAFETY: probed indices stay below `i`. The element under search is
    // left in place while the comparator runs, so a panic during the
    // search leaves the slice untouched.
    unsafe {
        let mut pos = 0;
        let mut rem = i;
        while rem > 0 {
            let half = rem / 2;
            if is_less(&*arr_ptr.add(i), &*arr_ptr.add(pos + half)) {
                rem = half;
            } else {
                pos += half + 1;
                rem -= half + 1;
            }
        }

        if pos < i {
            // Rotate v[pos..=i] right by one. No user code runs between
            // the read and the write-back, so no hole guard is needed.
            let tmp = ManuallyDrop::new(ptr::read(arr_ptr.add(i)));
            ptr::copy(arr_ptr.add(pos), arr_ptr.add(pos + 1), i - pos);
            ptr::copy_nonoverlapping(&*tmp as *const T, arr_ptr.add(pos), 1);
        }
    }
}
