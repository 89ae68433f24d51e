//! End-to-end scenarios: boundary shapes, comparison-count expectations,
//! stability, and cross-thread independence.

use std::cmp::Ordering;
use std::thread;

use sort_test_tools::types::OneKibiByte;

/// Sorts a copy of `v` with a counting comparator; returns the result and
/// how many times the comparator ran.
fn sort_counting_comps<T: Clone>(
    v: &[T],
    mut cmp: impl FnMut(&T, &T) -> Ordering,
) -> (Vec<T>, usize) {
    let mut data = v.to_vec();
    let mut count = 0;
    tim_sort::sort_by(&mut data, |a, b| {
        count += 1;
        cmp(a, b)
    });
    (data, count)
}

fn hash_mix(i: u32) -> i32 {
    (i.wrapping_mul(2654435761) ^ (i >> 7)) as i32
}

#[test]
fn empty_is_noop() {
    let mut v: Vec<i32> = vec![];
    tim_sort::sort(&mut v);
    assert!(v.is_empty());
}

#[test]
fn single_element() {
    let mut v = vec![5];
    tim_sort::sort(&mut v);
    assert_eq!(v, [5]);
}

#[test]
fn pi_digits() {
    let digits = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];

    let mut v = digits;
    tim_sort::sort(&mut v);
    assert_eq!(v, [1, 1, 2, 3, 3, 4, 5, 5, 5, 6, 9]);

    let mut v = digits;
    tim_sort::sort_by(&mut v, |a, b| b.cmp(a));
    assert_eq!(v, [9, 6, 5, 5, 5, 4, 3, 3, 2, 1, 1]);
}

#[test]
fn keyed_tuples_stay_in_input_order() {
    let input = [(1, 'a'), (1, 'b'), (0, 'c'), (1, 'd')];

    let mut v = input;
    tim_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));
    assert_eq!(v, [(0, 'c'), (1, 'a'), (1, 'b'), (1, 'd')]);

    let mut v = input;
    tim_sort::sort_by(&mut v, |a, b| b.0.cmp(&a.0));
    assert_eq!(v, [(1, 'a'), (1, 'b'), (1, 'd'), (0, 'c')]);
}

#[test]
fn two_equal_elements_keep_order() {
    let mut v = vec![(7, 0), (7, 1)];
    tim_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));
    assert_eq!(v, [(7, 0), (7, 1)]);
}

#[test]
fn ascending_input_costs_one_comparison_per_pair() {
    let input: Vec<i32> = (0..1000).collect();
    let (out, comps) = sort_counting_comps(&input, |a, b| a.cmp(b));
    assert_eq!(out, input);
    assert_eq!(comps, 999);
}

#[test]
fn descending_input_costs_one_comparison_per_pair() {
    let input: Vec<i32> = (0..1000).rev().collect();
    let (out, comps) = sort_counting_comps(&input, |a, b| a.cmp(b));
    assert_eq!(out, (0..1000).collect::<Vec<_>>());
    assert_eq!(comps, 999);
}

#[test]
fn reverse_comparator_sees_the_mirror_runs() {
    // Under `>` an ascending input is one strictly descending run and a
    // descending input one ascending run; both still cost N - 1.
    let input: Vec<i32> = (0..1000).collect();
    let (out, comps) = sort_counting_comps(&input, |a, b| b.cmp(a));
    assert_eq!(out, (0..1000).rev().collect::<Vec<_>>());
    assert_eq!(comps, 999);

    let input: Vec<i32> = (0..1000).rev().collect();
    let (out, comps) = sort_counting_comps(&input, |a, b| b.cmp(a));
    assert_eq!(out, (0..1000).rev().collect::<Vec<_>>());
    assert_eq!(comps, 999);
}

#[test]
fn small_sorted_input_stays_on_the_insertion_path() {
    // At 64 elements an i32 slice is at most one forced run; sorted input
    // costs exactly one comparison per insertion.
    let input: Vec<i32> = (0..64).collect();
    let (out, comps) = sort_counting_comps(&input, |a, b| a.cmp(b));
    assert_eq!(out, input);
    assert_eq!(comps, 63);
}

#[test]
fn trailing_element_joins_the_final_merge() {
    // A full natural run followed by a single out-of-place element.
    let mut v: Vec<i32> = (0..64).collect();
    v.push(-1);
    tim_sort::sort(&mut v);
    let mut expected = vec![-1];
    expected.extend(0..64);
    assert_eq!(v, expected);

    let mut v: Vec<i32> = (0..64).rev().collect();
    v.push(100);
    tim_sort::sort_by(&mut v, |a, b| b.cmp(a));
    let mut expected = vec![100];
    expected.extend((0..64).rev());
    assert_eq!(v, expected);
}

#[test]
fn short_natural_runs_get_extended() {
    // Sawtooth of period 8 at length 200: every natural run is well below
    // the forced minimum, so each gets completed by insertion sort.
    let input: Vec<i32> = (0..200).map(|i| i % 8).collect();
    let mut v = input.clone();
    tim_sort::sort(&mut v);
    let mut expected = input;
    expected.sort();
    assert_eq!(v, expected);
}

#[test]
fn large_elements_sort_stably() {
    // 1 KiB elements never fit the on-stack merge scratch, so every merge
    // takes the heap path, and the large-value minrun configuration is in
    // effect. The tag records input order per duplicated key.
    let mut v: Vec<(OneKibiByte, usize)> = (0..200)
        .map(|i| (OneKibiByte::new((i * 37) % 10), i as usize))
        .collect();
    tim_sort::sort_by(&mut v, |a, b| a.0.cmp(&b.0));

    for w in v.windows(2) {
        match w[0].0.cmp(&w[1].0) {
            Ordering::Less => {}
            Ordering::Equal => assert!(w[0].1 < w[1].1),
            Ordering::Greater => panic!("output is not sorted"),
        }
    }
}

#[test]
fn heap_scratch_fallback_matches_reference() {
    let mut v: Vec<i32> = (0u32..100_000).map(hash_mix).collect();
    let mut expected = v.clone();
    expected.sort();
    tim_sort::sort(&mut v);
    assert_eq!(v, expected);

    let mut v: Vec<i32> = (0u32..100_000).map(hash_mix).collect();
    let mut expected = v.clone();
    expected.sort_by(|a, b| b.cmp(a));
    tim_sort::sort_by(&mut v, |a, b| b.cmp(a));
    assert_eq!(v, expected);
}

#[test]
fn sort_by_key_orders_by_key() {
    let mut v = vec!["binary", "a", "insertion", "run", "gallop"];
    tim_sort::sort_by_key(&mut v, |s| s.len());
    assert_eq!(v, ["a", "run", "binary", "gallop", "insertion"]);
}

#[test]
fn concurrent_sorts_are_independent() {
    let handles: Vec<_> = (0..4)
        .map(|t: u32| {
            thread::spawn(move || {
                let mut v: Vec<i32> =
                    (0u32..50_000).map(|i| hash_mix(i).rotate_left(t)).collect();
                let mut expected = v.clone();
                expected.sort();
                tim_sort::sort(&mut v);
                assert_eq!(v, expected);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
