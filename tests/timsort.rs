use std::cmp::Ordering;

use sort_test_tools::{instantiate_sort_tests, Sort};

struct TimSortStable;

impl Sort for TimSortStable {
    fn name() -> String {
        "tim_sort_stable".into()
    }

    fn sort<T>(v: &mut [T])
    where
        T: Ord,
    {
        tim_sort::sort(v);
    }

    fn sort_by<T, F>(v: &mut [T], compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        tim_sort::sort_by(v, compare);
    }
}

instantiate_sort_tests!(TimSortStable);
