fn main() {
    afl::fuzz!(|data: &[u8]| {
        let original: Vec<i32> = data
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();

        let mut values = original.clone();
        let mut expected = original.clone();
        expected.sort();
        tim_sort::sort(&mut values);
        assert_eq!(values, expected);

        // Sort again on a narrowed key so equal keys are common. The tag
        // records input order and must come out ascending per key, which
        // catches stability bugs the full-width comparison masks.
        let mut tagged: Vec<(i32, usize)> = original.iter().map(|v| v & 0xF).zip(0usize..).collect();
        tim_sort::sort_by(&mut tagged, |a, b| a.0.cmp(&b.0));
        assert!(tagged
            .windows(2)
            .all(|w| w[0].0 < w[1].0 || (w[0].0 == w[1].0 && w[0].1 < w[1].1)));
    });
}
