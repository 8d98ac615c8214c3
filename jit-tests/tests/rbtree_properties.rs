//! Red-black invariants over a long random insert/delete sequence: after
//! every single operation, the tree must still be a valid red-black tree,
//! and in-order traversal (via repeated `search`) must agree with a plain
//! `HashSet` model.

use std::collections::HashSet;

use jit_core::OffsetIndex;

struct Xorshift(u32);

impl Xorshift {
    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }
}

#[test]
fn ten_thousand_random_ops_preserve_all_invariants() {
    let mut rng = Xorshift(0xC0FFEE11);
    let mut idx: OffsetIndex<u32> = OffsetIndex::new();
    let mut model: HashSet<u32> = HashSet::new();

    for step in 0..10_000u32 {
        let key = rng.next() % 2048;
        if model.contains(&key) {
            let removed = idx.remove(key);
            assert_eq!(removed, Some(key));
            model.remove(&key);
        } else {
            let prev = idx.insert(key, key);
            assert_eq!(prev, None);
            model.insert(key);
        }
        assert!(idx.verify_properties(), "invariant violated after step {step}");
        assert_eq!(idx.len(), model.len());
    }

    for key in &model {
        assert_eq!(idx.search(*key), Some(key));
    }
    for probe in 2048..2100u32 {
        if !model.contains(&probe) {
            assert_eq!(idx.search(probe), None);
        }
    }
}

#[test]
fn insert_overwrite_returns_previous_value_and_keeps_length() {
    let mut idx = OffsetIndex::new();
    idx.insert(7, "first");
    assert_eq!(idx.insert(7, "second"), Some("first"));
    assert_eq!(idx.len(), 1);
    assert_eq!(idx.search(7), Some(&"second"));
}
