//! Property-based model test for the hash table
//!
//! Drives random put/get/delete sequences against a `std::collections`
//! oracle. Key space is kept small so sequences collide often and cross
//! the resize thresholds in both directions.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::store::{PlayerId, PlayerRecord, PlayerStore, Position};

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u16),
    Delete(u8),
    Get(u8),
    Purge,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..40, any::<u16>()).prop_map(|(id, goals)| Op::Put(id, goals)),
        2 => (0u8..40).prop_map(Op::Delete),
        3 => (0u8..40).prop_map(Op::Get),
        1 => Just(Op::Purge),
    ]
}

proptest! {
    #[test]
    fn store_matches_hashmap_oracle(ops in proptest::collection::vec(op_strategy(), 1..200)) {
        let mut store = PlayerStore::new();
        let mut oracle: HashMap<String, f64> = HashMap::new();

        for op in ops {
            match op {
                Op::Put(id, goals) => {
                    let id = format!("p{id}");
                    let record = PlayerRecord::new(&id, "x", Position::Unknown)
                        .with_stat("goals", goals as f64);
                    store.put(record);
                    oracle.insert(id, goals as f64);
                }
                Op::Delete(id) => {
                    let id = format!("p{id}");
                    let deleted = store.delete(&PlayerId::new(id.as_str())).is_ok();
                    prop_assert_eq!(deleted, oracle.remove(&id).is_some());
                }
                Op::Get(id) => {
                    let id = format!("p{id}");
                    match oracle.get(&id) {
                        Some(&goals) => {
                            let rec = store.get(&PlayerId::new(id.as_str())).unwrap();
                            prop_assert_eq!(rec.stat("goals"), goals);
                        }
                        None => prop_assert!(store.get(&PlayerId::new(id.as_str())).is_err()),
                    }
                }
                Op::Purge => {
                    store.purge_inactive();
                }
            }
            prop_assert_eq!(store.len(), oracle.len());
        }

        let mut seen: Vec<String> = store.all().map(|r| r.id.to_string()).collect();
        let mut expected: Vec<String> = oracle.keys().cloned().collect();
        seen.sort();
        expected.sort();
        prop_assert_eq!(seen, expected);
    }
}
