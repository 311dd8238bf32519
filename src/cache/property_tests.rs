//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the expiring store and step validity against
//! simple models, driven by a manual clock.

use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::booking::{is_valid, FieldValue, StepAdapter, StepId, StepRecord};
use crate::cache::{shared, ExpiringStore, ManualClock, Namespace};

// == Test Configuration ==
const START_MS: u64 = 1_000_000;
const MAX_TTL_MS: u64 = 10_000;

fn test_store() -> (ExpiringStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    (ExpiringStore::in_memory(clock.clone()), clock)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

// == Strategies ==
/// Generates store keys in a session-like shape
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_:-]{1,48}".prop_map(|s| s)
}

/// Generates field values of every shape a step record can hold
fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        Just(FieldValue::Null),
        any::<bool>().prop_map(FieldValue::Bool),
        (-1_000_000i64..1_000_000).prop_map(|n| FieldValue::Number(n as f64)),
        "[ -~]{0,64}".prop_map(FieldValue::Text),
        prop::collection::vec("[a-z]{1,12}", 0..4).prop_map(FieldValue::List),
    ]
}

fn record_strategy() -> impl Strategy<Value = StepRecord> {
    prop::collection::btree_map("[a-z_]{1,20}", field_value_strategy(), 0..12)
}

fn step_strategy() -> impl Strategy<Value = StepId> {
    prop::sample::select(StepId::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum StoreOp {
    Set { key: String, value: String },
    Get { key: String },
    Remove { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    let key = prop::sample::select(vec!["a", "b", "c", "d", "e"]).prop_map(String::from);
    prop_oneof![
        (key.clone(), "[a-z ]{0,32}").prop_map(|(key, value)| StoreOp::Set { key, value }),
        key.clone().prop_map(|key| StoreOp::Get { key }),
        key.prop_map(|key| StoreOp::Remove { key }),
    ]
}

// == Valid Records ==
/// A record that passes validation for `step`, with the fields that can be
/// blanked to make it fail.
fn complete_record(step: StepId) -> (StepRecord, Vec<&'static str>) {
    let fields: Vec<(&'static str, FieldValue)> = match step {
        StepId::One => vec![
            ("artist", "alex-morgan".into()),
            ("location", "berlin".into()),
            ("date", "2026-11-02".into()),
            ("time", "2:00 PM".into()),
        ],
        StepId::Two => vec![
            ("first_name", "Ana".into()),
            ("last_name", "Silva".into()),
            ("email", "ana@example.com".into()),
            ("confirm_email", "ana@example.com".into()),
            ("phone", "+49 30 1234567".into()),
            ("birth_date", "1994-05-02".into()),
            ("contact_method", "email".into()),
        ],
        StepId::Three => vec![
            ("placement", "forearm".into()),
            ("size", "medium".into()),
            ("style", "fine-line".into()),
            ("description", "a fern curling around the wrist".into()),
        ],
        StepId::Four => vec![
            ("health_consent", true.into()),
            ("aftercare_consent", true.into()),
        ],
        StepId::Five => vec![
            ("deposit_method", "card".into()),
            ("accept_terms", true.into()),
            ("accept_cancellation_policy", true.into()),
        ],
    };

    let required = fields.iter().map(|(name, _)| *name).collect();
    let mut record = step.default_record();
    record.extend(fields.into_iter().map(|(name, value)| (name.to_string(), value)));
    (record, required)
}

/// The blank form of a field: empty text, or an unticked box.
fn blank(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Bool(_) => FieldValue::Bool(false),
        _ => FieldValue::Text(String::new()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Property 1: Round Trip
    // *For any* key and record, a get right after set returns the record
    // unchanged.
    #[test]
    fn prop_set_then_get_round_trips(
        key in key_strategy(),
        record in record_strategy(),
        ttl_ms in 1u64..MAX_TTL_MS,
    ) {
        let (mut store, _clock) = test_store();

        prop_assert!(store.set(&key, &record, ttl_ms));
        let loaded: Option<StepRecord> = store.get(&key);

        prop_assert_eq!(loaded, Some(record));
    }

    // Property 2: Expiry Boundary
    // *For any* TTL, an entry is live while at most `ttl` ms have elapsed and
    // gone once more than `ttl` ms have elapsed.
    #[test]
    fn prop_expires_strictly_after_ttl(
        key in key_strategy(),
        value in "[a-z]{1,16}",
        ttl_ms in 1u64..MAX_TTL_MS,
        overshoot in 1u64..MAX_TTL_MS,
    ) {
        let (mut store, clock) = test_store();
        store.set(&key, &value, ttl_ms);

        clock.advance(ttl_ms);
        prop_assert!(!store.is_expired(&key));
        prop_assert_eq!(store.time_remaining(&key), 0);

        clock.advance(overshoot);
        prop_assert!(store.is_expired(&key));
        prop_assert_eq!(store.get::<String>(&key), None);
        prop_assert!(!store.keys(None).contains(&key));
    }

    // Property 3: Sweep Precision
    // *For any* set of entries and elapsed time, a sweep removes exactly the
    // entries whose age exceeds their TTL and leaves the rest readable.
    #[test]
    fn prop_sweep_removes_exactly_expired(
        ttls in prop::collection::vec(1u64..MAX_TTL_MS, 1..40),
        elapsed in 0u64..(2 * MAX_TTL_MS),
    ) {
        let (mut store, clock) = test_store();
        for (i, ttl_ms) in ttls.iter().enumerate() {
            store.set(&format!("k{}", i), &i, *ttl_ms);
        }

        clock.advance(elapsed);
        let expected_expired: HashSet<String> = ttls
            .iter()
            .enumerate()
            .filter(|(_, ttl_ms)| elapsed > **ttl_ms)
            .map(|(i, _)| format!("k{}", i))
            .collect();

        let swept = store.sweep_expired(None);

        prop_assert_eq!(swept, expected_expired.len());
        prop_assert_eq!(store.len(), ttls.len() - expected_expired.len());
        for (i, _) in ttls.iter().enumerate() {
            let key = format!("k{}", i);
            let present = store.keys(None).contains(&key);
            prop_assert_eq!(present, !expected_expired.contains(&key));
            if present {
                prop_assert_eq!(store.get::<usize>(&key), Some(i));
            }
        }
    }

    // Property 4: Prefix Sweep Isolation
    // *For any* two namespaces, sweeping one never touches the other.
    #[test]
    fn prop_prefix_sweep_is_isolated(
        ttls in prop::collection::vec(1u64..MAX_TTL_MS, 1..20),
        elapsed in 0u64..(2 * MAX_TTL_MS),
    ) {
        let (mut store, clock) = test_store();
        let artists = Namespace::new("artists");
        let search = Namespace::new("search");
        for (i, ttl_ms) in ttls.iter().enumerate() {
            store.set(&artists.key(&i.to_string()), &i, *ttl_ms);
            store.set(&search.key(&i.to_string()), &i, *ttl_ms);
        }

        clock.advance(elapsed);
        store.sweep_expired(Some(&artists.prefix()));

        prop_assert_eq!(store.keys(Some(&search.prefix())).len(), ttls.len());
    }

    // Property 5: Statistics Accuracy
    // *For any* sequence of operations with no time passing, hits and misses
    // match a plain map model.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let (mut store, _clock) = test_store();
        let mut model: BTreeMap<String, String> = BTreeMap::new();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                StoreOp::Set { key, value } => {
                    store.set(&key, &value, MAX_TTL_MS);
                    model.insert(key, value);
                }
                StoreOp::Get { key } => {
                    let got: Option<String> = store.get(&key);
                    match model.get(&key) {
                        Some(expected) => {
                            expected_hits += 1;
                            prop_assert_eq!(got.as_ref(), Some(expected));
                        }
                        None => {
                            expected_misses += 1;
                            prop_assert_eq!(got, None);
                        }
                    }
                }
                StoreOp::Remove { key } => {
                    prop_assert_eq!(store.remove(&key), model.remove(&key).is_some());
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_entries, model.len());
    }

    // Property 6: Overwrite
    // *For any* two values under one key, the later write wins and restarts
    // the TTL.
    #[test]
    fn prop_overwrite_restarts_ttl(
        key in key_strategy(),
        first in "[a-z]{1,16}",
        second in "[a-z]{1,16}",
        ttl_ms in 2u64..MAX_TTL_MS,
    ) {
        let (mut store, clock) = test_store();
        store.set(&key, &first, ttl_ms);
        clock.advance(ttl_ms - 1);
        store.set(&key, &second, ttl_ms);
        clock.advance(ttl_ms - 1);

        prop_assert_eq!(store.get::<String>(&key), Some(second));
        prop_assert_eq!(store.len(), 1);
    }

    // Property 7: Validity Follows Completeness
    // *For any* step, a complete record is valid and blanking any non-empty
    // set of required fields makes it invalid.
    #[test]
    fn prop_blank_required_field_invalidates(
        step in step_strategy(),
        mask in prop::collection::vec(any::<bool>(), 7),
    ) {
        let (complete, required) = complete_record(step);
        prop_assert!(is_valid(step, &complete, today()));

        let mut record = complete.clone();
        let mut blanked = 0;
        for (field, drop) in required.iter().zip(mask.iter()) {
            if *drop {
                let value = blank(&record[*field]);
                record.insert(field.to_string(), value);
                blanked += 1;
            }
        }

        prop_assert_eq!(is_valid(step, &record, today()), blanked == 0);
    }

    // Property 8: Last Field Flips Validity
    // *For any* step and required field, saving that field last through the
    // adapter flips validity from false to true, and clearing it flips back.
    #[test]
    fn prop_adapter_validity_flips_on_last_field(
        step in step_strategy(),
        pick in any::<prop::sample::Index>(),
    ) {
        let clock = Arc::new(ManualClock::at_date(today()));
        let store = shared(ExpiringStore::in_memory(clock.clone()));
        let adapter = StepAdapter::new(step, &Namespace::session("prop"), store, clock, 60_000);

        let (mut complete, required) = complete_record(step);
        let last = *pick.get(&required);
        let last_value = complete[last].clone();
        complete.insert(last.to_string(), blank(&last_value));

        tokio_test::block_on(async {
            adapter.save(complete).await;
            prop_assert!(!adapter.is_valid().await);

            adapter
                .save(StepRecord::from([(last.to_string(), last_value.clone())]))
                .await;
            prop_assert!(adapter.is_valid().await);

            adapter
                .save(StepRecord::from([(last.to_string(), blank(&last_value))]))
                .await;
            prop_assert!(!adapter.is_valid().await);
            Ok(())
        })?;
    }
}
