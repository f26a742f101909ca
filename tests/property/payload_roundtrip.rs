//! Property-based payload round-trip tests.
//!
//! Uses proptest to verify:
//! 1. Any valid `Task` collection survives encode → decode round-trip.
//! 2. Arbitrary strings never cause a panic in `decode_tasks` (they
//!    return `Err` or a task list gracefully).
//! 3. Timestamps round-trip to the same instant.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use taskforge_proto::payload::{decode_tasks, encode_tasks};
use taskforge_proto::task::{AttachmentPresence, Priority, Task, TaskId};

// --- Strategies for model types ---

/// Strategy for generating arbitrary `TaskId` values.
fn arb_task_id() -> impl Strategy<Value = TaskId> {
    any::<u128>().prop_map(|n| TaskId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for timestamps between the epoch and ~2100, millisecond
/// precision (the payload format is RFC 3339 text).
fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800_000).prop_map(|ms| {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
    })
}

/// Strategy for generating arbitrary `Priority` values.
fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Urgent),
    ]
}

/// Strategy for generating arbitrary `AttachmentPresence` values.
fn arb_presence() -> impl Strategy<Value = AttachmentPresence> {
    prop_oneof![
        Just(AttachmentPresence::Local),
        Just(AttachmentPresence::RemoteOnly),
        Just(AttachmentPresence::Missing),
    ]
}

/// Strategy for generating an optional attachment-presence map.
fn arb_presence_map() -> impl Strategy<Value = Option<BTreeMap<String, AttachmentPresence>>> {
    prop::option::of(prop::collection::btree_map(
        "[a-z0-9_.]{1,16}",
        arb_presence(),
        0..4,
    ))
}

/// Strategy for generating arbitrary `Task` values.
///
/// Titles use non-NUL characters; the codec must carry anything the
/// validated constructor admits, including unicode.
fn arb_task() -> impl Strategy<Value = Task> {
    let core = (
        arb_task_id(),
        "[^\u{0}]{1,64}",
        prop::option::of("[^\u{0}]{0,128}"),
        arb_timestamp(),
        prop::option::of(arb_timestamp()),
        arb_priority(),
    );
    let state = (
        prop::collection::vec("[a-z0-9-]{1,12}", 0..5),
        any::<bool>(),
        prop::option::of(arb_timestamp()),
        any::<bool>(),
        prop::option::of(arb_timestamp()),
        prop::collection::vec("[a-z0-9_.]{1,16}", 0..3),
        arb_presence_map(),
    );
    (core, state).prop_map(
        |(
            (id, title, description, created_at, due_date, priority),
            (tags, completed, completed_at, archived, archived_at, attachments, attachment_presence),
        )| Task {
            id,
            title,
            description,
            created_at,
            due_date,
            priority,
            tags,
            completed,
            completed_at,
            archived,
            archived_at,
            attachments,
            attachment_presence,
        },
    )
}

proptest! {
    #[test]
    fn task_collection_round_trips(tasks in prop::collection::vec(arb_task(), 0..8)) {
        let encoded = encode_tasks(&tasks).expect("encode");
        let decoded = decode_tasks(&encoded).expect("decode");
        prop_assert_eq!(decoded, tasks);
    }

    #[test]
    fn decode_never_panics_on_arbitrary_input(input in ".{0,256}") {
        let _ = decode_tasks(&input);
    }

    #[test]
    fn decode_never_panics_on_arbitrary_json(value in "[\\[\\]{}0-9a-z\",:]{0,64}") {
        let _ = decode_tasks(&value);
    }

    #[test]
    fn timestamps_round_trip_to_same_instant(ts in arb_timestamp()) {
        let task = Task {
            due_date: Some(ts),
            ..Task::new("timestamp probe").unwrap()
        };
        let encoded = encode_tasks(std::slice::from_ref(&task)).expect("encode");
        let decoded = decode_tasks(&encoded).expect("decode");
        prop_assert_eq!(decoded[0].due_date, Some(ts));
    }
}
