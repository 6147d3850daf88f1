//! End-to-end database integration coverage for the SQLite repositories.
//!
//! Each test operates on an isolated database with migrations applied and
//! exercises behaviour that spans more than one repository or connection.

mod support;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use aura_core::{
    CalendarService, ConversationLedger, ConversationRepository, EventRepository,
    MemoryRepository, WriteOutcome,
};
use aura_domain::{AuraError, EventDraft, Intent, NewConversationTurn, NewEvent, NewMemory};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use support::TestDatabase;

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(hour, minute, 0).unwrap()
}

fn turn(n: i64, related_event_id: Option<i64>) -> NewConversationTurn {
    NewConversationTurn {
        session_id: "default".into(),
        user_message: format!("message {n}"),
        bot_response: format!("reply {n}"),
        intent: Intent::CreateEvent,
        related_event_id,
        timestamp: at(8, 0) + Duration::seconds(n),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_guarded_inserts_admit_exactly_one() {
    let db = TestDatabase::new();
    let repo = Arc::new(db.events());

    let mut handles = Vec::new();
    for n in 0..8 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            // Every candidate overlaps every other one.
            let start = at(10, n);
            let event = NewEvent::new(format!("Slot {n}"), start, start + Duration::minutes(30));
            repo.insert_if_free(event).await.expect("guarded insert")
        }));
    }

    let mut applied = 0;
    let mut conflicted = 0;
    for handle in handles {
        match handle.await.expect("task join") {
            WriteOutcome::Applied(_) => applied += 1,
            WriteOutcome::Conflicted(blocking) => {
                assert_eq!(blocking.len(), 1);
                conflicted += 1;
            }
            WriteOutcome::NotFound => panic!("insert cannot be NotFound"),
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(conflicted, 7);
    assert_eq!(repo.count().await.expect("count"), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_an_event_nulls_weak_references_without_cascading() {
    let db = TestDatabase::new();
    let events = db.events();
    let memories = db.memories();
    let conversations = db.conversations();

    let event = events
        .insert(NewEvent::new("Dentist", at(15, 0), at(16, 0)))
        .await
        .expect("insert event");

    let memory = memories
        .save(NewMemory {
            event_id: Some(event.id),
            content: "Created event: Dentist".into(),
            embedding: vec![0.6, 0.8],
            created_at: at(9, 0),
        })
        .await
        .expect("save memory");
    assert_eq!(memory.event_title.as_deref(), Some("Dentist"));
    conversations.append(&turn(1, Some(event.id))).await.expect("append turn");

    assert!(events.delete(event.id).await.expect("delete"));

    let recalled = memories.recent(10).await.expect("recent memories");
    assert_eq!(recalled.len(), 1, "memory must survive the delete");
    assert_eq!(recalled[0].event_id, None);
    assert_eq!(recalled[0].event_title, None);
    assert_eq!(recalled[0].embedding, vec![0.6, 0.8]);

    let history = conversations.recent("default", 10).await.expect("recent turns");
    assert_eq!(history.len(), 1, "turn must survive the delete");
    assert_eq!(history[0].related_event_id, None);

    assert_eq!(db.query_i64("SELECT COUNT(*) FROM memory WHERE event_id IS NULL"), Some(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn ledger_rehydrates_newest_turns_in_chronological_order() {
    let db = TestDatabase::new();
    let conversations = db.conversations();

    for n in 0..6 {
        conversations.append(&turn(n, None)).await.expect("append turn");
    }

    let mut ledger = ConversationLedger::new("default", 4);
    let persisted = conversations.recent("default", ledger.capacity()).await.expect("recent");
    ledger.rehydrate(persisted);

    let messages: Vec<&str> = ledger.iter().map(|t| t.user_message.as_str()).collect();
    assert_eq!(messages, vec!["message 2", "message 3", "message 4", "message 5"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn stats_reflect_all_tables() {
    let db = TestDatabase::new();
    let events = db.events();

    let event =
        events.insert(NewEvent::new("Standup", at(9, 0), at(9, 15))).await.expect("insert");
    db.conversations().append(&turn(0, Some(event.id))).await.expect("append");

    let stats = db.manager.table_stats().expect("stats");
    assert_eq!(stats.events, 1);
    assert_eq!(stats.memories, 0);
    assert_eq!(stats.conversation_turns, 1);
    db.manager.health_check().expect("healthy");
}

#[tokio::test(flavor = "multi_thread")]
async fn timed_out_create_under_a_held_write_lock_leaves_no_row() {
    let db = TestDatabase::new();

    // Another process holds the write lock for well past the caller's timeout.
    let holder = rusqlite::Connection::open(db.manager.path()).expect("second connection");
    holder.execute_batch("BEGIN IMMEDIATE").expect("take write lock");
    let release = std::thread::spawn(move || {
        std::thread::sleep(StdDuration::from_millis(600));
        holder.execute_batch("COMMIT").expect("release write lock");
    });

    let events = db.events().with_write_budget(StdDuration::from_millis(50));
    let calendar =
        CalendarService::new(Arc::new(events)).with_store_timeout(StdDuration::from_millis(100));
    let draft = EventDraft {
        title: Some("Blocked".into()),
        start_time: Some(at(9, 0)),
        end_time: Some(at(10, 0)),
        ..EventDraft::default()
    };

    let result = calendar.create_event(draft).await;
    assert!(matches!(result, Err(AuraError::Timeout(_))), "got {result:?}");

    release.join().expect("lock holder thread");
    // Give a straggling write every chance to land before counting.
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM events"), Some(0));
    assert_eq!(calendar.count_events().await.expect("count"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_returning_removes_exactly_the_row_it_reports() {
    let db = TestDatabase::new();
    let events = db.events();
    let kept = events.insert(NewEvent::new("Standup", at(9, 0), at(9, 15))).await.unwrap();
    let doomed = events.insert(NewEvent::new("Dentist", at(15, 0), at(16, 0))).await.unwrap();

    let removed = events.delete_returning(doomed.id).await.expect("delete");

    assert_eq!(removed, Some(doomed));
    assert_eq!(events.delete_returning(999).await.expect("missing id"), None);
    assert_eq!(events.list_in_range(at(0, 0), at(23, 59)).await.unwrap(), vec![kept]);
}
