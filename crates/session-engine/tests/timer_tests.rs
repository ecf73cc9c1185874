//! Listening time, sleep timer, headset remote and save scheduling

mod common;

use common::{book, today, FakeOutput, Harness};
use smartbook_config::PlayerConfig;
use smartbook_core::{
    BookKey, MemorySessionStore, PressKind, RemoteAction, RemoteButton, RemoteControlMapping,
    SessionSnapshot,
};
use smartbook_session::EngineEvent;

fn remote_events(events: &[EngineEvent]) -> Vec<&EngineEvent> {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::RemotePress { .. }))
        .collect()
}

#[test]
fn test_listening_time_flushes_in_batches() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.play();

    let events = h.advance(47_000);
    let flushed: u64 = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ListeningFlushed { seconds } => Some(*seconds),
            _ => None,
        })
        .sum();

    assert_eq!(flushed, 45);
    assert_eq!(h.engine.stats().seconds_on(today()), 45);
    assert_eq!(h.engine.pending_listening_seconds(), 2);
}

#[test]
fn test_pause_flushes_partial_listening() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.play();
    h.advance(7_000);

    h.pause();
    assert_eq!(h.engine.stats().seconds_on(today()), 7);
    assert_eq!(h.engine.pending_listening_seconds(), 0);

    // Paused time is not listening time
    h.advance(30_000);
    assert_eq!(h.engine.stats().total_seconds(), 7);
}

#[test]
fn test_listening_lands_on_current_day() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.play();
    h.advance(15_000);

    let tomorrow = today().succ_opt().expect("next day");
    h.clock.set_today(tomorrow);
    h.advance(15_000);

    assert_eq!(h.engine.stats().seconds_on(today()), 15);
    assert_eq!(h.engine.stats().seconds_on(tomorrow), 15);
}

#[test]
fn test_sleep_timer_counts_playing_time_only() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.play();
    h.engine.set_sleep_timer_minutes(5);

    h.advance(100_000);
    assert_eq!(h.engine.sleep_timer_remaining(), 200);

    h.pause();
    h.advance(10_000);
    assert_eq!(h.engine.sleep_timer_remaining(), 200);

    h.play();
    let events = h.advance(200_000);
    assert!(events.contains(&EngineEvent::SleepTimerExpired));
    assert_eq!(h.engine.sleep_timer_remaining(), 0);
    assert!(!h.engine.is_playing());
    assert!(h.main.state().paused);
}

#[test]
fn test_sleep_timer_set_while_paused_waits_for_playback() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.engine.set_sleep_timer_minutes(5);

    h.advance(60_000);
    assert_eq!(h.engine.sleep_timer_remaining(), 300);

    h.play();
    h.advance(1_000);
    assert_eq!(h.engine.sleep_timer_remaining(), 299);
}

#[test]
fn test_sleep_timer_zero_turns_it_off() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.play();
    h.engine.set_sleep_timer_minutes(1);
    h.advance(10_000);

    h.engine.set_sleep_timer_minutes(0);
    let events = h.advance(120_000);
    assert!(!events.contains(&EngineEvent::SleepTimerExpired));
    assert!(h.engine.is_playing());
}

#[test]
fn test_held_button_fires_one_long_press() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);
    h.engine.set_remote_mapping(RemoteControlMapping {
        previous_short: RemoteAction::AddBookmark.name().to_string(),
        previous_long: RemoteAction::VolumeDown.name().to_string(),
        ..Default::default()
    });

    let mut events = h.engine.remote_press(RemoteButton::Previous);
    events.extend(h.advance(100));
    events.extend(h.engine.remote_press(RemoteButton::Previous));
    events.extend(h.advance(100));
    events.extend(h.engine.remote_press(RemoteButton::Previous));
    events.extend(h.advance(2_000));

    assert_eq!(
        remote_events(&events),
        vec![&EngineEvent::RemotePress {
            button: RemoteButton::Previous,
            kind: PressKind::Long,
            action: Some(RemoteAction::VolumeDown),
        }]
    );
    assert!(h.engine.bookmarks().is_empty());
    assert!((h.engine.volume() - 0.9).abs() < 1e-9);
}

#[test]
fn test_single_press_fires_short_after_threshold() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);
    h.engine.set_remote_mapping(RemoteControlMapping {
        previous_short: RemoteAction::AddBookmark.name().to_string(),
        ..Default::default()
    });

    assert!(h.engine.remote_press(RemoteButton::Previous).is_empty());
    assert!(remote_events(&h.advance(399)).is_empty());
    assert!(h.engine.bookmarks().is_empty());

    let events = h.advance(1);
    assert_eq!(
        remote_events(&events),
        vec![&EngineEvent::RemotePress {
            button: RemoteButton::Previous,
            kind: PressKind::Short,
            action: Some(RemoteAction::AddBookmark),
        }]
    );
    assert_eq!(h.engine.bookmarks().len(), 1);
}

#[test]
fn test_default_previous_short_rewinds() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);

    h.engine.remote_press(RemoteButton::Previous);
    h.advance(500);
    assert_eq!(h.engine.current_time(), 55.0);
}

#[test]
fn test_swapped_buttons() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);
    h.engine.set_remote_mapping(RemoteControlMapping {
        swap_buttons: true,
        ..Default::default()
    });

    h.engine.remote_press(RemoteButton::Next);
    let events = h.advance(500);
    assert_eq!(
        remote_events(&events),
        vec![&EngineEvent::RemotePress {
            button: RemoteButton::Next,
            kind: PressKind::Short,
            action: Some(RemoteAction::Rewind45),
        }]
    );
    assert_eq!(h.engine.current_time(), 55.0);
    assert!(h.engine.clips().is_empty());
}

#[test]
fn test_unknown_binding_does_nothing() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);
    h.engine.set_remote_mapping(RemoteControlMapping {
        previous_short: "Launch rockets".to_string(),
        ..Default::default()
    });

    h.engine.remote_press(RemoteButton::Previous);
    let events = h.advance(500);
    assert_eq!(
        remote_events(&events),
        vec![&EngineEvent::RemotePress {
            button: RemoteButton::Previous,
            kind: PressKind::Short,
            action: None,
        }]
    );
    assert_eq!(h.engine.current_time(), 100.0);
}

#[test]
fn test_failed_remote_action_still_reports_gesture() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);

    // Default next-short creates a clip, which needs playback first
    h.engine.remote_press(RemoteButton::Next);
    let events = h.advance(500);
    assert_eq!(
        remote_events(&events),
        vec![&EngineEvent::RemotePress {
            button: RemoteButton::Next,
            kind: PressKind::Short,
            action: Some(RemoteAction::CreateClip),
        }]
    );
    assert!(h.engine.clips().is_empty());
}

#[test]
fn test_execute_remote_action_by_name() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);

    let action = h
        .engine
        .execute_remote_action("  fast FORWARD 30 s ")
        .expect("action");
    assert_eq!(action, Some(RemoteAction::FastForward30));
    assert_eq!(h.engine.current_time(), 130.0);

    let action = h
        .engine
        .execute_remote_action("Next chapter")
        .expect("action");
    assert_eq!(action, Some(RemoteAction::NextChapter));
    assert_eq!(h.engine.current_time(), 300.0);

    assert_eq!(h.engine.execute_remote_action("bogus").expect("no-op"), None);
    assert_eq!(h.engine.current_time(), 300.0);
}

#[test]
fn test_saves_are_debounced() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    assert!(h.engine.flush());
    let writes = h.store.writes();

    h.engine.seek_to(10.0).expect("seek");
    h.advance(500);
    h.engine.seek_to(20.0).expect("seek");
    h.advance(500);
    h.engine.seek_to(30.0).expect("seek");

    h.advance(1_999);
    assert_eq!(h.store.writes(), writes);
    assert!(h.engine.has_unsaved_changes());

    let events = h.advance(1);
    assert!(events.contains(&EngineEvent::SessionSaved));
    assert_eq!(h.store.writes(), writes + 1);
    assert!(!h.engine.has_unsaved_changes());

    let saved = h.store.last_saved().expect("saved");
    let session = saved.book(&BookKey::new("a.m4b")).expect("book session");
    assert_eq!(session.current_time, 30.0);
}

#[test]
fn test_switching_books_saves_immediately() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.engine.seek_to(100.0).expect("seek");
    let writes = h.store.writes();

    h.load(book("b.m4b"), 1800.0);
    assert_eq!(h.store.writes(), writes + 1);

    let saved = h.store.last_saved().expect("saved");
    let outgoing = saved.book(&BookKey::new("a.m4b")).expect("outgoing book");
    assert_eq!(outgoing.current_time, 100.0);
    assert_eq!(h.engine.current_time(), 0.0);
    assert_eq!(h.engine.last_opened(), Some(&BookKey::new("b.m4b")));

    // Going back restores where the first book was left
    h.load(book("a.m4b"), 3600.0);
    assert_eq!(h.engine.current_time(), 100.0);
}

#[test]
fn test_reloading_same_book_is_not_forced_to_disk() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.engine.flush();
    let writes = h.store.writes();

    h.load(book("a.m4b"), 3600.0);
    assert_eq!(h.store.writes(), writes);
    assert!(h.engine.has_unsaved_changes());
}

#[test]
fn test_unavailable_store_retries() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.engine.flush();

    h.store.set_unavailable(true);
    h.engine.seek_to(50.0).expect("seek");
    let events = h.advance(2_000);
    assert!(!events.contains(&EngineEvent::SessionSaved));
    assert!(h.engine.has_unsaved_changes());
    assert_eq!(h.engine.current_time(), 50.0);

    h.store.set_unavailable(false);
    let events = h.advance(2_000);
    assert!(events.contains(&EngineEvent::SessionSaved));
    let saved = h.store.last_saved().expect("saved");
    assert_eq!(
        saved.book(&BookKey::new("a.m4b")).map(|s| s.current_time),
        Some(50.0)
    );
}

#[test]
fn test_unreadable_store_starts_fresh() {
    let mut snapshot = SessionSnapshot::default();
    snapshot.last_opened = Some(BookKey::new("a.m4b"));
    let store = MemorySessionStore::with_snapshot(snapshot);
    store.set_unavailable(true);

    let h = Harness::build(store, FakeOutput::ready(), PlayerConfig::default());
    assert_eq!(h.engine.last_opened(), None);
    assert_eq!(h.engine.stats().total_seconds(), 0);
}

#[test]
fn test_settings_save_without_a_book() {
    let mut h = Harness::new();
    h.engine.set_remote_mapping(RemoteControlMapping {
        swap_buttons: true,
        ..Default::default()
    });

    h.advance(2_000);
    let saved = h.store.last_saved().expect("saved");
    assert!(saved.remote_controls.swap_buttons);
    assert!(saved.books.is_empty());
}

#[test]
fn test_shutdown_flushes_and_stops_timers() {
    let mut h = Harness::new();
    h.load(book("a.m4b"), 3600.0);
    h.play();
    h.engine.set_sleep_timer_minutes(10);
    h.advance(5_000);
    h.report_time(42.0);

    h.engine.shutdown();
    assert_eq!(h.engine.next_deadline(), None);
    assert!(h.engine.audiobook().is_none());
    assert!(h.main.state().paused);

    let saved = h.store.last_saved().expect("saved");
    assert_eq!(saved.stats.seconds_on(today()), 5);
    assert_eq!(
        saved.book(&BookKey::new("a.m4b")).map(|s| s.current_time),
        Some(42.0)
    );
}

#[test]
fn test_custom_timings_apply() {
    let settings = PlayerConfig {
        long_press_threshold_ms: 200,
        save_debounce_ms: 500,
        ..Default::default()
    };
    let mut h = Harness::build(MemorySessionStore::new(), FakeOutput::ready(), settings);
    h.load(book("a.m4b"), 3600.0);
    h.report_time(100.0);

    h.engine.remote_press(RemoteButton::Previous);
    h.advance(200);
    assert_eq!(h.engine.current_time(), 55.0);

    let events = h.advance(500);
    assert!(events.contains(&EngineEvent::SessionSaved));
}
