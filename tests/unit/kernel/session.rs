use super::*;
use std::sync::mpsc;

use crate::core::command::Command;
use crate::core::event::{CharKey, KeyModifiers};
use crate::kernel::dispatch::ModeKeys;
use crate::kernel::resolver::DEFAULT_TIMEOUT;

fn session_with(specs: Vec<MappingSpec>) -> InputSession {
    let mut session = InputSession::new(SessionConfig::default(), MappingTable::new());
    for spec in specs {
        session.define(spec).unwrap();
    }
    session
}

fn insert_session(specs: Vec<MappingSpec>) -> InputSession {
    let mut session = session_with(specs);
    session.apply(ModeEffect::Insert).unwrap();
    session
}

#[test]
fn starts_in_normal_mode_with_defaults() {
    let session = session_with(Vec::new());
    assert!(session.mode().is_normal());
    assert_eq!(session.encoding().name(), "utf-8");
    assert_eq!(session.buffer(), None);
    assert!(session.table().is_empty());
}

#[test]
fn bytes_flow_through_to_resolution() {
    let mut session = insert_session(vec![MappingSpec::new("jj", vec![0x1B], MapModes::INSERT)]);
    let now = Instant::now();
    session.feed(b"jj", now);
    assert_eq!(session.poll(now), Resolution::Command(Command::Escape));
}

#[test]
fn incomplete_key_is_flushed_after_key_timeout() {
    let mut session = session_with(Vec::new());
    let t0 = Instant::now();
    session.feed(&[0xE4], t0);
    assert_eq!(
        session.poll(t0),
        Resolution::NeedMoreInput {
            deadline: Some(t0 + DEFAULT_KEY_TIMEOUT)
        }
    );
    assert_eq!(
        session.poll(t0 + DEFAULT_KEY_TIMEOUT),
        Resolution::Command(Command::Key {
            key: CharKey::new(0xE4),
            modifiers: KeyModifiers::NONE
        })
    );
}

#[test]
fn earliest_deadline_is_reported() {
    let mut session = insert_session(vec![MappingSpec::new("jj", vec![0x1B], MapModes::INSERT)]);
    let t0 = Instant::now();
    session.feed(b"j", t0);
    assert_eq!(
        session.poll(t0),
        Resolution::NeedMoreInput {
            deadline: Some(t0 + DEFAULT_TIMEOUT)
        }
    );
    let t1 = t0 + Duration::from_millis(10);
    session.feed(&[0xE4], t1);
    assert_eq!(
        session.poll(t1),
        Resolution::NeedMoreInput {
            deadline: Some(t1 + DEFAULT_KEY_TIMEOUT)
        }
    );
}

#[test]
fn key_fed_before_deadline_completes_mapping_when_polled_late() {
    let mut session = session_with(vec![MappingSpec::new("ab", "X", MapModes::NORMAL)]);
    let t0 = Instant::now();
    session.feed(b"a", t0);
    assert!(matches!(
        session.poll(t0),
        Resolution::NeedMoreInput { deadline: Some(_) }
    ));
    session.feed(b"b", t0 + Duration::from_millis(10));
    assert_eq!(
        session.poll(t0 + Duration::from_secs(2)),
        Resolution::Command(Command::Key {
            key: CharKey::new('X' as u32),
            modifiers: KeyModifiers::NONE
        })
    );
}

#[test]
fn zero_timeout_maps_keys_that_arrive_together() {
    let config = SessionConfig {
        resolver: ResolverConfig {
            timeout: Some(Duration::ZERO),
            ..ResolverConfig::default()
        },
        ..SessionConfig::default()
    };
    let mut session = InputSession::new(config, MappingTable::new());
    session
        .define(MappingSpec::new("jj", vec![0x1B], MapModes::INSERT))
        .unwrap();
    session.apply(ModeEffect::Insert).unwrap();
    let t0 = Instant::now();

    session.feed(b"jj", t0);
    assert_eq!(session.poll(t0), Resolution::Command(Command::Escape));

    session.feed(b"j", t0);
    assert_eq!(session.poll(t0), Resolution::Character(CharKey::new('j' as u32)));
}

#[test]
fn invalid_effect_is_rejected_and_mode_kept() {
    let mut session = session_with(Vec::new());
    let err = session.apply(ModeEffect::SetReplace(true)).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Mode(ModeError::InvalidModeTransition { .. })
    ));
    assert!(session.mode().is_normal());
}

#[test]
fn dispatch_applies_returned_effect() {
    let mut session = session_with(Vec::new());
    let mut keys = ModeKeys::new();
    let now = Instant::now();
    session.feed(b"i", now);
    let resolution = session.poll(now);
    let mode = session.dispatch(&resolution, &mut keys).unwrap();
    assert!(mode.is_insert());

    session.feed(b"x", now);
    assert_eq!(
        session.poll(now),
        Resolution::Character(CharKey::new('x' as u32))
    );
}

#[test]
fn buffer_local_mappings_follow_active_buffer() {
    let buf = BufferId(9);
    let mut session = session_with(vec![
        MappingSpec::new("q", "a", MapModes::NORMAL).buffer(buf),
    ]);
    let now = Instant::now();
    session.feed(b"q", now);
    assert_eq!(
        session.poll(now),
        Resolution::Command(Command::Key {
            key: CharKey::new('q' as u32),
            modifiers: KeyModifiers::NONE
        })
    );

    session.set_buffer(Some(buf));
    session.feed(b"q", now);
    assert_eq!(
        session.poll(now),
        Resolution::Command(Command::Key {
            key: CharKey::new('a' as u32),
            modifiers: KeyModifiers::NONE
        })
    );

    assert_eq!(session.buffer_destroyed(buf), 1);
    assert_eq!(session.buffer(), None);
}

#[test]
fn undefine_through_session() {
    let mut session = session_with(vec![MappingSpec::new("q", "a", MapModes::NORMAL)]);
    session.undefine(b"q", MapModes::NORMAL, MapScope::Global).unwrap();
    assert!(session.table().is_empty());
    assert!(session.undefine(b"q", MapModes::NORMAL, MapScope::Global).is_err());
}

#[test]
fn encoding_switch_flushes_partial_input() {
    let mut session = insert_session(Vec::new());
    let now = Instant::now();
    session.feed(&[0xC3], now);
    session.set_encoding(Encoding::latin1());
    assert_eq!(session.encoding().name(), "latin1");
    assert_eq!(
        session.poll(now),
        Resolution::Character(CharKey::new(0xC3))
    );
}

#[test]
fn session_interrupt_clears_pending() {
    let mut session = insert_session(vec![MappingSpec::new("jj", vec![0x1B], MapModes::INSERT)]);
    let now = Instant::now();
    session.feed(b"j", now);
    session.poll(now);
    assert!(session.interrupt());
    assert!(session.resolver().pending().is_empty());
}

#[test]
fn next_reads_from_channel() {
    let (tx, rx) = mpsc::channel();
    let mut source = ChannelSource::new(rx);
    let mut session = insert_session(vec![MappingSpec::new("jj", vec![0x1B], MapModes::INSERT)]);
    tx.send(b"jj".to_vec()).unwrap();
    assert_eq!(
        session.next(&mut source).unwrap(),
        Resolution::Command(Command::Escape)
    );

    drop(tx);
    assert!(matches!(
        session.next(&mut source),
        Err(SessionError::SourceClosed)
    ));
}

#[test]
fn channel_wait_times_out_without_input() {
    let (_tx, rx) = mpsc::channel::<Vec<u8>>();
    let mut source = ChannelSource::new(rx);
    assert!(source.wait(Some(Instant::now())).unwrap().is_none());
}
