use super::*;
use std::time::Duration;

fn key(b: u8) -> KeyEvent {
    KeyEvent::literal_byte(b)
}

fn bytes(queue: &Typeahead) -> Vec<u8> {
    queue.keys.iter().flat_map(|k| k.event.raw().to_vec()).collect()
}

#[test]
fn typed_keys_queue_in_order() {
    let mut queue = Typeahead::new();
    let t0 = Instant::now();
    queue.push_typed(key(b'a'), Some(t0));
    queue.push_typed(key(b'b'), None);
    assert_eq!(queue.len(), 2);
    let first = queue.pop_front().unwrap();
    assert!(first.is_typed());
    assert_eq!(first.policy(), RemapPolicy::Allowed);
    assert_eq!(first.event.raw(), b"a");
    assert_eq!(first.at, Some(t0));
    assert_eq!(queue.front().unwrap().at, None);
}

#[test]
fn expansion_goes_in_front_preserving_order() {
    let mut queue = Typeahead::new();
    queue.push_typed(key(b'z'), Some(Instant::now() + Duration::from_millis(5)));
    queue.push_front_all(vec![
        QueuedKey::mapped(key(b'x'), RemapPolicy::Allowed),
        QueuedKey::mapped(key(b'y'), RemapPolicy::Never),
    ]);
    assert_eq!(bytes(&queue), b"xyz");
    assert_eq!(queue.mapped_len(), 2);
    let front = queue.front().unwrap();
    assert_eq!(front.policy(), RemapPolicy::Allowed);
    assert_eq!(front.at, None);
}

#[test]
fn discarding_mapped_keeps_typed() {
    let mut queue = Typeahead::new();
    queue.push_typed(key(b'a'), None);
    queue.push_front_all(vec![QueuedKey::mapped(key(b'm'), RemapPolicy::ScriptOnly)]);
    queue.push_typed(key(b'b'), None);
    assert_eq!(queue.discard_mapped(), 1);
    assert_eq!(bytes(&queue), b"ab");
    assert_eq!(queue.discard_mapped(), 0);

    queue.pop_front();
    queue.pop_front();
    assert!(queue.is_empty());
    assert!(queue.pop_front().is_none());
}
