use super::*;
use crate::core::event::{MouseAction, MouseButton};
use crate::core::keycode::encode_key;

fn keys(bytes: &[u8], encoding: &Encoding) -> Vec<KeyEvent> {
    decode(bytes, encoding)
        .map(|d| match d {
            Decoded::Key(event) => event,
            Decoded::Incomplete { offset } => panic!("incomplete at {offset}"),
        })
        .collect()
}

fn code_of(event: &KeyEvent) -> u32 {
    event.as_char().map(|c| c.code).unwrap()
}

#[test]
fn ascii_decodes_one_key_per_byte() {
    let events = keys(b"jk", &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(code_of(&events[0]), 'j' as u32);
    assert_eq!(events[1].raw(), b"k");
}

#[test]
fn multibyte_character_is_one_key() {
    let events = keys("é中".as_bytes(), &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(code_of(&events[0]), 'é' as u32);
    assert_eq!(events[0].byte_len(), 2);
    assert_eq!(code_of(&events[1]), '中' as u32);
}

#[test]
fn truncated_utf8_is_incomplete() {
    let bytes = [b'a', 0xE4, 0xB8];
    let out: Vec<_> = decode(&bytes, &Encoding::utf8()).collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1], Decoded::Incomplete { offset: 1 });
}

#[test]
fn bad_continuation_falls_back_to_literal_byte() {
    let events = keys(&[0xE4, b'a'], &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].raw(), &[0xE4]);
    assert_eq!(code_of(&events[0]), 0xE4);
    assert_eq!(code_of(&events[1]), 'a' as u32);
}

#[test]
fn overlong_form_is_rejected() {
    let events = keys(&[0xC0, 0xAF], &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].raw(), &[0xC0]);
    assert_eq!(events[1].raw(), &[0xAF]);
}

#[test]
fn combining_marks_fuse_onto_base() {
    let events = keys("e\u{301}x".as_bytes(), &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_char().unwrap().composing, vec![0x301]);
    assert_eq!(events[0].byte_len(), 3);
}

#[test]
fn combining_marks_are_capped() {
    let mut text = String::from("a");
    for _ in 0..=MAX_MCO {
        text.push('\u{301}');
    }
    let events = keys(text.as_bytes(), &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].as_char().unwrap().composing.len(), MAX_MCO);
    assert_eq!(code_of(&events[1]), 0x301);
}

#[test]
fn special_key_with_modifiers() {
    let bytes = [K_SPECIAL, KS_MODIFIER, 0x04, K_SPECIAL, b'k', b'u'];
    let events = keys(&bytes, &Encoding::utf8());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), &KeyKind::Special(SpecialKey::Up));
    assert_eq!(events[0].modifiers(), KeyModifiers::CONTROL);
    assert_eq!(events[0].raw(), &bytes);
}

#[test]
fn escaped_special_byte_is_literal_0x80() {
    let events = keys(&[K_SPECIAL, KS_SPECIAL, KE_FILLER], &Encoding::latin1());
    assert_eq!(events.len(), 1);
    assert_eq!(code_of(&events[0]), 0x80);
}

#[test]
fn unknown_termcap_degrades_to_single_byte() {
    let events = keys(&[K_SPECIAL, b'z', b'z'], &Encoding::utf8());
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].raw(), &[K_SPECIAL]);
}

#[test]
fn mouse_report_decodes_with_position() {
    let mouse = MouseKey {
        action: MouseAction::Down(MouseButton::Left),
        clicks: 2,
        position: MousePosition::new(10, 4),
    };
    let bytes = encode_key(&KeyKind::Mouse(mouse), KeyModifiers::CONTROL, &Encoding::utf8());
    let events = keys(&bytes, &Encoding::utf8());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), &KeyKind::Mouse(mouse));
    assert_eq!(events[0].modifiers(), KeyModifiers::CONTROL);
}

#[test]
fn truncated_mouse_report_is_incomplete() {
    let out: Vec<_> = decode(&[K_SPECIAL, KS_MOUSE, 0x00, 0x00], &Encoding::utf8()).collect();
    assert_eq!(out, vec![Decoded::Incomplete { offset: 0 }]);
}

#[test]
fn dangling_modifier_prefix_is_incomplete() {
    let out: Vec<_> = decode(&[b'a', K_SPECIAL, KS_MODIFIER, 0x08], &Encoding::utf8()).collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1], Decoded::Incomplete { offset: 1 });
}

#[test]
fn dbcs_pair_decodes_big_endian() {
    let enc = Encoding::lookup("cp932").unwrap();
    let events = keys(&[0x82, 0xA0, b'a'], &enc);
    assert_eq!(events.len(), 2);
    assert_eq!(code_of(&events[0]), 0x82A0);
}

#[test]
fn dbcs_zero_trail_is_invalid() {
    let enc = Encoding::lookup("cp936").unwrap();
    let events = keys(&[0x81, 0x00], &enc);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].raw(), &[0x81]);
}

#[test]
fn mapping_side_pads_positionless_mouse() {
    let bytes = [K_SPECIAL, KS_MOUSE, 0x00, b'x'];
    let events = decode_mapping_side(&bytes, &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert!(events[0].is_mouse());
    assert_eq!(events[0].map_bytes(), &bytes[..3]);
    assert_eq!(code_of(&events[1]), 'x' as u32);
}

#[test]
fn mapping_side_takes_truncated_tail_literally() {
    let events = decode_mapping_side(&[b'a', 0xE4], &Encoding::utf8());
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].raw(), &[0xE4]);
}

#[test]
fn stream_keeps_tail_until_completed() {
    let t0 = Instant::now();
    let mut stream = StreamDecoder::new(Encoding::utf8());
    let first = stream.feed(&[b'a', 0xE4], t0);
    assert_eq!(first.len(), 1);
    assert_eq!(stream.pending_bytes(), &[0xE4]);
    assert_eq!(stream.incomplete_since(), Some(t0));

    let second = stream.feed(&[0xB8, 0xAD], t0 + std::time::Duration::from_millis(5));
    assert_eq!(second.len(), 1);
    assert_eq!(code_of(&second[0]), '中' as u32);
    assert!(stream.pending_bytes().is_empty());
    assert_eq!(stream.incomplete_since(), None);
}

#[test]
fn stream_flush_emits_bytes_literally() {
    let mut stream = StreamDecoder::new(Encoding::utf8());
    stream.feed(&[K_SPECIAL, KS_MODIFIER], Instant::now());
    let flushed = stream.flush();
    assert_eq!(flushed.len(), 2);
    assert_eq!(flushed[0].raw(), &[K_SPECIAL]);
    assert_eq!(flushed[1].raw(), &[KS_MODIFIER]);
    assert!(stream.pending_bytes().is_empty());
}

#[test]
fn switching_encoding_flushes_tail() {
    let mut stream = StreamDecoder::new(Encoding::utf8());
    stream.feed(&[0xC3], Instant::now());
    let flushed = stream.set_encoding(Encoding::latin1());
    assert_eq!(flushed.len(), 1);
    assert_eq!(stream.encoding().name(), "latin1");
    let events = stream.feed(&[0xC3], Instant::now());
    assert_eq!(events.len(), 1);
    assert_eq!(code_of(&events[0]), 0xC3);
}
