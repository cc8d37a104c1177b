use super::*;
use crate::core::event::{CharKey, MousePosition};

#[test]
fn mouse_code_packs_button_modifiers_and_clicks() {
    let code = mouse_code(
        MouseAction::Down(MouseButton::Right),
        2,
        KeyModifiers::SHIFT | KeyModifiers::CONTROL,
    );
    assert_eq!(code & 0x03, MOUSE_RIGHT);
    assert_eq!(code & MOUSE_SHIFT, MOUSE_SHIFT);
    assert_eq!(code & MOUSE_CTRL, MOUSE_CTRL);
    assert_eq!(code & MOUSE_ALT, 0);
    assert_eq!(code >> 5, 1);

    let (action, clicks, mods) = parse_mouse_code(code);
    assert_eq!(action, MouseAction::Down(MouseButton::Right));
    assert_eq!(clicks, 2);
    assert_eq!(mods, KeyModifiers::SHIFT | KeyModifiers::CONTROL);
}

#[test]
fn mouse_code_ranges_decode_to_actions() {
    let cases = [
        (MouseAction::Up, 1),
        (MouseAction::Drag(MouseButton::Middle), 1),
        (MouseAction::ScrollUp, 1),
        (MouseAction::ScrollDown, 1),
        (MouseAction::ScrollLeft, 1),
        (MouseAction::ScrollRight, 1),
        (MouseAction::Extra(1), 1),
        (MouseAction::Extra(2), 1),
        (MouseAction::Moved, 1),
        (MouseAction::Down(MouseButton::Left), 4),
    ];
    for (action, clicks) in cases {
        let code = mouse_code(action, clicks, KeyModifiers::NONE);
        let (decoded, decoded_clicks, mods) = parse_mouse_code(code);
        assert_eq!(decoded, action, "code {code:#x}");
        assert_eq!(decoded_clicks, clicks);
        assert!(mods.is_empty());
    }
}

#[test]
fn click_count_is_clamped_to_four() {
    let code = mouse_code(MouseAction::Down(MouseButton::Left), 9, KeyModifiers::NONE);
    assert_eq!(parse_mouse_code(code).1, MAX_CLICKS);
}

#[test]
fn special_key_gets_reserved_prefix() {
    let bytes = encode_key(
        &KeyKind::Special(SpecialKey::Up),
        KeyModifiers::NONE,
        &Encoding::utf8(),
    );
    assert_eq!(bytes, vec![K_SPECIAL, b'k', b'u']);
}

#[test]
fn modifiers_become_a_prefix() {
    let bytes = encode_key(
        &KeyKind::Special(SpecialKey::F(5)),
        KeyModifiers::ALT,
        &Encoding::utf8(),
    );
    assert_eq!(
        bytes,
        vec![K_SPECIAL, KS_MODIFIER, KeyModifiers::ALT.bits(), K_SPECIAL, b'k', b'5']
    );
}

#[test]
fn mouse_report_carries_position_big_endian() {
    let mouse = MouseKey {
        action: MouseAction::Down(MouseButton::Left),
        clicks: 1,
        position: MousePosition::new(300, 2),
    };
    let bytes = encode_key(&KeyKind::Mouse(mouse), KeyModifiers::SHIFT, &Encoding::utf8());
    assert_eq!(bytes.len(), MOUSE_REPORT_LEN);
    assert_eq!(&bytes[..2], &[K_SPECIAL, KS_MOUSE]);
    assert_eq!(bytes[2] & MOUSE_SHIFT, MOUSE_SHIFT);
    assert_eq!(&bytes[3..5], &[0, 2]);
    assert_eq!(&bytes[5..7], &[1, 44]);
}

#[test]
fn utf8_encoding_covers_long_forms() {
    let mut out = Vec::new();
    utf8_encode('é' as u32, &mut out);
    assert_eq!(out, "é".as_bytes());

    out.clear();
    utf8_encode(0x20_0000, &mut out);
    assert_eq!(out, vec![0xF8, 0x88, 0x80, 0x80, 0x80]);

    out.clear();
    utf8_encode(0x7FFF_FFFF, &mut out);
    assert_eq!(out.len(), 6);
    assert_eq!(out[0], 0xFD);
}

#[test]
fn eight_bit_escapes_the_reserved_byte() {
    let mut out = Vec::new();
    encode_char(0x80, &[], &Encoding::latin1(), &mut out);
    assert_eq!(out, vec![K_SPECIAL, KS_SPECIAL, KE_FILLER]);

    out.clear();
    encode_char(0x4E2D, &[], &Encoding::latin1(), &mut out);
    assert_eq!(out, b"?");
}

#[test]
fn composing_characters_follow_the_base() {
    let ch = CharKey {
        code: 'a' as u32,
        composing: vec![0x308],
    };
    let bytes = encode_key(&KeyKind::Char(ch), KeyModifiers::NONE, &Encoding::utf8());
    assert_eq!(bytes, "a\u{308}".as_bytes());
}

#[test]
fn char_key_folds_shift_and_ctrl() {
    let enc = Encoding::utf8();
    let mut out = Vec::new();
    encode_char_key('a' as u32, KeyModifiers::CONTROL, &enc, &mut out);
    assert_eq!(out, vec![0x01]);

    out.clear();
    encode_char_key('a' as u32, KeyModifiers::SHIFT, &enc, &mut out);
    assert_eq!(out, b"A");

    out.clear();
    encode_char_key('x' as u32, KeyModifiers::ALT, &enc, &mut out);
    assert_eq!(out, vec![K_SPECIAL, KS_MODIFIER, KeyModifiers::ALT.bits(), b'x']);

    out.clear();
    encode_char_key('1' as u32, KeyModifiers::CONTROL, &enc, &mut out);
    assert_eq!(out, vec![K_SPECIAL, KS_MODIFIER, KeyModifiers::CONTROL.bits(), b'1']);
}
