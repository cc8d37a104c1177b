use super::*;
use crate::core::event::{CharKey, KeyModifiers};

fn key(c: char) -> Resolution {
    Resolution::Command(Command::Key {
        key: CharKey::new(c as u32),
        modifiers: KeyModifiers::NONE,
    })
}

fn ctrl(code: u32) -> Resolution {
    Resolution::Command(Command::Key {
        key: CharKey::new(code),
        modifiers: KeyModifiers::NONE,
    })
}

#[test]
fn normal_mode_entry_keys() {
    let mut keys = ModeKeys::new();
    let normal = Mode::normal();
    assert_eq!(keys.dispatch(&key('i'), &normal), ModeEffect::Insert);
    assert_eq!(keys.dispatch(&key('O'), &normal), ModeEffect::Insert);
    assert_eq!(keys.dispatch(&key('R'), &normal), ModeEffect::Replace);
    assert_eq!(keys.dispatch(&key('v'), &normal), ModeEffect::Visual);
    assert_eq!(keys.dispatch(&key(':'), &normal), ModeEffect::CommandLine);
    assert_eq!(keys.dispatch(&key('d'), &normal), ModeEffect::OperatorPending);
    assert_eq!(keys.dispatch(&key('x'), &normal), ModeEffect::None);
}

#[test]
fn escape_returns_to_normal() {
    let mut keys = ModeKeys::new();
    let esc = Resolution::Command(Command::Escape);
    assert_eq!(keys.dispatch(&esc, &Mode::insert()), ModeEffect::Normal);
    assert_eq!(keys.dispatch(&esc, &Mode::visual()), ModeEffect::Normal);
    assert_eq!(keys.dispatch(&esc, &Mode::normal()), ModeEffect::None);
}

#[test]
fn insert_key_toggles_replace() {
    let mut keys = ModeKeys::new();
    let ins = Resolution::Command(Command::Special {
        key: SpecialKey::Insert,
        modifiers: KeyModifiers::NONE,
    });
    let insert = Mode::insert();
    assert_eq!(keys.dispatch(&ins, &insert), ModeEffect::SetReplace(true));
    let replace = insert.transition(ModeEffect::SetReplace(true)).unwrap();
    assert_eq!(keys.dispatch(&ins, &replace), ModeEffect::SetReplace(false));
    let vreplace = Mode::normal().transition(ModeEffect::VirtualReplace).unwrap();
    assert_eq!(keys.dispatch(&ins, &vreplace), ModeEffect::Insert);
}

#[test]
fn visual_and_select_switching() {
    let mut keys = ModeKeys::new();
    let visual = Mode::visual();
    assert_eq!(keys.dispatch(&ctrl(CTRL_G), &visual), ModeEffect::Select);
    let select = visual.transition(ModeEffect::Select).unwrap();
    assert_eq!(keys.dispatch(&ctrl(CTRL_G), &select), ModeEffect::Visual);
    assert_eq!(
        keys.dispatch(&Resolution::Character(CharKey::new('a' as u32)), &select),
        ModeEffect::Insert
    );
    assert_eq!(keys.dispatch(&key('V'), &visual), ModeEffect::Normal);
}

#[test]
fn operator_pending_ends_on_any_command() {
    let mut keys = ModeKeys::new();
    let op = Mode::normal().transition(ModeEffect::OperatorPending).unwrap();
    assert_eq!(keys.dispatch(&key('w'), &op), ModeEffect::Normal);
}

#[test]
fn cmdline_enter_returns_to_normal() {
    let mut keys = ModeKeys::new();
    let cmdline = Mode::cmdline();
    assert_eq!(
        keys.dispatch(&Resolution::Command(Command::Enter), &cmdline),
        ModeEffect::Normal
    );
    assert_eq!(
        keys.dispatch(&Resolution::Character(CharKey::new('w' as u32)), &cmdline),
        ModeEffect::None
    );
}

#[test]
fn interrupt_leaves_non_normal_modes() {
    let mut keys = ModeKeys::new();
    let cancelled = Resolution::Cancelled(CancelReason::Interrupted);
    assert_eq!(keys.dispatch(&cancelled, &Mode::insert()), ModeEffect::Normal);
    assert_eq!(keys.dispatch(&cancelled, &Mode::normal()), ModeEffect::None);
}

#[test]
fn ctrl_q_requests_quit() {
    let mut keys = ModeKeys::new();
    assert!(!keys.quit_requested());
    assert_eq!(keys.dispatch(&ctrl(CTRL_Q), &Mode::insert()), ModeEffect::None);
    assert!(keys.quit_requested());
}
