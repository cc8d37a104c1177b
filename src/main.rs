//! keyweave: shows how terminal input resolves under the configured mappings.
//!
//! Each resolution is printed with the mode it was resolved in. Ctrl-Q quits.

use std::io::{self, Write};

use keyweave::kernel::resolver::Resolution;
use keyweave::kernel::services::adapters::{build_session, ensure_settings_file, load_settings};
use keyweave::kernel::services::ports::Settings;
use keyweave::kernel::{render, ModeKeys};
use keyweave::tui::{RawTerminal, TerminalSource};

mod logging;

fn main() -> io::Result<()> {
    let logging = logging::init();
    if let Some(guard) = &logging {
        eprintln!("logs: {}", guard.log_dir().display());
    }

    let settings = match ensure_settings_file() {
        Ok(path) => load_settings(&path).unwrap_or_else(|err| {
            eprintln!("{}: {err}; using defaults", path.display());
            Settings::default()
        }),
        Err(err) => {
            tracing::warn!(error = %err, "no settings file");
            Settings::default()
        }
    };

    let (mut session, rule_errors) =
        build_session(&settings).map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    for err in &rule_errors {
        eprintln!("{err}");
    }

    let mut source = TerminalSource::new(session.encoding().clone());
    let mut keys = ModeKeys::new();
    let terminal = RawTerminal::enter()?;
    let mut stdout = io::stdout();
    write!(stdout, "keyweave: type keys, Ctrl-Q quits\r\n")?;
    stdout.flush()?;

    let result = loop {
        let resolution = match session.next(&mut source) {
            Ok(resolution) => resolution,
            Err(err) => break Err(io::Error::new(io::ErrorKind::Other, err)),
        };
        let mode = session.mode().name();
        let line = describe(&resolution, session.encoding());
        write!(stdout, "{mode:<10} {line}\r\n")?;

        if let Err(err) = session.dispatch(&resolution, &mut keys) {
            tracing::warn!(error = %err, "mode change rejected");
            write!(stdout, "{:<10} ! {err}\r\n", "")?;
        }
        stdout.flush()?;

        if keys.quit_requested() {
            break Ok(());
        }
    };

    terminal.restore()?;
    result
}

fn describe(resolution: &Resolution, encoding: &keyweave::core::Encoding) -> String {
    use keyweave::core::command::Command;
    use keyweave::core::keycode::encode_key;
    use keyweave::core::event::KeyKind;

    match resolution {
        Resolution::Character(ch) => format!("char {:?}", ch.to_text()),
        Resolution::Command(Command::Key { key, modifiers }) => {
            let bytes = encode_key(&KeyKind::Char(key.clone()), *modifiers, encoding);
            format!("key {}", render(&bytes, encoding))
        }
        Resolution::Command(Command::Special { key, modifiers }) => {
            let bytes = encode_key(&KeyKind::Special(*key), *modifiers, encoding);
            format!("key {}", render(&bytes, encoding))
        }
        Resolution::Command(Command::Mouse { mouse, modifiers }) => format!(
            "mouse {:?} x{} at {},{} {:?}",
            mouse.action, mouse.clicks, mouse.position.x, mouse.position.y, modifiers
        ),
        Resolution::Command(command) => format!("command {}", command.name()),
        Resolution::NeedMoreInput { .. } => "waiting".to_string(),
        Resolution::Cancelled(reason) => format!("cancelled: {reason}"),
    }
}
