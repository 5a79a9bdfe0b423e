//! Hidden password input on a raw-mode terminal.

use std::{
    error::Error,
    io::{Stderr, Write},
};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

type PromptResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const MAX_ATTEMPTS: usize = 3;

/// Restores cooked mode when dropped, also on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> PromptResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn show_line(out: &mut Stderr, line: &str) -> PromptResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    out.flush()?;
    Ok(())
}

/// Read one line, echoing `*` per character.
fn read_hidden(label: &str) -> PromptResult<String> {
    let _raw = RawModeGuard::enter()?;
    let mut out = std::io::stderr();
    show_line(&mut out, label)?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => break,
            KeyCode::Backspace if secret.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                secret.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    out.flush()?;
    Ok(secret)
}

/// Ask for a new password and its confirmation.
pub fn new_password() -> PromptResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..MAX_ATTEMPTS {
        let password = read_hidden("Password: ")?;
        if password.is_empty() {
            show_line(&mut out, "Password must not be empty.\r\n")?;
            continue;
        }
        if read_hidden("Confirm password: ")? == password {
            return Ok(password);
        }
        show_line(&mut out, "Passwords do not match. Try again.\r\n")?;
    }

    Err("too many attempts".into())
}
