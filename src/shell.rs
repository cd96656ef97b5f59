//! Line-oriented driver for a session on a [`HeadlessMap`].
//!
//! ```text
//! click 39.74 -8.81        click the map
//! type cycling             change the type selector
//! set distance 12.5        type into a field
//! submit [dist dur extra]  submit, optionally filling the fields first
//! select <id>              click a list entry
//! list                     print the list
//! reset                    wipe everything and start over
//! quit
//! ```

use crate::form::Field;
use crate::map::{Geolocator, HeadlessMap};
use crate::session::{Phase, Session, UiEvent};
use crate::storage::KeyValueStore;
use crate::types::{Coords, WorkoutId, WorkoutKind, parse_degrees};
use anyhow::{Context, Result, bail};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Click(Coords),
    Type(WorkoutKind),
    Set(Field, String),
    Submit(Option<[String; 3]>),
    Select(WorkoutId),
    List,
    Reset,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  click <lat> <lng>
  type running|cycling
  set distance|duration|cadence|elevation <value>
  submit [<distance> <duration> <cadence|elevation>]
  select <id>
  list
  reset
  quit";

pub fn parse_command(line: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        bail!("empty command");
    };
    let args: Vec<&str> = words.collect();

    let cmd = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("click", [lat, lng]) => {
            let lat = parse_degrees(lat)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("bad latitude: {lat}"))?;
            let lng = parse_degrees(lng)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("bad longitude: {lng}"))?;
            Command::Click(Coords::new(lat, lng))
        }
        ("type", [kind]) => Command::Type(kind.parse().map_err(anyhow::Error::msg)?),
        ("set", [field, value]) => {
            Command::Set(field.parse().map_err(anyhow::Error::msg)?, (*value).to_string())
        }
        ("set", [field]) => {
            Command::Set(field.parse().map_err(anyhow::Error::msg)?, String::new())
        }
        ("submit", []) => Command::Submit(None),
        ("submit", [a, b, c]) => Command::Submit(Some([
            (*a).to_string(),
            (*b).to_string(),
            (*c).to_string(),
        ])),
        ("select", [id]) => Command::Select(WorkoutId::from(*id)),
        ("list" | "ls", []) => Command::List,
        ("reset", []) => Command::Reset,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (other, _) => bail!("unrecognized command: {other} (try `help`)"),
    };
    Ok(cmd)
}

/// Reads commands from `input` until EOF or `quit`, writing list output,
/// alerts and errors to `out`.
pub fn run<S, G, R, W>(session: &mut Session<S, HeadlessMap, G>, input: R, mut out: W) -> Result<()>
where
    S: KeyValueStore,
    G: Geolocator,
    R: BufRead,
    W: Write,
{
    flush_alerts(session, &mut out)?;

    for line in input.lines() {
        let line = line.context("reading command")?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        session.handle(UiEvent::Tick);

        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };

        if cmd == Command::Quit {
            break;
        }
        apply(session, cmd, &mut out)?;
        flush_alerts(session, &mut out)?;
    }

    out.flush()?;
    Ok(())
}

fn apply<S, G, W>(session: &mut Session<S, HeadlessMap, G>, cmd: Command, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    G: Geolocator,
    W: Write,
{
    match cmd {
        Command::Click(at) => {
            if !session.map_mut().backend_mut().click(at) {
                writeln!(out, "no map to click on")?;
            }
            session.pump();
        }
        Command::Type(kind) => session.handle(UiEvent::TypeChanged(kind)),
        Command::Set(field, value) => session.handle(UiEvent::InputChanged(field, value)),
        Command::Submit(values) => {
            if let Some([distance, duration, extra]) = values {
                let secondary = Field::secondary_for(session.form().kind());
                session.handle(UiEvent::InputChanged(Field::Distance, distance));
                session.handle(UiEvent::InputChanged(Field::Duration, duration));
                session.handle(UiEvent::InputChanged(secondary, extra));
            }
            let before = session.workouts().len();
            session.handle(UiEvent::Submitted);
            if session.workouts().len() > before {
                if let Some(entry) = session.list().first() {
                    writeln!(out, "{}", entry.markup)?;
                }
            } else if session.phase() == Phase::Idle {
                writeln!(out, "click the map first")?;
            }
        }
        Command::Select(id) => session.handle(UiEvent::WorkoutSelected(id)),
        Command::List => {
            for entry in session.list() {
                writeln!(out, "{}", entry.markup)?;
            }
        }
        Command::Reset => session.reset(),
        Command::Help => writeln!(out, "{HELP}")?,
        Command::Quit => {}
    }
    Ok(())
}

fn flush_alerts<S, G, W>(session: &mut Session<S, HeadlessMap, G>, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    G: Geolocator,
    W: Write,
{
    for alert in session.take_alerts() {
        writeln!(out, "alert: {alert}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_command("click 39.5 -8.25").unwrap(),
            Command::Click(Coords::new(39.5, -8.25))
        );
        assert_eq!(
            parse_command("TYPE cycling").unwrap(),
            Command::Type(WorkoutKind::Cycling)
        );
        assert_eq!(
            parse_command("set elevation -10").unwrap(),
            Command::Set(Field::Elevation, "-10".to_string())
        );
        assert_eq!(parse_command("set cadence").unwrap(), Command::Set(Field::Cadence, String::new()));
        assert_eq!(parse_command("submit").unwrap(), Command::Submit(None));
        assert_eq!(
            parse_command("select 0000123456").unwrap(),
            Command::Select(WorkoutId::from("0000123456"))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("click north south").is_err());
        assert!(parse_command("click NaN 0").is_err());
        assert!(parse_command("click 1 inf").is_err());
        assert!(parse_command("type swimming").is_err());
        assert!(parse_command("submit 1 2").is_err());
        assert!(parse_command("fly").is_err());
    }
}
