use crate::map::DEFAULT_ZOOM;
use crate::types::{Coords, parse_degrees};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_STORE: &str = "mapty.sqlite";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log runs and rides by clicking a map; workouts persist between sessions"
)]
pub struct Cli {
    /// SQLite file holding the workout store.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STORE, global = true)]
    pub store: PathBuf,

    /// Keep workouts in memory only; nothing is written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Latitude reported as the device position.
    ///
    /// Without both --lat and --lng the position request is denied and the
    /// session runs without a map.
    #[arg(long, allow_negative_numbers = true, value_parser = parse_degrees)]
    pub lat: Option<f64>,

    /// Longitude reported as the device position.
    #[arg(long, allow_negative_numbers = true, value_parser = parse_degrees)]
    pub lng: Option<f64>,

    /// Map zoom level used for the initial view and when recentering.
    #[arg(long, default_value_t = DEFAULT_ZOOM)]
    pub zoom: u8,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmd {
    /// Print stored workouts and exit.
    List,
    /// Delete all stored workouts.
    Reset,
}

impl Cli {
    pub fn position(&self) -> Option<Coords> {
        self.lat.zip(self.lng).map(|(lat, lng)| Coords::new(lat, lng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn position_needs_both_coordinates() {
        let cli = Cli::parse_from(["mapty", "--lat", "39.7", "--lng", "-8.1"]);
        assert_eq!(cli.position(), Some(Coords::new(39.7, -8.1)));
        assert_eq!(cli.zoom, DEFAULT_ZOOM);

        let cli = Cli::parse_from(["mapty", "--lat", "39.7"]);
        assert_eq!(cli.position(), None);
    }

    #[test]
    fn non_finite_position_is_rejected() {
        assert!(Cli::try_parse_from(["mapty", "--lat", "NaN", "--lng", "0"]).is_err());
        assert!(Cli::try_parse_from(["mapty", "--lat", "1", "--lng", "inf"]).is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from(["mapty", "--ephemeral", "reset"]);
        assert_eq!(cli.cmd, Some(Cmd::Reset));
        assert!(cli.ephemeral);
    }
}
