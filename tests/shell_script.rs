use mapty::map::{FixedLocation, HeadlessMap, MapSurface};
use mapty::session::Session;
use mapty::shell;
use mapty::storage::{MemoryStore, WorkoutStorage};
use mapty::types::Coords;

fn run_script(location: FixedLocation, script: &str) -> (String, usize) {
    let map = MapSurface::new(HeadlessMap::new(), location, 13);
    let mut session = Session::new(WorkoutStorage::new(MemoryStore::new()), map);
    session.start();

    let mut out = Vec::new();
    shell::run(&mut session, script.as_bytes(), &mut out).unwrap();
    (String::from_utf8(out).unwrap(), session.workouts().len())
}

#[test]
fn scripted_session_logs_both_kinds() {
    let script = "\
# a run and a ride
click 39.74 -8.81
submit 5 30 170
click 39.75 -8.80
type cycling
submit 20 60 -10
list
";
    let (out, logged) = run_script(FixedLocation::at(Coords::new(39.7, -8.8)), script);

    assert_eq!(logged, 2);
    assert!(out.contains("workout--running"));
    assert!(out.contains("workout--cycling"));
    assert!(!out.contains("alert:"));
}

#[test]
fn rejected_input_prints_alert() {
    let (out, logged) = run_script(
        FixedLocation::at(Coords::new(39.7, -8.8)),
        "click 1 1\nsubmit 5 30 0\n",
    );
    assert_eq!(logged, 0);
    assert!(out.contains("alert: Input must be a positive value"));
}

#[test]
fn denied_location_leaves_nothing_to_click() {
    let (out, logged) = run_script(FixedLocation::denied(), "click 1 1\nsubmit 5 30 170\n");
    assert_eq!(logged, 0);
    assert!(out.contains("alert: ERROR : Location could not be retrieved."));
    assert!(out.contains("no map to click on"));
    assert!(out.contains("click the map first"));
}

#[test]
fn quit_stops_reading() {
    let (out, logged) = run_script(
        FixedLocation::at(Coords::new(0.0, 0.0)),
        "quit\nclick 1 1\nsubmit 5 30 170\n",
    );
    assert_eq!(logged, 0);
    assert!(out.is_empty());
}

#[test]
fn bad_command_is_reported_and_skipped() {
    let (out, logged) = run_script(
        FixedLocation::at(Coords::new(0.0, 0.0)),
        "teleport\nclick 1 1\nsubmit 5 30 170\n",
    );
    assert_eq!(logged, 1);
    assert!(out.contains("error: unrecognized command: teleport"));
}

#[test]
fn non_finite_click_is_refused() {
    let map = MapSurface::new(HeadlessMap::new(), FixedLocation::at(Coords::new(0.0, 0.0)), 13);
    let mut session = Session::new(WorkoutStorage::new(MemoryStore::new()), map);
    session.start();

    let mut out = Vec::new();
    shell::run(&mut session, "click NaN 0\nclick 1 inf\nsubmit 5 30 170\n".as_bytes(), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert_eq!(out.matches("error: bad latitude").count(), 1);
    assert_eq!(out.matches("error: bad longitude").count(), 1);
    assert!(out.contains("click the map first"));
    assert!(!session.form().is_visible());
    assert!(session.workouts().is_empty());
    assert!(session.storage().load().is_empty());
}
