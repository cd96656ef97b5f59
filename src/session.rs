//! Session controller: owns the workout list and drives the
//! click -> form -> workout flow.

use crate::dlog;
use crate::error::LocationUnavailable;
use crate::form::{Field, WorkoutForm};
use crate::map::{Geolocator, MapBackend, MapSurface, popup_class};
use crate::render::{self, ListEntry};
use crate::storage::{KeyValueStore, WorkoutStorage};
use crate::types::{Coords, Workout, WorkoutId, WorkoutKind};
use chrono::{DateTime, Utc};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;

pub const LOCATION_ALERT: &str = "ERROR : Location could not be retrieved.";
pub const INPUT_ALERT: &str = "Input must be a positive value";

/// Everything the user (or a collaborator callback) can do to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    LocationResolved(Result<Coords, LocationUnavailable>),
    MapClicked(Coords),
    TypeChanged(WorkoutKind),
    InputChanged(Field, String),
    Submitted,
    /// A list entry was clicked; carries its `data-id`.
    WorkoutSelected(WorkoutId),
    /// Lets time-based form behavior catch up.
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    /// The form is open for a workout at `coords`, the most recent click.
    AwaitingSubmission { coords: Coords },
}

pub type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct Session<S, B, G> {
    storage: WorkoutStorage<S>,
    map: MapSurface<B, G>,
    form: WorkoutForm,
    workouts: Vec<Workout>,
    /// Newest first.
    list: Vec<ListEntry>,
    phase: Phase,
    alerts: Vec<String>,
    events: Sender<UiEvent>,
    inbox: Receiver<UiEvent>,
    clock: Clock,
}

impl<S: KeyValueStore, B: MapBackend, G: Geolocator> Session<S, B, G> {
    pub fn new(storage: WorkoutStorage<S>, map: MapSurface<B, G>) -> Self {
        let (events, inbox) = mpsc::channel();
        Self {
            storage,
            map,
            form: WorkoutForm::new(),
            workouts: Vec::new(),
            list: Vec::new(),
            phase: Phase::Idle,
            alerts: Vec::new(),
            events,
            inbox,
            clock: Box::new(Utc::now),
        }
    }

    /// Replaces the source of workout creation times.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Loads stored workouts into the list and asks for the device position.
    /// Markers for loaded workouts appear once the map exists.
    pub fn start(&mut self) {
        self.workouts = self.storage.load();
        self.list = self.workouts.iter().rev().filter_map(render_entry).collect();
        self.request_position();
    }

    fn request_position(&mut self) {
        tracing::info!(workouts = self.workouts.len(), "session started");

        let events = self.events.clone();
        self.map.acquire_position(Box::new(move |result| {
            if events.send(UiEvent::LocationResolved(result)).is_err() {
                dlog!("session gone before location resolved");
            }
        }));
        self.pump();
    }

    /// Handles queued collaborator events until none are left.
    pub fn pump(&mut self) {
        while let Ok(event) = self.inbox.try_recv() {
            self.handle(event);
        }
    }

    pub fn handle(&mut self, event: UiEvent) {
        dlog!("event {event:?}");
        match event {
            UiEvent::LocationResolved(Ok(center)) => self.on_location(center),
            UiEvent::LocationResolved(Err(e)) => {
                tracing::warn!(err = %e, "continuing without a map");
                self.alert(LOCATION_ALERT);
            }
            UiEvent::MapClicked(at) => {
                self.phase = Phase::AwaitingSubmission { coords: at };
                self.form.show();
            }
            UiEvent::TypeChanged(kind) => self.form.toggle_fields_for_type(kind),
            UiEvent::InputChanged(field, value) => self.form.set_value(field, value),
            UiEvent::Submitted => self.on_submit(),
            UiEvent::WorkoutSelected(id) => self.on_workout_selected(&id),
            UiEvent::Tick => self.form.tick(Instant::now()),
        }
    }

    fn on_location(&mut self, center: Coords) {
        if self.map.is_ready() {
            dlog!("location resolved again; map already exists");
            return;
        }
        self.map.initialize(center);

        let events = self.events.clone();
        self.map.on_map_clicked(move |at| {
            if events.send(UiEvent::MapClicked(at)).is_err() {
                dlog!("session gone; dropping click at {at}");
            }
        });

        for w in &self.workouts {
            place_marker(&mut self.map, w);
        }
    }

    fn on_submit(&mut self) {
        let Phase::AwaitingSubmission { coords } = self.phase else {
            dlog!("submit ignored: no pending map click");
            return;
        };

        let input = match self.form.validate() {
            Ok(input) => input,
            Err(e) => {
                tracing::info!(err = %e, "workout input rejected");
                self.alert(INPUT_ALERT);
                return;
            }
        };

        let workout = Workout::new(
            (self.clock)(),
            coords,
            input.distance,
            input.duration,
            input.effort,
        );
        tracing::info!(
            id = %workout.id(),
            kind = %workout.kind(),
            %coords,
            distance = workout.distance(),
            duration = workout.duration(),
            "workout logged"
        );

        place_marker(&mut self.map, &workout);
        if let Some(entry) = render_entry(&workout) {
            self.list.insert(0, entry);
        }
        self.workouts.push(workout);
        self.form.hide(Instant::now());
        self.storage.save(&self.workouts);
        self.phase = Phase::Idle;
    }

    fn on_workout_selected(&mut self, id: &WorkoutId) {
        let Some(w) = self.workouts.iter().find(|w| w.id() == id) else {
            dlog!("no workout with id={id}");
            return;
        };
        if !self.map.recenter(w.coords()) {
            dlog!("recenter ignored: no map");
        }
    }

    /// Drops every workout, stored and in memory, and starts over as if the
    /// app had just been opened.
    pub fn reset(&mut self) {
        tracing::info!(workouts = self.workouts.len(), "resetting session");
        let wiped = self.storage.clear() || self.storage.save(&[]);
        self.map.teardown();
        while self.inbox.try_recv().is_ok() {}

        self.workouts.clear();
        self.list.clear();
        self.form = WorkoutForm::new();
        self.phase = Phase::Idle;
        self.alerts.clear();

        if wiped {
            self.start();
        } else {
            tracing::warn!("stored workouts could not be wiped; not reloading them");
            self.request_position();
        }
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    /// Alerts raised since the last call, oldest first.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn list(&self) -> &[ListEntry] {
        &self.list
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn form(&self) -> &WorkoutForm {
        &self.form
    }

    pub const fn map(&self) -> &MapSurface<B, G> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MapSurface<B, G> {
        &mut self.map
    }

    pub const fn storage(&self) -> &WorkoutStorage<S> {
        &self.storage
    }
}

fn place_marker<B: MapBackend, G: Geolocator>(map: &mut MapSurface<B, G>, w: &Workout) {
    let label = render::popup_content(w);
    if !map.place_marker(w.coords(), &label, &popup_class(w.kind())) {
        dlog!("marker for id={} deferred until the map exists", w.id());
    }
}

fn render_entry(w: &Workout) -> Option<ListEntry> {
    match render::list_entry(w) {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(err = %e, id = %w.id(), "could not render workout");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{FixedLocation, HeadlessMap};
    use crate::storage::MemoryStore;

    type TestSession = Session<MemoryStore, HeadlessMap, FixedLocation>;

    fn session(location: FixedLocation) -> TestSession {
        let map = MapSurface::new(HeadlessMap::new(), location, 13);
        Session::new(WorkoutStorage::new(MemoryStore::new()), map)
    }

    #[test]
    fn submit_without_click_is_ignored() {
        let mut s = session(FixedLocation::at(Coords::new(1.0, 1.0)));
        s.start();
        s.handle(UiEvent::Submitted);
        assert!(s.workouts().is_empty());
        assert!(s.take_alerts().is_empty());
    }

    #[test]
    fn denied_location_alerts_and_leaves_no_map() {
        let mut s = session(FixedLocation::denied());
        s.start();
        assert_eq!(s.take_alerts(), vec![LOCATION_ALERT.to_string()]);
        assert!(!s.map().is_ready());
        assert!(!s.map_mut().backend_mut().click(Coords::new(0.0, 0.0)));
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let mut s = session(FixedLocation::at(Coords::new(1.0, 1.0)));
        s.start();
        s.handle(UiEvent::WorkoutSelected(WorkoutId::from("nope")));
        assert_eq!(s.map().backend().view(), Some((Coords::new(1.0, 1.0), 13)));
    }
}
