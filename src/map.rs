//! Map interaction surface.
//!
//! The map widget and the device location service are collaborators behind
//! [`MapBackend`] and [`Geolocator`]. [`MapSurface`] is the only thing the
//! session talks to. [`HeadlessMap`] and [`FixedLocation`] are the in-process
//! implementations used by the terminal front-end and the tests.

use crate::dlog;
use crate::error::LocationUnavailable;
use crate::types::{Coords, WorkoutKind};
use std::time::Duration;

pub const DEFAULT_ZOOM: u8 = 13;
pub const MAP_ELEMENT_ID: &str = "map";
pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.fr/hot/{z}/{x}/{y}.png";
pub const TILE_ATTRIBUTION: &str =
    r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#;

pub type ClickHandler = Box<dyn FnMut(Coords)>;
pub type PositionCallback = Box<dyn FnOnce(Result<Coords, LocationUnavailable>)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupOptions {
    pub max_width: u32,
    pub min_width: u32,
    pub auto_close: bool,
    pub close_on_click: bool,
    pub class_name: String,
}

impl PopupOptions {
    /// Sticky popup styled with `class_name`.
    pub fn styled(class_name: impl Into<String>) -> Self {
        Self {
            max_width: 300,
            min_width: 100,
            auto_close: false,
            close_on_click: false,
            class_name: class_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub animate: bool,
    pub pan_duration: Duration,
}

impl ViewOptions {
    pub const ANIMATED: Self = Self {
        animate: true,
        pan_duration: Duration::from_secs(1),
    };
}

/// Popup style class for a workout kind, e.g. `running-popup`.
pub fn popup_class(kind: WorkoutKind) -> String {
    format!("{kind}-popup")
}

/// The map widget.
pub trait MapBackend {
    fn create_map(&mut self, element_id: &str, center: Coords, zoom: u8);
    fn add_tile_layer(&mut self, url_template: &str, attribution: &str);
    fn on_click(&mut self, handler: ClickHandler);
    fn set_view(&mut self, center: Coords, zoom: u8, options: ViewOptions);
    /// Adds a marker and opens its popup.
    fn add_marker(&mut self, at: Coords, popup: PopupOptions, content: &str);
    /// Tears the map down, dropping markers and click handlers.
    fn remove(&mut self);
}

/// The device location service. `done` fires exactly once.
pub trait Geolocator {
    fn current_position(&mut self, done: PositionCallback);
}

pub struct MapSurface<B, G> {
    backend: B,
    geolocator: G,
    zoom: u8,
    ready: bool,
}

impl<B: MapBackend, G: Geolocator> MapSurface<B, G> {
    pub const fn new(backend: B, geolocator: G, zoom: u8) -> Self {
        Self {
            backend,
            geolocator,
            zoom,
            ready: false,
        }
    }

    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn acquire_position(&mut self, done: PositionCallback) {
        self.geolocator.current_position(done);
    }

    /// Creates the map view centered on `center`. Only the first call has an
    /// effect until [`MapSurface::teardown`].
    pub fn initialize(&mut self, center: Coords) {
        if self.ready {
            tracing::warn!(%center, "map already initialized; ignoring");
            return;
        }
        dlog!(
            "map center https://www.google.com/maps/@{},{}",
            center.lat,
            center.lng
        );
        self.backend.create_map(MAP_ELEMENT_ID, center, self.zoom);
        self.backend.add_tile_layer(TILE_URL, TILE_ATTRIBUTION);
        self.ready = true;
        tracing::info!(%center, zoom = self.zoom, "map ready");
    }

    pub fn on_map_clicked(&mut self, handler: impl FnMut(Coords) + 'static) {
        self.backend.on_click(Box::new(handler));
    }

    /// Returns false when there is no map to place the marker on.
    pub fn place_marker(&mut self, at: Coords, label: &str, style_class: &str) -> bool {
        if !self.ready {
            return false;
        }
        self.backend
            .add_marker(at, PopupOptions::styled(style_class), label);
        true
    }

    pub fn recenter(&mut self, at: Coords) -> bool {
        if !self.ready {
            return false;
        }
        self.backend.set_view(at, self.zoom, ViewOptions::ANIMATED);
        true
    }

    pub fn teardown(&mut self) {
        if self.ready {
            self.backend.remove();
            self.ready = false;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub at: Coords,
    pub popup: PopupOptions,
    pub content: String,
}

/// In-process map. Records what it was asked to draw; clicks are injected
/// with [`HeadlessMap::click`].
#[derive(Default)]
pub struct HeadlessMap {
    element_id: Option<String>,
    view: Option<(Coords, u8)>,
    tile_layers: Vec<String>,
    markers: Vec<Marker>,
    handlers: Vec<ClickHandler>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_created(&self) -> bool {
        self.element_id.is_some()
    }

    pub const fn view(&self) -> Option<(Coords, u8)> {
        self.view
    }

    pub fn tile_layers(&self) -> &[String] {
        &self.tile_layers
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Fires every registered click handler. Returns false if the map does
    /// not exist yet.
    pub fn click(&mut self, at: Coords) -> bool {
        if !self.is_created() {
            return false;
        }
        for handler in &mut self.handlers {
            handler(at);
        }
        true
    }
}

impl MapBackend for HeadlessMap {
    fn create_map(&mut self, element_id: &str, center: Coords, zoom: u8) {
        self.element_id = Some(element_id.to_string());
        self.view = Some((center, zoom));
    }

    fn add_tile_layer(&mut self, url_template: &str, _attribution: &str) {
        self.tile_layers.push(url_template.to_string());
    }

    fn on_click(&mut self, handler: ClickHandler) {
        self.handlers.push(handler);
    }

    fn set_view(&mut self, center: Coords, zoom: u8, options: ViewOptions) {
        dlog!(
            "set_view center={center} zoom={zoom} animate={} pan_ms={}",
            options.animate,
            options.pan_duration.as_millis()
        );
        self.view = Some((center, zoom));
    }

    fn add_marker(&mut self, at: Coords, popup: PopupOptions, content: &str) {
        tracing::info!(%at, class = %popup.class_name, "{content}");
        self.markers.push(Marker {
            at,
            popup,
            content: content.to_string(),
        });
    }

    fn remove(&mut self) {
        *self = Self::default();
    }
}

/// Location service with a configured answer. `None` behaves like a device
/// that denied the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    position: Option<Coords>,
}

impl FixedLocation {
    pub const fn at(position: Coords) -> Self {
        Self {
            position: Some(position),
        }
    }

    pub const fn denied() -> Self {
        Self { position: None }
    }

    pub const fn from_option(position: Option<Coords>) -> Self {
        Self { position }
    }
}

impl Geolocator for FixedLocation {
    fn current_position(&mut self, done: PositionCallback) {
        let result = self
            .position
            .ok_or_else(|| LocationUnavailable::new("no position configured"));
        done(result);
    }
}
