use crate::error::ValidationError;
use crate::types::{Effort, WorkoutKind};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// How long the form stays out of the layout after it is hidden.
pub const LAYOUT_RESTORE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    Elevation,
}

impl Field {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Cadence => "cadence",
            Self::Elevation => "elevation",
        }
    }

    /// The secondary field shown for `kind`.
    pub const fn secondary_for(kind: WorkoutKind) -> Self {
        match kind {
            WorkoutKind::Running => Self::Cadence,
            WorkoutKind::Cycling => Self::Elevation,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(Self::Distance),
            "duration" => Ok(Self::Duration),
            "cadence" => Ok(Self::Cadence),
            "elevation" | "elevationgain" => Ok(Self::Elevation),
            other => Err(format!("unknown field: {other:?}")),
        }
    }
}

/// CSS display mode of the form container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Grid,
    None,
}

/// Numbers read out of the form, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormInput {
    pub kind: WorkoutKind,
    pub distance: f64,
    pub duration: f64,
    /// Cadence for running, elevation gain for cycling.
    pub secondary: f64,
}

/// Inputs that passed [`validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidInput {
    pub distance: f64,
    pub duration: f64,
    pub effort: Effort,
}

/// Reads a text input the way a browser coerces it to a number: blank is
/// zero, anything unparsable is NaN.
pub fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

fn finite(field: &'static str, v: f64) -> Result<f64, ValidationError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

fn positive(field: &'static str, v: f64) -> Result<f64, ValidationError> {
    if v > 0.0 {
        Ok(v)
    } else {
        Err(ValidationError::NotPositive { field, value: v })
    }
}

/// All inputs must be finite. Distance and duration must be positive; so
/// must cadence. Elevation gain may be zero or negative.
pub fn validate(
    kind: WorkoutKind,
    distance: f64,
    duration: f64,
    secondary: f64,
) -> Result<ValidInput, ValidationError> {
    let distance = finite("distance", distance)?;
    let duration = finite("duration", duration)?;
    let effort = match kind {
        WorkoutKind::Running => Effort::Cadence(finite("cadence", secondary)?),
        WorkoutKind::Cycling => Effort::ElevationGain(finite("elevation", secondary)?),
    };

    let distance = positive("distance", distance)?;
    let duration = positive("duration", duration)?;
    if let Effort::Cadence(cadence) = effort {
        positive("cadence", cadence)?;
    }

    Ok(ValidInput {
        distance,
        duration,
        effort,
    })
}

/// State of the workout entry form.
#[derive(Debug, Clone)]
pub struct WorkoutForm {
    hidden: bool,
    layout: Layout,
    restore_at: Option<Instant>,
    kind: WorkoutKind,
    secondary: Field,
    focused: Option<Field>,
    distance: String,
    duration: String,
    cadence: String,
    elevation: String,
}

impl Default for WorkoutForm {
    fn default() -> Self {
        Self {
            hidden: true,
            layout: Layout::Grid,
            restore_at: None,
            kind: WorkoutKind::default(),
            secondary: Field::secondary_for(WorkoutKind::default()),
            focused: None,
            distance: String::new(),
            duration: String::new(),
            cadence: String::new(),
            elevation: String::new(),
        }
    }
}

impl WorkoutForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_visible(&self) -> bool {
        !self.hidden
    }

    pub const fn layout(&self) -> Layout {
        self.layout
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.kind
    }

    /// Which of cadence/elevation is currently shown.
    pub const fn secondary_field(&self) -> Field {
        self.secondary
    }

    pub const fn focused(&self) -> Option<Field> {
        self.focused
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Distance => &self.distance,
            Field::Duration => &self.duration,
            Field::Cadence => &self.cadence,
            Field::Elevation => &self.elevation,
        }
    }

    pub fn set_value(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Distance => &mut self.distance,
            Field::Duration => &mut self.duration,
            Field::Cadence => &mut self.cadence,
            Field::Elevation => &mut self.elevation,
        };
        *slot = value.into();
    }

    /// Reveals the form and focuses distance.
    pub fn show(&mut self) {
        self.hidden = false;
        self.focused = Some(Field::Distance);
    }

    /// Clears every input and hides the form. The layout comes back after
    /// [`LAYOUT_RESTORE_DELAY`], on the first [`WorkoutForm::tick`] past it.
    pub fn hide(&mut self, now: Instant) {
        self.distance.clear();
        self.duration.clear();
        self.cadence.clear();
        self.elevation.clear();

        self.layout = Layout::None;
        self.hidden = true;
        self.focused = None;
        self.restore_at = Some(now + LAYOUT_RESTORE_DELAY);
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(at) = self.restore_at
            && now >= at
        {
            self.layout = Layout::Grid;
            self.restore_at = None;
        }
    }

    pub fn toggle_fields_for_type(&mut self, kind: WorkoutKind) {
        self.kind = kind;
        self.secondary = Field::secondary_for(kind);
    }

    pub fn read(&self) -> FormInput {
        FormInput {
            kind: self.kind,
            distance: parse_number(&self.distance),
            duration: parse_number(&self.duration),
            secondary: parse_number(self.value(Field::secondary_for(self.kind))),
        }
    }

    pub fn validate(&self) -> Result<ValidInput, ValidationError> {
        let input = self.read();
        validate(input.kind, input.distance, input.duration, input.secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_with_zero_cadence_is_rejected() {
        let err = validate(WorkoutKind::Running, 5.0, 30.0, 0.0).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotPositive {
                field: "cadence",
                value: 0.0
            }
        );
    }

    #[test]
    fn cycling_with_negative_elevation_is_accepted() {
        let ok = validate(WorkoutKind::Cycling, 5.0, 30.0, -10.0).unwrap();
        assert_eq!(ok.effort, Effort::ElevationGain(-10.0));
    }

    #[test]
    fn cycling_still_needs_positive_distance_and_duration() {
        assert!(validate(WorkoutKind::Cycling, 0.0, 30.0, 10.0).is_err());
        assert!(validate(WorkoutKind::Cycling, 5.0, -1.0, 10.0).is_err());
    }

    #[test]
    fn non_finite_inputs_are_rejected() {
        let err = validate(WorkoutKind::Cycling, 5.0, 30.0, f64::NAN).unwrap_err();
        assert_eq!(err, ValidationError::NotFinite { field: "elevation" });
        assert!(validate(WorkoutKind::Running, f64::INFINITY, 30.0, 170.0).is_err());
    }

    #[test]
    fn parse_number_coerces_like_a_browser() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("  7.5 "), 7.5);
        assert!(parse_number("abc").is_nan());
        assert!(parse_number("inf").is_infinite());
    }

    #[test]
    fn blank_elevation_counts_as_zero() {
        let mut form = WorkoutForm::new();
        form.toggle_fields_for_type(WorkoutKind::Cycling);
        form.set_value(Field::Distance, "12");
        form.set_value(Field::Duration, "40");

        let ok = form.validate().unwrap();
        assert_eq!(ok.effort, Effort::ElevationGain(0.0));
    }

    #[test]
    fn toggle_swaps_secondary_field() {
        let mut form = WorkoutForm::new();
        assert_eq!(form.secondary_field(), Field::Cadence);
        form.toggle_fields_for_type(WorkoutKind::Cycling);
        assert_eq!(form.secondary_field(), Field::Elevation);
        form.toggle_fields_for_type(WorkoutKind::Running);
        assert_eq!(form.secondary_field(), Field::Cadence);
    }

    #[test]
    fn show_focuses_distance() {
        let mut form = WorkoutForm::new();
        assert!(!form.is_visible());
        form.show();
        assert!(form.is_visible());
        assert_eq!(form.focused(), Some(Field::Distance));
    }

    #[test]
    fn hide_clears_and_restores_layout_later() {
        let mut form = WorkoutForm::new();
        form.show();
        form.set_value(Field::Distance, "5");
        form.set_value(Field::Cadence, "170");

        let t0 = Instant::now();
        form.hide(t0);
        assert!(!form.is_visible());
        assert_eq!(form.value(Field::Distance), "");
        assert_eq!(form.value(Field::Cadence), "");
        assert_eq!(form.layout(), Layout::None);

        form.tick(t0 + Duration::from_millis(500));
        assert_eq!(form.layout(), Layout::None);
        form.tick(t0 + LAYOUT_RESTORE_DELAY);
        assert_eq!(form.layout(), Layout::Grid);
    }
}
