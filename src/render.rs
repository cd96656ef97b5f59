use crate::types::{Workout, WorkoutDetail, WorkoutId};
use crate::utils::format_fixed1;
use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// One rendered entry of the workout list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub markup: String,
}

/// Text of a workout's map popup.
pub fn popup_content(w: &Workout) -> String {
    format!("{} {}", w.kind().icon(), w.description())
}

/// `<li>` markup for a workout.
pub fn list_entry(w: &Workout) -> Result<ListEntry> {
    let mut xml = Writer::new(Vec::new());

    let class = format!("workout workout--{}", w.kind());
    let li = BytesStart::new("li").with_attributes([
        ("class", class.as_str()),
        ("data-id", w.id().as_str()),
    ]);
    xml.write_event(Event::Start(li))?;

    xml.write_event(Event::Start(
        BytesStart::new("h2").with_attributes([("class", "workout__title")]),
    ))?;
    xml.write_event(Event::Text(BytesText::new(w.description())))?;
    xml.write_event(Event::End(BytesEnd::new("h2")))?;

    detail(&mut xml, w.kind().icon(), &w.distance().to_string(), "km")?;
    detail(&mut xml, "⏱", &w.duration().to_string(), "min")?;

    match *w.detail() {
        WorkoutDetail::Running { cadence, pace } => {
            detail(&mut xml, "⚡️", &format_fixed1(pace), "min/km")?;
            detail(&mut xml, "🦶🏼", &cadence.to_string(), "spm")?;
        }
        WorkoutDetail::Cycling {
            elevation_gain,
            speed,
        } => {
            detail(&mut xml, "⚡️", &format_fixed1(speed), "km/h")?;
            detail(&mut xml, "⛰", &elevation_gain.to_string(), "m")?;
        }
    }

    xml.write_event(Event::End(BytesEnd::new("li")))?;

    Ok(ListEntry {
        id: w.id().clone(),
        markup: String::from_utf8(xml.into_inner())?,
    })
}

fn detail(xml: &mut Writer<Vec<u8>>, icon: &str, value: &str, unit: &str) -> Result<()> {
    xml.write_event(Event::Start(
        BytesStart::new("div").with_attributes([("class", "workout__details")]),
    ))?;
    for (class, text) in [
        ("workout__icon", icon),
        ("workout__value", value),
        ("workout__unit", unit),
    ] {
        xml.write_event(Event::Start(
            BytesStart::new("span").with_attributes([("class", class)]),
        ))?;
        xml.write_event(Event::Text(BytesText::new(text)))?;
        xml.write_event(Event::End(BytesEnd::new("span")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("div")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coords, Effort};
    use chrono::{TimeZone, Utc};

    fn at(kind_effort: Effort, distance: f64, duration: f64) -> Workout {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        Workout::new(t, Coords::new(39.7, -8.1), distance, duration, kind_effort)
    }

    #[test]
    fn running_entry_has_pace_and_cadence() {
        let w = at(Effort::Cadence(178.0), 5.2, 24.0);
        let entry = list_entry(&w).unwrap();

        assert_eq!(entry.id, *w.id());
        assert!(entry.markup.starts_with(r#"<li class="workout workout--running" data-id=""#));
        assert!(entry.markup.contains("<span class=\"workout__value\">4.6</span>"));
        assert!(entry.markup.contains("<span class=\"workout__unit\">spm</span>"));
        assert!(entry.markup.contains("<span class=\"workout__value\">5.2</span>"));
        assert!(!entry.markup.contains("km/h"));
    }

    #[test]
    fn cycling_entry_has_speed_and_elevation() {
        let w = at(Effort::ElevationGain(-10.0), 5.0, 30.0);
        let entry = list_entry(&w).unwrap();

        assert!(entry.markup.contains("workout--cycling"));
        assert!(entry.markup.contains("<span class=\"workout__value\">10.0</span>"));
        assert!(entry.markup.contains("<span class=\"workout__value\">-10</span>"));
        assert!(!entry.markup.contains("min/km"));
    }

    #[test]
    fn infinite_pace_renders_placeholder() {
        let w = at(Effort::Cadence(170.0), 0.0, 30.0);
        let entry = list_entry(&w).unwrap();
        assert!(entry.markup.contains("<span class=\"workout__value\">n/a</span>"));
    }

    #[test]
    fn popup_has_icon_and_description() {
        let w = at(Effort::ElevationGain(0.0), 5.0, 30.0);
        assert!(popup_content(&w).starts_with("🚴‍♂️ Cycling on March"));
    }
}
