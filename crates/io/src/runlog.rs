//! XML run log → ordered [`LogEvent`]s.
//!
//! Recognized elements (anything else is skipped):
//!
//! | element                                  | event                        |
//! |------------------------------------------|------------------------------|
//! | `<dataNOCUTS parts="n"/>`                | `PartsDeclared`              |
//! | `<dataNOCUTS time=…><clock stop=…/>`     | `PartClock`                  |
//! | `<dataNOCUTS>` with no clock             | `EmptyPart`                  |
//! | `<alarm time=…>text</alarm>`             | `Alarm`                      |
//! | `<auto-restart><auto-stop time=…/>`      | `AutoRestartStop`            |
//! | `<auto-stop time=…/>`                    | `AutoStop`                   |
//! | `<weather time=…>code</weather>`         | `Weather`                    |

use std::path::Path;

use chrono::NaiveTime;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use skylog_recon::model::{AlarmKind, LogEvent};

use crate::error::IoError;

const TIME_FORMAT: &str = "%H:%M:%S";

const EMERGENCY_STOP: &str = "Emergency Stop!";
const SKY_EXCEPTION: &str = "Sky thread exception!";

pub fn load_run_log(path: &Path) -> Result<Vec<LogEvent>, IoError> {
    let xml = std::fs::read_to_string(path).map_err(|e| IoError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_run_log(&xml)
}

pub fn parse_run_log(xml: &str) -> Result<Vec<LogEvent>, IoError> {
    // No trim_text: chunks split by entity references keep their inner
    // spaces. Text is trimmed per element on close.
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut builder = RunLogBuilder::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => builder.open(e)?,
            Ok(Event::Empty(ref e)) => {
                builder.open(e)?;
                builder.close(e.name().as_ref())?;
            }
            Ok(Event::Text(ref e)) => builder.text(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::CData(ref e)) => builder.text(&String::from_utf8_lossy(e.as_ref())),
            Ok(Event::GeneralRef(ref e)) => {
                let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                match e.resolve_char_ref() {
                    Ok(Some(ch)) => builder.text(ch.encode_utf8(&mut [0; 4])),
                    Ok(None) => match resolve_predefined_entity(&name) {
                        Some(text) => builder.text(text),
                        None => log::debug!("skipping unknown entity &{name};"),
                    },
                    Err(e) => return Err(IoError::Xml(format!("&{name};: {e}"))),
                }
            }
            Ok(Event::End(ref e)) => builder.close(e.name().as_ref())?,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    log::debug!("parsed {} run log event(s)", builder.events.len());
    Ok(builder.events)
}

// =============================================================================
// Event assembly
// =============================================================================

#[derive(Default)]
struct RunLogBuilder {
    events: Vec<LogEvent>,
    section: Option<DataSection>,
    alarm: Option<TimedText>,
    weather: Option<TimedText>,
    in_auto_restart: bool,
}

/// An open `<dataNOCUTS>` element.
struct DataSection {
    time: Option<String>,
    parts: Option<String>,
    /// `stop` attribute of each `<clock>` child, in order.
    clock_stops: Vec<Option<String>>,
}

struct TimedText {
    time: Option<String>,
    text: String,
}

impl RunLogBuilder {
    fn open(&mut self, e: &BytesStart) -> Result<(), IoError> {
        match e.name().as_ref() {
            b"dataNOCUTS" => {
                self.section = Some(DataSection {
                    time: attr(e, b"time"),
                    parts: attr(e, b"parts"),
                    clock_stops: Vec::new(),
                });
            }
            b"clock" => {
                if let Some(section) = self.section.as_mut() {
                    section.clock_stops.push(attr(e, b"stop"));
                }
            }
            b"alarm" => {
                self.alarm = Some(TimedText { time: attr(e, b"time"), text: String::new() });
            }
            b"weather" => {
                self.weather = Some(TimedText { time: attr(e, b"time"), text: String::new() });
            }
            b"auto-restart" => self.in_auto_restart = true,
            b"auto-stop" => {
                let time = required_time("auto-stop", attr(e, b"time"))?;
                self.events.push(if self.in_auto_restart {
                    LogEvent::AutoRestartStop { time }
                } else {
                    LogEvent::AutoStop { time }
                });
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some(weather) = self.weather.as_mut() {
            weather.text.push_str(text);
        } else if let Some(alarm) = self.alarm.as_mut() {
            alarm.text.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) -> Result<(), IoError> {
        match name {
            b"dataNOCUTS" => {
                if let Some(section) = self.section.take() {
                    self.events.push(section.finish()?);
                }
            }
            b"alarm" => {
                if let Some(alarm) = self.alarm.take() {
                    let kind = alarm_kind(&alarm.text);
                    match (kind, alarm.time) {
                        (AlarmKind::Other, None) => {
                            log::debug!("ignoring untimed alarm: {}", alarm.text.trim());
                        }
                        (kind, time) => {
                            let time = required_time("alarm", time)?;
                            self.events.push(LogEvent::Alarm { kind, time });
                        }
                    }
                }
            }
            b"weather" => {
                if let Some(weather) = self.weather.take() {
                    let time = required_time("weather", weather.time)?;
                    self.events.push(LogEvent::Weather {
                        time,
                        raw: weather.text.trim().to_string(),
                    });
                }
            }
            b"auto-restart" => self.in_auto_restart = false,
            _ => {}
        }
        Ok(())
    }
}

impl DataSection {
    fn finish(self) -> Result<LogEvent, IoError> {
        if let Some(parts) = self.parts {
            let n = parts
                .trim()
                .parse::<u32>()
                .map_err(|_| invalid("dataNOCUTS", "parts", &parts))?;
            return Ok(LogEvent::PartsDeclared { parts: n });
        }
        if self.clock_stops.is_empty() {
            return Ok(LogEvent::EmptyPart);
        }

        let start = required_time("dataNOCUTS", self.time)?;
        // The stop normally sits on the first clock; restarted clocks carry it on the second.
        let stop = match self.clock_stops.iter().take(2).find_map(|s| s.as_deref()) {
            Some(s) => Some(parse_time("clock", "stop", s)?),
            None => None,
        };
        Ok(LogEvent::PartClock { start, stop })
    }
}

fn alarm_kind(text: &str) -> AlarmKind {
    let text = text.trim();
    if text == EMERGENCY_STOP {
        AlarmKind::EmergencyStop
    } else if text.starts_with(SKY_EXCEPTION) {
        AlarmKind::SkyException
    } else {
        AlarmKind::Other
    }
}

// =============================================================================
// Attribute helpers
// =============================================================================

fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn required_time(element: &str, value: Option<String>) -> Result<NaiveTime, IoError> {
    match value {
        Some(v) => parse_time(element, "time", &v),
        None => Err(IoError::MissingAttribute {
            element: element.into(),
            attribute: "time".into(),
        }),
    }
}

fn parse_time(element: &str, attribute: &str, value: &str) -> Result<NaiveTime, IoError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| invalid(element, attribute, value))
}

fn invalid(element: &str, attribute: &str, value: &str) -> IoError {
    IoError::InvalidAttribute {
        element: element.into(),
        attribute: attribute.into(),
        value: value.into(),
    }
}

// =============================================================================
// Tests
// =============================================================================
