mod mods;
mod notes;
mod pages;
mod timing;

pub use mods::Mods;
pub use notes::{Note, NoteKind};
pub use pages::Page;
pub use timing::TempoMap;

use log::info;
use std::fmt;

use crate::checksum;
use crate::parsing::structured::EventDef;
use crate::parsing::{self, ParseError, ParsedChart};

/// Which source encoding the chart came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Structured,
    Legacy,
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartFormat::Structured => write!(f, "structured"),
            ChartFormat::Legacy => write!(f, "legacy"),
        }
    }
}

/// Viewport-derived constants and active modifiers, supplied by the caller
/// at construction and fixed for the chart's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSettings {
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Half the vertical extent of the orthographic camera.
    pub camera_half_extent: f64,
    pub horizontal_ratio: f64,
    pub vertical_ratio: f64,
    pub mods: Mods,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            camera_half_extent: 5.0,
            horizontal_ratio: 0.85,
            vertical_ratio: 7.0 / 9.0,
            mods: Mods::default(),
        }
    }
}

impl ChartSettings {
    pub fn new(viewport_width: f64, viewport_height: f64, camera_half_extent: f64) -> Self {
        Self {
            viewport_width,
            viewport_height,
            camera_half_extent,
            ..Self::default()
        }
    }

    pub(crate) fn aspect(&self) -> f64 {
        self.viewport_width / self.viewport_height
    }

    pub(crate) fn vertical_offset(&self) -> f64 {
        -self.camera_half_extent * 0.04
    }
}

/// An event-order entry stamped with its absolute time.
#[derive(Debug, Clone)]
pub struct EventOrder {
    pub tick: f64,
    pub time: f64,
    pub event_list: Vec<EventDef>,
}

/// An animation entry stamped with its absolute time.
#[derive(Debug, Clone)]
pub struct Animation {
    pub tick: f64,
    pub time: f64,
    pub animation_type: i64,
    pub new_text: String,
    pub transition_time: f64,
}

/// A fully resolved chart: normalized from either source encoding, timed,
/// positioned and fingerprinted. Immutable after construction; every query
/// is pure.
#[derive(Debug, Clone)]
pub struct Chart {
    format: ChartFormat,
    settings: ChartSettings,
    tempo: TempoMap,
    pages: Vec<Page>,
    notes: Vec<Note>,
    event_orders: Vec<EventOrder>,
    animations: Vec<Animation>,
    music_offset: f64,
    fingerprint: String,
}

impl Chart {
    /// One-shot construction from chart text: dispatch to a parser,
    /// fingerprint, build the tempo map, resolve pages, then notes, then
    /// time-stamp events. Either completes fully or fails.
    pub fn new(text: &str, settings: ChartSettings) -> Result<Chart, ChartError> {
        let parsed = parsing::parse(text)?;
        let (format, root, source) = match parsed {
            ParsedChart::Structured(root) => {
                let source = checksum::canonical_source(&root);
                (ChartFormat::Structured, root, source)
            }
            ParsedChart::Legacy {
                root,
                checksum_source,
            } => (ChartFormat::Legacy, root, checksum_source),
        };
        let fingerprint = checksum::fingerprint(&source);

        let tempo = TempoMap::new(root.time_base, root.tempo_list)?;
        let pages = pages::resolve_pages(&root.page_list, &tempo, &settings.mods)?;
        let notes = notes::resolve_notes(&root.note_list, &pages, &tempo, &settings)?;

        let event_orders = root
            .event_order_list
            .into_iter()
            .map(|def| EventOrder {
                time: tempo.tick_to_time(def.tick),
                tick: def.tick,
                event_list: def.event_list,
            })
            .collect();
        let animations = root
            .animation_list
            .into_iter()
            .map(|def| Animation {
                time: tempo.tick_to_time(def.tick),
                tick: def.tick,
                animation_type: def.animation_type,
                new_text: def.new_text,
                transition_time: def.transition_time,
            })
            .collect();

        let chart = Chart {
            format,
            settings,
            tempo,
            pages,
            notes,
            event_orders,
            animations,
            music_offset: root.music_offset,
            fingerprint,
        };
        info!(
            "resolved {} chart: {} notes, {} pages, {} tempo changes, fingerprint {}",
            chart.format,
            chart.notes.len(),
            chart.pages.len(),
            chart.tempo.entries().len(),
            chart.fingerprint
        );
        Ok(chart)
    }

    pub fn format(&self) -> ChartFormat {
        self.format
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn tempo(&self) -> &TempoMap {
        &self.tempo
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn event_orders(&self) -> &[EventOrder] {
        &self.event_orders
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn music_offset(&self) -> f64 {
        self.music_offset
    }

    /// Stable content fingerprint, independent of superficial formatting of
    /// the source text.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// End time of the last page.
    pub fn end_time(&self) -> f64 {
        self.pages[self.pages.len() - 1].end_time
    }

    /// Index of the page the scan-line is on at `time`, clamped to the last
    /// page once the chart is over.
    pub fn page_index_at(&self, time: f64) -> usize {
        pages::page_index_at(&self.pages, time).min(self.pages.len() - 1)
    }

    /// Scan-line y coordinate at an absolute time.
    pub fn scan_position_at(&self, time: f64) -> f64 {
        pages::scan_position(&self.pages, &self.settings, time)
    }

    /// Scan-line y coordinate for a page fraction in [0, 1].
    pub fn scan_position_at_fraction(&self, fraction: f64) -> f64 {
        let half = self.settings.camera_half_extent;
        self.settings.vertical_ratio * (-half + 2.0 * half * fraction)
            + self.settings.vertical_offset()
    }

    /// The y coordinate of the top or bottom scan edge.
    pub fn edge_position(&self, bottom: bool) -> f64 {
        let sign = if bottom { 1.0 } else { -1.0 };
        self.settings.vertical_ratio * sign * -self.settings.camera_half_extent
            + self.settings.vertical_offset()
    }

    /// Maps an arbitrary tick to a scan-space y coordinate (the hold-tail
    /// routine).
    pub fn note_y_at_tick(&self, tick: f64) -> f64 {
        pages::y_at_tick(&self.pages, &self.settings, tick)
    }
}

#[derive(Debug)]
pub enum ChartError {
    Parse(ParseError),
    EmptyTempoList,
    NonPositiveTimeBase(i32),
    NonPositiveTempoValue { tick: f64, value: i64 },
    EmptyPages,
    DegeneratePage { index: usize },
    PageIndexOutOfRange { note_id: i64, page_index: i64, page_count: usize },
    LinkOutOfRange { note_id: i64, next_id: i64, note_count: usize },
    UnknownNoteKind { note_id: i64, raw: i64 },
}

impl fmt::Display for ChartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartError::Parse(err) => write!(f, "{}", err),
            ChartError::EmptyTempoList => write!(f, "chart has no tempo changes"),
            ChartError::NonPositiveTimeBase(base) => {
                write!(f, "time base must be positive, got {}", base)
            }
            ChartError::NonPositiveTempoValue { tick, value } => {
                write!(f, "tempo value at tick {} must be positive, got {}", tick, value)
            }
            ChartError::EmptyPages => write!(f, "chart has no pages"),
            ChartError::DegeneratePage { index } => {
                write!(f, "page {} has zero tick span", index)
            }
            ChartError::PageIndexOutOfRange {
                note_id,
                page_index,
                page_count,
            } => write!(
                f,
                "note {} references page {} of {}",
                note_id, page_index, page_count
            ),
            ChartError::LinkOutOfRange {
                note_id,
                next_id,
                note_count,
            } => write!(
                f,
                "note {} links to note {} of {}",
                note_id, next_id, note_count
            ),
            ChartError::UnknownNoteKind { note_id, raw } => {
                write!(f, "note {} has unknown type {}", note_id, raw)
            }
        }
    }
}

impl std::error::Error for ChartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChartError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for ChartError {
    fn from(err: ParseError) -> Self {
        ChartError::Parse(err)
    }
}
