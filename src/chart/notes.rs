use cgmath::Vector2;
use log::debug;

use crate::chart::pages::{self, Page};
use crate::chart::{ChartError, ChartSettings, TempoMap};
use crate::parsing::structured::NoteDef;

/// Reference travel duration in seconds; anchors both the page-transition
/// speed blend and the intro lead of standard notes.
const REFERENCE_TRAVEL: f64 = 1.367;
/// Intro lead for drag notes.
const DRAG_INTRO_LEAD: f64 = 1.175;
const DRAG_LINE_START_LEAD: f64 = 0.133;
const DRAG_LINE_STOP_LEAD: f64 = 0.132;
/// Coordinate comparison epsilon for chain rotation.
const POSITION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Click,
    Hold,
    LongHold,
    DragHead,
    DragChild,
    Flick,
}

impl NoteKind {
    pub fn from_raw(raw: i64) -> Option<NoteKind> {
        match raw {
            0 => Some(NoteKind::Click),
            1 => Some(NoteKind::Hold),
            2 => Some(NoteKind::LongHold),
            3 => Some(NoteKind::DragHead),
            4 => Some(NoteKind::DragChild),
            5 => Some(NoteKind::Flick),
            _ => None,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            NoteKind::Click => 0,
            NoteKind::Hold => 1,
            NoteKind::LongHold => 2,
            NoteKind::DragHead => 3,
            NoteKind::DragChild => 4,
            NoteKind::Flick => 5,
        }
    }

    pub fn is_drag(self) -> bool {
        matches!(self, NoteKind::DragHead | NoteKind::DragChild)
    }
}

/// A fully resolved note: the raw wire fields plus everything derived at
/// construction time. Immutable once the chart is built.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: i64,
    pub page_index: usize,
    pub kind: NoteKind,
    pub x: f64,
    pub tick: f64,
    pub hold_tick: f64,
    /// Raw link field as it appeared on the wire; `<= 0` means no link.
    pub next_id: i64,
    pub approach_rate: f64,

    /// Resolved index of the linked note. `Some` iff `next_id > 0`, so the
    /// sentinel never needs re-interpreting downstream.
    pub next: Option<usize>,
    pub direction: i32,
    pub speed: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub position: Vector2<f64>,
    pub end_position: Vector2<f64>,
    pub hold_length: f64,
    pub intro_time: f64,
    pub tint: f64,
    /// Degrees toward the linked note; zero for unlinked notes.
    pub rotation: f64,
    pub drag_line_start_time: Option<f64>,
    pub drag_line_stop_time: Option<f64>,
}

pub(crate) fn resolve_notes(
    defs: &[NoteDef],
    all_pages: &[Page],
    tempo: &TempoMap,
    settings: &ChartSettings,
) -> Result<Vec<Note>, ChartError> {
    let half = settings.camera_half_extent;
    let offset = settings.vertical_offset();
    let aspect = settings.aspect();
    let flip = settings.mods.horizontal_flip_sign();
    let mod_speed = settings.mods.speed_multiplier();

    let mut notes = Vec::with_capacity(defs.len());
    for def in defs {
        let kind = NoteKind::from_raw(def.note_type).ok_or(ChartError::UnknownNoteKind {
            note_id: def.id,
            raw: def.note_type,
        })?;
        if def.page_index < 0 || def.page_index as usize >= all_pages.len() {
            return Err(ChartError::PageIndexOutOfRange {
                note_id: def.id,
                page_index: def.page_index,
                page_count: all_pages.len(),
            });
        }
        let page_index = def.page_index as usize;
        let page = &all_pages[page_index];
        let direction = page.scan_line_direction;

        let next = if def.next_id > 0 {
            let index = def.next_id as usize;
            if index >= defs.len() {
                return Err(ChartError::LinkOutOfRange {
                    note_id: def.id,
                    next_id: def.next_id,
                    note_count: defs.len(),
                });
            }
            Some(index)
        } else {
            None
        };

        let base_speed = if page_index == 0 {
            1.0
        } else {
            transition_speed(page, &all_pages[page_index - 1], def.tick)
        };
        let speed = base_speed * def.approach_rate * mod_speed;

        let start_time = tempo.tick_to_time(def.tick);
        let end_time = tempo.tick_to_time(def.tick + def.hold_tick);

        let px =
            (def.x * 2.0 * settings.horizontal_ratio - settings.horizontal_ratio)
                * half
                * aspect
                * flip;
        let py = settings.vertical_ratio
            * direction as f64
            * (-half + 2.0 * half * (def.tick - page.start_tick) / page.tick_span())
            + offset;
        let end_py = pages::y_at_tick(all_pages, settings, def.tick + def.hold_tick);

        let lead = if kind.is_drag() {
            DRAG_INTRO_LEAD
        } else {
            REFERENCE_TRAVEL
        };

        notes.push(Note {
            id: def.id,
            page_index,
            kind,
            x: def.x,
            tick: def.tick,
            hold_tick: def.hold_tick,
            next_id: def.next_id,
            approach_rate: def.approach_rate,
            next,
            direction,
            speed,
            start_time,
            end_time,
            position: Vector2::new(px, py),
            end_position: Vector2::new(px, end_py),
            hold_length: settings.vertical_ratio * 2.0 * half * def.hold_tick / page.tick_span(),
            intro_time: start_time - lead / speed,
            tint: tint_for(kind, direction),
            rotation: 0.0,
            drag_line_start_time: None,
            drag_line_stop_time: None,
        });
    }

    // Drag-line windows need every intro time resolved first.
    for i in 0..notes.len() {
        if let Some(next) = notes[i].next {
            if notes[i].kind.is_drag() {
                let stop = notes[next].intro_time - DRAG_LINE_STOP_LEAD;
                let note = &mut notes[i];
                note.drag_line_start_time = Some(note.intro_time - DRAG_LINE_START_LEAD);
                note.drag_line_stop_time = Some(stop);
            }
        }
    }

    // Rotation toward the linked note, for any linked note kind.
    for i in 0..notes.len() {
        if let Some(next) = notes[i].next {
            let target = notes[next].position;
            notes[i].rotation = chain_rotation(notes[i].position, target);
        }
    }

    debug!("resolved {} notes", notes.len());
    Ok(notes)
}

/// Cross-page speed blend. Pages after the first scale against the travel
/// time spanned by this page and the previous one, pivoting on the
/// reference travel duration.
fn transition_speed(page: &Page, previous: &Page, tick: f64) -> f64 {
    let page_ratio = (tick - page.actual_start_tick) / (page.end_tick - page.actual_start_tick);
    let tempo_span = (page.end_time - page.actual_start_time) * page_ratio
        + (previous.end_time - previous.actual_start_time) * (REFERENCE_TRAVEL - page_ratio);
    if tempo_span >= REFERENCE_TRAVEL {
        1.0
    } else {
        REFERENCE_TRAVEL / tempo_span
    }
}

fn tint_for(kind: NoteKind, direction: i32) -> f64 {
    match kind {
        NoteKind::Flick => {
            if direction == 1 {
                1.00
            } else {
                1.30
            }
        }
        _ => {
            if direction == 1 {
                0.94
            } else {
                1.06
            }
        }
    }
}

/// Rotation in degrees from one note toward the next in its chain.
/// Axis-aligned cases snap to discrete angles; the general case is
/// `atan(dx/dy)` with a half-turn correction when the next note is not
/// above the current one.
fn chain_rotation(from: Vector2<f64>, to: Vector2<f64>) -> f64 {
    if from == to {
        0.0
    } else if (from.y - to.y).abs() < POSITION_EPSILON {
        if from.x > to.x { -90.0 } else { 90.0 }
    } else if (from.x - to.x).abs() < POSITION_EPSILON {
        if from.y > to.y { 180.0 } else { 0.0 }
    } else {
        ((to.x - from.x) / (to.y - from.y)).atan().to_degrees()
            + if to.y > from.y { 0.0 } else { 180.0 }
    }
}
