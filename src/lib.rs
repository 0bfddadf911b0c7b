//! Chart normalization and timing core for scanline rhythm games.
//!
//! Ingests a chart in either the structured JSON encoding or the legacy
//! line-record encoding, normalizes both into one model, and resolves the
//! full timeline: absolute timestamps, render-space positions, per-note
//! speed and rotation, and a stable content fingerprint. Rendering, audio,
//! input and asset concerns live with external collaborators; this crate
//! only computes the resolved data they consume.

pub mod chart;
pub mod checksum;
pub mod parsing;

pub use chart::{
    Animation, Chart, ChartError, ChartFormat, ChartSettings, EventOrder, Mods, Note, NoteKind,
    Page, TempoMap,
};
pub use parsing::structured::EventDef;
pub use parsing::{ParseError, ParsedChart};
