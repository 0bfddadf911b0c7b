use serde::Deserialize;

fn default_time_base() -> i32 {
    480
}

fn default_approach_rate() -> f64 {
    1.0
}

/// Normalized chart root. The structured encoding deserializes straight into
/// this; the legacy converter synthesizes one, so everything downstream is
/// format-agnostic.
///
/// Unknown keys are ignored and absent keys are defaulted, matching the
/// tolerance of the original serializer contract.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartRoot {
    #[serde(default)]
    pub format_version: i32,
    #[serde(default = "default_time_base")]
    pub time_base: i32,
    #[serde(default)]
    pub start_offset_time: f64,
    #[serde(default)]
    pub music_offset: f64,
    #[serde(default)]
    pub tempo_list: Vec<TempoEvent>,
    #[serde(default)]
    pub page_list: Vec<PageDef>,
    #[serde(default)]
    pub note_list: Vec<NoteDef>,
    #[serde(default)]
    pub event_order_list: Vec<EventOrderDef>,
    #[serde(default)]
    pub animation_list: Vec<AnimationDef>,
}

/// One tempo change: `value` microseconds per `time_base` ticks, in effect
/// from `tick` onward.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TempoEvent {
    #[serde(default)]
    pub tick: f64,
    #[serde(default)]
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PageDef {
    #[serde(default)]
    pub start_tick: f64,
    #[serde(default)]
    pub end_tick: f64,
    #[serde(default)]
    pub scan_line_direction: i32,
}

/// Raw note fields as they appear on the wire. Ticks are carried as floats:
/// the legacy converter produces fractional ticks and only the checksum
/// truncates them to integers.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NoteDef {
    #[serde(default)]
    pub page_index: i64,
    #[serde(rename = "type", default)]
    pub note_type: i64,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub tick: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub hold_tick: f64,
    #[serde(default)]
    pub next_id: i64,
    #[serde(default = "default_approach_rate")]
    pub approach_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventOrderDef {
    #[serde(default)]
    pub tick: f64,
    #[serde(default)]
    pub event_list: Vec<EventDef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventDef {
    #[serde(rename = "type", default)]
    pub event_type: i64,
    #[serde(default)]
    pub args: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnimationDef {
    #[serde(default)]
    pub tick: f64,
    #[serde(rename = "type", default)]
    pub animation_type: i64,
    #[serde(default)]
    pub new_text: String,
    #[serde(default)]
    pub transition_time: f64,
}
