use std::fmt::Write as FmtWrite;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::parsing::structured::ChartRoot;

/// Builds the canonical field string for a structured chart: every tempo
/// change, then every page, then every note, in list order. Ticks, lanes and
/// hold ticks are truncated to integers so the string is stable against
/// superficial formatting differences in the source text.
pub fn canonical_source(root: &ChartRoot) -> String {
    let mut source = String::new();
    for tempo in &root.tempo_list {
        let _ = write!(source, "tempo {} {}", tempo.tick as i64, tempo.value);
    }
    for page in &root.page_list {
        let _ = write!(
            source,
            "page {} {}",
            page.start_tick as i64, page.end_tick as i64
        );
    }
    for note in &root.note_list {
        let _ = write!(
            source,
            "note {} {} {} {} {} {} {} {}",
            note.id,
            note.page_index,
            note.note_type,
            note.tick as i64,
            normalize_lane(note.x),
            note.hold_tick as i64,
            note.next_id,
            (note.approach_rate * 100.0) as i64
        );
    }
    source
}

/// Scales the lane value into integer range, cancelling floating-point noise
/// while preserving sign and relative ordering.
fn normalize_lane(x: f64) -> i64 {
    let mut lx = x;
    if lx != 0.0 {
        while lx.abs() < 10_000.0 {
            lx *= 10.0;
        }
    }
    lx as i64
}

/// Reduces an accumulated checksum source to the stable content fingerprint.
pub fn fingerprint(source: &str) -> String {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(source.as_bytes());
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::structured::{NoteDef, PageDef, TempoEvent};

    #[test]
    fn lane_normalization_preserves_sign_and_order() {
        assert_eq!(normalize_lane(0.0), 0);
        assert_eq!(normalize_lane(0.5), 50_000);
        assert_eq!(normalize_lane(-0.5), -50_000);
        assert!(normalize_lane(0.25) < normalize_lane(0.5));
        // Values already in range are left alone.
        assert_eq!(normalize_lane(12_345.0), 12_345);
    }

    #[test]
    fn canonical_source_field_order() {
        let root = ChartRoot {
            format_version: 2,
            time_base: 480,
            start_offset_time: 0.0,
            music_offset: 0.0,
            tempo_list: vec![TempoEvent {
                tick: 0.0,
                value: 500_000,
            }],
            page_list: vec![PageDef {
                start_tick: 0.0,
                end_tick: 480.0,
                scan_line_direction: -1,
            }],
            note_list: vec![NoteDef {
                page_index: 0,
                note_type: 0,
                id: 0,
                tick: 240.0,
                x: 0.5,
                hold_tick: 0.0,
                next_id: 0,
                approach_rate: 1.0,
            }],
            event_order_list: Vec::new(),
            animation_list: Vec::new(),
        };
        assert_eq!(
            canonical_source(&root),
            "tempo 0 500000page 0 480note 0 0 0 240 50000 0 0 100"
        );
    }

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert_eq!(fingerprint("abc").len(), 16);
    }
}
