use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::chart::NoteKind;
use crate::parsing::ParseError;
use crate::parsing::structured::{ChartRoot, NoteDef, PageDef, TempoEvent};

/// Ticks per page in converted charts.
const TIME_BASE: i32 = 480;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyKind {
    Single,
    Chain,
    Hold,
}

/// Intermediate note carried only during conversion. Chain links are held as
/// original ids and remapped after the chronological re-sort.
#[derive(Debug, Clone)]
struct LegacyNote {
    time: f64,
    x: f64,
    duration: f64,
    kind: LegacyKind,
    is_chain_head: bool,
    next_original: Option<i64>,
}

/// Converts legacy line-record chart text into the normalized root, plus the
/// raw-token checksum source accumulated record by record.
///
/// Records are whitespace-delimited: `PAGE_SIZE <seconds>`,
/// `PAGE_SHIFT <seconds>`, `NOTE <id> <time> <lane> <duration>`,
/// `LINK <id> <id> ...`. Unrecognized record types are skipped.
pub fn convert(text: &str) -> Result<(ChartRoot, String), ParseError> {
    let mut page_duration = 0.0f64;
    let mut page_shift = 0.0f64;
    let mut arena: Vec<LegacyNote> = Vec::new();
    let mut by_original: HashMap<i64, usize> = HashMap::new();
    let mut checksum_source = String::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        match tokens[0] {
            "PAGE_SIZE" => {
                let token = record_token(&tokens, 1, line_no, "PAGE_SIZE")?;
                checksum_source.push_str(token);
                page_duration = parse_number(token, line_no, "PAGE_SIZE")?;
            }
            "PAGE_SHIFT" => {
                let token = record_token(&tokens, 1, line_no, "PAGE_SHIFT")?;
                checksum_source.push_str(token);
                page_shift = parse_number(token, line_no, "PAGE_SHIFT")?;
            }
            "NOTE" => {
                if tokens.len() < 5 {
                    return Err(ParseError::InvalidRecord {
                        line: line_no,
                        reason: format!("NOTE expects 4 fields, got {}", tokens.len() - 1),
                    });
                }
                for token in &tokens[1..5] {
                    checksum_source.push_str(token);
                }
                let id: i64 = tokens[1].parse().map_err(|_| ParseError::InvalidRecord {
                    line: line_no,
                    reason: format!("NOTE id '{}' is not an integer", tokens[1]),
                })?;
                let time = parse_number(tokens[2], line_no, "NOTE time")?;
                let x = parse_number(tokens[3], line_no, "NOTE lane")?;
                let duration = parse_number(tokens[4], line_no, "NOTE duration")?;

                if by_original.contains_key(&id) {
                    return Err(ParseError::DuplicateNote { line: line_no, id });
                }
                by_original.insert(id, arena.len());
                arena.push(LegacyNote {
                    time,
                    x,
                    duration,
                    kind: if duration > 0.0 {
                        LegacyKind::Hold
                    } else {
                        LegacyKind::Single
                    },
                    is_chain_head: false,
                    next_original: None,
                });
            }
            "LINK" => {
                // Chain takes precedence over the duration-based Hold
                // classification. Tokens equal to "LINK" are skipped; other
                // non-numeric tokens still enter the checksum stream.
                let mut chain: Vec<i64> = Vec::new();
                for token in &tokens[1..] {
                    if *token != "LINK" {
                        checksum_source.push_str(token);
                    }
                    let id: i64 = match token.parse() {
                        Ok(id) => id,
                        Err(_) => continue,
                    };
                    let slot = by_original
                        .get(&id)
                        .copied()
                        .ok_or(ParseError::UndefinedLink { line: line_no, id })?;
                    arena[slot].kind = LegacyKind::Chain;
                    if !chain.contains(&id) {
                        chain.push(id);
                    }
                }
                if chain.is_empty() {
                    return Err(ParseError::EmptyLink { line: line_no });
                }
                for pair in chain.windows(2) {
                    if let Some(&slot) = by_original.get(&pair[0]) {
                        arena[slot].next_original = Some(pair[1]);
                    }
                }
                if let Some(&slot) = by_original.get(&chain[0]) {
                    arena[slot].is_chain_head = true;
                }
            }
            _ => {}
        }
    }

    if page_duration <= 0.0 {
        return Err(ParseError::InvalidPageSize {
            value: page_duration,
        });
    }

    page_shift += page_duration;
    if page_shift < 0.0 {
        page_shift += 2.0 * page_duration;
    }

    // Chronological id reassignment: stable-sort by time, rank becomes the
    // new id. Links were captured by original id, so they survive the
    // resort via the remap below.
    let mut order: Vec<usize> = (0..arena.len()).collect();
    order.sort_by(|&a, &b| {
        arena[a]
            .time
            .partial_cmp(&arena[b].time)
            .unwrap_or(Ordering::Equal)
    });
    let mut new_id = vec![0i64; arena.len()];
    for (rank, &slot) in order.iter().enumerate() {
        new_id[slot] = rank as i64;
    }

    let tempo_value = (page_duration * 1_000_000.0) as i64;
    let shift_tick_offset = page_shift / page_duration * TIME_BASE as f64;
    let time_base = TIME_BASE as f64;

    let mut note_list = Vec::with_capacity(order.len());
    let mut last_page = 0i64;
    for &slot in &order {
        let legacy = &arena[slot];
        let tick = legacy.time * time_base * 1e6 / tempo_value as f64 + shift_tick_offset;
        let hold_tick = legacy.duration * time_base * 1e6 / tempo_value as f64;
        last_page = (tick / time_base).floor() as i64;

        let kind = match legacy.kind {
            LegacyKind::Single => NoteKind::Click,
            LegacyKind::Hold => NoteKind::Hold,
            LegacyKind::Chain => {
                if legacy.is_chain_head {
                    NoteKind::DragHead
                } else {
                    NoteKind::DragChild
                }
            }
        };
        // Chain tails keep -1 so they stay distinguishable from the 0 that
        // marks non-chain notes on the wire.
        let next_id = match legacy.kind {
            LegacyKind::Chain => legacy
                .next_original
                .and_then(|id| by_original.get(&id))
                .map(|&next_slot| new_id[next_slot])
                .unwrap_or(-1),
            _ => 0,
        };

        note_list.push(NoteDef {
            page_index: last_page,
            note_type: kind.as_raw(),
            id: new_id[slot],
            tick,
            x: legacy.x,
            hold_tick,
            next_id,
            approach_rate: 1.0,
        });
    }

    // One page per time-base interval through the last note's page,
    // alternating scan direction starting downward.
    let mut page_list = Vec::new();
    let mut direction = -1;
    let mut start_tick = 0i64;
    for _ in 0..=last_page {
        page_list.push(PageDef {
            start_tick: start_tick as f64,
            end_tick: (start_tick + TIME_BASE as i64) as f64,
            scan_line_direction: direction,
        });
        direction = -direction;
        start_tick += TIME_BASE as i64;
    }

    let root = ChartRoot {
        format_version: 0,
        time_base: TIME_BASE,
        start_offset_time: 0.0,
        music_offset: shift_tick_offset / time_base / 1e6 * tempo_value as f64,
        tempo_list: vec![TempoEvent {
            tick: 0.0,
            value: tempo_value,
        }],
        page_list,
        note_list,
        event_order_list: Vec::new(),
        animation_list: Vec::new(),
    };
    debug!(
        "converted legacy chart: {} notes over {} pages",
        root.note_list.len(),
        root.page_list.len()
    );
    Ok((root, checksum_source))
}

fn record_token<'a>(
    tokens: &[&'a str],
    index: usize,
    line: usize,
    record: &str,
) -> Result<&'a str, ParseError> {
    tokens
        .get(index)
        .copied()
        .ok_or_else(|| ParseError::InvalidRecord {
            line,
            reason: format!("{} is missing its value", record),
        })
}

fn parse_number(token: &str, line: usize, field: &str) -> Result<f64, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidRecord {
        line,
        reason: format!("{} '{}' is not a number", field, token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_without_shift_lands_on_first_page() {
        // PAGE_SHIFT -0.5 cancels the one-page normalization offset.
        let text = "PAGE_SIZE 0.5\nPAGE_SHIFT -0.5\nNOTE 0 0.0 0.5 0\n";
        let (root, _) = convert(text).unwrap();
        assert_eq!(root.note_list.len(), 1);
        let note = &root.note_list[0];
        assert_eq!(note.page_index, 0);
        assert_eq!(note.tick, 0.0);
        assert_eq!(note.note_type, NoteKind::Click.as_raw());
        assert_eq!(note.next_id, 0);
        assert_eq!(root.tempo_list[0].value, 500_000);
    }

    #[test]
    fn zero_shift_normalizes_to_one_page_offset() {
        let text = "PAGE_SIZE 0.5\nPAGE_SHIFT 0\nNOTE 0 0.0 0.5 0\n";
        let (root, _) = convert(text).unwrap();
        let note = &root.note_list[0];
        assert_eq!(note.tick, 480.0);
        assert_eq!(note.page_index, 1);
        assert_eq!(root.music_offset, 0.5);
        assert_eq!(root.page_list.len(), 2);
    }

    #[test]
    fn ids_are_reassigned_chronologically_and_links_survive() {
        // Original ids are deliberately out of time order; 7 -> 3 is a chain.
        let text = "PAGE_SIZE 1.0\nPAGE_SHIFT -1.0\n\
                    NOTE 7 0.2 0.1 0\nNOTE 3 0.6 0.9 0\nNOTE 5 0.4 0.5 0\n\
                    LINK 7 3\n";
        let (root, _) = convert(text).unwrap();
        let ids: Vec<i64> = root.note_list.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        // Note 7 is earliest -> id 0, head of the chain; note 3 is latest -> id 2.
        let head = &root.note_list[0];
        assert_eq!(head.note_type, NoteKind::DragHead.as_raw());
        assert_eq!(head.next_id, 2);
        let tail = &root.note_list[2];
        assert_eq!(tail.note_type, NoteKind::DragChild.as_raw());
        assert_eq!(tail.next_id, -1);
        // The middle note is untouched by the chain.
        assert_eq!(root.note_list[1].note_type, NoteKind::Click.as_raw());
        assert_eq!(root.note_list[1].next_id, 0);
    }

    #[test]
    fn link_reclassifies_holds() {
        let text = "PAGE_SIZE 1.0\nNOTE 0 0.0 0.5 0.3\nNOTE 1 0.5 0.5 0\nLINK 0 1\n";
        let (root, _) = convert(text).unwrap();
        assert_eq!(root.note_list[0].note_type, NoteKind::DragHead.as_raw());
    }

    #[test]
    fn link_to_undefined_note_is_fatal() {
        let text = "PAGE_SIZE 1.0\nNOTE 0 0.0 0.5 0\nLINK 0 9\n";
        match convert(text) {
            Err(ParseError::UndefinedLink { id: 9, .. }) => {}
            other => panic!("expected UndefinedLink, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_note_id_is_fatal() {
        let text = "PAGE_SIZE 1.0\nNOTE 0 0.0 0.5 0\nNOTE 0 0.5 0.5 0\n";
        match convert(text) {
            Err(ParseError::DuplicateNote { id: 0, .. }) => {}
            other => panic!("expected DuplicateNote, got {:?}", other),
        }
    }

    #[test]
    fn missing_page_size_is_fatal() {
        match convert("NOTE 0 0.0 0.5 0\n") {
            Err(ParseError::InvalidPageSize { .. }) => {}
            other => panic!("expected InvalidPageSize, got {:?}", other),
        }
    }

    #[test]
    fn pages_alternate_direction_starting_downward() {
        let text = "PAGE_SIZE 0.5\nPAGE_SHIFT -0.5\nNOTE 0 1.2 0.5 0\n";
        let (root, _) = convert(text).unwrap();
        assert_eq!(root.page_list.len(), 3);
        let directions: Vec<i32> = root
            .page_list
            .iter()
            .map(|p| p.scan_line_direction)
            .collect();
        assert_eq!(directions, vec![-1, 1, -1]);
        assert_eq!(root.page_list[1].start_tick, root.page_list[0].end_tick);
    }
}
