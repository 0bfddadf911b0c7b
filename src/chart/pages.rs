use log::debug;

use crate::chart::{ChartError, ChartSettings, Mods, TempoMap};
use crate::parsing::structured::PageDef;

/// One scan-line sweep window with resolved absolute times.
///
/// `actual_start_tick`/`actual_start_time` mirror the previous page's end
/// (zero for the first page) and feed the cross-boundary speed blend.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub start_tick: f64,
    pub end_tick: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub actual_start_tick: f64,
    pub actual_start_time: f64,
    pub scan_line_direction: i32,
}

impl Page {
    pub fn tick_span(&self) -> f64 {
        self.end_tick - self.start_tick
    }
}

pub(crate) fn resolve_pages(
    defs: &[PageDef],
    tempo: &TempoMap,
    mods: &Mods,
) -> Result<Vec<Page>, ChartError> {
    if defs.is_empty() {
        return Err(ChartError::EmptyPages);
    }

    let mut pages: Vec<Page> = Vec::with_capacity(defs.len());
    for (index, def) in defs.iter().enumerate() {
        if def.start_tick == def.end_tick {
            return Err(ChartError::DegeneratePage { index });
        }

        let (actual_start_tick, actual_start_time) = if index == 0 {
            (0.0, 0.0)
        } else {
            let previous = &pages[index - 1];
            (previous.end_tick, previous.end_time)
        };

        let scan_line_direction = if mods.flip_y_active() {
            if def.scan_line_direction == 1 { -1 } else { 1 }
        } else {
            def.scan_line_direction
        };

        pages.push(Page {
            start_tick: def.start_tick,
            end_tick: def.end_tick,
            start_time: tempo.tick_to_time(def.start_tick),
            end_time: tempo.tick_to_time(def.end_tick),
            actual_start_tick,
            actual_start_time,
            scan_line_direction,
        });
    }

    debug!("resolved {} pages", pages.len());
    Ok(pages)
}

/// Index of the page whose time window contains `time` (the first page whose
/// end time is not yet passed). Returns `pages.len()` past the last page so
/// callers can extrapolate.
pub(crate) fn page_index_at(pages: &[Page], time: f64) -> usize {
    let mut index = 0;
    while index < pages.len() && time > pages[index].end_time {
        index += 1;
    }
    index
}

/// Maps an arbitrary tick to a scan-space y coordinate. Past the last page,
/// extrapolates from it with the direction negated and the overshoot
/// measured from its end tick. Reused for hold tails and ad-hoc queries.
pub(crate) fn y_at_tick(pages: &[Page], settings: &ChartSettings, tick: f64) -> f64 {
    let half = settings.camera_half_extent;
    let offset = settings.vertical_offset();

    let mut index = 0;
    while index < pages.len() && tick > pages[index].end_tick {
        index += 1;
    }

    if index == pages.len() {
        let last = &pages[index - 1];
        return -settings.vertical_ratio
            * last.scan_line_direction as f64
            * (-half + 2.0 * half * (tick - last.end_tick) / last.tick_span())
            + offset;
    }

    let page = &pages[index];
    settings.vertical_ratio
        * page.scan_line_direction as f64
        * (-half + 2.0 * half * (tick - page.start_tick) / page.tick_span())
        + offset
}

/// Scan-line y at an absolute time, linear in time across the containing
/// page's window; the same negated extrapolation as `y_at_tick` past the
/// last page.
pub(crate) fn scan_position(pages: &[Page], settings: &ChartSettings, time: f64) -> f64 {
    let half = settings.camera_half_extent;
    let offset = settings.vertical_offset();

    let index = page_index_at(pages, time);
    if index == pages.len() {
        let last = &pages[index - 1];
        return -settings.vertical_ratio
            * last.scan_line_direction as f64
            * (-half + 2.0 * half * (time - last.end_time) / (last.end_time - last.start_time))
            + offset;
    }

    let page = &pages[index];
    settings.vertical_ratio
        * page.scan_line_direction as f64
        * (-half + 2.0 * half * (time - page.start_time) / (page.end_time - page.start_time))
        + offset
}
