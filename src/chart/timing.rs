use crate::chart::ChartError;
use crate::parsing::structured::TempoEvent;

/// Piecewise tick<->time converter built from the chart's tempo list.
///
/// Each entry rules the interval from its tick up to the next entry's tick;
/// `value` is microseconds per `time_base` ticks. The list is expected in
/// ascending tick order with the first entry at tick 0.
///
/// The two walk directions use asymmetric boundary comparisons (`>=` when
/// driven by tick, strict `<` when driven by time); both are load-bearing
/// and covered by the boundary tests below.
#[derive(Debug, Clone)]
pub struct TempoMap {
    time_base: i32,
    entries: Vec<TempoEvent>,
}

impl TempoMap {
    pub fn new(time_base: i32, entries: Vec<TempoEvent>) -> Result<Self, ChartError> {
        if time_base <= 0 {
            return Err(ChartError::NonPositiveTimeBase(time_base));
        }
        if entries.is_empty() {
            return Err(ChartError::EmptyTempoList);
        }
        if let Some(bad) = entries.iter().find(|entry| entry.value <= 0) {
            return Err(ChartError::NonPositiveTempoValue {
                tick: bad.tick,
                value: bad.value,
            });
        }
        Ok(Self { time_base, entries })
    }

    pub fn time_base(&self) -> i32 {
        self.time_base
    }

    pub fn entries(&self) -> &[TempoEvent] {
        &self.entries
    }

    /// Absolute time in seconds for a tick. Segments strictly before the
    /// tick are accumulated whole; the remainder uses the segment the tick
    /// falls in, with a segment boundary belonging to the earlier segment.
    pub fn tick_to_time(&self, tick: f64) -> f64 {
        let base = self.time_base as f64;
        let mut result = 0.0f64;
        let mut segment_start = 0.0f64;
        let mut active = 0;

        for i in 1..self.entries.len() {
            if self.entries[i].tick >= tick {
                break;
            }
            result +=
                (self.entries[i].tick - segment_start) * 1e-6 * self.entries[i - 1].value as f64
                    / base;
            segment_start = self.entries[i].tick;
            active = i;
        }

        result + (tick - segment_start) * 1e-6 * self.entries[active].value as f64 / base
    }

    /// Nearest tick for an absolute time. Whole segment durations are
    /// consumed while they fit strictly below the target; the residual is
    /// scaled by the active segment's value and rounded.
    pub fn time_to_tick(&self, time: f64) -> i64 {
        let base = self.time_base as f64;
        let mut elapsed = 0.0f64;
        let mut segment_start = 0.0f64;
        let mut i = 1;

        while i < self.entries.len() {
            let duration = (self.entries[i].tick - self.entries[i - 1].tick) / base
                * self.entries[i - 1].value as f64
                * 1e-6;
            if elapsed + duration < time {
                elapsed += duration;
                segment_start = self.entries[i].tick;
                i += 1;
            } else {
                break;
            }
        }

        (segment_start + (time - elapsed) / self.entries[i - 1].value as f64 * 1e6 * base).round()
            as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_segment() -> TempoMap {
        TempoMap::new(
            480,
            vec![TempoEvent {
                tick: 0.0,
                value: 500_000,
            }],
        )
        .unwrap()
    }

    fn two_segments() -> TempoMap {
        // 0..480 at 500000 us/page (0.5 s), 480.. at 250000 us/page.
        TempoMap::new(
            480,
            vec![
                TempoEvent {
                    tick: 0.0,
                    value: 500_000,
                },
                TempoEvent {
                    tick: 480.0,
                    value: 250_000,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn single_segment_tick_to_time() {
        let map = single_segment();
        assert!((map.tick_to_time(480.0) - 0.5).abs() < 1e-12);
        assert!((map.tick_to_time(240.0) - 0.25).abs() < 1e-12);
        assert_eq!(map.tick_to_time(0.0), 0.0);
    }

    #[test]
    fn tick_on_tempo_boundary_uses_earlier_segment() {
        let map = two_segments();
        // The boundary tick accumulates nothing past the first segment.
        assert!((map.tick_to_time(480.0) - 0.5).abs() < 1e-12);
        // Just past the boundary, the second value takes over.
        assert!((map.tick_to_time(960.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn time_on_segment_boundary_stays_in_earlier_segment() {
        let map = two_segments();
        assert_eq!(map.time_to_tick(0.5), 480);
        assert_eq!(map.time_to_tick(0.75), 960);
        assert_eq!(map.time_to_tick(0.25), 240);
    }

    #[test]
    fn round_trip_recovers_tick_within_one() {
        let map = two_segments();
        for tick in [0i64, 1, 239, 479, 480, 481, 720, 960, 1337] {
            let recovered = map.time_to_tick(map.tick_to_time(tick as f64));
            assert!(
                (recovered - tick).abs() <= 1,
                "tick {} round-tripped to {}",
                tick,
                recovered
            );
        }
    }

    #[test]
    fn rejects_degenerate_tempo_lists() {
        assert!(matches!(
            TempoMap::new(480, Vec::new()),
            Err(ChartError::EmptyTempoList)
        ));
        assert!(matches!(
            TempoMap::new(
                480,
                vec![TempoEvent {
                    tick: 0.0,
                    value: 0
                }]
            ),
            Err(ChartError::NonPositiveTempoValue { .. })
        ));
        assert!(matches!(
            TempoMap::new(0, vec![TempoEvent { tick: 0.0, value: 1 }]),
            Err(ChartError::NonPositiveTimeBase(0))
        ));
    }
}
