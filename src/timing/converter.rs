use crate::chart::DEFAULT_BPM;

use super::tempo_map::DEFAULT_BEATS_PER_MEASURE;
use super::{Beat, Measure, Position, Second, TempoMap};

/// Lookup service over a [`TempoMap`]: binary-search the surrounding
/// breakpoints and interpolate linearly, extrapolating with the final
/// segment's slope outside the tabulated range (and with the 120 BPM / 4-4
/// defaults before the first breakpoint).
#[derive(Debug, Clone)]
pub struct TimeConverter {
    tempo_map: TempoMap,
}

impl TimeConverter {
    pub fn new(tempo_map: TempoMap) -> Self {
        Self { tempo_map }
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    pub fn beats_to_seconds(&self, beats: Beat) -> Second {
        let table = self.tempo_map.beat_timestamps();
        let pos = table.partition_point(|ts| ts.beat < beats);
        if pos == table.len() {
            let back = table[table.len() - 1];
            return Second(
                back.seconds.value()
                    + (beats - back.beat).value() * self.tempo_map.last_seconds_per_beat(),
            );
        }
        if pos == 0 {
            let front = table[0];
            let default_seconds_per_beat = 60_000.0 / f64::from(DEFAULT_BPM);
            return Second(
                front.seconds.value()
                    - (front.beat - beats).value() * default_seconds_per_beat,
            );
        }
        let prev = table[pos - 1];
        let next = table[pos];
        Second(lerp(
            beats.value(),
            prev.beat.value(),
            next.beat.value(),
            prev.seconds.value(),
            next.seconds.value(),
        ))
    }

    pub fn seconds_to_beats(&self, seconds: Second) -> Beat {
        let table = self.tempo_map.beat_timestamps();
        let pos = table.partition_point(|ts| ts.seconds < seconds);
        if pos == table.len() {
            let back = table[table.len() - 1];
            return Beat(
                back.beat.value()
                    + (seconds - back.seconds).value() / self.tempo_map.last_seconds_per_beat(),
            );
        }
        if pos == 0 {
            let front = table[0];
            let default_seconds_per_beat = 60_000.0 / f64::from(DEFAULT_BPM);
            return Beat(
                front.beat.value()
                    - (front.seconds - seconds).value() / default_seconds_per_beat,
            );
        }
        let prev = table[pos - 1];
        let next = table[pos];
        Beat(lerp(
            seconds.value(),
            prev.seconds.value(),
            next.seconds.value(),
            prev.beat.value(),
            next.beat.value(),
        ))
    }

    pub fn beats_to_measures(&self, beats: Beat) -> Measure {
        let table = self.tempo_map.measure_timestamps();
        let pos = table.partition_point(|ts| ts.beat < beats);
        if pos == table.len() {
            let back = table[table.len() - 1];
            return Measure(
                back.measure.value()
                    + (beats - back.beat).value() / self.tempo_map.last_beats_per_measure(),
            );
        }
        if pos == 0 {
            let front = table[0];
            return Measure(
                front.measure.value()
                    - (front.beat - beats).value() / DEFAULT_BEATS_PER_MEASURE,
            );
        }
        let prev = table[pos - 1];
        let next = table[pos];
        Measure(lerp(
            beats.value(),
            prev.beat.value(),
            next.beat.value(),
            prev.measure.value(),
            next.measure.value(),
        ))
    }

    pub fn measures_to_beats(&self, measures: Measure) -> Beat {
        let table = self.tempo_map.measure_timestamps();
        let pos = table.partition_point(|ts| ts.measure < measures);
        if pos == table.len() {
            let back = table[table.len() - 1];
            return Beat(
                back.beat.value()
                    + (measures - back.measure).value() * self.tempo_map.last_beats_per_measure(),
            );
        }
        if pos == 0 {
            let front = table[0];
            return Beat(
                front.beat.value()
                    - (front.measure - measures).value() * DEFAULT_BEATS_PER_MEASURE,
            );
        }
        let prev = table[pos - 1];
        let next = table[pos];
        Beat(lerp(
            measures.value(),
            prev.measure.value(),
            next.measure.value(),
            prev.beat.value(),
            next.beat.value(),
        ))
    }

    /// The position at the given beat under this converter's tempo map.
    pub fn position_at(&self, beat: Beat) -> Position {
        Position::new(beat, self.beats_to_measures(beat))
    }
}

fn lerp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BpmChange, SyncTrack, TimeSignature};
    use crate::timing::Tick;

    fn converter(sync: SyncTrack) -> TimeConverter {
        TimeConverter::new(TempoMap::new(&sync, 192, &[]).unwrap())
    }

    #[test]
    fn constant_bpm_is_linear() {
        let conv = converter(SyncTrack::default());
        assert!((conv.beats_to_seconds(Beat(4.0)).value() - 2.0).abs() < 1e-9);
        assert!((conv.seconds_to_beats(Second(2.0)).value() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn interpolates_across_bpm_changes() {
        let sync = SyncTrack::new(
            vec![],
            vec![
                BpmChange { position: Tick(0), bpm: 120_000 },
                BpmChange { position: Tick(384), bpm: 240_000 },
            ],
        )
        .unwrap();
        let conv = converter(sync);

        // Two beats at 120 BPM, then 240 BPM at 0.25 s per beat.
        assert!((conv.beats_to_seconds(Beat(2.0)).value() - 1.0).abs() < 1e-9);
        assert!((conv.beats_to_seconds(Beat(4.0)).value() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn extrapolates_before_first_breakpoint_with_defaults() {
        let conv = converter(SyncTrack::default());
        assert!((conv.beats_to_seconds(Beat(-1.0)).value() + 0.5).abs() < 1e-9);
        assert!((conv.beats_to_measures(Beat(-4.0)).value() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn measures_follow_time_signatures() {
        let sync = SyncTrack::new(
            vec![
                TimeSignature { position: Tick(0), numerator: 4, denominator: 4 },
                TimeSignature { position: Tick(768), numerator: 3, denominator: 4 },
            ],
            vec![],
        )
        .unwrap();
        let conv = converter(sync);

        assert!((conv.beats_to_measures(Beat(4.0)).value() - 1.0).abs() < 1e-9);
        assert!((conv.beats_to_measures(Beat(7.0)).value() - 2.0).abs() < 1e-9);
        assert!((conv.measures_to_beats(Measure(2.0)).value() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn seconds_beats_round_trip() {
        let sync = SyncTrack::new(
            vec![],
            vec![
                BpmChange { position: Tick(0), bpm: 120_000 },
                BpmChange { position: Tick(576), bpm: 90_000 },
                BpmChange { position: Tick(1152), bpm: 180_000 },
            ],
        )
        .unwrap();
        let conv = converter(sync);

        for i in 0..50 {
            let beat = Beat(f64::from(i) * 0.25);
            let round_trip = conv.seconds_to_beats(conv.beats_to_seconds(beat));
            assert!(
                (round_trip - beat).value().abs() < 1e-9,
                "round trip failed at beat {}: got {}",
                beat.value(),
                round_trip.value()
            );
        }
    }
}
