use crate::chart::{ChartError, SyncTrack, DEFAULT_BPM};

use super::{Beat, Measure, Second, Tick};

pub(crate) const DEFAULT_BEATS_PER_MEASURE: f64 = 4.0;
const OD_BEATS_PER_MEASURE: f64 = 4.0;

/// A (beat, seconds) breakpoint produced by a BPM change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatTimestamp {
    pub beat: Beat,
    pub seconds: Second,
}

/// A (measure, beat) breakpoint produced by a time signature change, or by
/// an OD beat when the chart carries a beat track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureTimestamp {
    pub measure: Measure,
    pub beat: Beat,
}

/// Piecewise-linear tables mapping tick → beat → measure → seconds.
/// Immutable after construction; lookups live on [`TimeConverter`].
///
/// [`TimeConverter`]: super::TimeConverter
#[derive(Debug, Clone)]
pub struct TempoMap {
    beat_timestamps: Vec<BeatTimestamp>,
    measure_timestamps: Vec<MeasureTimestamp>,
    /// Seconds per beat past the final BPM change.
    last_seconds_per_beat: f64,
    /// Beats per measure past the final time signature (or OD beat).
    last_beats_per_measure: f64,
}

impl TempoMap {
    pub fn new(
        sync: &SyncTrack,
        resolution: u32,
        od_beats: &[Tick],
    ) -> Result<Self, ChartError> {
        if resolution == 0 {
            return Err(ChartError::InvalidResolution);
        }

        let beat_timestamps = build_beat_timestamps(sync, resolution);
        let (measure_timestamps, last_beats_per_measure) = if od_beats.is_empty() {
            build_measure_timestamps(sync, resolution)
        } else {
            build_od_measure_timestamps(od_beats, resolution)
        };

        if beat_timestamps.is_empty() || measure_timestamps.is_empty() {
            return Err(ChartError::InvalidSync("empty breakpoint table".into()));
        }

        let last_bpm = sync.bpms().last().expect("normalised sync has a BPM").bpm;

        Ok(Self {
            beat_timestamps,
            measure_timestamps,
            last_seconds_per_beat: 60_000.0 / f64::from(last_bpm),
            last_beats_per_measure,
        })
    }

    pub fn beat_timestamps(&self) -> &[BeatTimestamp] {
        &self.beat_timestamps
    }

    pub fn measure_timestamps(&self) -> &[MeasureTimestamp] {
        &self.measure_timestamps
    }

    pub(crate) fn last_seconds_per_beat(&self) -> f64 {
        self.last_seconds_per_beat
    }

    pub(crate) fn last_beats_per_measure(&self) -> f64 {
        self.last_beats_per_measure
    }
}

fn build_beat_timestamps(sync: &SyncTrack, resolution: u32) -> Vec<BeatTimestamp> {
    let mut timestamps = Vec::with_capacity(sync.bpms().len());
    let mut last_tick = 0u32;
    let mut last_seconds_per_beat = 60_000.0 / f64::from(DEFAULT_BPM);
    let mut last_seconds = 0.0;

    for bpm in sync.bpms() {
        let delta_beats =
            f64::from(bpm.position.value() - last_tick) / f64::from(resolution);
        last_seconds += delta_beats * last_seconds_per_beat;
        timestamps.push(BeatTimestamp {
            beat: bpm.position.to_beat(resolution),
            seconds: Second(last_seconds),
        });
        last_seconds_per_beat = 60_000.0 / f64::from(bpm.bpm);
        last_tick = bpm.position.value();
    }

    timestamps
}

fn build_measure_timestamps(
    sync: &SyncTrack,
    resolution: u32,
) -> (Vec<MeasureTimestamp>, f64) {
    let mut timestamps = Vec::with_capacity(sync.time_sigs().len());
    let mut last_tick = 0u32;
    let mut last_beats_per_measure = DEFAULT_BEATS_PER_MEASURE;
    let mut measures = 0.0;

    for sig in sync.time_sigs() {
        let delta_beats =
            f64::from(sig.position.value() - last_tick) / f64::from(resolution);
        measures += delta_beats / last_beats_per_measure;
        timestamps.push(MeasureTimestamp {
            measure: Measure(measures),
            beat: sig.position.to_beat(resolution),
        });
        last_beats_per_measure =
            DEFAULT_BEATS_PER_MEASURE * f64::from(sig.numerator) / f64::from(sig.denominator);
        last_tick = sig.position.value();
    }

    (timestamps, last_beats_per_measure)
}

/// A beat track overrides the signature-derived measure mapping: every four
/// OD beats form one measure.
fn build_od_measure_timestamps(
    od_beats: &[Tick],
    resolution: u32,
) -> (Vec<MeasureTimestamp>, f64) {
    let timestamps: Vec<MeasureTimestamp> = od_beats
        .iter()
        .enumerate()
        .map(|(index, tick)| MeasureTimestamp {
            measure: Measure(index as f64 / OD_BEATS_PER_MEASURE),
            beat: tick.to_beat(resolution),
        })
        .collect();

    let last_beats_per_measure = match od_beats {
        [.., prev, last] => {
            OD_BEATS_PER_MEASURE * f64::from(last.value() - prev.value())
                / f64::from(resolution)
        }
        _ => DEFAULT_BEATS_PER_MEASURE,
    };

    (timestamps, last_beats_per_measure)
}
