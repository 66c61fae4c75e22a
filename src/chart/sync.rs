use crate::timing::Tick;

use super::ChartError;

pub const DEFAULT_BPM: u32 = 120_000;
pub const DEFAULT_RESOLUTION: u32 = 192;

/// A time signature change. The denominator must be a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub position: Tick,
    pub numerator: u32,
    pub denominator: u32,
}

/// A tempo change. BPM is stored in thousandths, so 120 BPM is 120 000.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BpmChange {
    pub position: Tick,
    pub bpm: u32,
}

/// The sync track of a chart: sorted, deduplicated time signatures and BPM
/// changes, each guaranteed to have an entry at tick zero.
#[derive(Debug, Clone)]
pub struct SyncTrack {
    time_sigs: Vec<TimeSignature>,
    bpms: Vec<BpmChange>,
}

impl SyncTrack {
    /// Normalise the raw sync events: sort by position, keep the last event
    /// at a given position, and fall back to 4/4 at 120 BPM when the chart
    /// leaves tick zero unspecified.
    pub fn new(
        mut time_sigs: Vec<TimeSignature>,
        mut bpms: Vec<BpmChange>,
    ) -> Result<Self, ChartError> {
        for sig in &time_sigs {
            if sig.denominator == 0 || !sig.denominator.is_power_of_two() {
                return Err(ChartError::InvalidTimeSignature(sig.denominator));
            }
            if sig.numerator == 0 {
                return Err(ChartError::InvalidSync("zero time signature numerator".into()));
            }
        }
        for bpm in &bpms {
            if bpm.bpm == 0 {
                return Err(ChartError::InvalidSync("zero BPM".into()));
            }
        }

        time_sigs.sort_by_key(|sig| sig.position);
        bpms.sort_by_key(|bpm| bpm.position);
        dedup_keep_last(&mut time_sigs, |sig| sig.position);
        dedup_keep_last(&mut bpms, |bpm| bpm.position);

        if time_sigs.first().map(|sig| sig.position) != Some(Tick(0)) {
            time_sigs.insert(
                0,
                TimeSignature {
                    position: Tick(0),
                    numerator: 4,
                    denominator: 4,
                },
            );
        }
        if bpms.first().map(|bpm| bpm.position) != Some(Tick(0)) {
            bpms.insert(
                0,
                BpmChange {
                    position: Tick(0),
                    bpm: DEFAULT_BPM,
                },
            );
        }

        Ok(Self { time_sigs, bpms })
    }

    pub fn time_sigs(&self) -> &[TimeSignature] {
        &self.time_sigs
    }

    pub fn bpms(&self) -> &[BpmChange] {
        &self.bpms
    }
}

impl Default for SyncTrack {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new()).expect("empty sync normalises to defaults")
    }
}

fn dedup_keep_last<T: Copy>(events: &mut Vec<T>, key: impl Fn(&T) -> Tick) {
    let mut kept: Vec<T> = Vec::with_capacity(events.len());
    for event in events.iter() {
        if kept.last().map(|last| key(last)) == Some(key(event)) {
            *kept.last_mut().expect("checked non-empty") = *event;
        } else {
            kept.push(*event);
        }
    }
    *events = kept;
}
