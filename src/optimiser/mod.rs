//! The path search: enumerate candidate activations over the point set
//! and pick the highest-scoring non-overlapping schedule.

use std::collections::HashMap;

use tracing::debug;

use crate::points::{PointIdx, PointSet};
use crate::song::{ActValidity, Activation, ActivationCandidate, Path, ProcessedSong};
use crate::sp::{SpBar, MINIMUM_SP_AMOUNT};
use crate::timing::{Beat, Measure, Position};

const NEG_INF_POSITION: Position = Position {
    beat: Beat::NEG_INFINITY,
    measure: Measure::NEG_INFINITY,
};

/// Search state is memoised on (first ungathered point, gather start
/// position): the best continuation from there with an empty bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    point: PointIdx,
    beat_bits: u64,
}

impl CacheKey {
    fn new(point: PointIdx, position: Position) -> Self {
        Self {
            point,
            beat_bits: position.beat.value().to_bits(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedAct {
    act_start: PointIdx,
    act_end: PointIdx,
    earliest: Position,
    sp_bar: SpBar,
    sp_start: Beat,
    ending: Position,
    next_point: PointIdx,
}

#[derive(Debug, Clone, Copy)]
struct CacheValue {
    boost: u32,
    act: Option<CachedAct>,
}

/// Finds the maximum-boost activation path for a processed song. Ties are
/// broken towards the earliest start, then the earliest end, then the
/// fewest activations, by enumerating candidates in order and only
/// replacing the incumbent on a strict improvement.
pub struct Optimiser<'a> {
    song: &'a ProcessedSong,
    squeeze: f64,
    cache: HashMap<CacheKey, CacheValue>,
}

impl<'a> Optimiser<'a> {
    pub fn new(song: &'a ProcessedSong, squeeze: f64) -> Self {
        Self {
            song,
            squeeze,
            cache: HashMap::new(),
        }
    }

    pub fn optimal_path(&mut self) -> Path {
        let points = self.song.points();
        if points.is_empty() {
            return Path::default();
        }

        let root_position = Position::ZERO;
        let root = self.best_from(points.first(), root_position);
        debug!(
            boost = root.boost,
            cached = self.cache.len(),
            "optimal path search finished"
        );

        let mut activations = Vec::new();
        let mut value = root;
        while let Some(act) = value.act {
            let whammy_end = self.minimum_whammy_end(&act);
            activations.push(Activation {
                act_start: act.act_start,
                act_end: act.act_end,
                whammy_end,
                sp_start: act.sp_start,
                sp_end: act.ending.beat,
            });
            value = if act.next_point == points.end() {
                CacheValue { boost: 0, act: None }
            } else {
                self.cache[&CacheKey::new(act.next_point, act.ending)]
            };
        }

        Path {
            activations,
            score_boost: root.boost,
        }
    }

    /// Best score boost achievable from `first_point` onwards, starting
    /// with an empty bar whose gathering begins at `start_position`.
    fn best_from(&mut self, first_point: PointIdx, start_position: Position) -> CacheValue {
        let points = self.song.points();
        if first_point == points.end() {
            return CacheValue { boost: 0, act: None };
        }
        let key = CacheKey::new(first_point, start_position);
        if let Some(value) = self.cache.get(&key) {
            return *value;
        }

        let mut best = CacheValue { boost: 0, act: None };
        let mut act_start = points.next_non_hold_point(first_point);
        while act_start < points.end() {
            let (sp_bar, earliest) = self.song.total_available_sp_with_earliest_pos(
                start_position.beat,
                first_point,
                act_start,
                start_position,
            );
            if sp_bar.max >= MINIMUM_SP_AMOUNT {
                self.try_act_ends(act_start, sp_bar, earliest, &mut best);
            }
            act_start = points.next_non_hold_point(act_start.next());
        }

        self.cache.insert(key, best);
        best
    }

    fn try_act_ends(
        &mut self,
        act_start: PointIdx,
        sp_bar: SpBar,
        earliest: Position,
        best: &mut CacheValue,
    ) {
        let points = self.song.points();
        let mut act_end = act_start;
        while act_end < points.end() {
            if !is_candidate_end(points, act_end) {
                act_end = act_end.next();
                continue;
            }
            let candidate = ActivationCandidate {
                act_start,
                act_end,
                earliest_activation_point: earliest,
                sp_bar,
            };
            let result = self
                .song
                .is_candidate_valid(&candidate, self.squeeze, NEG_INF_POSITION);
            match result.validity {
                // The bar ran out before this end; later ends only get
                // further away.
                ActValidity::InsufficientSp => break,
                ActValidity::SurplusSp => {}
                ActValidity::Success => {
                    let gain_end = points.next_non_hold_point(act_end.next());
                    let boost = points.range_score(act_start, gain_end);
                    let continuation = self.best_from(gain_end, result.ending_position);
                    let total = boost + continuation.boost;
                    if total > best.boost {
                        let sp_start = self
                            .song
                            .adjusted_hit_window_start(act_start, self.squeeze)
                            .max(earliest)
                            .beat;
                        *best = CacheValue {
                            boost: total,
                            act: Some(CachedAct {
                                act_start,
                                act_end,
                                earliest,
                                sp_bar,
                                sp_start,
                                ending: result.ending_position,
                                next_point: gain_end,
                            }),
                        };
                    }
                }
            }
            act_end = act_end.next();
        }
    }

    /// The earliest beat the player may stop whammying: the smallest
    /// forced-whammy horizon under which even the worst-case bar still
    /// reaches the activation's final scored note.
    fn minimum_whammy_end(&self, act: &CachedAct) -> Beat {
        let act_position = self
            .song
            .adjusted_hit_window_start(act.act_start, self.squeeze)
            .max(act.earliest);
        let wait_drain = (act_position.measure - act.earliest.measure).value()
            * self.song.engine().sp_drain_rate;
        let min_sp = (act.sp_bar.min.max(MINIMUM_SP_AMOUNT) - wait_drain).max(0.0);
        let early_limit = self
            .song
            .adjusted_hit_window_start(act.act_end, self.squeeze);

        let reaches = |whammy_end: Beat| {
            self.song
                .sp_data()
                .activation_end_point(act_position, min_sp, whammy_end)
                .beat
                .value()
                >= early_limit.beat.value() - 1e-9
        };
        if reaches(Beat::NEG_INFINITY) {
            return act.sp_start;
        }

        let mut low = act_position.beat;
        let mut high = act.ending.beat;
        for _ in 0..50 {
            let mid = Beat((low.value() + high.value()) / 2.0);
            if reaches(mid) {
                high = mid;
            } else {
                low = mid;
            }
        }
        high
    }
}

/// An activation may end on a head, or on the final tick of a sustain.
fn is_candidate_end(points: &PointSet, idx: PointIdx) -> bool {
    if !points.point(idx).is_hold_point {
        return true;
    }
    let next = idx.next();
    next == points.end() || !points.point(next).is_hold_point
}
