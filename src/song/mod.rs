//! The composition layer: a song processed for Star Power optimisation,
//! exposing the contract surface the optimiser works against.

use std::fmt::Write as _;

use crate::chart::{ChartError, NoteColour, NoteTrack, SyncTrack};
use crate::config::{DrumSettings, SqueezeSettings};
use crate::engine::Engine;
use crate::points::{PointIdx, PointSet};
use crate::sp::{SpBar, SpData, MINIMUM_SP_AMOUNT};
use crate::timing::{Beat, Position, Second, TempoMap, Tick, TimeConverter};

/// How far past a drum fill's start an activation may still end.
const ACTIVATION_FLEX: Second = Second(0.25);

/// A proposed activation, before validation.
#[derive(Debug, Clone, Copy)]
pub struct ActivationCandidate {
    pub act_start: PointIdx,
    pub act_end: PointIdx,
    pub earliest_activation_point: Position,
    pub sp_bar: SpBar,
}

/// Whether an activation is feasible, and if not which way it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActValidity {
    Success,
    InsufficientSp,
    SurplusSp,
}

/// Validator verdict: validity plus the earliest position the activation
/// can end when it succeeds.
#[derive(Debug, Clone, Copy)]
pub struct ActResult {
    pub ending_position: Position,
    pub validity: ActValidity,
}

/// A scheduled activation in a finished path. All positions are beats.
#[derive(Debug, Clone, Copy)]
pub struct Activation {
    pub act_start: PointIdx,
    pub act_end: PointIdx,
    /// How long whammy is mandatory for the path to hold.
    pub whammy_end: Beat,
    pub sp_start: Beat,
    pub sp_end: Beat,
}

/// An ordered, non-overlapping activation schedule and its score gain.
#[derive(Debug, Clone, Default)]
pub struct Path {
    pub activations: Vec<Activation>,
    pub score_boost: u32,
}

/// A song processed for Star Power optimisation. Construction composes the
/// tempo map, point set, and SP model; everything is read-only afterwards.
#[derive(Debug)]
pub struct ProcessedSong {
    converter: TimeConverter,
    points: PointSet,
    sp_data: SpData,
    engine: Engine,
    total_solo_boost: u32,
    total_bre_boost: u32,
    base_score: u32,
    is_drums: bool,
    bre_start: Option<Position>,
}

impl ProcessedSong {
    pub fn new<C: NoteColour>(
        track: &NoteTrack<C>,
        sync: &SyncTrack,
        squeeze_settings: &SqueezeSettings,
        drum_settings: &DrumSettings,
        engine: Engine,
        od_beats: &[Tick],
        unison_phrases: &[Tick],
    ) -> Result<Self, ChartError> {
        let tempo_map = TempoMap::new(sync, track.resolution(), od_beats)?;
        let converter = TimeConverter::new(tempo_map);
        let points = PointSet::new(
            track,
            &converter,
            unison_phrases,
            squeeze_settings,
            drum_settings,
            &engine,
        );
        let sp_data = SpData::new(track, converter.clone(), squeeze_settings, &engine);

        let total_solo_boost = track.solos().iter().map(|solo| solo.value).sum();
        let (total_bre_boost, bre_start) = match track.bre().filter(|_| engine.has_bres) {
            Some(bre) => {
                let start_beat = bre.start.to_beat(track.resolution());
                let end_beat = bre.end.to_beat(track.resolution());
                let gap = (converter.beats_to_seconds(end_beat)
                    - converter.beats_to_seconds(start_beat))
                .value();
                let boost = (750.0 + 500.0 * gap).round() as u32;
                (boost, Some(converter.position_at(start_beat)))
            }
            None => (0, None),
        };
        let base_score = points.total_value() + total_solo_boost;

        Ok(Self {
            converter,
            points,
            sp_data,
            engine,
            total_solo_boost,
            total_bre_boost,
            base_score,
            is_drums: C::IS_DRUMS,
            bre_start,
        })
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub fn sp_data(&self) -> &SpData {
        &self.sp_data
    }

    pub fn converter(&self) -> &TimeConverter {
        &self.converter
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The score with no Star Power spent: all point values plus solos.
    pub fn base_score(&self) -> u32 {
        self.base_score
    }

    pub fn total_solo_boost(&self) -> u32 {
        self.total_solo_boost
    }

    pub fn total_bre_boost(&self) -> u32 {
        self.total_bre_boost
    }

    pub fn is_drums(&self) -> bool {
        self.is_drums
    }

    /// The minimum and maximum SP acquirable between `start` and the
    /// position of `act_start`, counting phrase grants from points in
    /// `[first_point, act_start)`. Whammy up to `required_whammy_end` is
    /// mandatory and so counts towards the minimum.
    pub fn total_available_sp(
        &self,
        start: Beat,
        first_point: PointIdx,
        act_start: PointIdx,
        required_whammy_end: Beat,
    ) -> SpBar {
        let mut bar = SpBar::empty();
        let mut p = self.points.next_sp_granting_note(first_point);
        while p < act_start {
            self.add_phrase_grant(&mut bar, p);
            p = self.points.next_sp_granting_note(p.next());
        }
        let act_beat = self.points.point(act_start).position.beat;
        let min = bar.min
            + self
                .sp_data
                .available_whammy(start, act_beat.min(required_whammy_end));
        let max = bar.max + self.sp_data.available_whammy(start, act_beat);
        SpBar::new(min, max)
    }

    /// As [`total_available_sp`] with no mandatory whammy, but stopping as
    /// soon as the best-case bar reaches half at some position no earlier
    /// than `earliest_potential_pos`, returning the SP held at that moment.
    ///
    /// [`total_available_sp`]: Self::total_available_sp
    pub fn total_available_sp_with_earliest_pos(
        &self,
        start: Beat,
        first_point: PointIdx,
        act_start: PointIdx,
        earliest_potential_pos: Position,
    ) -> (SpBar, Position) {
        let act_position = self.points.point(act_start).position;
        let mut bar = SpBar::empty();
        let mut cursor = start;

        let mut p = self.points.next_sp_granting_note(first_point);
        while p < act_start {
            let point_beat = self.points.point(p).position.beat;
            if let Some(reached) =
                self.whammy_to_half(&mut bar, cursor, point_beat, earliest_potential_pos)
            {
                return (bar, reached);
            }
            self.add_phrase_grant(&mut bar, p);
            if bar.max >= MINIMUM_SP_AMOUNT {
                let position = self.points.point(p).position.max(earliest_potential_pos);
                return (bar, position);
            }
            cursor = point_beat;
            p = self.points.next_sp_granting_note(p.next());
        }

        if let Some(reached) =
            self.whammy_to_half(&mut bar, cursor, act_position.beat, earliest_potential_pos)
        {
            return (bar, reached);
        }
        (bar, act_position.max(earliest_potential_pos))
    }

    /// Accumulate whammy over `[cursor, until]`, returning the position at
    /// which the best case first holds half a bar, if it does.
    fn whammy_to_half(
        &self,
        bar: &mut SpBar,
        cursor: Beat,
        until: Beat,
        earliest_potential_pos: Position,
    ) -> Option<Position> {
        let need = MINIMUM_SP_AMOUNT - bar.max;
        if need > 0.0 {
            if let Some(beat) = self.sp_data.beat_where_whammy_reaches(cursor, need, until) {
                bar.max = MINIMUM_SP_AMOUNT;
                let beat = beat.max(earliest_potential_pos.beat);
                return Some(self.converter.position_at(beat).max(earliest_potential_pos));
            }
        }
        *bar = SpBar::new(
            bar.min,
            bar.max + self.sp_data.available_whammy(cursor, until),
        );
        None
    }

    fn add_phrase_grant(&self, bar: &mut SpBar, p: PointIdx) {
        bar.add_phrase(self.engine.sp_phrase_amount);
        if self.points.point(p).is_unison_sp_ender {
            bar.add_phrase(self.engine.unison_bonus_amount);
        }
    }

    /// The position `(1 - squeeze)` of the way from the start of the
    /// point's timing window back towards the point itself.
    pub fn adjusted_hit_window_start(&self, point: PointIdx, squeeze: f64) -> Position {
        let p = self.points.point(point);
        let window = self.converter.beats_to_seconds(p.hit_window_start.beat);
        let middle = self.converter.beats_to_seconds(p.position.beat);
        let adjusted = Second(window.value() + (middle - window).value() * (1.0 - squeeze));
        self.converter
            .position_at(self.converter.seconds_to_beats(adjusted))
    }

    /// The position `squeeze` of the way from the point to the end of its
    /// timing window.
    pub fn adjusted_hit_window_end(&self, point: PointIdx, squeeze: f64) -> Position {
        let p = self.points.point(point);
        let window = self.converter.beats_to_seconds(p.hit_window_end.beat);
        let middle = self.converter.beats_to_seconds(p.position.beat);
        let adjusted = Second(middle.value() + (window - middle).value() * squeeze);
        self.converter
            .position_at(self.converter.seconds_to_beats(adjusted))
    }

    /// Decide whether a candidate activation is feasible. On success the
    /// result carries the earliest position the activation can end.
    ///
    /// Panics if the candidate ends before it starts; that is a caller
    /// bug, not a chart property.
    pub fn is_candidate_valid(
        &self,
        candidate: &ActivationCandidate,
        squeeze: f64,
        required_whammy_end: Position,
    ) -> ActResult {
        assert!(
            candidate.act_start <= candidate.act_end,
            "activation ends before it starts"
        );
        if !candidate.sp_bar.full_enough_to_activate() {
            return ActResult {
                ending_position: Position::ZERO,
                validity: ActValidity::InsufficientSp,
            };
        }

        let act_position = self
            .adjusted_hit_window_start(candidate.act_start, squeeze)
            .max(candidate.earliest_activation_point);

        // The bar drains from the earliest moment the activation could
        // have begun until it actually does. Whammy before the activation
        // is not counted; whammy belongs inside it.
        let wait_drain = (act_position.measure - candidate.earliest_activation_point.measure)
            .value()
            * self.engine.sp_drain_rate;
        let min_sp = (candidate.sp_bar.min.max(MINIMUM_SP_AMOUNT) - wait_drain).max(0.0);
        let max_sp = (candidate.sp_bar.max - wait_drain).max(0.0);

        let mut end_max = self
            .sp_data
            .activation_end_point(act_position, max_sp, Beat::INFINITY);
        let mut end_min =
            self.sp_data
                .activation_end_point(act_position, min_sp, required_whammy_end.beat);
        if let Some(bre) = self.bre_start {
            end_max = end_max.min(bre);
            end_min = end_min.min(bre);
        }

        let early_limit = self.adjusted_hit_window_start(candidate.act_end, squeeze);
        if end_max.beat < early_limit.beat {
            return self.fill_checked(candidate, end_max, ActValidity::InsufficientSp);
        }

        if candidate.act_start == candidate.act_end {
            return self.fill_checked(candidate, end_max, ActValidity::Success);
        }

        let late_limit = self.adjusted_hit_window_end(candidate.act_end, squeeze);
        if end_min.beat > late_limit.beat {
            // Nothing scores after the final point, so leftover SP simply
            // burns off into silence.
            let is_final_point =
                self.points.next_non_hold_point(candidate.act_end.next()) == self.points.end();
            if is_final_point {
                return self.fill_checked(candidate, end_min, ActValidity::Success);
            }
            if self.engine.overlaps {
                return self.fill_checked(candidate, late_limit, ActValidity::Success);
            }
            return self.fill_checked(candidate, end_min, ActValidity::SurplusSp);
        }
        self.fill_checked(candidate, end_min.max(early_limit), ActValidity::Success)
    }

    /// Apply the drum fill gate: an activation ending on a fill point must
    /// end within the flex window of the fill's start.
    fn fill_checked(
        &self,
        candidate: &ActivationCandidate,
        ending_position: Position,
        validity: ActValidity,
    ) -> ActResult {
        if validity == ActValidity::Success {
            if let Some(fill_start) = self.points.point(candidate.act_end).fill_start {
                let ending_seconds = self.converter.beats_to_seconds(ending_position.beat);
                if ending_seconds > fill_start + ACTIVATION_FLEX {
                    return ActResult {
                        ending_position,
                        validity: ActValidity::SurplusSp,
                    };
                }
            }
        }
        ActResult {
            ending_position,
            validity,
        }
    }

    /// Render a finished path as text: phrase-count notation, score totals,
    /// and one line per activation.
    pub fn path_summary(&self, path: &Path) -> String {
        let mut counts = Vec::with_capacity(path.activations.len());
        let mut cursor = self.points.first();
        for act in &path.activations {
            let mut count = 0u32;
            let mut p = self.points.next_sp_granting_note(cursor);
            while p < act.act_start {
                count += 1;
                p = self.points.next_sp_granting_note(p.next());
            }
            counts.push(count.to_string());
            cursor = self.points.next_non_hold_point(act.act_end.next());
        }

        let mut summary = String::new();
        if counts.is_empty() {
            summary.push_str("Path: none\n");
        } else {
            let _ = writeln!(summary, "Path: {}", counts.join("-"));
        }
        let _ = writeln!(summary, "No SP score: {}", self.base_score);
        let _ = writeln!(
            summary,
            "Total score: {}",
            self.base_score + path.score_boost
        );
        if !self.engine.ignore_average_multiplier && self.points.total_base_value() > 0 {
            let average =
                f64::from(self.points.total_value()) / f64::from(self.points.total_base_value());
            let _ = writeln!(summary, "Average multiplier: {average:.3}x");
        }
        for (i, act) in path.activations.iter().enumerate() {
            let start_measure = self.converter.beats_to_measures(act.sp_start).value() + 1.0;
            let end_measure = self.converter.beats_to_measures(act.sp_end).value() + 1.0;
            let label = self.points.colour_label(act.act_start);
            if label.is_empty() {
                let _ = writeln!(
                    summary,
                    "Activation {}: Measure {start_measure:.3} to Measure {end_measure:.3}",
                    i + 1
                );
            } else {
                let _ = writeln!(
                    summary,
                    "Activation {}: Measure {start_measure:.3} to Measure {end_measure:.3} ({label})",
                    i + 1
                );
            }
        }
        summary
    }
}
