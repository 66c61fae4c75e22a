use crate::chart::{Note, NoteColour, NoteTrack, StarPower};
use crate::config::{DrumSettings, SqueezeSettings};
use crate::engine::{Engine, SustainRounding};
use crate::timing::{Beat, Position, Second, Tick, TimeConverter};

use super::{Point, PointIdx};

/// The scoring ledger of a track: every hit point and sustain tick in beat
/// order, annotated with timing windows and Star Power flags, plus the
/// index arrays the optimiser leans on. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PointSet {
    points: Vec<Point>,
    next_non_hold: Vec<usize>,
    next_sp_granting: Vec<usize>,
    first_after_current_sp: Vec<usize>,
    cumulative_score: Vec<u32>,
    labels: Vec<String>,
    solo_boosts: Vec<(Position, u32)>,
    total_base_value: u32,
}

/// A point under construction, with the bookkeeping the finished set no
/// longer needs.
struct RawPoint {
    point: Point,
    source_tick: f64,
    has_non_kick: bool,
    label: String,
}

impl PointSet {
    pub fn new<C: NoteColour>(
        track: &NoteTrack<C>,
        converter: &TimeConverter,
        unison_phrases: &[Tick],
        squeeze_settings: &SqueezeSettings,
        drum_settings: &DrumSettings,
        engine: &Engine,
    ) -> Self {
        let mut raw = points_from_track(
            track,
            converter,
            unison_phrases,
            squeeze_settings,
            drum_settings,
            engine,
        );

        raw.sort_by(|a, b| {
            a.point
                .position
                .beat
                .partial_cmp(&b.point.position.beat)
                .expect("point beats are finite")
        });

        apply_multiplier(&mut raw, engine);
        if C::IS_DRUMS {
            attach_drum_fills(&mut raw, track, converter);
        }
        shift_by_video_lag(&mut raw, converter, squeeze_settings.video_lag);

        let next_non_hold = next_matching(&raw, |p| !p.is_hold_point);
        let next_sp_granting = next_matching(&raw, |p| p.is_sp_granting_note);
        let first_after_current_sp = first_after_phrase(&raw, track.sp_phrases());

        let mut cumulative_score = Vec::with_capacity(raw.len() + 1);
        cumulative_score.push(0);
        let mut sum = 0u32;
        for rp in &raw {
            sum += rp.point.value;
            cumulative_score.push(sum);
        }
        let total_base_value = raw.iter().map(|rp| rp.point.base_value).sum();

        let solo_boosts = track
            .solos()
            .iter()
            .map(|solo| {
                let beat = solo.end.to_beat(track.resolution());
                (converter.position_at(beat), solo.value)
            })
            .collect();

        let mut points = Vec::with_capacity(raw.len());
        let mut labels = Vec::with_capacity(raw.len());
        for rp in raw {
            points.push(rp.point);
            labels.push(rp.label);
        }

        Self {
            points,
            next_non_hold,
            next_sp_granting,
            first_after_current_sp,
            cumulative_score,
            labels,
            solo_boosts,
            total_base_value,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> PointIdx {
        PointIdx(0)
    }

    /// One-past-the-end sentinel.
    pub fn end(&self) -> PointIdx {
        PointIdx(self.points.len())
    }

    pub fn point(&self, idx: PointIdx) -> &Point {
        &self.points[idx.0]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn indices(&self) -> impl Iterator<Item = PointIdx> {
        (0..self.points.len()).map(PointIdx)
    }

    /// The chord label of a head point; empty for hold points.
    pub fn colour_label(&self, idx: PointIdx) -> &str {
        &self.labels[idx.0]
    }

    /// The least index `j >= idx` whose point is not a hold point.
    pub fn next_non_hold_point(&self, idx: PointIdx) -> PointIdx {
        if idx.0 >= self.points.len() {
            return self.end();
        }
        PointIdx(self.next_non_hold[idx.0])
    }

    /// The least index `j >= idx` whose point grants Star Power.
    pub fn next_sp_granting_note(&self, idx: PointIdx) -> PointIdx {
        if idx.0 >= self.points.len() {
            return self.end();
        }
        PointIdx(self.next_sp_granting[idx.0])
    }

    /// The first point past the end of the phrase containing `idx`, or the
    /// next point when `idx` sits in no phrase.
    pub fn first_after_current_phrase(&self, idx: PointIdx) -> PointIdx {
        if idx.0 >= self.points.len() {
            return self.end();
        }
        PointIdx(self.first_after_current_sp[idx.0])
    }

    /// Sum of point values in `[start, end)`.
    pub fn range_score(&self, start: PointIdx, end: PointIdx) -> u32 {
        self.cumulative_score[end.0] - self.cumulative_score[start.0]
    }

    pub fn total_value(&self) -> u32 {
        *self.cumulative_score.last().expect("prefix sums are never empty")
    }

    pub fn total_base_value(&self) -> u32 {
        self.total_base_value
    }

    pub fn solo_boosts(&self) -> &[(Position, u32)] {
        &self.solo_boosts
    }
}

fn points_from_track<C: NoteColour>(
    track: &NoteTrack<C>,
    converter: &TimeConverter,
    unison_phrases: &[Tick],
    squeeze_settings: &SqueezeSettings,
    drum_settings: &DrumSettings,
    engine: &Engine,
) -> Vec<RawPoint> {
    let resolution = track.resolution();
    let notes: Vec<&Note<C>> = track
        .notes()
        .iter()
        .filter(|note| !note.colour.is_skipped(drum_settings))
        .collect();
    let bre_cutoff = track.bre().filter(|_| engine.has_bres).map(|bre| bre.start);
    let phrases = track.sp_phrases();

    let mut raw = Vec::new();
    let mut current_phrase = 0usize;
    let mut idx = 0usize;
    while idx < notes.len() {
        let position = notes[idx].position;
        if bre_cutoff.is_some_and(|cutoff| position >= cutoff) {
            break;
        }
        let mut group_end = idx;
        while group_end < notes.len() && notes[group_end].position == position {
            group_end += 1;
        }

        while current_phrase < phrases.len() && phrases[current_phrase].end() <= position {
            current_phrase += 1;
        }
        let mut is_sp_ender = false;
        let mut is_unison_ender = false;
        if current_phrase < phrases.len()
            && phrases[current_phrase].contains(position)
            && (group_end == notes.len()
                || !phrases[current_phrase].contains(notes[group_end].position))
        {
            is_sp_ender = true;
            is_unison_ender = engine.has_unison_bonuses
                && unison_phrases.contains(&phrases[current_phrase].position);
            current_phrase += 1;
        }

        append_note_points(
            &notes[idx..group_end],
            idx.checked_sub(1).map(|i| notes[i].position),
            notes.get(group_end).map(|note| note.position),
            &mut raw,
            resolution,
            is_sp_ender,
            is_unison_ender,
            converter,
            squeeze_settings.squeeze,
            engine,
            drum_settings,
        );
        idx = group_end;
    }

    raw
}

#[allow(clippy::too_many_arguments)]
fn append_note_points<C: NoteColour>(
    group: &[&Note<C>],
    prev_position: Option<Tick>,
    next_position: Option<Tick>,
    raw: &mut Vec<RawPoint>,
    resolution: u32,
    is_sp_ender: bool,
    is_unison_ender: bool,
    converter: &TimeConverter,
    squeeze: f64,
    engine: &Engine,
    drum_settings: &DrumSettings,
) {
    let mut note_value = engine.base_note_value;
    if drum_settings.pro_drums && group.iter().any(|note| note.colour.is_cymbal()) {
        note_value = engine.base_cymbal_value;
    }
    if drum_settings.enable_dynamics && group.iter().any(|note| note.colour.has_dynamics()) {
        note_value *= 2;
    }

    let chord_size = group.len() as u32;
    let position = group[0].position;
    let beat = position.to_beat(resolution);
    let note_seconds = converter.beats_to_seconds(beat);

    let early_gap = prev_position.map_or(f64::INFINITY, |prev| {
        (note_seconds - converter.beats_to_seconds(prev.to_beat(resolution))).value()
    });
    let late_gap = next_position.map_or(f64::INFINITY, |next| {
        (converter.beats_to_seconds(next.to_beat(resolution)) - note_seconds).value()
    });

    let early_window = Second(engine.early_timing_window(early_gap, late_gap) * squeeze);
    let late_window = Second(engine.late_timing_window(early_gap, late_gap) * squeeze);
    let early_beat = converter.seconds_to_beats(note_seconds - early_window);
    let late_beat = converter.seconds_to_beats(note_seconds + late_window);

    let mut label = String::new();
    for note in group {
        if !label.is_empty() && C::IS_DRUMS {
            label.push(' ');
        }
        label.push_str(&note.colour.label());
    }

    raw.push(RawPoint {
        point: Point {
            position: converter.position_at(beat),
            hit_window_start: converter.position_at(early_beat),
            hit_window_end: converter.position_at(late_beat),
            fill_start: None,
            value: note_value * chord_size,
            base_value: note_value * chord_size,
            is_hold_point: false,
            is_sp_granting_note: is_sp_ender,
            is_unison_sp_ender: is_unison_ender,
        },
        source_tick: f64::from(position.value()),
        has_non_kick: group.iter().any(|note| !note.colour.is_kick()),
        label,
    });

    if engine.sust_points_per_beat == 0 {
        return;
    }
    let min_length = group.iter().map(|note| note.length).min().expect("non-empty chord");
    let max_length = group.iter().map(|note| note.length).max().expect("non-empty chord");
    if min_length == max_length || engine.merge_uneven_sustains {
        append_sustain_points(raw, position, min_length, resolution, chord_size, converter, engine);
    } else {
        for note in group {
            append_sustain_points(raw, position, note.length, resolution, chord_size, converter, engine);
        }
    }
}

fn append_sustain_points(
    raw: &mut Vec<RawPoint>,
    position: Tick,
    sust_length: Tick,
    resolution: u32,
    chord_size: u32,
    converter: &TimeConverter,
    engine: &Engine,
) {
    const HALF_TICK_OFFSET: f64 = 0.5;

    let float_res = f64::from(resolution);
    let mut float_pos = f64::from(position.value());
    let mut float_len = f64::from(sust_length.value());

    let mut tick_gap = float_res / f64::from(engine.sust_points_per_beat);
    if engine.round_tick_gap {
        tick_gap = tick_gap.round();
    }
    tick_gap = tick_gap.max(1.0);

    let float_ticks = float_len / tick_gap;
    let mut sust_ticks = match engine.sustain_rounding {
        SustainRounding::RoundUp => float_ticks.ceil(),
        SustainRounding::RoundToNearest => float_ticks.round(),
    } as u32;
    if engine.chords_multiply_sustains {
        tick_gap /= f64::from(chord_size);
        sust_ticks *= chord_size;
    }

    while float_len > engine.burst_size * float_res && sust_ticks > 0 {
        float_pos += tick_gap;
        float_len -= tick_gap;
        let beat = Beat((float_pos - HALF_TICK_OFFSET) / float_res);
        raw.push(hold_point(beat, 1, float_pos, converter));
        sust_ticks -= 1;
    }
    if sust_ticks > 0 {
        let beat = Beat((float_pos + HALF_TICK_OFFSET) / float_res);
        raw.push(hold_point(beat, sust_ticks, float_pos, converter));
    }
}

fn hold_point(beat: Beat, value: u32, source_tick: f64, converter: &TimeConverter) -> RawPoint {
    let position = converter.position_at(beat);
    RawPoint {
        point: Point {
            position,
            hit_window_start: position,
            hit_window_end: position,
            fill_start: None,
            value,
            base_value: value,
            is_hold_point: true,
            is_sp_granting_note: false,
            is_unison_sp_ender: false,
        },
        source_tick,
        has_non_kick: true,
        label: String::new(),
    }
}

fn apply_multiplier(raw: &mut [RawPoint], engine: &Engine) {
    let mut combo = 0u32;
    for rp in raw {
        if !rp.point.is_hold_point {
            combo += 1;
        }
        let mut multiplier =
            (combo / engine.combo_per_multiplier_level + 1).min(engine.max_multiplier);
        if !rp.point.is_hold_point && engine.delayed_multiplier {
            multiplier = (combo.saturating_sub(1) / engine.combo_per_multiplier_level + 1)
                .min(engine.max_multiplier);
        }
        rp.point.value *= multiplier;
    }
}

/// Attach the start of each drum fill to the closest non-kick point to the
/// fill's end; on an exact tie the later point wins.
fn attach_drum_fills<C: NoteColour>(
    raw: &mut [RawPoint],
    track: &NoteTrack<C>,
    converter: &TimeConverter,
) {
    if raw.is_empty() {
        return;
    }
    for fill in track.drum_fills() {
        let fill_start = fill.position.to_beat(track.resolution());
        let fill_end = fill.end().to_beat(track.resolution());

        let mut nearest = 0usize;
        let mut best_gap = (raw[0].point.position.beat - fill_end).value().abs();
        for (i, rp) in raw.iter().enumerate().skip(1) {
            if rp.point.position.beat <= raw[nearest].point.position.beat {
                continue;
            }
            let gap = (rp.point.position.beat - fill_end).value().abs();
            if gap > best_gap {
                break;
            }
            nearest = i;
            best_gap = gap;
        }

        if raw[nearest].has_non_kick {
            raw[nearest].point.fill_start = Some(converter.beats_to_seconds(fill_start));
        }
    }
}

fn shift_by_video_lag(raw: &mut [RawPoint], converter: &TimeConverter, video_lag: Second) {
    if video_lag.value() == 0.0 {
        return;
    }
    let shift = |position: &mut Position| {
        let seconds = converter.beats_to_seconds(position.beat) + video_lag;
        position.beat = converter.seconds_to_beats(seconds);
        position.measure = converter.beats_to_measures(position.beat);
    };
    for rp in raw {
        if rp.point.is_hold_point {
            continue;
        }
        shift(&mut rp.point.position);
        shift(&mut rp.point.hit_window_start);
        shift(&mut rp.point.hit_window_end);
    }
}

/// For each index, the least `j >= i` whose point matches; the length of
/// the set where none does.
fn next_matching(raw: &[RawPoint], predicate: impl Fn(&Point) -> bool) -> Vec<usize> {
    let mut result = vec![raw.len(); raw.len()];
    let mut next = raw.len();
    for i in (0..raw.len()).rev() {
        if predicate(&raw[i].point) {
            next = i;
        }
        result[i] = next;
    }
    result
}

fn first_after_phrase(raw: &[RawPoint], phrases: &[StarPower]) -> Vec<usize> {
    let mut result = Vec::with_capacity(raw.len());
    for (i, rp) in raw.iter().enumerate() {
        let phrase = phrases
            .iter()
            .find(|phrase| {
                rp.source_tick >= f64::from(phrase.position.value())
                    && rp.source_tick < f64::from(phrase.end().value())
            });
        let index = match phrase {
            Some(phrase) => raw
                .partition_point(|other| other.source_tick < f64::from(phrase.end().value())),
            None => i + 1,
        };
        result.push(index.min(raw.len()));
    }
    result
}
