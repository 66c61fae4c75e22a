use crate::chart::{NoteColour, NoteTrack};
use crate::config::SqueezeSettings;
use crate::engine::Engine;
use crate::timing::{Beat, Position, Second, TimeConverter};

use super::SpBar;

/// A beat interval during which the player can whammy a Star Power
/// sustain. Overlapping per-lane intervals are merged at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhammyRange {
    pub start: Beat,
    pub end: Beat,
}

/// Answers how Star Power evolves across an interval: whammy income from
/// SP sustains, and drain while an activation is running. Read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct SpData {
    converter: TimeConverter,
    whammy_ranges: Vec<WhammyRange>,
    /// Beats of the measure-map breakpoints, so drain stays piecewise
    /// linear inside every walked segment.
    measure_break_beats: Vec<Beat>,
    gain_rate: f64,
    drain_rate: f64,
}

impl SpData {
    pub fn new<C: NoteColour>(
        track: &NoteTrack<C>,
        converter: TimeConverter,
        squeeze_settings: &SqueezeSettings,
        engine: &Engine,
    ) -> Self {
        let early_whammy_window = Second(
            engine.early_timing_window(f64::INFINITY, f64::INFINITY)
                * squeeze_settings.early_whammy,
        );

        let mut ranges = Vec::new();
        for note in track.notes() {
            if note.length.value() == 0 {
                continue;
            }
            let in_phrase = track
                .sp_phrases()
                .iter()
                .any(|phrase| phrase.contains(note.position));
            if !in_phrase {
                continue;
            }
            let start_beat = note.position.to_beat(track.resolution());
            let end_beat = Beat(
                f64::from(note.position.value() + note.length.value())
                    / f64::from(track.resolution()),
            );
            let start_seconds = converter.beats_to_seconds(start_beat) - early_whammy_window
                + squeeze_settings.whammy_delay;
            let end_seconds =
                converter.beats_to_seconds(end_beat) - squeeze_settings.lazy_whammy;
            if end_seconds <= start_seconds {
                continue;
            }
            ranges.push(WhammyRange {
                start: converter.seconds_to_beats(start_seconds),
                end: converter.seconds_to_beats(end_seconds),
            });
        }
        ranges.sort_by(|a, b| a.start.partial_cmp(&b.start).expect("beats are finite"));
        let whammy_ranges = merge_ranges(ranges);

        let measure_break_beats = converter
            .tempo_map()
            .measure_timestamps()
            .iter()
            .map(|ts| ts.beat)
            .collect();

        Self {
            converter,
            whammy_ranges,
            measure_break_beats,
            gain_rate: engine.sp_gain_rate,
            drain_rate: engine.sp_drain_rate,
        }
    }

    pub fn whammy_ranges(&self) -> &[WhammyRange] {
        &self.whammy_ranges
    }

    pub fn is_in_whammy_ranges(&self, beat: Beat) -> bool {
        self.whammy_ranges
            .iter()
            .any(|range| beat >= range.start && beat < range.end)
    }

    /// Bars of Star Power obtainable by whammying between two beats.
    pub fn available_whammy(&self, start: Beat, end: Beat) -> f64 {
        if end <= start {
            return 0.0;
        }
        let mut beats = 0.0;
        for range in &self.whammy_ranges {
            let lo = range.start.max(start);
            let hi = range.end.min(end);
            if hi > lo {
                beats += (hi - lo).value();
            }
        }
        beats * self.gain_rate
    }

    /// The earliest beat no later than `limit` at which whammy starting at
    /// `start` has produced `amount` bars, if it ever does.
    pub fn beat_where_whammy_reaches(
        &self,
        start: Beat,
        amount: f64,
        limit: Beat,
    ) -> Option<Beat> {
        if amount <= 0.0 {
            return Some(start);
        }
        let mut remaining = amount / self.gain_rate;
        for range in &self.whammy_ranges {
            let lo = range.start.max(start);
            let hi = range.end.min(limit);
            if hi <= lo {
                continue;
            }
            let len = (hi - lo).value();
            if len >= remaining {
                return Some(Beat(lo.value() + remaining));
            }
            remaining -= len;
        }
        None
    }

    /// Integrate drain and whammy across `[start, end]`. The best case
    /// whammies every available sustain; the worst case whammies only up
    /// to `required_whammy_end`. A bar that empties along the way stays
    /// empty. The result is clamped to one bar.
    pub fn propagate(
        &self,
        bar: SpBar,
        start: Position,
        end: Position,
        required_whammy_end: Beat,
    ) -> SpBar {
        let max = self.walk_between(start.beat, end.beat, bar.max, Beat::INFINITY);
        let min = self.walk_between(start.beat, end.beat, bar.min, required_whammy_end);
        SpBar::new(min, max)
    }

    /// The earliest position at which a bar of the given size, activated at
    /// `start`, reaches exactly zero. Whammy counts only up to
    /// `whammy_limit`.
    pub fn activation_end_point(
        &self,
        start: Position,
        bar: f64,
        whammy_limit: Beat,
    ) -> Position {
        if bar <= 0.0 {
            return start;
        }
        let mut current = start.beat;
        let mut remaining = bar;
        for boundary in self.boundaries_after(start.beat, whammy_limit) {
            let (next_bar, crossing) =
                self.walk_segment(current, boundary, remaining, whammy_limit);
            if let Some(beat) = crossing {
                return self.position_at(beat);
            }
            remaining = next_bar;
            current = boundary;
        }

        // Past the final breakpoint drain is uniform and no whammy remains.
        let drain_per_beat =
            self.drain_rate / self.converter.tempo_map().last_beats_per_measure();
        let beat = Beat(current.value() + remaining / drain_per_beat);
        self.position_at(beat)
    }

    fn position_at(&self, beat: Beat) -> Position {
        Position::new(beat, self.converter.beats_to_measures(beat))
    }

    /// Walk the bar from `start` to `end`, returning the amount left.
    /// Depletion is absorbing: once the bar empties it stays empty.
    fn walk_between(&self, start: Beat, end: Beat, bar: f64, whammy_limit: Beat) -> f64 {
        if end <= start {
            return bar;
        }
        let mut current = start;
        let mut remaining = bar;
        for boundary in self.boundaries_between(start, end, whammy_limit) {
            let (next_bar, crossing) =
                self.walk_segment(current, boundary, remaining, whammy_limit);
            if crossing.is_some() {
                return 0.0;
            }
            remaining = next_bar;
            current = boundary;
        }
        remaining
    }

    /// Boundaries splitting `(start, end]` so that whammy activity and the
    /// measure slope are constant within each segment.
    fn boundaries_between(&self, start: Beat, end: Beat, whammy_limit: Beat) -> Vec<Beat> {
        let mut boundaries = Vec::new();
        let mut push = |beat: Beat| {
            if beat > start && beat < end {
                boundaries.push(beat);
            }
        };
        for range in &self.whammy_ranges {
            push(range.start);
            push(range.end);
        }
        for &beat in &self.measure_break_beats {
            push(beat);
        }
        if whammy_limit.value().is_finite() {
            push(whammy_limit);
        }
        boundaries.push(end);
        boundaries.sort_by(|a, b| a.partial_cmp(b).expect("beats are finite"));
        boundaries.dedup();
        boundaries
    }

    /// Boundaries after `start` in ascending order, for open-ended walks.
    fn boundaries_after(&self, start: Beat, whammy_limit: Beat) -> Vec<Beat> {
        let mut boundaries = Vec::new();
        let mut push = |beat: Beat| {
            if beat > start {
                boundaries.push(beat);
            }
        };
        for range in &self.whammy_ranges {
            push(range.start);
            push(range.end);
        }
        for &beat in &self.measure_break_beats {
            push(beat);
        }
        if whammy_limit.value().is_finite() {
            push(whammy_limit);
        }
        boundaries.sort_by(|a, b| a.partial_cmp(b).expect("beats are finite"));
        boundaries.dedup();
        boundaries
    }

    /// Advance the bar across one segment with uniform gain and drain.
    /// Returns the bar at the segment end, or the crossing beat if the bar
    /// empties inside the segment.
    fn walk_segment(
        &self,
        from: Beat,
        to: Beat,
        bar: f64,
        whammy_limit: Beat,
    ) -> (f64, Option<Beat>) {
        let length = (to - from).value();
        if length <= 0.0 {
            return (bar, None);
        }
        let midpoint = Beat(from.value() + length / 2.0);
        let active = midpoint < whammy_limit && self.is_in_whammy_ranges(midpoint);
        let gain_per_beat = if active { self.gain_rate } else { 0.0 };
        let measures = (self.converter.beats_to_measures(to)
            - self.converter.beats_to_measures(from))
        .value();
        let drain_per_beat = self.drain_rate * measures / length;
        let rate = gain_per_beat - drain_per_beat;

        let end_bar = bar + rate * length;
        if end_bar < 0.0 {
            let crossing = Beat(from.value() + bar / -rate);
            return (0.0, Some(crossing));
        }
        (end_bar.min(1.0), None)
    }
}

fn merge_ranges(sorted: Vec<WhammyRange>) -> Vec<WhammyRange> {
    let mut merged: Vec<WhammyRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}
