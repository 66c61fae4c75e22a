//! Engine descriptors: the numeric parameters and behaviour flags that
//! distinguish the supported game engines. One constant per engine, looked
//! up by [`EngineKind`].

/// The game engine a chart is scored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    ChGuitar,
    Gh1Guitar,
    RockBand,
    Drums,
    Ghl,
}

/// How the total sustain tick count is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SustainRounding {
    RoundUp,
    RoundToNearest,
}

/// Hit window shape. Most engines use a fixed half-width; the early GH
/// engines scale the window with the gap to the neighbouring note.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TimingWindow {
    Constant(f64),
    GapScaled { floor: f64, ceiling: f64 },
}

impl TimingWindow {
    fn width(self, gap: f64) -> f64 {
        match self {
            Self::Constant(width) => width,
            Self::GapScaled { floor, ceiling } => (gap / 2.0).clamp(floor, ceiling),
        }
    }
}

/// Engine descriptor: scoring values, sustain behaviour, timing windows,
/// and the Star Power economy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    pub kind: EngineKind,
    pub base_note_value: u32,
    pub base_cymbal_value: u32,
    pub max_multiplier: u32,
    pub combo_per_multiplier_level: u32,
    /// Sustain scoring ticks per beat; zero disables sustain points.
    pub sust_points_per_beat: u32,
    /// Round the sustain tick gap to a whole number of chart ticks.
    pub round_tick_gap: bool,
    pub chords_multiply_sustains: bool,
    pub sustain_rounding: SustainRounding,
    /// Sustains no longer than this fraction of a beat collapse into a
    /// single burst point.
    pub burst_size: f64,
    /// Bars of Star Power gained per beat of whammied SP sustain.
    pub sp_gain_rate: f64,
    /// Bars of Star Power drained per measure during an activation.
    pub sp_drain_rate: f64,
    /// Bars granted by completing one SP phrase.
    pub sp_phrase_amount: f64,
    /// Extra bars granted on top of the phrase for a unison bonus.
    pub unison_bonus_amount: f64,
    pub has_unison_bonuses: bool,
    pub has_bres: bool,
    pub merge_uneven_sustains: bool,
    /// The multiplier steps up one note later than the combo threshold.
    pub delayed_multiplier: bool,
    /// Whether an activation may run past its final scored point, spending
    /// the leftover bar, instead of being rejected as surplus.
    pub overlaps: bool,
    pub ignore_average_multiplier: bool,
    timing_window: TimingWindow,
}

impl Engine {
    pub const CH_GUITAR: Self = Self {
        kind: EngineKind::ChGuitar,
        base_note_value: 50,
        base_cymbal_value: 50,
        max_multiplier: 4,
        combo_per_multiplier_level: 10,
        sust_points_per_beat: 25,
        round_tick_gap: true,
        chords_multiply_sustains: false,
        sustain_rounding: SustainRounding::RoundToNearest,
        burst_size: 0.0,
        sp_gain_rate: 1.0 / 30.0,
        sp_drain_rate: 1.0 / 8.0,
        sp_phrase_amount: 0.25,
        unison_bonus_amount: 0.0,
        has_unison_bonuses: false,
        has_bres: false,
        merge_uneven_sustains: false,
        delayed_multiplier: false,
        overlaps: false,
        ignore_average_multiplier: true,
        timing_window: TimingWindow::Constant(0.07),
    };

    pub const GH1_GUITAR: Self = Self {
        kind: EngineKind::Gh1Guitar,
        base_note_value: 50,
        base_cymbal_value: 50,
        max_multiplier: 4,
        combo_per_multiplier_level: 10,
        sust_points_per_beat: 25,
        round_tick_gap: true,
        chords_multiply_sustains: true,
        sustain_rounding: SustainRounding::RoundUp,
        burst_size: 0.0,
        sp_gain_rate: 1.0 / 30.0,
        sp_drain_rate: 1.0 / 8.0,
        sp_phrase_amount: 0.5,
        unison_bonus_amount: 0.0,
        has_unison_bonuses: false,
        has_bres: false,
        merge_uneven_sustains: false,
        delayed_multiplier: false,
        overlaps: false,
        ignore_average_multiplier: false,
        timing_window: TimingWindow::GapScaled { floor: 0.05, ceiling: 0.1 },
    };

    pub const ROCK_BAND: Self = Self {
        kind: EngineKind::RockBand,
        base_note_value: 25,
        base_cymbal_value: 25,
        max_multiplier: 4,
        combo_per_multiplier_level: 10,
        sust_points_per_beat: 12,
        round_tick_gap: false,
        chords_multiply_sustains: false,
        sustain_rounding: SustainRounding::RoundToNearest,
        burst_size: 0.25,
        sp_gain_rate: 0.034,
        sp_drain_rate: 1.0 / 8.0,
        sp_phrase_amount: 0.25,
        unison_bonus_amount: 0.25,
        has_unison_bonuses: true,
        has_bres: true,
        merge_uneven_sustains: true,
        delayed_multiplier: true,
        overlaps: true,
        ignore_average_multiplier: false,
        timing_window: TimingWindow::Constant(0.1),
    };

    pub const DRUMS: Self = Self {
        kind: EngineKind::Drums,
        base_note_value: 50,
        base_cymbal_value: 65,
        max_multiplier: 4,
        combo_per_multiplier_level: 10,
        sust_points_per_beat: 0,
        round_tick_gap: true,
        chords_multiply_sustains: false,
        sustain_rounding: SustainRounding::RoundToNearest,
        burst_size: 0.0,
        sp_gain_rate: 1.0 / 30.0,
        sp_drain_rate: 1.0 / 8.0,
        sp_phrase_amount: 0.25,
        unison_bonus_amount: 0.0,
        has_unison_bonuses: false,
        has_bres: false,
        merge_uneven_sustains: false,
        delayed_multiplier: false,
        overlaps: false,
        ignore_average_multiplier: true,
        timing_window: TimingWindow::Constant(0.07),
    };

    pub const GHL: Self = Self {
        kind: EngineKind::Ghl,
        base_note_value: 50,
        base_cymbal_value: 50,
        max_multiplier: 4,
        combo_per_multiplier_level: 10,
        sust_points_per_beat: 25,
        round_tick_gap: true,
        chords_multiply_sustains: false,
        sustain_rounding: SustainRounding::RoundToNearest,
        burst_size: 0.0,
        sp_gain_rate: 1.0 / 30.0,
        sp_drain_rate: 1.0 / 8.0,
        sp_phrase_amount: 0.25,
        unison_bonus_amount: 0.0,
        has_unison_bonuses: false,
        has_bres: false,
        merge_uneven_sustains: false,
        delayed_multiplier: false,
        overlaps: false,
        ignore_average_multiplier: true,
        timing_window: TimingWindow::Constant(0.07),
    };

    pub fn for_kind(kind: EngineKind) -> Self {
        match kind {
            EngineKind::ChGuitar => Self::CH_GUITAR,
            EngineKind::Gh1Guitar => Self::GH1_GUITAR,
            EngineKind::RockBand => Self::ROCK_BAND,
            EngineKind::Drums => Self::DRUMS,
            EngineKind::Ghl => Self::GHL,
        }
    }

    /// Early half-width of the hit window in seconds, given the seconds to
    /// the previous and next note.
    pub fn early_timing_window(&self, prev_gap: f64, _next_gap: f64) -> f64 {
        self.timing_window.width(prev_gap)
    }

    /// Late half-width of the hit window in seconds.
    pub fn late_timing_window(&self, _prev_gap: f64, next_gap: f64) -> f64 {
        self.timing_window.width(next_gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_windows_ignore_gaps() {
        let engine = Engine::CH_GUITAR;
        assert!((engine.early_timing_window(0.01, 5.0) - 0.07).abs() < 1e-9);
        assert!((engine.late_timing_window(f64::INFINITY, f64::INFINITY) - 0.07).abs() < 1e-9);
    }

    #[test]
    fn gap_scaled_windows_clamp() {
        let engine = Engine::GH1_GUITAR;
        assert!((engine.early_timing_window(0.04, 1.0) - 0.05).abs() < 1e-9);
        assert!((engine.early_timing_window(0.12, 1.0) - 0.06).abs() < 1e-9);
        assert!((engine.late_timing_window(1.0, f64::INFINITY) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn for_kind_selects_the_matching_constant() {
        assert_eq!(Engine::for_kind(EngineKind::RockBand), Engine::ROCK_BAND);
        assert_eq!(Engine::for_kind(EngineKind::Drums).base_cymbal_value, 65);
    }
}
