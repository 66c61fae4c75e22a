use std::fmt::Debug;

use crate::config::DrumSettings;
use crate::timing::Tick;

/// Lane colour behaviour the scoring layer needs from a track kind.
/// Five-fret and six-fret colours are plain frets; drum colours add
/// cymbals, dynamics, and kick gating.
pub trait NoteColour: Copy + Eq + Debug {
    const IS_DRUMS: bool = false;

    fn is_cymbal(self) -> bool {
        false
    }

    fn has_dynamics(self) -> bool {
        false
    }

    fn is_kick(self) -> bool {
        false
    }

    /// Whether the note is dropped entirely under the given drum settings.
    fn is_skipped(self, _settings: &DrumSettings) -> bool {
        false
    }

    /// Short human-readable name used in path summaries.
    fn label(self) -> String;
}

/// Five-fret guitar and bass lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiveFretColour {
    Green,
    Red,
    Yellow,
    Blue,
    Orange,
    Open,
}

impl NoteColour for FiveFretColour {
    fn label(self) -> String {
        match self {
            Self::Green => "G",
            Self::Red => "R",
            Self::Yellow => "Y",
            Self::Blue => "B",
            Self::Orange => "O",
            Self::Open => "open",
        }
        .to_owned()
    }
}

/// Guitar Hero Live lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SixFretColour {
    WhiteLow,
    WhiteMid,
    WhiteHigh,
    BlackLow,
    BlackMid,
    BlackHigh,
    Open,
}

impl NoteColour for SixFretColour {
    fn label(self) -> String {
        match self {
            Self::WhiteLow => "W1",
            Self::WhiteMid => "W2",
            Self::WhiteHigh => "W3",
            Self::BlackLow => "B1",
            Self::BlackMid => "B2",
            Self::BlackHigh => "B3",
            Self::Open => "open",
        }
        .to_owned()
    }
}

/// Drum pads, with the kick variants that drum settings can disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrumPad {
    Red,
    Yellow,
    Blue,
    Green,
    Kick,
    DoubleKick,
}

/// Accent and ghost markings on a drum note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrumDynamics {
    #[default]
    Plain,
    Accent,
    Ghost,
}

/// A drum lane: pad plus cymbal and dynamics markings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrumColour {
    pub pad: DrumPad,
    pub cymbal: bool,
    pub dynamics: DrumDynamics,
}

impl DrumColour {
    pub fn pad(pad: DrumPad) -> Self {
        Self {
            pad,
            cymbal: false,
            dynamics: DrumDynamics::Plain,
        }
    }

    pub fn cymbal(pad: DrumPad) -> Self {
        Self {
            pad,
            cymbal: true,
            dynamics: DrumDynamics::Plain,
        }
    }
}

impl NoteColour for DrumColour {
    const IS_DRUMS: bool = true;

    fn is_cymbal(self) -> bool {
        self.cymbal
    }

    fn has_dynamics(self) -> bool {
        self.dynamics != DrumDynamics::Plain
    }

    fn is_kick(self) -> bool {
        matches!(self.pad, DrumPad::Kick | DrumPad::DoubleKick)
    }

    fn is_skipped(self, settings: &DrumSettings) -> bool {
        match self.pad {
            DrumPad::Kick => settings.disable_kick,
            DrumPad::DoubleKick => !settings.enable_double_kick,
            _ => false,
        }
    }

    fn label(self) -> String {
        let pad = match self.pad {
            DrumPad::Red => "R",
            DrumPad::Yellow => "Y",
            DrumPad::Blue => "B",
            DrumPad::Green => "G",
            DrumPad::Kick | DrumPad::DoubleKick => "kick",
        };
        let mut label = pad.to_owned();
        match self.dynamics {
            DrumDynamics::Accent => label.push_str(" accent"),
            DrumDynamics::Ghost => label.push_str(" ghost"),
            DrumDynamics::Plain => {}
        }
        if self.cymbal {
            label.push_str(" cymbal");
        }
        label
    }
}

/// A single note: where it sits, how long its sustain is, and which lane
/// it occupies. Notes sharing a tick form a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note<C> {
    pub position: Tick,
    pub length: Tick,
    pub colour: C,
}

impl<C> Note<C> {
    pub fn new(position: Tick, length: Tick, colour: C) -> Self {
        Self {
            position,
            length,
            colour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kick_gating_follows_drum_settings() {
        let mut settings = DrumSettings::default_settings();
        let kick = DrumColour::pad(DrumPad::Kick);
        let double = DrumColour::pad(DrumPad::DoubleKick);

        assert!(!kick.is_skipped(&settings));
        assert!(!double.is_skipped(&settings));

        settings.disable_kick = true;
        settings.enable_double_kick = false;
        assert!(kick.is_skipped(&settings));
        assert!(double.is_skipped(&settings));
    }

    #[test]
    fn drum_labels_name_markings() {
        let colour = DrumColour {
            pad: DrumPad::Yellow,
            cymbal: true,
            dynamics: DrumDynamics::Ghost,
        };
        assert_eq!(colour.label(), "Y ghost cymbal");
        assert_eq!(FiveFretColour::Open.label(), "open");
    }
}
