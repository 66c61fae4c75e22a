use tracing::debug;

use crate::timing::Tick;

use super::{ChartError, Note, NoteColour};

/// A tick interval whose notes grant Star Power when fully hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarPower {
    pub position: Tick,
    pub length: Tick,
}

impl StarPower {
    /// Whether a tick lies inside the phrase. The end tick is exclusive.
    pub fn contains(&self, position: Tick) -> bool {
        position >= self.position
            && position.value() < self.position.value() + self.length.value()
    }

    pub fn end(&self) -> Tick {
        Tick(self.position.value() + self.length.value())
    }
}

/// A solo section worth a fixed bonus once completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solo {
    pub start: Tick,
    pub end: Tick,
    pub value: u32,
}

/// A drum fill, the gateway for drum Star Power activations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumFill {
    pub position: Tick,
    pub length: Tick,
}

impl DrumFill {
    pub fn end(&self) -> Tick {
        Tick(self.position.value() + self.length.value())
    }
}

/// A big rock ending: a scripted terminal scoring zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bre {
    pub start: Tick,
    pub end: Tick,
}

/// A note track for one instrument and difficulty.
///
/// Invariants upheld by the constructor:
/// - notes are sorted by position (stable, so chord order is preserved);
/// - Star Power phrases are sorted, non-overlapping, and each contains at
///   least one note (empty phrases are dropped);
/// - solos and drum fills are sorted by start.
#[derive(Debug, Clone)]
pub struct NoteTrack<C> {
    resolution: u32,
    notes: Vec<Note<C>>,
    sp_phrases: Vec<StarPower>,
    solos: Vec<Solo>,
    drum_fills: Vec<DrumFill>,
    bre: Option<Bre>,
}

impl<C: NoteColour> NoteTrack<C> {
    pub fn new(
        resolution: u32,
        mut notes: Vec<Note<C>>,
        mut sp_phrases: Vec<StarPower>,
        mut solos: Vec<Solo>,
    ) -> Result<Self, ChartError> {
        if resolution == 0 {
            return Err(ChartError::InvalidResolution);
        }

        notes.sort_by_key(|note| note.position);
        sp_phrases.sort_by_key(|phrase| phrase.position);
        solos.sort_by_key(|solo| solo.start);

        for pair in sp_phrases.windows(2) {
            if pair[1].position < pair[0].end() {
                return Err(ChartError::OverlappingPhrases);
            }
        }
        sp_phrases.retain(|phrase| {
            let has_note = notes.iter().any(|note| phrase.contains(note.position));
            if !has_note {
                debug!(
                    "dropping star power phrase at tick {} with no notes",
                    phrase.position.value()
                );
            }
            has_note
        });

        Ok(Self {
            resolution,
            notes,
            sp_phrases,
            solos,
            drum_fills: Vec::new(),
            bre: None,
        })
    }

    pub fn with_drum_fills(mut self, mut drum_fills: Vec<DrumFill>) -> Self {
        drum_fills.sort_by_key(|fill| fill.position);
        self.drum_fills = drum_fills;
        self
    }

    pub fn with_bre(mut self, bre: Bre) -> Self {
        self.bre = Some(bre);
        self
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn notes(&self) -> &[Note<C>] {
        &self.notes
    }

    pub fn sp_phrases(&self) -> &[StarPower] {
        &self.sp_phrases
    }

    pub fn solos(&self) -> &[Solo] {
        &self.solos
    }

    pub fn drum_fills(&self) -> &[DrumFill] {
        &self.drum_fills
    }

    pub fn bre(&self) -> Option<Bre> {
        self.bre
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::FiveFretColour;

    fn note(position: u32) -> Note<FiveFretColour> {
        Note::new(Tick(position), Tick(0), FiveFretColour::Green)
    }

    #[test]
    fn notes_are_sorted_by_position() {
        let track = NoteTrack::new(192, vec![note(384), note(0)], vec![], vec![]).unwrap();
        assert_eq!(track.notes()[0].position, Tick(0));
        assert_eq!(track.notes()[1].position, Tick(384));
    }

    #[test]
    fn phrases_without_notes_are_dropped() {
        let track = NoteTrack::new(
            192,
            vec![note(0)],
            vec![
                StarPower { position: Tick(0), length: Tick(50) },
                StarPower { position: Tick(800), length: Tick(50) },
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(track.sp_phrases().len(), 1);
        assert_eq!(track.sp_phrases()[0].position, Tick(0));
    }

    #[test]
    fn overlapping_phrases_are_rejected() {
        let result = NoteTrack::new(
            192,
            vec![note(0), note(40)],
            vec![
                StarPower { position: Tick(0), length: Tick(50) },
                StarPower { position: Tick(40), length: Tick(50) },
            ],
            vec![],
        );
        assert!(matches!(result, Err(ChartError::OverlappingPhrases)));
    }

    #[test]
    fn phrase_end_is_exclusive() {
        let phrase = StarPower { position: Tick(0), length: Tick(50) };
        assert!(phrase.contains(Tick(49)));
        assert!(!phrase.contains(Tick(50)));
    }
}
