mod error;
mod note;
mod sync;
mod track;

pub use error::ChartError;
pub use note::{
    DrumColour, DrumDynamics, DrumPad, FiveFretColour, Note, NoteColour, SixFretColour,
};
pub use sync::{BpmChange, SyncTrack, TimeSignature, DEFAULT_BPM, DEFAULT_RESOLUTION};
pub use track::{Bre, DrumFill, NoteTrack, Solo, StarPower};
