mod converter;
mod position;
mod tempo_map;

pub use converter::TimeConverter;
pub use position::{Beat, Measure, Position, Second, Tick};
pub use tempo_map::{BeatTimestamp, MeasureTimestamp, TempoMap};
