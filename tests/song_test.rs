use chartopt::chart::{FiveFretColour, Note, NoteTrack, Solo, StarPower, SyncTrack};
use chartopt::config::{DrumSettings, SqueezeSettings};
use chartopt::engine::Engine;
use chartopt::points::PointIdx;
use chartopt::song::{
    ActValidity, Activation, ActivationCandidate, Path, ProcessedSong,
};
use chartopt::sp::SpBar;
use chartopt::timing::{Beat, Measure, Position, Tick};

fn guitar_note(position: u32, length: u32) -> Note<FiveFretColour> {
    Note::new(Tick(position), Tick(length), FiveFretColour::Green)
}

fn phrase(position: u32, length: u32) -> StarPower {
    StarPower {
        position: Tick(position),
        length: Tick(length),
    }
}

fn ch_song(notes: Vec<Note<FiveFretColour>>, phrases: Vec<StarPower>) -> ProcessedSong {
    let track = NoteTrack::new(192, notes, phrases, vec![]).unwrap();
    ProcessedSong::new(
        &track,
        &SyncTrack::default(),
        &SqueezeSettings::default_settings(),
        &DrumSettings::default_settings(),
        Engine::CH_GUITAR,
        &[],
        &[],
    )
    .unwrap()
}

const NEG_INF_POSITION: Position = Position {
    beat: Beat::NEG_INFINITY,
    measure: Measure::NEG_INFINITY,
};

#[test]
fn one_phrase_grants_a_quarter_bar() {
    let song = ch_song(
        vec![guitar_note(0, 0), guitar_note(384, 0)],
        vec![phrase(0, 50)],
    );
    let bar = song.total_available_sp(
        Beat(0.0),
        PointIdx::new(0),
        PointIdx::new(1),
        Beat::NEG_INFINITY,
    );
    assert!((bar.min - 0.25).abs() < 1e-9);
    assert!((bar.max - 0.25).abs() < 1e-9);
}

#[test]
fn quarter_bar_cannot_activate() {
    let song = ch_song(vec![guitar_note(0, 0)], vec![phrase(0, 50)]);
    let candidate = ActivationCandidate {
        act_start: PointIdx::new(0),
        act_end: PointIdx::new(0),
        earliest_activation_point: Position::ZERO,
        sp_bar: SpBar::new(0.25, 0.25),
    };
    let result = song.is_candidate_valid(&candidate, 1.0, NEG_INF_POSITION);
    assert_eq!(result.validity, ActValidity::InsufficientSp);
}

#[test]
fn half_bar_activation_ends_sixteen_beats_later() {
    let song = ch_song(
        vec![guitar_note(0, 0), guitar_note(384, 0)],
        vec![phrase(0, 50), phrase(384, 50)],
    );
    let candidate = ActivationCandidate {
        act_start: PointIdx::new(1),
        act_end: PointIdx::new(1),
        earliest_activation_point: song.converter().position_at(Beat(2.0)),
        sp_bar: SpBar::new(0.5, 0.5),
    };
    let result = song.is_candidate_valid(&candidate, 1.0, NEG_INF_POSITION);

    assert_eq!(result.validity, ActValidity::Success);
    assert!(
        (result.ending_position.beat.value() - 18.0).abs() < 1e-9,
        "half a bar should last four measures, ended at beat {}",
        result.ending_position.beat.value()
    );
    assert!((result.ending_position.measure.value() - 4.5).abs() < 1e-9);
}

#[test]
#[should_panic(expected = "activation ends before it starts")]
fn backwards_candidate_is_a_caller_bug() {
    let song = ch_song(
        vec![guitar_note(0, 0), guitar_note(384, 0)],
        vec![phrase(0, 50)],
    );
    let candidate = ActivationCandidate {
        act_start: PointIdx::new(1),
        act_end: PointIdx::new(0),
        earliest_activation_point: Position::ZERO,
        sp_bar: SpBar::new(1.0, 1.0),
    };
    song.is_candidate_valid(&candidate, 1.0, NEG_INF_POSITION);
}

#[test]
fn sp_gathering_stops_at_the_half_bar() {
    let song = ch_song(
        vec![guitar_note(0, 0), guitar_note(192, 0), guitar_note(384, 0)],
        vec![phrase(0, 50), phrase(192, 50)],
    );
    let (bar, position) = song.total_available_sp_with_earliest_pos(
        Beat(0.0),
        PointIdx::new(0),
        PointIdx::new(2),
        Position::ZERO,
    );

    assert!((bar.min - 0.5).abs() < 1e-9);
    assert!((bar.max - 0.5).abs() < 1e-9);
    assert!(
        (position.beat.value() - 1.0).abs() < 1e-9,
        "the half bar is held once the second phrase is banked"
    );
}

#[test]
fn whammy_raises_only_the_best_case() {
    // A two-beat SP sustain, then a far-away activation note.
    let song = ch_song(
        vec![guitar_note(0, 384), guitar_note(1536, 0)],
        vec![phrase(0, 434)],
    );
    let points = song.points();
    let act_start = PointIdx::new(points.len() - 1);
    assert!(!points.point(act_start).is_hold_point);

    let bar = song.total_available_sp(Beat(0.0), PointIdx::new(0), act_start, Beat::NEG_INFINITY);
    assert!((bar.min - 0.25).abs() < 1e-9);
    assert!((bar.max - (0.25 + 2.0 / 30.0)).abs() < 1e-9);

    // Forcing whammy to the end of the sustain drags the minimum up too.
    let forced = song.total_available_sp(Beat(0.0), PointIdx::new(0), act_start, Beat(2.0));
    assert!((forced.min - forced.max).abs() < 1e-9);
}

#[test]
fn adjusted_windows_interpolate_in_seconds() {
    let song = ch_song(vec![guitar_note(384, 0)], vec![]);
    let point = PointIdx::new(0);

    let none = song.adjusted_hit_window_start(point, 0.0);
    assert!((none.beat.value() - 2.0).abs() < 1e-9);

    let full = song.adjusted_hit_window_start(point, 1.0);
    assert!((full.beat.value() - 1.86).abs() < 1e-9);

    let half = song.adjusted_hit_window_end(point, 0.5);
    assert!((half.beat.value() - 2.07).abs() < 1e-9);
}

#[test]
fn surplus_is_an_error_unless_the_engine_overlaps() {
    let notes = vec![guitar_note(0, 0), guitar_note(192, 0), guitar_note(3840, 0)];
    let candidate = |song: &ProcessedSong| ActivationCandidate {
        act_start: PointIdx::new(0),
        act_end: PointIdx::new(1),
        earliest_activation_point: song.converter().position_at(Beat(0.0)),
        sp_bar: SpBar::new(1.0, 1.0),
    };

    let ch = ch_song(notes.clone(), vec![]);
    let result = ch.is_candidate_valid(&candidate(&ch), 1.0, NEG_INF_POSITION);
    assert_eq!(result.validity, ActValidity::SurplusSp);

    let track = NoteTrack::new(192, notes, vec![], vec![]).unwrap();
    let rb = ProcessedSong::new(
        &track,
        &SyncTrack::default(),
        &SqueezeSettings::default_settings(),
        &DrumSettings::default_settings(),
        Engine::ROCK_BAND,
        &[],
        &[],
    )
    .unwrap();
    let result = rb.is_candidate_valid(&candidate(&rb), 1.0, NEG_INF_POSITION);
    assert_eq!(result.validity, ActValidity::Success);
    // The activation is pinned to the end of the final hit window.
    let late_limit = rb.adjusted_hit_window_end(PointIdx::new(1), 1.0);
    assert!((result.ending_position.beat - late_limit.beat).value().abs() < 1e-9);
}

#[test]
fn base_score_of_an_empty_track_is_the_solo_total() {
    let track = NoteTrack::<FiveFretColour>::new(
        192,
        vec![],
        vec![],
        vec![Solo { start: Tick(0), end: Tick(384), value: 300 }],
    )
    .unwrap();
    let song = ProcessedSong::new(
        &track,
        &SyncTrack::default(),
        &SqueezeSettings::default_settings(),
        &DrumSettings::default_settings(),
        Engine::CH_GUITAR,
        &[],
        &[],
    )
    .unwrap();

    assert_eq!(song.base_score(), 300);
    assert!(song.points().is_empty());
}

#[test]
fn path_summary_reports_counts_and_totals() {
    let song = ch_song(
        vec![
            guitar_note(0, 0),
            guitar_note(192, 0),
            guitar_note(384, 0),
            guitar_note(3224, 0),
            guitar_note(3456, 0),
        ],
        vec![phrase(0, 50), phrase(192, 50), phrase(3224, 50)],
    );
    let path = Path {
        activations: vec![Activation {
            act_start: PointIdx::new(2),
            act_end: PointIdx::new(2),
            whammy_end: Beat(1.86),
            sp_start: Beat(1.86),
            sp_end: Beat(17.0),
        }],
        score_boost: 50,
    };

    let summary = song.path_summary(&path);
    assert!(summary.contains("Path: 2\n"), "summary was:\n{summary}");
    assert!(summary.contains("No SP score: 250"));
    assert!(summary.contains("Total score: 300"));
    assert!(summary.contains("Activation 1: Measure"));
}
