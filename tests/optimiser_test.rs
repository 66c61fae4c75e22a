use chartopt::chart::{FiveFretColour, Note, NoteTrack, StarPower, SyncTrack};
use chartopt::config::{DrumSettings, SqueezeSettings};
use chartopt::engine::Engine;
use chartopt::optimiser::Optimiser;
use chartopt::points::PointIdx;
use chartopt::song::ProcessedSong;

fn guitar_note(position: u32) -> Note<FiveFretColour> {
    Note::new(chartopt::timing::Tick(position), chartopt::timing::Tick(0), FiveFretColour::Green)
}

fn phrase(position: u32) -> StarPower {
    StarPower {
        position: chartopt::timing::Tick(position),
        length: chartopt::timing::Tick(50),
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

#[test]
fn empty_track_yields_an_empty_path() {
    let song = ch_song(vec![], vec![]);
    let path = Optimiser::new(&song, 1.0).optimal_path();

    assert!(path.activations.is_empty());
    assert_eq!(path.score_boost, 0);
    assert_eq!(song.base_score(), 0);
}

#[test]
fn no_phrases_means_no_activations() {
    let song = ch_song((0..10).map(|i| guitar_note(i * 192)).collect(), vec![]);
    let path = Optimiser::new(&song, 1.0).optimal_path();

    assert!(path.activations.is_empty());
    assert_eq!(path.score_boost, 0);
}

#[test]
fn nearly_overlapped_phrases() {
    let song = ch_song(
        vec![
            guitar_note(0),
            guitar_note(192),
            guitar_note(384),
            guitar_note(3224),
            guitar_note(3456),
        ],
        vec![phrase(0), phrase(192), phrase(3224)],
    );
    let path = Optimiser::new(&song, 1.0).optimal_path();

    assert_eq!(path.score_boost, 50);
    assert_eq!(path.activations.len(), 1);
    let act = path.activations[0];
    assert_eq!(act.act_start, PointIdx::new(2));
    assert_eq!(act.act_end, PointIdx::new(2));

    // Activation begins at the squeezed front of the third note's window
    // and runs until the drained bar, started at the second phrase, dies.
    assert!((act.sp_start.value() - 1.86).abs() < 1e-6);
    assert!((act.sp_end.value() - 17.0).abs() < 1e-3);
    // No whammy exists, so none is mandatory.
    assert!((act.whammy_end.value() - act.sp_start.value()).abs() < 1e-6);
}

#[test]
fn distant_phrase_pairs_produce_two_activations() {
    let song = ch_song(
        vec![
            guitar_note(0),
            guitar_note(192),
            guitar_note(384),
            guitar_note(19200),
            guitar_note(19392),
            guitar_note(19584),
        ],
        vec![phrase(0), phrase(192), phrase(19200), phrase(19392)],
    );
    let path = Optimiser::new(&song, 1.0).optimal_path();

    assert_eq!(path.score_boost, 100);
    assert_eq!(path.activations.len(), 2);
    assert_eq!(path.activations[0].act_start, PointIdx::new(2));
    assert_eq!(path.activations[0].act_end, PointIdx::new(2));
    assert_eq!(path.activations[1].act_start, PointIdx::new(5));
    assert_eq!(path.activations[1].act_end, PointIdx::new(5));
}

#[test]
fn activations_never_overlap() {
    let song = ch_song(
        (0..40).map(|i| guitar_note(i * 384)).collect(),
        vec![phrase(0), phrase(384), phrase(3840), phrase(4224), phrase(9600), phrase(9984)],
    );
    let path = Optimiser::new(&song, 1.0).optimal_path();

    for pair in path.activations.windows(2) {
        let end = song.points().point(pair[0].act_end).position.beat;
        let start = song.points().point(pair[1].act_start).position.beat;
        assert!(
            end < start,
            "activations overlap: {} then {}",
            end.value(),
            start.value()
        );
        assert!(pair[0].sp_end <= pair[1].sp_start);
    }
}

#[test]
fn identical_inputs_give_identical_paths() {
    let build = || {
        ch_song(
            (0..30).map(|i| guitar_note(i * 256)).collect(),
            vec![phrase(0), phrase(256), phrase(512), phrase(5120), phrase(5376)],
        )
    };
    let song_a = build();
    let song_b = build();
    let path_a = Optimiser::new(&song_a, 1.0).optimal_path();
    let path_b = Optimiser::new(&song_b, 1.0).optimal_path();

    assert_eq!(path_a.score_boost, path_b.score_boost);
    assert_eq!(path_a.activations.len(), path_b.activations.len());
    for (a, b) in path_a.activations.iter().zip(&path_b.activations) {
        assert_eq!(a.act_start, b.act_start);
        assert_eq!(a.act_end, b.act_end);
        assert_eq!(a.sp_start.value().to_bits(), b.sp_start.value().to_bits());
        assert_eq!(a.sp_end.value().to_bits(), b.sp_end.value().to_bits());
    }
}

#[test]
fn optimal_path_prefers_higher_scoring_windows() {
    // Two phrases bank half a bar; the activation should cover the dense
    // cluster of notes rather than fire immediately.
    let mut notes = vec![guitar_note(0), guitar_note(192)];
    // A gap, then a tight cluster within one activation's reach.
    for i in 0..8 {
        notes.push(guitar_note(1920 + i * 96));
    }
    let song = ch_song(notes, vec![phrase(0), phrase(192)]);
    let path = Optimiser::new(&song, 1.0).optimal_path();

    assert_eq!(path.activations.len(), 1);
    let act = path.activations[0];
    assert_eq!(act.act_start, PointIdx::new(2), "start on the first cluster note");
    assert_eq!(act.act_end, PointIdx::new(9), "sweep the whole cluster");
    assert_eq!(
        song.points().range_score(act.act_start, song.points().next_non_hold_point(act.act_end.next())),
        path.score_boost
    );
    assert_eq!(path.score_boost, 7 * 50 + 100);
}
