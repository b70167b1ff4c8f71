use groove_trainer::model::settings::Settings;
use groove_trainer::storage;

#[test]
fn roundtrip_settings_yaml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trainer.yaml");

    let mut s = Settings::default();
    s.bpm = 112;
    s.rhythm = "r4".into();
    s.samples_dir = "kits/acoustic".into();
    s.gains.metronome = 0.3;
    s.engine.scoring.match_window_ms = 150.0;
    s.engine.scheduler.tick_ms = 20;

    storage::settings::save(&s, &path).expect("save");
    let out = storage::settings::open(&path).expect("open");

    assert_eq!(out, s);
    assert_eq!(out.rhythm_pattern().label, "Kick/Snare alternate");
}

#[test]
fn open_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = storage::settings::open(dir.path().join("nope.yaml")).expect_err("missing");
    assert!(format!("{:#}", err).contains("reading"));
}

#[test]
fn open_reports_bad_yaml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "bpm: [fast\n").expect("write");
    let err = storage::settings::open(&path).expect_err("bad yaml");
    assert!(format!("{:#}", err).contains("parsing"));
}

#[test]
fn unknown_rhythm_in_file_falls_back_to_first_preset() {
    let s: Settings = serde_yaml::from_str("rhythm: r9\n").expect("parse");
    assert_eq!(s.rhythm_pattern().id, "r1");
}
