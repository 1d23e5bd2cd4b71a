/// Playthrough integration tests: sessions over the demo adventure.

use adventure_engine::core::interpreter::{PlayState, EMPTY_INVENTORY_LABEL};
use adventure_engine::core::playtest::Playtester;
use adventure_engine::core::progress::{FileProgressStore, ObservedStore, ProgressEvent, ProgressStore};
use adventure_engine::core::session::{PlaySession, SessionConfig};
use adventure_engine::schema::adventure::Adventure;
use adventure_engine::schema::item::ItemId;
use adventure_engine::schema::passage::PassageId;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

fn lighthouse() -> Adventure {
    adventure_engine::core::format::load_from_file(Path::new("adventures/lighthouse.ron")).unwrap()
}

#[test]
fn full_playthrough_to_victory() {
    let adv = lighthouse();
    let dir = tempfile::tempdir().unwrap();
    let store = FileProgressStore::open(dir.path()).unwrap();
    let mut session = PlaySession::open(&adv, "lighthouse", store, SessionConfig::default()).unwrap();

    assert_eq!(session.state(), &PlayState::Introduction);
    assert_eq!(session.inventory_summary(), EMPTY_INVENTORY_LABEL);

    session.start().unwrap();
    session.choose(1).unwrap(); // shed
    assert_eq!(session.inventory_summary(), "Flask of lamp oil");
    session.choose(0).unwrap(); // back to the lighthouse
    session.choose(0).unwrap(); // keeper's room
    assert_eq!(
        session.inventory_summary(),
        "Box of matches, Flask of lamp oil, Iron key"
    );
    session.choose(0).unwrap(); // stairs
    let snapshot = session.choose(0).unwrap().clone();

    assert_eq!(
        snapshot.state,
        PlayState::Ended {
            passage: PassageId(5),
            ending_type: "victory".to_string()
        }
    );
    assert_eq!(snapshot.inventory.sorted_ids(), vec![ItemId::from("matches")]);
    assert!(session.warnings().is_empty());
}

#[test]
fn progress_survives_a_new_session() {
    let adv = lighthouse();
    let dir = tempfile::tempdir().unwrap();

    {
        let store = FileProgressStore::open(dir.path()).unwrap();
        let mut session =
            PlaySession::open(&adv, "lighthouse", store, SessionConfig::default()).unwrap();
        session.start().unwrap();
        session.choose(0).unwrap();
    }

    let store = FileProgressStore::open(dir.path()).unwrap();
    let mut session = PlaySession::open(&adv, "lighthouse", store, SessionConfig::default()).unwrap();
    assert_eq!(session.state(), &PlayState::InPassage(PassageId(2)));
    assert!(session.snapshot().inventory.contains(&ItemId::from("key")));

    session.restart().unwrap();
    assert_eq!(session.state(), &PlayState::InPassage(PassageId(1)));
    let saved = session.store().load("lighthouse").unwrap().unwrap();
    assert!(saved.inventory.is_empty());
}

#[test]
fn observers_follow_inventory_changes() {
    let adv = lighthouse();
    let counts = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&counts);

    let dir = tempfile::tempdir().unwrap();
    let mut store = ObservedStore::new(FileProgressStore::open(dir.path()).unwrap());
    store.subscribe(move |event| {
        if let ProgressEvent::Saved(progress) = event {
            sink.borrow_mut().push(progress.inventory.len());
        }
    });

    let mut session = PlaySession::open(&adv, "lighthouse", store, SessionConfig::default()).unwrap();
    session.start().unwrap();
    session.choose(0).unwrap();
    session.choose(1).unwrap();
    session.choose(1).unwrap();

    assert_eq!(*counts.borrow(), vec![0, 2, 2, 3]);
}

#[test]
fn random_walks_reach_both_endings() {
    let adv = lighthouse();
    let report = Playtester {
        runs: 300,
        seed: 3,
        max_steps: 200,
    }
    .run(&adv)
    .unwrap();

    assert_eq!(report.unfinished, 0);
    assert!(report.endings.contains_key("victory"));
    assert!(report.endings.contains_key("defeat"));
    assert!(report.items_never_held.is_empty());
    assert!(report.never_visited(&adv).is_empty());
}
