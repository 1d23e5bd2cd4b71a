/// Loading and validation integration tests.

use adventure_engine::core::format::{self, FormatError};
use adventure_engine::core::validator::{validate, Category, Severity, Subject};
use adventure_engine::schema::item::ItemId;
use adventure_engine::schema::passage::PassageId;
use std::path::Path;

#[test]
fn demo_adventure_loads_and_validates() {
    let adv = format::load_from_file(Path::new("adventures/lighthouse.ron")).unwrap();
    assert_eq!(adv.title(), "The Keeper's Lamp");
    assert_eq!(adv.items.len(), 3);
    assert_eq!(adv.passages.len(), 6);

    let report = validate(&adv);
    assert!(report.violations.is_empty(), "{}", report);

    let endings: Vec<_> = adv.endings().into_iter().map(|(_, e)| e).collect();
    assert_eq!(endings, vec![Some("victory"), Some("defeat")]);
}

#[test]
fn broken_adventure_reports_every_problem() {
    let adv = format::load_from_file(Path::new("tests/fixtures/broken.ron")).unwrap();
    let report = validate(&adv);
    assert!(!report.is_playable());

    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 5, "{}", report);

    // Pipeline order: uniqueness, references, endings, effects, text.
    assert_eq!(errors[0].subject, Subject::Item(ItemId::from("lamp")));
    assert_eq!(
        errors[1].subject,
        Subject::Choice {
            passage: PassageId(1),
            index: 1
        }
    );
    assert!(errors[1].message.contains("99"));
    assert_eq!(errors[2].subject, Subject::Passage(PassageId(2)));
    assert_eq!(errors[3].category, Category::EffectConflict);
    assert!(errors[3]
        .message
        .contains("added and removed in the same passage"));
    assert_eq!(errors[4].subject, Subject::Title);

    let warnings: Vec<_> = report.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, Category::Unreachable);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(warnings[0].subject, Subject::Passage(PassageId(3)));
}

#[test]
fn string_goto_is_rejected_before_validation() {
    let err = format::load_from_file(Path::new("tests/fixtures/bad_goto.ron")).unwrap_err();
    assert!(matches!(err, FormatError::Schema(_)), "{err}");
}

#[test]
fn demo_adventure_survives_both_formats() {
    let adv = format::load_from_file(Path::new("adventures/lighthouse.ron")).unwrap();
    for fmt in [format::Format::Ron, format::Format::Json] {
        let text = format::serialize_as(&adv, fmt).unwrap();
        let back = format::parse_as(&text, fmt).unwrap();
        assert_eq!(back, adv);
        assert!(validate(&back).violations.is_empty());
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = format::load_from_file(Path::new("tests/fixtures/nope.ron")).unwrap_err();
    assert!(matches!(err, FormatError::Io(_)));
}
