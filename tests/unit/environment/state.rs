use super::*;

#[test]
fn isolated_environments_do_not_share_state() {
    let a = Environment::isolated();
    let b = Environment::isolated();
    a.set_display_mode(DisplayMode::Interactive);
    assert_eq!(b.display_mode(), DisplayMode::Batch);
    assert!(!a.same_as(&b));
    assert!(a.same_as(&a.clone()));
}

#[test]
fn suppression_notices_once() {
    let env = Environment::isolated();
    let n = env.suppress(WarningCategory::EmptyContour).unwrap();
    assert_eq!(n.kind, NoticeKind::Suppressed);
    assert!(n.message.contains("restore_warnings(\"empty-contour\")"));
    assert!(env.suppress(WarningCategory::EmptyContour).is_none());
}

#[test]
fn warn_respects_filters_and_counts() {
    let env = Environment::isolated();
    assert!(env.warn(WarningCategory::CoordinateSystem, "no wcs"));
    env.suppress(WarningCategory::CoordinateSystem);
    assert!(!env.warn(WarningCategory::CoordinateSystem, "no wcs"));
    assert_eq!(env.warnings_emitted(WarningCategory::CoordinateSystem), 1);
    assert_eq!(env.warnings_emitted(WarningCategory::EmptyContour), 0);
}

#[test]
fn restoring_never_suppressed_category_is_noop() {
    let env = Environment::isolated();
    let before = env.snapshot();
    let notices = env.restore_warnings(WarningSelection::One(WarningCategory::EmptyContour));
    assert!(notices.is_empty());
    assert_eq!(env.snapshot(), before);
}

#[test]
fn restore_all_reports_each_suppressed_category() {
    let env = Environment::isolated();
    env.suppress(WarningCategory::CoordinateSystem);
    let notices = env.restore_warnings(WarningSelection::All);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].category, WarningCategory::CoordinateSystem);
    assert_eq!(notices[0].kind, NoticeKind::Restored);
    assert_eq!(
        env.filter(WarningCategory::CoordinateSystem),
        WarningFilter::Default
    );
}

#[test]
fn category_names_parse_back() {
    for c in WarningCategory::ALL {
        assert_eq!(WarningCategory::parse(c.name()), Some(c));
    }
    assert_eq!(
        WarningCategory::parse("wcs"),
        Some(WarningCategory::CoordinateSystem)
    );
    assert_eq!(WarningCategory::parse("nope"), None);
}
