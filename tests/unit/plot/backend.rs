use super::*;

#[test]
fn registry_tracks_kinds() {
    let mut r = ArtistRegistry::default();
    let img = r.mint(ArtistKind::Image);
    let txt = r.mint(ArtistKind::Text);
    assert_ne!(img, txt);
    r.expect(img, ArtistKind::Image).unwrap();
    assert!(r.expect(img, ArtistKind::Text).is_err());

    assert_eq!(r.remove(txt).unwrap(), ArtistKind::Text);
    assert!(r.expect(txt, ArtistKind::Text).is_err());
    assert!(r.remove(txt).is_err());
}

#[test]
fn ids_are_never_reused() {
    let mut r = ArtistRegistry::default();
    let a = r.mint(ArtistKind::Contour);
    r.remove(a).unwrap();
    r.clear();
    let b = r.mint(ArtistKind::Contour);
    assert_ne!(a, b);
}

#[test]
fn straight_alpha_conversion() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 32, 0, 128, 10, 20, 30, 255],
        premultiplied: true,
    };
    let s = frame.to_straight_rgba8();
    assert_eq!(&s[..4], &[128, 64, 0, 128]);
    assert_eq!(&s[4..], &[10, 20, 30, 255]);
}
