use super::*;

fn item(n: usize) -> MediaItem {
    MediaItem {
        id: format!("m{n}"),
        source: format!("clip{n}.mp4"),
        name: format!("clip{n}.mp4"),
        kind: MediaKind::Video,
    }
}

fn list(n: usize) -> (Playlist, fastrand::Rng) {
    let mut rng = fastrand::Rng::with_seed(7);
    let mut p = Playlist::default();
    p.append((0..n).map(item).collect(), &mut rng);
    (p, rng)
}

#[test]
fn append_to_empty_sets_current_zero() {
    let (p, _) = list(1);
    assert_eq!(p.current, Some(0));
    assert_eq!(p.next, Some(0));

    let (mut p, mut rng) = list(2);
    assert_eq!((p.current, p.next), (Some(0), Some(1)));
    p.select(1, &mut rng).unwrap();
    p.append(vec![item(9)], &mut rng);
    assert_eq!((p.current, p.next), (Some(1), Some(2)));
}

#[test]
fn shuffle_successor_never_repeats_current() {
    let mut rng = fastrand::Rng::with_seed(42);
    for len in 2..8 {
        for cur in 0..len {
            for _ in 0..50 {
                let s = successor(cur, len, true, &mut rng);
                assert!(s < len);
                assert_ne!(s, cur);
            }
        }
    }
    assert_eq!(successor(0, 1, true, &mut rng), 0);
    assert_eq!(successor(3, 4, false, &mut rng), 0);
}

#[test]
fn reorder_tracks_current_item() {
    let (mut p, mut rng) = list(5);
    p.select(2, &mut rng).unwrap();
    let current_id = p.current_item().unwrap().id.clone();

    p.reorder(2, 4, &mut rng).unwrap();
    assert_eq!(p.current, Some(4));
    p.reorder(0, 4, &mut rng).unwrap();
    assert_eq!(p.current, Some(3));
    p.reorder(4, 0, &mut rng).unwrap();
    assert_eq!(p.current, Some(4));
    assert_eq!(p.current_item().unwrap().id, current_id);
    assert_eq!(p.next, Some(0));

    assert!(p.reorder(0, 5, &mut rng).is_err());
}

#[test]
fn remove_shifts_and_resets_current() {
    let (mut p, mut rng) = list(4);
    p.select(2, &mut rng).unwrap();
    p.remove(0, &mut rng).unwrap();
    assert_eq!(p.current, Some(1));
    p.remove(1, &mut rng).unwrap();
    assert_eq!(p.current, Some(0));
    assert_eq!(p.next, Some(1));
    p.remove(1, &mut rng).unwrap();
    p.remove(0, &mut rng).unwrap();
    assert_eq!((p.current, p.next), (None, None));
    assert!(p.remove(0, &mut rng).is_err());
}

#[test]
fn advance_promotes_next() {
    let (mut p, mut rng) = list(3);
    p.advance(&mut rng);
    assert_eq!((p.current, p.next), (Some(1), Some(2)));
    p.advance(&mut rng);
    p.advance(&mut rng);
    assert_eq!((p.current, p.next), (Some(0), Some(1)));
}

#[test]
fn slot_toggles() {
    assert_eq!(Slot::A.toggle(), Slot::B);
    assert_eq!(Slot::B.toggle().index(), 0);
}
