use chrono::{Local, TimeZone};
use core_model::{DisplayItem, LayoutRegion};
use core_render::{Canvas, MemoryCanvas, Surface};
use core_widgets::list::{ListWidget, SELECTED_SPEC};
use proptest::prelude::*;

const WIDTH: u16 = 10;

fn build(len: usize, height: u16) -> (ListWidget, MemoryCanvas) {
    let canvas = MemoryCanvas::new(WIDTH, height);
    let surface = Surface::new(LayoutRegion::new(0, 0, WIDTH, height), canvas.fork());
    let mut list = ListWidget::new(surface).unwrap();
    let created = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..len {
        list.append(DisplayItem::new(format!("note {i}"), created)).unwrap();
    }
    (list, canvas)
}

fn highlighted_rows(canvas: &MemoryCanvas, height: u16) -> Vec<u16> {
    (0..height)
        .filter(|y| canvas.spec_at(0, *y) == Some(SELECTED_SPEC))
        .collect()
}

#[test]
fn empty_list_ignores_every_operation() {
    let (mut list, canvas) = build(0, 4);
    assert!(!list.move_up().unwrap());
    assert!(!list.move_down().unwrap());
    assert!(list.delete(0).unwrap().is_none());
    list.render().unwrap();
    assert_eq!(list.current(), None);
    assert!(list.current_item().is_none());
    assert!(highlighted_rows(&canvas, 4).is_empty());
}

#[test]
fn boundary_moves_are_noops() {
    let (mut list, canvas) = build(2, 4);
    canvas.take_touched();
    assert!(!list.move_up().unwrap());
    assert!(canvas.take_touched().is_empty());
    assert!(list.move_down().unwrap());
    assert!(!list.move_down().unwrap());
    assert_eq!(list.current(), Some(1));
}

proptest! {
    #[test]
    fn moves_repaint_at_most_two_rows(len in 1usize..8, moves in prop::collection::vec(any::<bool>(), 0..20)) {
        // Tall enough that the selection never scrolls.
        let height = len as u16 + 1;
        let (mut list, canvas) = build(len, height);
        for down in moves {
            let moved = if down { list.move_down().unwrap() } else { list.move_up().unwrap() };
            if moved {
                prop_assert_eq!(list.last_repaint().len(), 2);
                prop_assert_eq!(list.previous_rendered(), list.current());
            }
            let expected = list.current().map(|c| c as u16 + 1);
            prop_assert_eq!(highlighted_rows(&canvas, height), expected.into_iter().collect::<Vec<_>>());
        }
    }

    #[test]
    fn selection_stays_in_bounds(ops in prop::collection::vec(0u8..4, 0..30), len in 0usize..6) {
        let (mut list, canvas) = build(len, 12);
        let created = Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (n, op) in ops.into_iter().enumerate() {
            match op {
                0 => { list.move_up().unwrap(); }
                1 => { list.move_down().unwrap(); }
                2 => { list.insert(DisplayItem::new(format!("ins {n}"), created), n % 4).unwrap(); }
                _ => { list.delete(n % 4).unwrap(); }
            }
            match list.current() {
                Some(c) => prop_assert!(c < list.len()),
                None => prop_assert!(list.is_empty()),
            }
            let want = usize::from(!list.is_empty());
            prop_assert_eq!(highlighted_rows(&canvas, 12).len(), want);
        }
    }
}
