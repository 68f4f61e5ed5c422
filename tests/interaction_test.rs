use obligation_grid::filter::{FilterCriterion, FilterOperator};
use obligation_grid::interaction::{CriteriaList, DragState, ResizeState, move_item};
use obligation_grid::layout::{ColumnLayout, TRANSPOSED_ROW_HEIGHT, ViewMode};
use obligation_grid::model::Field;

#[test]
fn test_move_item() {
    println!("\n====== Testing move_item ======");
    let mut items = vec!['a', 'b', 'c', 'd'];
    assert!(move_item(&mut items, 0, 2));
    assert_eq!(items, vec!['b', 'c', 'a', 'd']);
    assert!(move_item(&mut items, 3, 0));
    assert_eq!(items, vec!['d', 'b', 'c', 'a']);
    assert!(!move_item(&mut items, 4, 0));
    assert_eq!(items, vec!['d', 'b', 'c', 'a']);
    println!("✓ Items shift around the moved element; bad positions are refused");
}

#[test]
fn test_drag_state_machine() {
    println!("\n====== Testing DragState ======");
    let mut drag: DragState<u8> = DragState::default();
    drag.hover(3);
    assert_eq!(drag, DragState::Idle);
    assert_eq!(drag.drop(), None);

    drag.start(1);
    assert_eq!(drag, DragState::Dragging { active: 1, over: None });
    drag.hover(2);
    drag.hover(4);
    assert_eq!(drag.drop(), Some((1, 4)));
    assert!(!drag.is_dragging());
    println!("✓ Idle -> dragging -> dropped yields the last hovered target");

    drag.start(1);
    assert_eq!(drag.drop(), None);
    drag.start(1);
    drag.hover(2);
    drag.cancel();
    assert_eq!(drag.drop(), None);
    println!("✓ No target or a cancel commits nothing");
}

#[test]
fn test_resize_state_machine() {
    println!("\n====== Testing ResizeState ======");
    let mut resize: ResizeState<&str> = ResizeState::default();
    assert_eq!(resize.drag_to(10, 0, 100), None);
    assert_eq!(resize.commit(), None);

    resize.start("owner", 120, 40);
    assert!(resize.is_resizing());
    assert_eq!(resize.drag_to(70, 80, 180), Some(150));
    assert_eq!(resize.drag_to(-200, 80, 180), Some(80));
    assert_eq!(resize.commit(), Some(("owner", 80)));
    assert!(!resize.is_resizing());
    println!("✓ Live size follows the pointer within bounds and commits once");

    resize.start("owner", 120, 0);
    resize.drag_to(30, 80, 180);
    resize.cancel();
    assert_eq!(resize.commit(), None);
    println!("✓ Cancel drops the pending size");
}

#[test]
fn test_criteria_list() {
    println!("\n====== Testing CriteriaList ======");
    let mut list = CriteriaList::new();
    assert!(list.is_empty());
    list.add(FilterCriterion::new(Field::Owner, FilterOperator::Is, "Alice"));
    list.add(FilterCriterion::new(Field::Domain, FilterOperator::Contains, "fin"));
    list.add(FilterCriterion::range(Field::OpenTasks, "1", "3"));
    assert_eq!(list.len(), 3);

    assert!(list.move_item(2, 0));
    assert_eq!(list.items()[0].field, Field::OpenTasks);
    assert!(list.replace(1, FilterCriterion::new(Field::Owner, FilterOperator::IsNot, "Bob")));
    assert_eq!(list.items()[1].operator, FilterOperator::IsNot);
    assert!(!list.replace(9, FilterCriterion::new(Field::Owner, FilterOperator::IsEmpty, "")));

    let removed = list.remove(2).unwrap();
    assert_eq!(removed.field, Field::Domain);
    assert!(list.remove(5).is_none());
    println!("✓ Add, move, replace and remove keep the list ordered");

    list.clear();
    assert!(list.is_empty());
    println!("✓ Clear empties the list");
}

#[test]
fn test_column_layouts() {
    println!("\n====== Testing ColumnLayout ======");
    let grouped = ColumnLayout::for_view(ViewMode::Grouped);
    assert_eq!(grouped.order().len(), 6);
    assert!(!grouped.contains(Field::TaskId));
    assert_eq!(grouped.size(Field::ContractId), Some(140));

    let mut flat = ColumnLayout::for_view(ViewMode::Flat);
    assert_eq!(flat.order().len(), 12);
    assert_eq!(flat.order()[11], Field::Remarks);
    assert!(flat.set_visible(Field::Domain, false));
    assert!(!flat.is_visible(Field::Domain));
    assert_eq!(flat.visible().len(), 11);
    assert_eq!(flat.order().len(), 12);
    assert!(flat.reorder(0, 12).is_err());
    println!("✓ Hidden columns keep their place in the order");

    let transposed = ColumnLayout::for_view(ViewMode::Transposed);
    assert!(!transposed.contains(Field::Remarks));
    assert_eq!(transposed.size(Field::Owner), Some(TRANSPOSED_ROW_HEIGHT));
    println!("✓ Transposed rows default to {}px", TRANSPOSED_ROW_HEIGHT);

    assert_eq!("Flat".parse::<ViewMode>().ok(), Some(ViewMode::Flat));
    assert!("sideways".parse::<ViewMode>().is_err());
    assert_eq!(ViewMode::Transposed.to_string(), "transposed");
    println!("✓ View modes parse and print by name");
}
