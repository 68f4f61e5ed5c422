mod common;

use obligation_grid::flatten::flatten;
use obligation_grid::model::{Compliance, Criticality, Field, FlatRecord};
use obligation_grid::sort::{SortCriterion, SortDirection, apply_sort, sort_nested, sort_rows};

use common::{obligation, sample_contracts, task, task_ids};

fn flat_ids(rows: &[FlatRecord]) -> Vec<&str> {
    rows.iter().map(|r| r.task_id.as_str()).collect()
}

#[test]
fn test_multi_key_tie_break() {
    println!("\n====== Testing multi-key sort ======");
    let mut contracts = sample_contracts();
    contracts[1].tasks.push(task(
        "T007",
        vec![obligation("Audit Review", Criticality::High, 6, 3, Compliance::Compliant)],
    ));
    let mut flat = flatten(&contracts);

    let criteria = [
        SortCriterion::asc(Field::Criticality),
        SortCriterion::desc(Field::OpenTasks),
    ];
    sort_rows(&criteria, &mut flat);

    // High: T007 (3), T001 (2), T004 (1); Low: T006 (4), T002 (0); Medium: T003 (7), T005 (0)
    assert_eq!(
        flat_ids(&flat),
        vec!["T007", "T001", "T004", "T006", "T002", "T003", "T005"]
    );
    println!("✓ Second key breaks ties left by the first");
}

#[test]
fn test_sort_is_stable() {
    println!("\n====== Testing stability ======");
    let mut flat = flatten(&sample_contracts());
    sort_rows(&[SortCriterion::asc(Field::Category)], &mut flat);
    // Legal rows keep their input order, then Operations.
    assert_eq!(
        flat_ids(&flat),
        vec!["T001", "T002", "T004", "T005", "T006", "T003"]
    );
    println!("✓ Equal rows keep their relative order");
}

#[test]
fn test_id_sort_is_numeric() {
    println!("\n====== Testing id ordering ======");
    let mut flat = flatten(&sample_contracts());
    sort_rows(&[SortCriterion::desc(Field::ContractId)], &mut flat);
    let ids: Vec<&str> = flat.iter().map(|r| r.contract_id.as_str()).collect();
    assert_eq!(ids[0], "CNT-2024-010");
    assert_eq!(ids[5], "CNT-2024-001");
    println!("✓ Ids compare by their trailing number");
}

#[test]
fn test_empty_sort_keeps_order() {
    println!("\n====== Testing empty sort ======");
    let contracts = sample_contracts();
    let mut flat = flatten(&contracts);
    sort_rows(&[SortCriterion::desc(Field::TriggeredTasks)], &mut flat);
    let before = flat_ids(&flat).join(",");

    let (nested, flat) = apply_sort(&[], &contracts, &flat);
    assert_eq!(flat_ids(&flat).join(","), before);
    assert_eq!(nested, contracts);
    println!("✓ No criteria leaves the current order untouched");
}

#[test]
fn test_nested_sort_reorders_tasks_only() {
    println!("\n====== Testing nested sort ======");
    let mut contracts = sample_contracts();
    sort_nested(
        &[
            SortCriterion::desc(Field::ContractId),
            SortCriterion::asc(Field::TriggeredTasks),
        ],
        &mut contracts,
    );

    let contract_ids: Vec<&str> = contracts.iter().map(|c| c.contract_id.as_str()).collect();
    assert_eq!(contract_ids, vec!["CNT-2024-001", "CNT-2024-002", "CNT-2024-010"]);
    assert_eq!(task_ids(&contracts), vec!["T002", "T001", "T003", "T005", "T004", "T006"]);
    println!("✓ Contract order untouched, tasks sorted inside each contract");
}

#[test]
fn test_apply_sort_both_representations() {
    println!("\n====== Testing apply_sort ======");
    let contracts = sample_contracts();
    let flat = flatten(&contracts);
    let (nested, flat) = apply_sort(&[SortCriterion::asc(Field::ObligationTitle)], &contracts, &flat);

    assert_eq!(
        flat_ids(&flat),
        vec!["T005", "T001", "T006", "T004", "T002", "T003"]
    );
    assert_eq!(task_ids(&nested), vec!["T001", "T002", "T003", "T005", "T006", "T004"]);
    println!("✓ Flat rows sorted globally, nested tasks per contract");
}

#[test]
fn test_direction_cycle() {
    println!("\n====== Testing header sort cycle ======");
    let mut state = None;
    state = SortDirection::cycle(state);
    assert_eq!(state, Some(SortDirection::Asc));
    state = SortDirection::cycle(state);
    assert_eq!(state, Some(SortDirection::Desc));
    state = SortDirection::cycle(state);
    assert_eq!(state, None);
    println!("✓ none -> asc -> desc -> none");

    let criterion: SortCriterion = serde_json::from_str(r#"{"field":"openTasks"}"#).unwrap();
    assert_eq!(criterion, SortCriterion::asc(Field::OpenTasks));
    assert_eq!(SortDirection::parse("DESC"), Some(SortDirection::Desc));
    println!("✓ Direction defaults to ascending");
}
