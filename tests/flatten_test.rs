mod common;

use obligation_grid::flatten::flatten;
use obligation_grid::model::{Compliance, Criticality, Field, FieldValue, RecordRef, RowKey};

use common::{obligation, sample_contracts, task};

#[test]
fn test_flatten_count_and_order() {
    println!("\n====== Testing flatten ======");
    let contracts = sample_contracts();
    let flat = flatten(&contracts);

    let expected: usize = contracts
        .iter()
        .flat_map(|c| c.tasks.iter())
        .map(|t| t.obligations.len())
        .sum();
    assert_eq!(flat.len(), expected);
    println!("✓ {} rows for {} obligations", flat.len(), expected);

    let order: Vec<&str> = flat.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(order, vec!["T001", "T002", "T003", "T004", "T005", "T006"]);
    println!("✓ Rows follow traversal order");

    let row = &flat[2];
    assert_eq!(row.contract_id, "CNT-2024-002");
    assert_eq!(row.owner, "Bob");
    assert_eq!(row.task_count, 1);
    assert_eq!(row.obligation_title, "Security Assessment");
    assert_eq!(row.criticality, Criticality::Medium);
    assert_eq!(row.compliance, Compliance::NonCompliant);
    assert!(row.remarks.is_empty());
    println!("✓ Contract and obligation fields copied into the row");
}

#[test]
fn test_flatten_multiple_obligations() {
    println!("\n====== Testing flatten with several obligations ======");
    let mut contracts = sample_contracts();
    contracts[0].tasks[0] = task(
        "T001",
        vec![
            obligation("Audit Review", Criticality::High, 5, 2, Compliance::Compliant),
            obligation("Policy Update", Criticality::Low, 2, 1, Compliance::Compliant),
        ],
    );
    contracts[1].tasks[0].obligations.clear();

    let flat = flatten(&contracts);
    assert_eq!(flat.len(), 6);
    assert_eq!(flat[0].obligation_index, 0);
    assert_eq!(flat[1].obligation_index, 1);
    assert_ne!(flat[0].key(), flat[1].key());
    assert!(flat.iter().all(|r| r.task_id != "T003"));
    println!("✓ One row per obligation; tasks without obligations produce none");
}

#[test]
fn test_row_key_text_form() {
    println!("\n====== Testing RowKey ======");
    let flat = flatten(&sample_contracts());
    let key = flat[3].key();
    assert_eq!(key.to_string(), "CNT-2024-010/T004/0");

    let parsed: RowKey = "CNT-2024-010/T004/0".parse().unwrap();
    assert_eq!(parsed, key);
    assert!("CNT-2024-010/T004".parse::<RowKey>().is_err());
    assert!("CNT-2024-010/T004/x".parse::<RowKey>().is_err());
    println!("✓ RowKey prints and parses as contract/task/obligation");
}

#[test]
fn test_record_ref_access() {
    println!("\n====== Testing RecordRef ======");
    let contracts = sample_contracts();
    let flat = flatten(&contracts);
    let contract = &contracts[2];
    let first_task = &contract.tasks[0];

    assert_eq!(
        RecordRef::Contract(contract).value(Field::TaskCount),
        Some(FieldValue::Int(3))
    );
    assert_eq!(RecordRef::Contract(contract).value(Field::TaskId), None);
    assert_eq!(
        RecordRef::Task(first_task).value(Field::TaskId),
        Some(FieldValue::Text("T004"))
    );
    assert_eq!(
        RecordRef::Obligation(&first_task.obligations[0]).value(Field::OpenTasks),
        Some(FieldValue::Int(1))
    );
    assert_eq!(
        RecordRef::Flat(&flat[3]).value(Field::Owner),
        Some(FieldValue::Text("Carol"))
    );
    println!("✓ Each record shape answers only for its own fields");

    assert_eq!("TASK".parse::<Field>().ok(), None);
    assert_eq!("task".parse::<Field>().ok(), Some(Field::TaskId));
    assert_eq!("OpenTasks".parse::<Field>().ok(), Some(Field::OpenTasks));
    println!("✓ Field names parse case-insensitively with the `task` alias");
}
