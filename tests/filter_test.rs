mod common;

use obligation_grid::filter::{FilterCriterion, FilterOperator, apply_filters};
use obligation_grid::flatten::flatten;
use obligation_grid::generator;
use obligation_grid::model::{Compliance, Contract, Field, FieldKind, FieldValue, FlatRecord};
use rand::SeedableRng;
use rand::rngs::StdRng;

use common::{sample_contracts, task_ids};

fn assert_tasks(criteria: &[FilterCriterion], expected: &[&str]) -> (Vec<Contract>, Vec<FlatRecord>) {
    let (nested, flat) = apply_filters(criteria, &sample_contracts());
    assert_eq!(task_ids(&nested), expected);
    let flat_ids: Vec<&str> = flat.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(flat_ids, expected);
    println!("✓ {:?} kept tasks {:?}", criteria.iter().map(|c| c.operator).collect::<Vec<_>>(), expected);
    (nested, flat)
}

#[test]
fn test_empty_criteria_restore_original() {
    println!("\n====== Testing empty criteria ======");
    let original = sample_contracts();
    let (nested, flat) = apply_filters(&[], &original);
    assert_eq!(nested, original);
    assert_eq!(flat, flatten(&original));
    println!("✓ No criteria returns the original dataset");
}

#[test]
fn test_filter_idempotent() {
    println!("\n====== Testing idempotence ======");
    let criteria = vec![
        FilterCriterion::new(Field::Category, FilterOperator::Is, "Legal"),
        FilterCriterion::new(Field::OpenTasks, FilterOperator::Lte, "2"),
    ];
    let (once, _) = apply_filters(&criteria, &sample_contracts());
    let (twice, _) = apply_filters(&criteria, &once);
    assert_eq!(once, twice);
    assert_eq!(task_ids(&once), vec!["T001", "T002", "T004", "T005"]);
    println!("✓ Filtering the filtered data again changes nothing");
}

#[test]
fn test_id_contains_and_comparisons() {
    println!("\n====== Testing id filters ======");
    let (nested, _) = assert_tasks(
        &[FilterCriterion::new(Field::ContractId, FilterOperator::Contains, "001")],
        &["T001", "T002"],
    );
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].contract_id, "CNT-2024-001");
    println!("✓ `001` matches CNT-2024-001 and not CNT-2024-010");

    assert_tasks(
        &[FilterCriterion::new(Field::ContractId, FilterOperator::Gt, "2")],
        &["T004", "T005", "T006"],
    );
    assert_tasks(
        &[FilterCriterion::new(Field::TaskId, FilterOperator::Equals, "T003")],
        &["T003"],
    );
    assert_tasks(
        &[FilterCriterion::range(Field::TaskId, "2", "4")],
        &["T002", "T003", "T004"],
    );
}

#[test]
fn test_numeric_filters() {
    println!("\n====== Testing numeric filters ======");
    let (_, flat) = assert_tasks(
        &[FilterCriterion::range(Field::TriggeredTasks, "2", "5")],
        &["T001", "T004", "T005", "T006"],
    );
    assert!(flat.iter().all(|r| (2..=5).contains(&r.triggered_tasks)));
    println!("✓ Range excludes triggeredTasks = 6 or 7");

    assert_tasks(
        &[FilterCriterion::new(Field::OpenTasks, FilterOperator::Equals, "0")],
        &["T002", "T005"],
    );
    println!("✓ Zero is a value, not an empty cell");

    assert_tasks(
        &[FilterCriterion::new(Field::TaskCount, FilterOperator::Gte, "2")],
        &["T001", "T002", "T004", "T005", "T006"],
    );
    assert_tasks(
        &[FilterCriterion::new(Field::TriggeredTasks, FilterOperator::Gt, "abc")],
        &[],
    );
    println!("✓ Unparseable bounds match nothing");
}

#[test]
fn test_text_and_enum_filters() {
    println!("\n====== Testing text and enum filters ======");
    assert_tasks(
        &[FilterCriterion::new(Field::ObligationTitle, FilterOperator::Contains, "review")],
        &["T001", "T005", "T006"],
    );
    assert_tasks(
        &[FilterCriterion::new(Field::Criticality, FilterOperator::Is, " high ")],
        &["T001", "T004"],
    );
    assert_tasks(
        &[FilterCriterion::new(Field::Owner, FilterOperator::IsNot, "alice")],
        &["T003", "T004", "T005", "T006"],
    );
    assert_tasks(
        &[FilterCriterion::new(Field::Domain, FilterOperator::IsNotEmpty, "")],
        &["T001", "T002", "T003", "T004", "T005", "T006"],
    );
    assert_tasks(
        &[FilterCriterion::new(Field::Domain, FilterOperator::IsEmpty, "")],
        &[],
    );
}

#[test]
fn test_blank_values() {
    println!("\n====== Testing blank values ======");
    let mut contracts = sample_contracts();
    contracts[1].owner = "  ".to_string();

    let criterion = FilterCriterion::new(Field::Owner, FilterOperator::IsEmpty, "");
    let (nested, _) = apply_filters(&[criterion], &contracts);
    assert_eq!(task_ids(&nested), vec!["T003"]);

    let criterion = FilterCriterion::new(Field::Owner, FilterOperator::Is, "");
    let (nested, _) = apply_filters(&[criterion], &contracts);
    assert!(nested.is_empty());
    println!("✓ Blank cells only satisfy `is empty`");
}

#[test]
fn test_operator_fit() {
    println!("\n====== Testing operator applicability ======");
    assert_eq!(FilterOperator::offered_for(FieldKind::Enum).len(), 4);
    assert!(FilterOperator::offered_for(FieldKind::Numeric).contains(&FilterOperator::Range));
    assert!(!FilterOperator::Gt.applies_to(FieldKind::Text));
    assert!(FilterOperator::Contains.applies_to(FieldKind::Id));
    assert!(!FilterOperator::Contains.applies_to(FieldKind::Enum));

    let criterion = FilterCriterion::new(Field::Owner, FilterOperator::Gt, "A");
    assert!(!criterion.matches(Some(FieldValue::Text("Bob"))));
    println!("✓ Operators that do not fit the field reject every row");

    assert_eq!(FilterOperator::parse("isNotEmpty"), Some(FilterOperator::IsNotEmpty));
    assert_eq!(FilterOperator::parse("between"), None);
    println!("✓ Operator names parse from their wire form");
}

#[test]
fn test_remarks_criteria_skipped() {
    println!("\n====== Testing remarks criteria ======");
    assert_tasks(
        &[FilterCriterion::new(Field::Remarks, FilterOperator::Contains, "anything")],
        &["T001", "T002", "T003", "T004", "T005", "T006"],
    );
}

#[test]
fn test_contract_level_routing() {
    println!("\n====== Testing routing by level ======");
    let (nested, _) = apply_filters(
        &[FilterCriterion::new(Field::Category, FilterOperator::Is, "Operations")],
        &sample_contracts(),
    );
    assert_eq!(nested.len(), 1);
    assert_eq!(nested[0].tasks.len(), 1);
    println!("✓ Contract fields keep whole contracts");

    let (nested, _) = apply_filters(
        &[FilterCriterion::new(Field::Compliance, FilterOperator::Is, "Non-Compliant")],
        &sample_contracts(),
    );
    assert_eq!(nested.len(), 3);
    assert_eq!(nested[2].tasks.len(), 1);
    assert_eq!(nested[2].task_count, 3);
    println!("✓ Obligation fields drop tasks and keep the stored task count");
}

#[test]
fn test_criterion_wire_format() {
    println!("\n====== Testing criterion JSON ======");
    let json = r#"{"field":"triggeredTasks","operator":"range","value":"2","upperValue":"5"}"#;
    let criterion: FilterCriterion = serde_json::from_str(json).unwrap();
    assert_eq!(criterion, FilterCriterion::range(Field::TriggeredTasks, "2", "5"));

    let criterion: FilterCriterion =
        serde_json::from_str(r#"{"field":"task","operator":"isEmpty"}"#).unwrap();
    assert_eq!(criterion.field, Field::TaskId);
    assert!(criterion.value.is_empty());
    println!("✓ Criteria deserialize from the client's field names");
}

#[test]
fn test_generated_compliance_scenario() {
    println!("\n====== Testing generated dataset scenario ======");
    let contracts = generator::generate(&mut StdRng::seed_from_u64(2024));
    let criterion = FilterCriterion::new(Field::Compliance, FilterOperator::Is, "Compliant");
    let (nested, flat) = apply_filters(&[criterion], &contracts);

    assert!(flat.iter().all(|r| r.compliance == Compliance::Compliant));
    assert!(nested.iter().all(|c| !c.tasks.is_empty()));
    assert_eq!(flat, flatten(&nested));
    println!(
        "✓ {} compliant rows across {} contracts, none empty",
        flat.len(),
        nested.len()
    );
}
