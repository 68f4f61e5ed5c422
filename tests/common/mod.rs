#![allow(dead_code)]

use obligation_grid::model::{Compliance, Contract, Criticality, Obligation, Task};

pub fn obligation(
    title: &str,
    criticality: Criticality,
    triggered_tasks: u32,
    open_tasks: u32,
    compliance: Compliance,
) -> Obligation {
    Obligation {
        title: title.to_string(),
        criticality,
        triggered_tasks,
        open_tasks,
        compliance,
    }
}

pub fn task(id: &str, obligations: Vec<Obligation>) -> Task {
    Task {
        task_id: id.to_string(),
        obligations,
    }
}

pub fn contract(id: &str, category: &str, domain: &str, owner: &str, tasks: Vec<Task>) -> Contract {
    Contract {
        contract_id: id.to_string(),
        category: category.to_string(),
        domain: domain.to_string(),
        subdomain: format!("{} Ops", domain),
        owner: owner.to_string(),
        task_count: tasks.len() as u32,
        tasks,
    }
}

/// Three contracts, six tasks, one obligation per task.
pub fn sample_contracts() -> Vec<Contract> {
    use Compliance::*;
    use Criticality::*;

    vec![
        contract(
            "CNT-2024-001",
            "Legal",
            "Finance",
            "Alice",
            vec![
                task("T001", vec![obligation("Audit Review", High, 5, 2, Compliant)]),
                task("T002", vec![obligation("Policy Update", Low, 1, 0, NonCompliant)]),
            ],
        ),
        contract(
            "CNT-2024-002",
            "Operations",
            "IT",
            "Bob",
            vec![task(
                "T003",
                vec![obligation("Security Assessment", Medium, 7, 7, NonCompliant)],
            )],
        ),
        contract(
            "CNT-2024-010",
            "Legal",
            "HR",
            "Carol",
            vec![
                task("T004", vec![obligation("Employee Training", High, 3, 1, Compliant)]),
                task("T005", vec![obligation("Access Control Review", Medium, 2, 0, Compliant)]),
                task("T006", vec![obligation("Audit Review", Low, 4, 4, NonCompliant)]),
            ],
        ),
    ]
}

pub fn task_ids(contracts: &[Contract]) -> Vec<String> {
    contracts
        .iter()
        .flat_map(|contract| contract.tasks.iter())
        .map(|task| task.task_id.clone())
        .collect()
}
