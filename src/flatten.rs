use crate::model::{Contract, FlatRecord};

/// Project the nested dataset into one row per (contract, task, obligation).
///
/// Rows follow traversal order: contracts as given, tasks and obligations in
/// their current order. Remarks start out empty.
pub fn flatten(contracts: &[Contract]) -> Vec<FlatRecord> {
    let capacity = contracts
        .iter()
        .flat_map(|contract| contract.tasks.iter())
        .map(|task| task.obligations.len())
        .sum();
    let mut flat = Vec::with_capacity(capacity);

    for contract in contracts {
        for task in &contract.tasks {
            for (index, obligation) in task.obligations.iter().enumerate() {
                flat.push(FlatRecord {
                    contract_id: contract.contract_id.clone(),
                    task_id: task.task_id.clone(),
                    obligation_index: index,
                    obligation_title: obligation.title.clone(),
                    category: contract.category.clone(),
                    domain: contract.domain.clone(),
                    subdomain: contract.subdomain.clone(),
                    criticality: obligation.criticality,
                    owner: contract.owner.clone(),
                    task_count: contract.task_count,
                    triggered_tasks: obligation.triggered_tasks,
                    open_tasks: obligation.open_tasks,
                    compliance: obligation.compliance,
                    remarks: String::new(),
                });
            }
        }
    }

    flat
}
