use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::{Compliance, Contract, Criticality, Obligation, Task};
use crate::session::{SessionStore, TABLE_DATA_KEY};

pub const CONTRACT_COUNT: usize = 15;
pub const CONTRACT_YEAR: u32 = 2024;
pub const MIN_TASKS: u32 = 2;
pub const MAX_TASKS: u32 = 7;
pub const MAX_TRIGGERED_TASKS: u32 = 7;

pub const CATEGORIES: [&str; 7] = [
    "Security",
    "Finance",
    "HR",
    "Procurement",
    "IT",
    "Legal",
    "Operations",
];

pub const DOMAINS: [&str; 7] = [
    "Information Security",
    "Accounting",
    "Training",
    "Vendor Management",
    "Cloud",
    "Compliance",
    "Logistics",
];

pub const SUBDOMAINS: [&str; 7] = [
    "Risk Assessment",
    "Reporting",
    "Mandatory Training",
    "Supplier Review",
    "AWS",
    "Policy",
    "Inventory",
];

pub const OWNERS: [&str; 7] = [
    "John Smith",
    "Emily Chen",
    "Lisa Anderson",
    "Jennifer Taylor",
    "Michael Brown",
    "Sarah Lee",
    "David Wilson",
];

pub const OBLIGATION_TITLES: [&str; 10] = [
    "Monthly Security Assessment Report",
    "Quarterly Audit",
    "Annual Compliance Review",
    "Incident Response Plan",
    "Vendor Risk Evaluation",
    "Employee Training",
    "Policy Update",
    "Inventory Check",
    "Financial Statement Review",
    "Access Control Review",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

pub fn contract_id(ordinal: usize) -> String {
    format!("CNT-{}-{:03}", CONTRACT_YEAR, ordinal)
}

pub fn task_id(ordinal: usize) -> String {
    format!("T{:03}", ordinal)
}

/// Build a fresh mock dataset.
///
/// Task ids are numbered globally, so they stay unique across contracts.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Vec<Contract> {
    let mut next_task = 1;

    (1..=CONTRACT_COUNT)
        .map(|ordinal| {
            let task_count = rng.gen_range(MIN_TASKS..=MAX_TASKS);
            let category = pick(rng, &CATEGORIES);
            let domain = pick(rng, &DOMAINS);
            let subdomain = pick(rng, &SUBDOMAINS);
            let owner = pick(rng, &OWNERS);

            let tasks = (0..task_count)
                .map(|_| {
                    let id = task_id(next_task);
                    next_task += 1;

                    let triggered_tasks = rng.gen_range(1..=MAX_TRIGGERED_TASKS);
                    let obligation = Obligation {
                        title: pick(rng, &OBLIGATION_TITLES),
                        criticality: *Criticality::ALL.choose(rng).unwrap_or(&Criticality::Low),
                        triggered_tasks,
                        open_tasks: rng.gen_range(0..=triggered_tasks),
                        compliance: *Compliance::ALL
                            .choose(rng)
                            .unwrap_or(&Compliance::Compliant),
                    };
                    Task {
                        task_id: id,
                        obligations: vec![obligation],
                    }
                })
                .collect();

            Contract {
                contract_id: contract_id(ordinal),
                category,
                domain,
                subdomain,
                owner,
                task_count,
                tasks,
            }
        })
        .collect()
}

/// Return the session's dataset, generating and caching it on first use.
///
/// Later calls in the same session hand back the cached dataset untouched so
/// reloading a view never reshuffles rows under pending edits.
pub fn load_or_generate<S, R>(store: &mut S, rng: &mut R) -> Vec<Contract>
where
    S: SessionStore + ?Sized,
    R: Rng + ?Sized,
{
    if let Some(raw) = store.get_item(TABLE_DATA_KEY) {
        match serde_json::from_str::<Vec<Contract>>(&raw) {
            Ok(contracts) => {
                debug!("reusing {} cached contracts", contracts.len());
                return contracts;
            }
            Err(e) => warn!("cached table data is unreadable, regenerating: {}", e),
        }
    }

    let contracts = generate(rng);
    match serde_json::to_string(&contracts) {
        Ok(json) => store.set_item(TABLE_DATA_KEY, json),
        Err(e) => warn!("could not cache generated table data: {}", e),
    }
    info!(
        "generated {} contracts with {} tasks",
        contracts.len(),
        contracts.iter().map(|c| c.tasks.len()).sum::<usize>()
    );
    contracts
}
