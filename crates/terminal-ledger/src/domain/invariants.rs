//! Consistency checks over a whole [`Warehouse`].
//!
//! Used by tests and by repositories after loading a persisted state.

use std::collections::HashSet;

use super::capacity::SectionView;
use super::warehouse::Warehouse;

/// A broken warehouse invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A terminal references a section that is not in the layout.
    UnknownSection { serial: String, section: String },
    /// Two terminals share one cell.
    SharedCell { section: String, position: u32 },
    /// A position lies outside the grid of the active box type.
    OutOfGrid { section: String, position: u32, total_cells: u32 },
    /// A section holds terminals of more than one box type.
    MixedBoxTypes { section: String },
    /// A history event is older than its predecessor.
    HistoryOutOfOrder { serial: String, index: usize },
    /// Two verification requests share an id.
    DuplicateRequestId { id: String },
}

fn check_section(view: &SectionView, violations: &mut Vec<InvariantViolation>) {
    let section = view.id.to_string();
    let Some(active) = view.current_box_type else {
        return;
    };

    if view.occupants.iter().any(|c| c.box_type != active) {
        violations.push(InvariantViolation::MixedBoxTypes {
            section: section.clone(),
        });
    }

    let total_cells = view.total_cells(active);
    let mut seen = HashSet::new();
    for cell in &view.occupants {
        if !seen.insert(cell.position) {
            violations.push(InvariantViolation::SharedCell {
                section: section.clone(),
                position: cell.position,
            });
        }
        if cell.position >= total_cells {
            violations.push(InvariantViolation::OutOfGrid {
                section: section.clone(),
                position: cell.position,
                total_cells,
            });
        }
    }
}

/// Returns every violated structural invariant. Empty means consistent.
pub fn check_all_invariants(warehouse: &Warehouse) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for terminal in warehouse.terminals() {
        if let Some(section) = terminal.section() {
            if warehouse.section(section).is_none() {
                violations.push(InvariantViolation::UnknownSection {
                    serial: terminal.serial.to_string(),
                    section: section.to_string(),
                });
            }
        }
    }

    for view in warehouse.section_views() {
        check_section(&view, &mut violations);
    }

    let mut request_ids = HashSet::new();
    for request in warehouse.requests().iter() {
        if !request_ids.insert(request.id.as_str()) {
            violations.push(InvariantViolation::DuplicateRequestId {
                id: request.id.clone(),
            });
        }
    }

    violations
}

/// Checks that history timestamps never decrease.
///
/// Kept separate from [`check_all_invariants`]: a shipment re-date may
/// legitimately move an event behind its predecessor.
pub fn check_history_order(warehouse: &Warehouse) -> Vec<InvariantViolation> {
    warehouse
        .terminals()
        .flat_map(|t| {
            t.history
                .as_slice()
                .windows(2)
                .enumerate()
                .filter(|(_, pair)| pair[1].timestamp < pair[0].timestamp)
                .map(|(i, _)| InvariantViolation::HistoryOutOfOrder {
                    serial: t.serial.to_string(),
                    index: i + 1,
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
