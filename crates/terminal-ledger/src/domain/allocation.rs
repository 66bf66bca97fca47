//! # Allocation Engine
//!
//! First-fit cell assignment inside a shelf section.
//!
//! The engine is deterministic: given the same occupancy it always returns the
//! lowest free index for the effective box type. It does not check box-type
//! homogeneity; callers reject mixed placements before allocating.

use super::capacity::SectionView;
use super::entities::{Actor, BoxType, Placement, Terminal, Timestamp};
use super::errors::{LedgerError, LedgerResult};
use super::history::EventKind;

/// Lowest free 0-based position in `view` for a terminal of `box_type`.
///
/// # Errors
/// - `CapacityExhausted`: every cell of the effective box type is taken
pub fn find_free_cell(view: &SectionView, box_type: BoxType) -> LedgerResult<u32> {
    let effective = view.effective_box_type(box_type);
    let total = view.total_cells(box_type);

    (0..total)
        .find(|position| !view.is_occupied(*position))
        .ok_or_else(|| LedgerError::CapacityExhausted {
            section: view.id.clone(),
            box_type: effective,
            total_cells: total,
        })
}

/// Assigns `terminal` to the first free cell of `view`.
///
/// Appends "placed" for an unplaced terminal, "moved" otherwise. On error the
/// terminal is left unchanged.
pub fn allocate(
    terminal: &mut Terminal,
    view: &SectionView,
    actor: &Actor,
    now: Timestamp,
) -> LedgerResult<Placement> {
    let position = find_free_cell(view, terminal.box_type)?;
    let placement = Placement::new(view.id.clone(), position);

    let kind = match terminal.placement.take() {
        Some(previous) => EventKind::Moved {
            from: previous.section,
            to: view.id.clone(),
        },
        None => EventKind::Placed {
            section: view.id.clone(),
        },
    };

    terminal.placement = Some(placement.clone());
    terminal.history.record(kind, actor, now);
    Ok(placement)
}
