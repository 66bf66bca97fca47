//! # Shelf Capacity Model
//!
//! Occupancy of a section is never stored. [`SectionView`] projects it from
//! terminal placements on demand, so it cannot drift from the terminals.
//!
//! A section holds a single box type at a time. The active type is the box
//! type of its lowest-positioned occupant and is `None` exactly when the
//! section is empty.

use serde::Serialize;

use super::entities::{
    BoxType, SectionCapacity, SectionId, SerialNumber, ShelfSection, ShelfTier, Terminal,
};

/// Number of cells a section offers for `box_type`.
pub fn total_cells(capacity: &SectionCapacity, box_type: BoxType) -> u32 {
    capacity.for_box(box_type).cells()
}

/// A terminal occupying one cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OccupiedCell {
    pub position: u32,
    pub serial: SerialNumber,
    pub box_type: BoxType,
}

impl OccupiedCell {
    /// 1-based cell number.
    pub fn cell(&self) -> u32 {
        self.position + 1
    }
}

/// Read-time projection of a section and its occupants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub id: SectionId,
    pub tier: ShelfTier,
    pub capacity: SectionCapacity,
    pub current_box_type: Option<BoxType>,
    /// Occupants ordered by position.
    pub occupants: Vec<OccupiedCell>,
}

impl SectionView {
    /// Builds the view of `section` from every terminal placed in it.
    pub fn project<'a, I>(section: &ShelfSection, terminals: I) -> Self
    where
        I: IntoIterator<Item = &'a Terminal>,
    {
        let mut occupants: Vec<OccupiedCell> = terminals
            .into_iter()
            .filter_map(|t| {
                t.placement
                    .as_ref()
                    .filter(|p| p.section == section.id)
                    .map(|p| OccupiedCell {
                        position: p.position,
                        serial: t.serial.clone(),
                        box_type: t.box_type,
                    })
            })
            .collect();
        occupants.sort_by_key(|c| c.position);

        Self {
            id: section.id.clone(),
            tier: section.tier,
            capacity: section.capacity,
            current_box_type: occupants.first().map(|c| c.box_type),
            occupants,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn occupied(&self) -> u32 {
        u32::try_from(self.occupants.len()).unwrap_or(u32::MAX)
    }

    pub fn is_occupied(&self, position: u32) -> bool {
        self.occupants.iter().any(|c| c.position == position)
    }

    /// Box type that governs capacity if `incoming` were placed here.
    pub fn effective_box_type(&self, incoming: BoxType) -> BoxType {
        self.current_box_type.unwrap_or(incoming)
    }

    /// Cells available for the active (or incoming) box type.
    pub fn total_cells(&self, incoming: BoxType) -> u32 {
        total_cells(&self.capacity, self.effective_box_type(incoming))
    }

    pub fn free_cells(&self, incoming: BoxType) -> u32 {
        self.total_cells(incoming).saturating_sub(self.occupied())
    }

    pub fn contains(&self, serial: &SerialNumber) -> bool {
        self.occupants.iter().any(|c| &c.serial == serial)
    }
}

/// True when placing `incoming` would mix box types in a non-empty section.
pub fn is_homogeneity_violation(view: &SectionView, incoming: BoxType) -> bool {
    matches!(view.current_box_type, Some(current) if current != incoming)
}

/// True when the section has at least one cell left for `incoming`.
pub fn has_free_cell(view: &SectionView, incoming: BoxType) -> bool {
    view.free_cells(incoming) > 0
}
