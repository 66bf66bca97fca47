//! Domain services: fleet classification, intake validation and the
//! warehouse calendar.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use super::entities::{Fleet, SerialNumber, ShelfSection, ShelfTier, Timestamp};
use super::errors::{LedgerError, LedgerResult};
use super::history::EventKind;
use super::value_objects::{IntakeChannel, LedgerConfig};

/// Decides a terminal's fleet from its serial number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FleetClassifier {
    rental_prefix: String,
    warehouse_model: String,
    rental_model: String,
}

impl FleetClassifier {
    pub fn new(
        rental_prefix: impl Into<String>,
        warehouse_model: impl Into<String>,
        rental_model: impl Into<String>,
    ) -> Self {
        Self {
            rental_prefix: rental_prefix.into(),
            warehouse_model: warehouse_model.into(),
            rental_model: rental_model.into(),
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(
            config.rental_serial_prefix.clone(),
            config.warehouse_model.clone(),
            config.rental_model.clone(),
        )
    }

    pub fn classify(&self, serial: &SerialNumber) -> Fleet {
        if !self.rental_prefix.is_empty() && serial.as_str().starts_with(&self.rental_prefix) {
            Fleet::Rental
        } else {
            Fleet::Warehouse
        }
    }

    pub fn model_for(&self, fleet: Fleet) -> &str {
        match fleet {
            Fleet::Warehouse => &self.warehouse_model,
            Fleet::Rental => &self.rental_model,
        }
    }

    /// History event recorded when a terminal of `fleet` is created.
    pub fn intake_event(fleet: Fleet) -> EventKind {
        match fleet {
            Fleet::Warehouse => EventKind::AddedToWarehouse,
            Fleet::Rental => EventKind::AddedToRentalFleet,
        }
    }
}

impl Default for FleetClassifier {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

impl IntakeChannel {
    /// Tiers this channel may place terminals into.
    pub fn tiers(&self) -> &'static [ShelfTier] {
        match self {
            IntakeChannel::Warehouse => &[ShelfTier::Upper, ShelfTier::Lower],
            IntakeChannel::Rental => &[ShelfTier::Rental],
        }
    }

    pub fn accepts_tier(&self, tier: ShelfTier) -> bool {
        self.tiers().contains(&tier)
    }

    pub fn fleet(&self) -> Fleet {
        match self {
            IntakeChannel::Warehouse => Fleet::Warehouse,
            IntakeChannel::Rental => Fleet::Rental,
        }
    }
}

/// Checks that a serial and target section match the intake channel.
///
/// # Errors
/// - `SerialChannelMismatch`: rental serial on the warehouse intake or the reverse
/// - `SectionChannelMismatch`: section tier not served by the channel
pub fn validate_intake(
    channel: IntakeChannel,
    classifier: &FleetClassifier,
    serial: &SerialNumber,
    section: Option<&ShelfSection>,
) -> LedgerResult<()> {
    if classifier.classify(serial) != channel.fleet() {
        return Err(LedgerError::SerialChannelMismatch {
            serial: serial.clone(),
            channel: channel.to_string(),
        });
    }
    if let Some(section) = section {
        if !channel.accepts_tier(section.tier) {
            return Err(LedgerError::SectionChannelMismatch {
                section: section.id.clone(),
                tier: section.tier,
                channel: channel.to_string(),
            });
        }
    }
    Ok(())
}

/// Calendar used for verification expiry.
///
/// Expiry compares dates, not instants, so the warehouse's local offset
/// decides when a day ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarehouseCalendar {
    offset: FixedOffset,
}

impl WarehouseCalendar {
    /// Builds a calendar for a UTC offset in seconds. Out-of-range offsets
    /// fall back to UTC.
    pub fn from_offset_secs(secs: i32) -> Self {
        Self {
            offset: FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix()),
        }
    }

    pub fn utc() -> Self {
        Self::from_offset_secs(0)
    }

    pub fn today(&self, now: Timestamp) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }
}

impl Default for WarehouseCalendar {
    fn default() -> Self {
        Self::utc()
    }
}
