//! One CSV row of a shipment manifest

/// A validated manifest row.
///
/// Keys are non-empty and `quantity` is already an integer, so every field can
/// be used directly as a MERGE key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRow {
    pub trailer_id: String,
    pub sid: String,
    pub cisco_id: String,
    pub part_number: String,
    pub quantity: i64,
}

impl ShipmentRow {
    pub fn new(
        trailer_id: impl Into<String>,
        sid: impl Into<String>,
        cisco_id: impl Into<String>,
        part_number: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            trailer_id: trailer_id.into(),
            sid: sid.into(),
            cisco_id: cisco_id.into(),
            part_number: part_number.into(),
            quantity,
        }
    }
}
