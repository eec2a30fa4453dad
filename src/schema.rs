//! Shipment graph vocabulary shared by every backend.
//!
//! Property names follow the graph already in production: key properties are
//! camel-cased (`id`, `ciscoID`, `number`, `quantity`), schedule fields are
//! Pascal-cased.

pub const TRAILER: &str = "Trailer";
pub const SID: &str = "SID";
pub const PART: &str = "Part";
pub const CISCO: &str = "Cisco";
pub const SCHEDULE: &str = "Schedule";

pub const HAS_SID: &str = "HAS_SID";
pub const BELONGS_TO: &str = "BELONGS_TO";
pub const HAS_PART: &str = "HAS_PART";
pub const HAS_CISCO: &str = "HAS_CISCO";
pub const HAS_SCHEDULE: &str = "HAS_SCHEDULE";
pub const CONTAINS_PART: &str = "CONTAINS_PART";

/// Load status given to every backfilled schedule
pub const DEFAULT_LOAD_STATUS: &str = "in-transit";

/// Schedule text fields that start out empty
pub const SCHEDULE_TEXT_FIELDS: [&str; 7] = [
    "RequestDate",
    "ScheduleDate",
    "ScheduleTime",
    "CarrierCode",
    "ArrivalTime",
    "DoorNumber",
    "Email",
];
