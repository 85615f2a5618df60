pub mod alert;
pub mod customer;
pub mod message;
pub mod validation;

pub use alert::{
    AddonValue, Addons, Alert, AlertEvent, AlertKey, AlertSeverity, AlertTemplate, KeepAliveAlert,
};
pub use customer::Customer;
pub use message::{EinsteinMessage, Location, DEFAULT_ORGANISATION_NAME};
pub use validation::{validate, ValidationError, ValidationReason};
