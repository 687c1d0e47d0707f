mod helpers;
mod minor_units;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use minor_units::{MinorUnits, MinorUnitsConversionError, EURO_CURRENCY_CODE};
pub use secret::Secret;
