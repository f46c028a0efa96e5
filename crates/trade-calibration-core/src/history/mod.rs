pub mod aggregate;
pub mod coerce;
pub mod record;
