// Clients for everything the map talks to outside the process.

pub mod geocoding;
pub mod nearby;
pub mod notify;
