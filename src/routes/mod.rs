pub mod host;
pub mod rsvp;
