pub mod error;
pub mod invite;
pub mod kv;
pub mod rate_limit;
pub mod repos;
pub mod rsvp;
