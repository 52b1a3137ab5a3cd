//! Domain services. Each takes the caller's [`Actor`](crate::auth::Actor)
//! explicitly and performs its own authorization.

pub mod events;
pub mod guests;
pub mod media;
pub mod provisioning;
pub mod registrations;
pub mod review;
