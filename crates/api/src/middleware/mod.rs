//! Request extractors.

mod actor;

pub use actor::{ActorContext, ACTOR_HEADER, BUSINESS_HEADER};
