// Assessment wizard: proficiency model, stage machine, normalizer, sessions.
// Every operation here is synchronous and pure except the session store.

pub mod catalog;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod proficiency;
pub mod session;
pub mod wizard;
