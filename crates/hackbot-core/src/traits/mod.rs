//! Trait seams between the core components and their collaborators.

pub mod channel;
pub mod store;

pub use channel::Channel;
pub use store::Store;
