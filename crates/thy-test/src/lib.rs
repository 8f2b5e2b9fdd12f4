#![doc = "Test doubles shared by the thy crates."]

mod store;
mod transport;

pub use store::MemoryStore;
pub use transport::MockTransport;
