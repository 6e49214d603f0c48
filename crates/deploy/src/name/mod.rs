//! IPNS naming: signing keys, signed records, and the services that resolve
//! and publish them.

pub mod key;
pub mod publisher;
pub mod record;
pub mod service;
pub mod w3name;

pub use key::{IpnsName, NameKey};
pub use publisher::NamePublisher;
pub use record::{Revision, SignedRecord};
pub use service::{MemoryNameService, NameService, Resolution};
pub use w3name::W3NameClient;
