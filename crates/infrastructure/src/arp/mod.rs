pub mod packet;
pub mod resolver;

pub use packet::{ArpOperation, ArpPacket};
pub use resolver::RawArpResolver;
