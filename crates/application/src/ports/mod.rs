mod arp_resolver;

pub use arp_resolver::ArpResolver;
