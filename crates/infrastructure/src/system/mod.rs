pub mod interface;

pub use interface::LinkInterface;
