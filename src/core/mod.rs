/// The counter abstraction shared by every storage kind.
pub mod counter;
