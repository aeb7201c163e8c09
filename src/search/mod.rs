pub mod controller;
pub mod lane;
pub mod timer;


pub use controller::*;
