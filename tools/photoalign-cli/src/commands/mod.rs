pub mod check;
pub mod devices;
pub mod snap;
