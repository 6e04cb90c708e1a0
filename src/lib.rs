pub mod libpeer;
pub mod libround;
