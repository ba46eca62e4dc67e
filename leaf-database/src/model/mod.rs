pub mod infractions;
pub mod tags;
