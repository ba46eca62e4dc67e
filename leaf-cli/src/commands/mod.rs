//! One module per subcommand group.

pub mod infractions;
pub mod migrate;
pub mod tags;
