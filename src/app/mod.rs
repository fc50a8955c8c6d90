//! The command-line front end: argument parsing, output sinks and task control.

pub mod cli;
pub mod sink;
pub mod tasks;

pub use cli::Cli;
pub use sink::{ChannelSink, CollectingSink, ConsoleSink};
pub use tasks::{spawn_search, SearchTask};
