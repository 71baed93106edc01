pub mod completions;
pub mod init;
pub mod load;
pub mod merge;
pub mod series;
pub mod usage;
