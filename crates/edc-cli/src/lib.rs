//! Library components for the EDC command line.

pub mod logging;
