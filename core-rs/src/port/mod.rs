/**
 * port module
 * Local port availability probing
 */

pub mod prober;

pub use prober::{PortProber, ProbeOutcome, ProbeReport};
