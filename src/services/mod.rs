pub mod stream_prober;

pub use stream_prober::{
    HttpReachabilityProbe, ProbeJob, ProbeOutcome, ProbeReport, ProbeTarget, ReachabilityProbe,
    StatusProber,
};
