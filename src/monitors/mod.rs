pub mod probe;

pub use probe::{CheckResult, HttpProber, Prober, Status};
