pub mod orchestration;

pub use orchestration::{BuildOutcome, BuildRequest, Builder, PlannedBuild};
