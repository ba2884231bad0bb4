use rand::distr::{Alphanumeric, SampleString};

pub mod item;

pub mod job;

pub mod step;

/// Generates a random name consisting of alphanumeric characters.
///
/// Used as the default name for steps and jobs when none is configured.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
