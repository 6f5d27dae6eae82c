use rand::Rng;

/// Injectable source of the simulation's randomness.
///
/// All probability branching goes through this trait so tests can supply
/// deterministic decisions instead of true randomness.
pub trait Decider {
    /// Return `true` with the given probability in `0.0..=1.0`.
    fn decide(&mut self, probability: f64) -> bool;

    /// Uniform integer in `lo..=hi`, used for generated names and email
    /// addresses.
    fn pick(&mut self, lo: u32, hi: u32) -> u32;
}

/// Production decider backed by the thread-local RNG.
#[derive(Default)]
pub struct RngDecider;

impl RngDecider {
    pub fn new() -> Self {
        Self
    }
}

impl Decider for RngDecider {
    fn decide(&mut self, probability: f64) -> bool {
        rand::thread_rng().gen::<f64>() < probability
    }

    fn pick(&mut self, lo: u32, hi: u32) -> u32 {
        rand::thread_rng().gen_range(lo..=hi)
    }
}
