//! Looped-buffer playback and brown noise generation.

/// Deterministic white noise in `[-1, 1)` via xorshift64*.
///
/// Seeded so that generated buffers are reproducible under test.
#[derive(Debug, Clone)]
struct WhiteNoise {
    state: u64,
}

impl WhiteNoise {
    fn new(seed: u64) -> Self {
        // xorshift state must be non-zero
        Self {
            state: seed.max(1),
        }
    }

    fn next_sample(&mut self) -> f64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        let bits = self.state.wrapping_mul(0x2545_F491_4F6C_DD1D);
        ((bits >> 11) as f64 / (1_u64 << 53) as f64) * 2.0 - 1.0
    }
}

/// Generates `seconds` of brown noise at `sample_rate`.
///
/// White noise through a leaky integrator, producing the deep rumble used
/// for the breath bed. The integrator constants keep the output inside
/// `[-1, 1]` without a separate normalization pass.
pub fn brown_noise(sample_rate: u32, seconds: f32, seed: u64) -> Vec<f64> {
    let len = (sample_rate as f64 * seconds as f64) as usize;
    let mut white = WhiteNoise::new(seed);
    let mut last = 0.0_f64;
    let mut buffer = Vec::with_capacity(len);

    for _ in 0..len {
        let sample = (last + 0.02 * white.next_sample()) / 1.02;
        last = sample;
        buffer.push(sample);
    }

    buffer
}

/// Plays a mono buffer back sample by sample, optionally looping.
///
/// The graph's analogue of a buffer-source node: the noise bed is a short
/// buffer looped for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct BufferSource {
    buffer: Vec<f64>,
    position: usize,
    looping: bool,
}

impl BufferSource {
    pub fn looping(buffer: Vec<f64>) -> Self {
        Self {
            buffer,
            position: 0,
            looping: true,
        }
    }

    pub fn one_shot(buffer: Vec<f64>) -> Self {
        Self {
            buffer,
            position: 0,
            looping: false,
        }
    }

    /// Next sample, or silence once a non-looping buffer is exhausted.
    pub fn next_sample(&mut self) -> f64 {
        if self.position >= self.buffer.len() {
            if !self.looping || self.buffer.is_empty() {
                return 0.0;
            }
            self.position = 0;
        }

        let sample = self.buffer[self.position];
        self.position += 1;
        sample
    }
}
