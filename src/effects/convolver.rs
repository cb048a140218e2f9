//! Uniform partitioned FFT convolution.
//!
//! Convolves the audio bus with a long impulse response in real time by
//! splitting the response into equal partitions and keeping a frequency
//! delay line of recent input spectra. Input arrives in arbitrary block
//! sizes; internally it is re-blocked to the partition size, so the wet
//! signal carries up to one partition of latency while the first chunk
//! fills.

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

/// Input samples per partition. The FFT size is twice this.
const PARTITION: usize = 512;
const FFT_SIZE: usize = PARTITION * 2;

/// Mono partitioned convolver for one channel of the impulse response.
pub struct Convolver {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    /// Spectra of the impulse-response partitions.
    partitions: Vec<Vec<Complex32>>,
    /// Spectra of recent input chunks, newest first.
    history: VecDeque<Vec<Complex32>>,
    /// Overlap-add tail carried into the next chunk.
    overlap: Vec<f32>,
    /// Input waiting to fill a partition.
    pending: Vec<f32>,
    /// Processed wet samples ready to emit.
    ready: VecDeque<f32>,
}

impl Convolver {
    /// Build a convolver for `impulse`. Returns `None` for an empty
    /// impulse; callers skip the wet path in that case.
    pub fn new(impulse: &[f32]) -> Option<Self> {
        if impulse.is_empty() {
            return None;
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let ifft = planner.plan_fft_inverse(FFT_SIZE);

        let partitions: Vec<Vec<Complex32>> = impulse
            .chunks(PARTITION)
            .map(|chunk| {
                let mut buf = vec![Complex32::new(0.0, 0.0); FFT_SIZE];
                for (i, &s) in chunk.iter().enumerate() {
                    buf[i].re = s;
                }
                fft.process(&mut buf);
                buf
            })
            .collect();

        let count = partitions.len();
        Some(Convolver {
            fft,
            ifft,
            partitions,
            history: VecDeque::with_capacity(count),
            overlap: vec![0.0; PARTITION],
            pending: Vec::with_capacity(PARTITION),
            ready: VecDeque::new(),
        })
    }

    /// Convolve `input` into `output` (same length). Emits zeros until the
    /// first full partition has been processed.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        for &s in input {
            self.pending.push(s);
            if self.pending.len() == PARTITION {
                self.process_partition();
            }
        }
        for slot in output.iter_mut() {
            *slot = self.ready.pop_front().unwrap_or(0.0);
        }
    }

    fn process_partition(&mut self) {
        let mut buf = vec![Complex32::new(0.0, 0.0); FFT_SIZE];
        for (i, &s) in self.pending.iter().enumerate() {
            buf[i].re = s;
        }
        self.pending.clear();
        self.fft.process(&mut buf);

        self.history.push_front(buf);
        self.history.truncate(self.partitions.len());

        let mut acc = vec![Complex32::new(0.0, 0.0); FFT_SIZE];
        for (spectrum, partition) in self.history.iter().zip(self.partitions.iter()) {
            for i in 0..FFT_SIZE {
                acc[i] += spectrum[i] * partition[i];
            }
        }

        self.ifft.process(&mut acc);
        let scale = 1.0 / FFT_SIZE as f32;
        for i in 0..PARTITION {
            self.ready.push_back(acc[i].re * scale + self.overlap[i]);
            self.overlap[i] = acc[PARTITION + i].re * scale;
        }
    }

    /// Drop all buffered signal, keeping the impulse response.
    pub fn clear(&mut self) {
        self.history.clear();
        self.overlap.fill(0.0);
        self.pending.clear();
        self.ready.clear();
    }
}
