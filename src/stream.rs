//! Hop-size adapter for audio callbacks of arbitrary length.
//!
//! Input samples queue up until a full hop is available; every complete hop
//! goes through the pipeline and lands in the output queue. The output queue
//! starts with one hop of silence, so a block of any size up to `max_block`
//! can always be served. That costs one extra hop of delay on top of the
//! pipeline's frame delay.

use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::SuppressorConfig;
use ringbuf::{Consumer, Producer, RingBuffer};

pub struct StreamAdapter {
    pipeline: Pipeline,
    max_block: usize,

    input_producer: Producer<f32>,
    input_consumer: Consumer<f32>,
    output_producer: Producer<f32>,
    output_consumer: Consumer<f32>,

    hop_in: Vec<f32>,
    hop_out: Vec<f32>,
}

impl StreamAdapter {
    /// Wraps an existing pipeline. `max_block` is the largest slice handed to
    /// one internal pass; longer callbacks are split.
    pub fn new(pipeline: Pipeline, max_block: usize) -> Self {
        let hop = pipeline.hop_len();
        let max_block = max_block.max(1);

        // Pending input stays below hop + max_block, and so does queued output.
        let buf_cap = hop + max_block;
        let (in_prod, in_cons) = RingBuffer::<f32>::new(buf_cap).split();
        let (out_prod, out_cons) = RingBuffer::<f32>::new(buf_cap).split();

        // Prime output
        let mut out_prod_init = out_prod;
        for _ in 0..hop {
            let _ = out_prod_init.push(0.0);
        }

        log::debug!(
            "stream adapter: hop {} samples, max block {}, latency {} samples",
            hop,
            max_block,
            pipeline.latency_samples() + hop
        );

        Self {
            pipeline,
            max_block,
            input_producer: in_prod,
            input_consumer: in_cons,
            output_producer: out_prod_init,
            output_consumer: out_cons,
            hop_in: vec![0.0; hop],
            hop_out: vec![0.0; hop],
        }
    }

    pub fn from_config(config: SuppressorConfig, max_block: usize) -> Result<Self, ConfigError> {
        Ok(Self::new(Pipeline::new(config)?, max_block))
    }

    /// Processes `input` into `output`; both must have the same length, any
    /// length.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(input.len(), output.len());
        let len = input.len().min(output.len());

        for (inp, out) in input[..len]
            .chunks(self.max_block)
            .zip(output[..len].chunks_mut(self.max_block))
        {
            self.process_chunk(inp, out);
        }
        output[len..].fill(0.0);
    }

    fn process_chunk(&mut self, input: &[f32], output: &mut [f32]) {
        let hop = self.hop_in.len();
        self.input_producer.push_slice(input);

        while self.input_consumer.len() >= hop {
            self.input_consumer.pop_slice(&mut self.hop_in);
            // Both scratch buffers are hop-sized, so this cannot fail.
            if self
                .pipeline
                .process_hop(&self.hop_in, &mut self.hop_out)
                .is_err()
            {
                self.hop_out.fill(0.0);
            }
            self.output_producer.push_slice(&self.hop_out);
        }

        let served = self.output_consumer.pop_slice(output);
        output[served..].fill(0.0);
    }

    /// Total input-to-output delay in samples.
    pub fn latency_samples(&self) -> usize {
        self.pipeline.latency_samples() + self.hop_in.len()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unity_config() -> SuppressorConfig {
        SuppressorConfig {
            calib_sec: 0.1,
            highpass_hz: 0.0,
            noise_floor: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_latency_is_frame_plus_hop() {
        let adapter = StreamAdapter::from_config(unity_config(), 256).unwrap();
        assert_eq!(adapter.latency_samples(), 320 + 160);
    }

    #[test]
    fn test_irregular_blocks_are_delayed_copy() {
        let mut adapter = StreamAdapter::from_config(unity_config(), 512).unwrap();
        let delay = adapter.latency_samples();

        let mut rng = StdRng::seed_from_u64(17);
        let input: Vec<f32> = (0..20_000).map(|_| rng.gen_range(-0.5..0.5)).collect();
        let mut output = vec![0.0; input.len()];

        // callback sizes that never line up with the hop
        let sizes = [1usize, 97, 160, 333, 512, 7, 1024, 45];
        let mut pos = 0;
        let mut k = 0;
        while pos < input.len() {
            let n = sizes[k % sizes.len()].min(input.len() - pos);
            adapter.process(&input[pos..pos + n], &mut output[pos..pos + n]);
            pos += n;
            k += 1;
        }

        assert!(output[..delay].iter().all(|&v| v == 0.0));
        for i in delay..input.len() {
            assert!(
                (output[i] - input[i - delay]).abs() < 1e-4,
                "sample {i}"
            );
        }
    }

    #[test]
    fn test_exact_hop_blocks() {
        let mut adapter = StreamAdapter::from_config(unity_config(), 160).unwrap();
        let mut out = vec![1.0; 160];
        adapter.process(&[0.25; 160], &mut out);
        // first block is the primed silence
        assert!(out.iter().all(|&v| v == 0.0));
        assert_eq!(adapter.pipeline().hops_processed(), 1);
    }

    #[test]
    fn test_drives_pipeline_state() {
        let cfg = SuppressorConfig {
            calib_sec: 0.05,
            ..Default::default()
        };
        let mut adapter = StreamAdapter::from_config(cfg, 480).unwrap();
        let input = vec![0.0; 480];
        let mut output = vec![0.0; 480];
        for _ in 0..3 {
            adapter.process(&input, &mut output);
        }
        // 800 calibration samples = 5 hops
        assert_eq!(adapter.pipeline().hops_processed(), 9);
        assert_eq!(
            adapter.pipeline().state(),
            crate::pipeline::PipelineState::Running
        );
    }
}
