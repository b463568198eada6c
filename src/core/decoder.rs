//! Unpacks raw records into per-channel sample buffers.
//!
//! Samples are little-endian unsigned integers of the configured width and
//! are widened to `u64`. The channel buffers are allocated once per session
//! and overwritten by every decoded record.

use crate::core::header::RunHeader;
use crate::core::slice::ChannelInfo;
use crate::error::DecodeError;
use crate::source::{ChannelLayout, Record};

/// Per-channel samples of the record currently being sliced.
#[derive(Debug, Clone)]
pub struct ChannelBuffers {
    samples: Vec<Vec<u64>>,
    info: ChannelInfo,
}

impl ChannelBuffers {
    /// Allocate zeroed buffers for `n_channels` channels of `record_length` samples.
    pub fn new(n_channels: usize, record_length: usize) -> Self {
        Self {
            samples: vec![vec![0; record_length]; n_channels],
            info: ChannelInfo::default(),
        }
    }

    pub fn n_channels(&self) -> usize {
        self.samples.len()
    }

    /// Samples held per channel.
    pub fn record_length(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// Samples of one channel.
    pub fn channel(&self, index: usize) -> &[u64] {
        &self.samples[index]
    }

    /// Iterate over all channels.
    pub fn channels(&self) -> impl Iterator<Item = &[u64]> {
        self.samples.iter().map(|c| c.as_slice())
    }

    /// Identity of the record these samples came from.
    pub fn info(&self) -> ChannelInfo {
        self.info
    }
}

/// Decodes records of one fixed layout and sample width.
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    layout: ChannelLayout,
    record_length: usize,
    sample_width: usize,
}

impl RecordDecoder {
    pub fn new(layout: ChannelLayout, record_length: usize, sample_width: usize) -> Self {
        Self {
            layout,
            record_length,
            sample_width,
        }
    }

    /// Build a decoder matching a run header.
    pub fn for_header(header: &RunHeader) -> Self {
        Self::new(
            header.layout,
            header.geometry.record_length,
            header.sample_width,
        )
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Allocate buffers sized for this decoder.
    pub fn buffers(&self) -> ChannelBuffers {
        ChannelBuffers::new(self.layout.n_channels(), self.record_length)
    }

    /// Bytes expected in every record.
    pub fn expected_bytes(&self) -> usize {
        self.record_length * self.layout.n_channels() * self.sample_width
    }

    /// Unpack `record` into `buffers`.
    pub fn decode(&self, record: &Record, buffers: &mut ChannelBuffers) -> Result<(), DecodeError> {
        if record.layout != self.layout {
            return Err(DecodeError::LayoutMismatch {
                expected: self.layout,
                found: record.layout,
            });
        }

        let expected = self.expected_bytes();
        if record.data.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                found: record.data.len(),
            });
        }

        let expected_channels = self.layout.n_channels();
        if buffers.n_channels() != expected_channels
            || buffers.samples.iter().any(|c| c.len() != self.record_length)
        {
            return Err(DecodeError::BufferMismatch {
                expected_channels,
                expected_samples: self.record_length,
                channels: buffers.n_channels(),
                samples: buffers.record_length(),
            });
        }

        let width = self.sample_width;
        match self.layout {
            ChannelLayout::OneChannel => {
                unpack(&record.data, width, &mut buffers.samples[0]);
            }
            ChannelLayout::TwoChannelSeparate => {
                let (first, second) = record.data.split_at(expected / 2);
                let (ch0, ch1) = buffers.samples.split_at_mut(1);
                unpack(first, width, &mut ch0[0]);
                unpack(second, width, &mut ch1[0]);
            }
            ChannelLayout::TwoChannelInterleaved => {
                let (ch0, ch1) = buffers.samples.split_at_mut(1);
                let pairs = record.data.chunks_exact(2 * width);
                for ((pair, s0), s1) in pairs.zip(ch0[0].iter_mut()).zip(ch1[0].iter_mut()) {
                    *s0 = read_sample(&pair[..width]);
                    *s1 = read_sample(&pair[width..]);
                }
            }
        }

        buffers.info = ChannelInfo {
            acquisition_id: record.acquisition_id,
            record_id: record.record_id,
            timestamp_ns: record.timestamp_ns,
        };
        Ok(())
    }
}

fn unpack(bytes: &[u8], width: usize, out: &mut [u64]) {
    for (chunk, sample) in bytes.chunks_exact(width).zip(out.iter_mut()) {
        *sample = read_sample(chunk);
    }
}

fn read_sample(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}
