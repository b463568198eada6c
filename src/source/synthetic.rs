//! Deterministic record generator standing in for a digitizer.
//!
//! Used by the command line tool and the tests. Samples are a function of the
//! absolute stream position, so any slice can be checked against what the
//! source must have produced at that position.

use crate::config::{AcquisitionConfig, SyntheticSourceConfig, Waveform};
use crate::source::types::{ChannelLayout, Record};
use std::f64::consts::PI;

const NSEC_PER_SEC: f64 = 1.0e9;

/// Iterator over generated records.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    record_length: usize,
    layout: ChannelLayout,
    sample_width: usize,
    bit_depth: u32,
    sample_rate_hz: f64,
    config: SyntheticSourceConfig,
    next_index: u64,
}

impl SyntheticSource {
    pub fn new(acquisition: &AcquisitionConfig, config: SyntheticSourceConfig) -> Self {
        Self {
            record_length: acquisition.record_length,
            layout: acquisition.layout,
            sample_width: acquisition.sample_width,
            bit_depth: acquisition.bit_depth,
            sample_rate_hz: acquisition.sample_rate_hz,
            config,
            next_index: 0,
        }
    }

    /// Raw value of `channel` at absolute sample `position` in the stream.
    ///
    /// For a ramp, channel 0 counts up with the position and channel 1 counts
    /// down, both wrapping at the bit depth. For a sine, channel 1 lags by a
    /// quarter period.
    pub fn sample(&self, channel: usize, position: u64) -> u64 {
        let mask = self.mask();
        match self.config.waveform {
            Waveform::Ramp => {
                let up = position & mask;
                if channel == 0 {
                    up
                } else {
                    mask - up
                }
            }
            Waveform::Sine { frequency_hz } => {
                let t = position as f64 / self.sample_rate_hz;
                let phase = 2.0 * PI * frequency_hz * t - channel as f64 * PI / 2.0;
                let full_scale = mask as f64;
                ((phase.sin() + 1.0) * 0.5 * full_scale).round() as u64
            }
        }
    }

    /// Acquisition id of the record at `index`.
    pub fn acquisition_of(&self, index: u64) -> u64 {
        match self.config.acquisition_every {
            0 => 0,
            every => index / every,
        }
    }

    fn mask(&self) -> u64 {
        if self.bit_depth >= 64 {
            u64::MAX
        } else {
            (1u64 << self.bit_depth) - 1
        }
    }

    fn timestamp_of(&self, index: u64) -> u64 {
        let samples = index as f64 * self.record_length as f64;
        let offset_ns = (samples * NSEC_PER_SEC / self.sample_rate_hz).round() as u64;
        self.config.start_timestamp_ns + offset_ns
    }

    fn generate(&self, index: u64) -> Record {
        let first = index * self.record_length as u64;
        let channels: Vec<Vec<u64>> = (0..self.layout.n_channels())
            .map(|c| {
                (0..self.record_length as u64)
                    .map(|i| self.sample(c, first + i))
                    .collect()
            })
            .collect();

        Record::new(
            self.acquisition_of(index),
            index,
            self.timestamp_of(index),
            self.layout,
            encode_record(self.layout, self.sample_width, &channels),
        )
    }
}

impl Iterator for SyntheticSource {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.next_index >= self.config.n_records {
            return None;
        }
        let record = self.generate(self.next_index);
        self.next_index += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.config.n_records - self.next_index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SyntheticSource {}

/// Pack per-channel samples into raw record bytes for `layout`.
///
/// Each sample is written little-endian in `sample_width` bytes.
pub fn encode_record(layout: ChannelLayout, sample_width: usize, channels: &[Vec<u64>]) -> Vec<u8> {
    let len = channels.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(len * channels.len() * sample_width);
    let mut put = |value: u64| data.extend_from_slice(&value.to_le_bytes()[..sample_width]);

    match layout {
        ChannelLayout::OneChannel | ChannelLayout::TwoChannelSeparate => {
            for channel in channels {
                channel.iter().for_each(|&v| put(v));
            }
        }
        ChannelLayout::TwoChannelInterleaved => {
            for i in 0..len {
                for channel in channels {
                    put(channel[i]);
                }
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder::RecordDecoder;

    fn acquisition(layout: ChannelLayout, width: usize, bit_depth: u32) -> AcquisitionConfig {
        AcquisitionConfig {
            record_length: 8,
            layout,
            sample_rate_hz: 1.0e6,
            sample_width: width,
            bit_depth,
            ..AcquisitionConfig::default()
        }
    }

    #[test]
    fn test_ramp_follows_stream_position() {
        let acq = acquisition(ChannelLayout::OneChannel, 2, 12);
        let records: Vec<Record> = SyntheticSource::new(&acq, SyntheticSourceConfig::default())
            .take(3)
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].record_id, 2);
        assert_eq!(records[2].timestamp_ns, 16_000);

        let decoder = RecordDecoder::new(ChannelLayout::OneChannel, 8, 2);
        let mut buffers = decoder.buffers();
        decoder.decode(&records[2], &mut buffers).unwrap();
        assert_eq!(buffers.channel(0), &[16, 17, 18, 19, 20, 21, 22, 23]);
    }

    #[test]
    fn test_interleaved_two_channels_decode() {
        let acq = acquisition(ChannelLayout::TwoChannelInterleaved, 1, 8);
        let record = SyntheticSource::new(&acq, SyntheticSourceConfig::default())
            .next()
            .unwrap();
        assert_eq!(&record.data[..4], &[0, 255, 1, 254]);

        let decoder = RecordDecoder::new(ChannelLayout::TwoChannelInterleaved, 8, 1);
        let mut buffers = decoder.buffers();
        decoder.decode(&record, &mut buffers).unwrap();
        assert_eq!(buffers.channel(1)[0], 255);
        assert_eq!(buffers.channel(1)[7], 248);
    }

    #[test]
    fn test_acquisition_rolls_over() {
        let acq = acquisition(ChannelLayout::OneChannel, 1, 8);
        let config = SyntheticSourceConfig {
            n_records: 5,
            acquisition_every: 2,
            ..SyntheticSourceConfig::default()
        };
        let ids: Vec<u64> = SyntheticSource::new(&acq, config)
            .map(|r| r.acquisition_id)
            .collect();
        assert_eq!(ids, vec![0, 0, 1, 1, 2]);
    }

    #[test]
    fn test_sine_stays_in_range() {
        let acq = acquisition(ChannelLayout::TwoChannelSeparate, 1, 8);
        let config = SyntheticSourceConfig {
            waveform: Waveform::Sine {
                frequency_hz: 125_000.0,
            },
            ..SyntheticSourceConfig::default()
        };
        let source = SyntheticSource::new(&acq, config);
        assert_eq!(source.sample(0, 0), 128);
        assert_eq!(source.sample(0, 2), 255);
        assert_eq!(source.sample(1, 0), 0);
        assert!((0..64).all(|p| source.sample(0, p) <= 255));
    }

    #[test]
    fn test_full_width_mask() {
        let acq = acquisition(ChannelLayout::OneChannel, 8, 64);
        let source = SyntheticSource::new(&acq, SyntheticSourceConfig::default());
        assert_eq!(source.sample(0, 12345), 12345);
        assert_eq!(source.sample(1, 0), u64::MAX);
    }

    #[test]
    fn test_exact_size() {
        let acq = acquisition(ChannelLayout::OneChannel, 1, 8);
        let mut source = SyntheticSource::new(&acq, SyntheticSourceConfig::default());
        assert_eq!(source.len(), 16);
        source.next();
        assert_eq!(source.len(), 15);
    }
}
