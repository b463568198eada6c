//! Slice output types.

use crate::core::header::DigitizerParams;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

const NS_PER_SEC: f64 = 1.0e9;

/// Identity of the record a channel's data started in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub acquisition_id: u64,
    pub record_id: u64,
    pub timestamp_ns: u64,
}

/// Metadata carried by every slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceHeader {
    pub slice_number: u64,
    pub n_channels: usize,
    /// First slice after an acquisition boundary (or the run start)
    pub is_new_acquisition: bool,
    pub sample_rate_hz: f64,
    pub slice_length: usize,
    pub record_length: usize,
    /// `stride / slice_length`
    pub non_overlap_fraction: f64,
    /// Seconds since the start of the run at the first sample
    pub time_in_run: f64,
    pub start_record_number: u64,
    pub start_sample_number: usize,
    pub end_record_number: u64,
    pub end_sample_number: usize,
    /// Per-channel identity of the record the slice started in
    pub channels: Vec<ChannelInfo>,
}

impl SliceHeader {
    /// Seconds per sample.
    pub fn bin_width(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    /// Duration covered by the slice, in seconds.
    pub fn slice_duration(&self) -> f64 {
        self.slice_length as f64 * self.bin_width()
    }

    /// Time in run of the `sample`-th sample of the slice.
    pub fn time_in_run_at_sample(&self, sample: usize) -> f64 {
        self.time_in_run + self.bin_width() * sample as f64
    }

    /// Absolute `(record number, sample in record)` of the `sample`-th sample.
    ///
    /// Only meaningful for slices that do not straddle skipped records, which
    /// holds for every emitted slice.
    pub fn record_and_sample_at(&self, sample: usize) -> (u64, usize) {
        let offset = self.start_sample_number + sample;
        (
            self.start_record_number + (offset / self.record_length) as u64,
            offset % self.record_length,
        )
    }

    /// Timestamp in ns of the `sample`-th sample on `channel`.
    ///
    /// Counted from the timestamp of the record the slice started in, so the
    /// slice's start offset within that record is included.
    pub fn timestamp_at_sample(&self, sample: usize, channel: usize) -> Option<u64> {
        let samples_in = (self.start_sample_number + sample) as f64;
        self.channels
            .get(channel)
            .map(|c| c.timestamp_ns + (samples_in * self.bin_width() * NS_PER_SEC).round() as u64)
    }
}

/// Per-channel statistics of a slice, for display.
///
/// `std_dev_volts` is the sample standard deviation and is NaN for a
/// single-sample slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: usize,
    pub mean_volts: f64,
    pub std_dev_volts: f64,
    pub min_raw: u64,
    pub max_raw: u64,
}

/// A fixed-length, per-channel window of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub header: SliceHeader,
    samples: Vec<Vec<u64>>,
}

impl Slice {
    pub(crate) fn new(header: SliceHeader, samples: Vec<Vec<u64>>) -> Self {
        Self { header, samples }
    }

    pub fn slice_number(&self) -> u64 {
        self.header.slice_number
    }

    pub fn n_channels(&self) -> usize {
        self.samples.len()
    }

    /// Raw samples of one channel.
    pub fn channel(&self, index: usize) -> &[u64] {
        &self.samples[index]
    }

    /// Calibrated samples of one channel, in volts.
    pub fn volts(&self, index: usize, digitizer: &DigitizerParams) -> Vec<f64> {
        digitizer.convert(&self.samples[index])
    }

    /// Calibrated statistics of one channel.
    pub fn summary(&self, index: usize, digitizer: &DigitizerParams) -> ChannelSummary {
        let raw = &self.samples[index];
        let volts = digitizer.convert(raw);
        ChannelSummary {
            channel: index,
            mean_volts: volts.iter().mean(),
            std_dev_volts: volts.iter().std_dev(),
            min_raw: raw.iter().fold(u64::MAX, |a, &b| a.min(b)),
            max_raw: raw.iter().fold(0, |a, &b| a.max(b)),
        }
    }

    /// Take ownership of the per-channel sample arrays.
    pub fn into_samples(self) -> Vec<Vec<u64>> {
        self.samples
    }
}
