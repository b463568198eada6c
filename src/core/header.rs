//! Run header and validated slice geometry.
//!
//! A [`RunHeader`] is built once per session from the slicer and acquisition
//! configuration. Building it is where configuration errors are caught, so a
//! session that exists always has a consistent geometry.

use crate::config::{AcquisitionConfig, SlicerConfig};
use crate::error::{Result, SlicerError};
use crate::source::ChannelLayout;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sample widths the decoder understands, in bytes.
pub const SUPPORTED_SAMPLE_WIDTHS: [usize; 4] = [1, 2, 4, 8];

/// Digitizer calibration, mapping raw values to volts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitizerParams {
    pub bit_depth: u32,
    pub data_type_size: usize,
    pub voltage_min: f64,
    pub voltage_range: f64,
    /// Number of distinct raw values, `2^bit_depth`
    pub levels: f64,
    /// Volts per raw count
    pub voltage_resolution: f64,
}

impl DigitizerParams {
    pub fn new(bit_depth: u32, data_type_size: usize, voltage_min: f64, voltage_range: f64) -> Self {
        let levels = 2f64.powi(bit_depth as i32);
        Self {
            bit_depth,
            data_type_size,
            voltage_min,
            voltage_range,
            levels,
            voltage_resolution: voltage_range / levels,
        }
    }

    /// Convert one raw sample to volts.
    pub fn to_volts(&self, raw: u64) -> f64 {
        self.voltage_min + raw as f64 * self.voltage_resolution
    }

    /// Convert a run of raw samples to volts.
    pub fn convert(&self, raw: &[u64]) -> Vec<f64> {
        raw.iter().map(|&r| self.to_volts(r)).collect()
    }
}

/// Immutable slicing geometry, derived and validated at session setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceGeometry {
    /// Samples per slice
    pub slice_length: usize,
    /// Samples between slice starts (never less than `slice_length`)
    pub stride: usize,
    /// Samples per channel in each record
    pub record_length: usize,
    /// Digitizer sample rate in Hz
    pub sample_rate_hz: f64,
}

impl SliceGeometry {
    /// Seconds per sample.
    pub fn bin_width(&self) -> f64 {
        1.0 / self.sample_rate_hz
    }

    /// `stride / slice_length`; 1.0 means back-to-back slices.
    pub fn non_overlap_fraction(&self) -> f64 {
        self.stride as f64 / self.slice_length as f64
    }

    /// Samples dropped between consecutive slices.
    pub fn gap(&self) -> usize {
        self.stride - self.slice_length
    }
}

/// Description of a slicing run, handed to the emitter before any slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunHeader {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub layout: ChannelLayout,
    pub n_channels: usize,
    pub sample_width: usize,
    pub digitizer: DigitizerParams,
    pub geometry: SliceGeometry,
}

impl RunHeader {
    /// Validate the configuration and build the run header.
    pub fn new(slicer: &SlicerConfig, acquisition: &AcquisitionConfig) -> Result<Self> {
        let geometry = validate(slicer, acquisition)?;
        Ok(Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            description: acquisition.description.clone(),
            layout: acquisition.layout,
            n_channels: acquisition.layout.n_channels(),
            sample_width: acquisition.sample_width,
            digitizer: DigitizerParams::new(
                acquisition.bit_depth,
                acquisition.sample_width,
                acquisition.voltage_min,
                acquisition.voltage_range,
            ),
            geometry,
        })
    }

    /// Raw bytes expected in every record.
    pub fn record_bytes(&self) -> usize {
        self.geometry.record_length * self.n_channels * self.sample_width
    }
}

fn validate(slicer: &SlicerConfig, acquisition: &AcquisitionConfig) -> Result<SliceGeometry> {
    if slicer.slice_length == 0 {
        return Err(SlicerError::Configuration(
            "slice length must be greater than zero".to_string(),
        ));
    }

    let stride = slicer.resolved_stride();
    if stride < slicer.slice_length {
        return Err(SlicerError::Configuration(format!(
            "stride cannot be less than the slice length: {} < {}",
            stride, slicer.slice_length
        )));
    }

    if acquisition.record_length == 0 {
        return Err(SlicerError::Configuration(
            "record length must be greater than zero".to_string(),
        ));
    }

    // the skip counter must hold every record a stride can span
    if (stride / acquisition.record_length) as u64 >= u32::MAX as u64 {
        return Err(SlicerError::Configuration(format!(
            "stride of {} samples spans too many {}-sample records",
            stride, acquisition.record_length
        )));
    }

    if !SUPPORTED_SAMPLE_WIDTHS.contains(&acquisition.sample_width) {
        return Err(SlicerError::Configuration(format!(
            "unsupported sample width {} (expected one of {:?})",
            acquisition.sample_width, SUPPORTED_SAMPLE_WIDTHS
        )));
    }

    let max_bits = 8 * acquisition.sample_width as u32;
    if acquisition.bit_depth == 0 || acquisition.bit_depth > max_bits {
        return Err(SlicerError::Configuration(format!(
            "bit depth {} does not fit a {}-byte sample",
            acquisition.bit_depth, acquisition.sample_width
        )));
    }

    if !acquisition.sample_rate_hz.is_finite() || acquisition.sample_rate_hz <= 0.0 {
        return Err(SlicerError::Configuration(format!(
            "sample rate must be positive, got {}",
            acquisition.sample_rate_hz
        )));
    }

    Ok(SliceGeometry {
        slice_length: slicer.slice_length,
        stride,
        record_length: acquisition.record_length,
        sample_rate_hz: acquisition.sample_rate_hz,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acquisition() -> AcquisitionConfig {
        AcquisitionConfig {
            record_length: 8,
            sample_rate_hz: 100.0,
            ..AcquisitionConfig::default()
        }
    }

    #[test]
    fn test_zero_stride_means_slice_length() {
        let header = RunHeader::new(&SlicerConfig::new(4, 0), &acquisition()).unwrap();
        assert_eq!(header.geometry.stride, 4);
        assert_eq!(header.geometry.non_overlap_fraction(), 1.0);
        assert_eq!(header.geometry.gap(), 0);
    }

    #[test]
    fn test_stride_below_slice_length_rejected() {
        let err = RunHeader::new(&SlicerConfig::new(8, 4), &acquisition()).unwrap_err();
        assert!(matches!(err, SlicerError::Configuration(_)));
    }

    #[test]
    fn test_stride_spanning_too_many_records_rejected() {
        let mut acq = acquisition();
        acq.record_length = 1;
        let err = RunHeader::new(&SlicerConfig::new(4, usize::MAX), &acq).unwrap_err();
        assert!(matches!(err, SlicerError::Configuration(_)));

        let longest = u32::MAX as usize - 1;
        assert!(RunHeader::new(&SlicerConfig::new(4, longest), &acq).is_ok());
        assert!(RunHeader::new(&SlicerConfig::new(4, longest + 1), &acq).is_err());
    }

    #[test]
    fn test_bad_acquisition_rejected() {
        let slicer = SlicerConfig::new(4, 0);

        let mut acq = acquisition();
        acq.sample_width = 3;
        assert!(RunHeader::new(&slicer, &acq).is_err());

        let mut acq = acquisition();
        acq.bit_depth = 12;
        assert!(RunHeader::new(&slicer, &acq).is_err());

        let mut acq = acquisition();
        acq.record_length = 0;
        assert!(RunHeader::new(&slicer, &acq).is_err());

        let mut acq = acquisition();
        acq.sample_rate_hz = f64::NAN;
        assert!(RunHeader::new(&slicer, &acq).is_err());

        assert!(RunHeader::new(&SlicerConfig::new(0, 0), &acquisition()).is_err());
    }

    #[test]
    fn test_record_bytes() {
        let mut acq = acquisition();
        acq.layout = ChannelLayout::TwoChannelInterleaved;
        acq.sample_width = 2;
        acq.bit_depth = 14;
        let header = RunHeader::new(&SlicerConfig::new(4, 0), &acq).unwrap();
        assert_eq!(header.n_channels, 2);
        assert_eq!(header.record_bytes(), 8 * 2 * 2);
    }

    #[test]
    fn test_digitizer_calibration() {
        let params = DigitizerParams::new(8, 1, -0.25, 0.5);
        assert_eq!(params.levels, 256.0);
        assert!((params.to_volts(0) + 0.25).abs() < 1e-12);
        assert!((params.to_volts(128) - 0.0).abs() < 1e-12);
        assert_eq!(params.convert(&[0, 256]).len(), 2);
    }
}
