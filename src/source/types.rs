//! Record types delivered by the acquisition source.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

/// How channel samples are arranged inside a record's raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelLayout {
    /// One channel, samples back to back
    OneChannel,
    /// Two channels, all of channel 0 followed by all of channel 1
    TwoChannelSeparate,
    /// Two channels, samples alternating `<ch0><ch1><ch0><ch1>...`
    TwoChannelInterleaved,
}

impl ChannelLayout {
    /// Parse the numeric mode code used by the acquisition request.
    pub fn from_code(code: u8) -> Result<Self, DecodeError> {
        match code {
            0 => Ok(ChannelLayout::OneChannel),
            1 => Ok(ChannelLayout::TwoChannelSeparate),
            2 => Ok(ChannelLayout::TwoChannelInterleaved),
            other => Err(DecodeError::UnsupportedLayout(other)),
        }
    }

    /// Numeric mode code for this layout.
    pub fn code(self) -> u8 {
        match self {
            ChannelLayout::OneChannel => 0,
            ChannelLayout::TwoChannelSeparate => 1,
            ChannelLayout::TwoChannelInterleaved => 2,
        }
    }

    /// Number of channels carried by this layout.
    pub fn n_channels(self) -> usize {
        match self {
            ChannelLayout::OneChannel => 1,
            ChannelLayout::TwoChannelSeparate | ChannelLayout::TwoChannelInterleaved => 2,
        }
    }

    /// Parse a layout name (`single`, `separate`, `interleaved`).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" | "one" | "one_channel" => Some(ChannelLayout::OneChannel),
            "separate" | "two_channel_separate" => Some(ChannelLayout::TwoChannelSeparate),
            "interleaved" | "two_channel_interleaved" => {
                Some(ChannelLayout::TwoChannelInterleaved)
            }
            _ => None,
        }
    }
}

/// One fixed-size block of raw samples as delivered by the acquisition source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Identifies a contiguous run of records
    pub acquisition_id: u64,
    /// Record identifier assigned by the source
    pub record_id: u64,
    /// Timestamp of the first sample, in nanoseconds
    pub timestamp_ns: u64,
    /// Arrangement of channels inside `data`
    pub layout: ChannelLayout,
    /// Raw little-endian sample bytes
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(
        acquisition_id: u64,
        record_id: u64,
        timestamp_ns: u64,
        layout: ChannelLayout,
        data: Vec<u8>,
    ) -> Self {
        Self {
            acquisition_id,
            record_id,
            timestamp_ns,
            layout,
            data,
        }
    }

    /// Build a record from a raw layout code, as it arrives off the wire.
    pub fn from_raw(
        acquisition_id: u64,
        record_id: u64,
        timestamp_ns: u64,
        layout_code: u8,
        data: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        let layout = ChannelLayout::from_code(layout_code)?;
        Ok(Self::new(acquisition_id, record_id, timestamp_ns, layout, data))
    }

    /// Number of raw bytes in this record.
    pub fn n_bytes(&self) -> usize {
        self.data.len()
    }
}
