//! Slice a short two-channel stream in-process and print where each slice came from.
//!
//! Run with `cargo run --example slicing_demo`.

use record_slicer::config::{AcquisitionConfig, SlicerConfig, SyntheticSourceConfig};
use record_slicer::core::{RecordOutcome, Slice, SlicerSession};
use record_slicer::source::{ChannelLayout, SyntheticSource};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let acquisition = AcquisitionConfig {
        record_length: 64,
        layout: ChannelLayout::TwoChannelInterleaved,
        sample_rate_hz: 1.0e6,
        ..AcquisitionConfig::default()
    };
    let source = SyntheticSourceConfig {
        n_records: 12,
        acquisition_every: 5,
        ..SyntheticSourceConfig::default()
    };

    // 48-sample slices, one every 100 samples
    let mut slices: Vec<Slice> = Vec::new();
    let mut session = SlicerSession::new(&SlicerConfig::new(48, 100), &acquisition, &mut slices)?;
    let digitizer = session.header().digitizer;

    for record in SyntheticSource::new(&acquisition, source) {
        let outcome = session.on_record(&record)?;
        if outcome == RecordOutcome::Skipped {
            println!("record {:>2} skipped", record.record_id);
        }
    }
    let stats = session.finish()?;
    drop(session);

    for slice in &slices {
        let h = &slice.header;
        let ch0 = slice.summary(0, &digitizer);
        println!(
            "slice {:>2} acq {} [{}:{} .. {}:{}] first sample {:>3} mean {:+.4} V{}",
            h.slice_number,
            h.channels[0].acquisition_id,
            h.start_record_number,
            h.start_sample_number,
            h.end_record_number,
            h.end_sample_number,
            slice.channel(0)[0],
            ch0.mean_volts,
            if h.is_new_acquisition { "  (new acquisition)" } else { "" }
        );
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
