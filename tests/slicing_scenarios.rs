//! End-to-end slicing tests through the public API.

use record_slicer::config::{AcquisitionConfig, OutputMode, SlicerConfig, SyntheticSourceConfig};
use record_slicer::core::{RecordOutcome, Slice, SlicerSession};
use record_slicer::emit::{emitter_for_mode, SliceEvent};
use record_slicer::error::{DecodeError, SlicerError};
use record_slicer::source::{ChannelLayout, Record, SyntheticSource};
use record_slicer::stats::SessionStatsSnapshot;

fn acquisition(record_length: usize, layout: ChannelLayout) -> AcquisitionConfig {
    AcquisitionConfig {
        record_length,
        layout,
        sample_rate_hz: 1.0e6,
        sample_width: 4,
        bit_depth: 32,
        ..AcquisitionConfig::default()
    }
}

fn source(n_records: u64, acquisition_every: u64) -> SyntheticSourceConfig {
    SyntheticSourceConfig {
        n_records,
        acquisition_every,
        ..SyntheticSourceConfig::default()
    }
}

/// Most records a slice can extend past the record it starts in.
fn records_past_start(slice_length: usize, record_length: usize) -> u32 {
    ((slice_length + record_length - 2) / record_length) as u32
}

/// Slice a synthetic ramp, checking the cursor bounds after every record.
fn run(
    slicer: SlicerConfig,
    acq: &AcquisitionConfig,
    src: SyntheticSourceConfig,
) -> (Vec<Slice>, SessionStatsSnapshot) {
    let mut slices: Vec<Slice> = Vec::new();
    let stats = {
        let mut session = SlicerSession::new(&slicer, acq, &mut slices).unwrap();
        for record in SyntheticSource::new(acq, src) {
            session.on_record(&record).unwrap();
            let cursor = session.cursor();
            let limit = records_past_start(slicer.slice_length, acq.record_length);
            assert!(cursor.record_offset_since_slice_start() <= limit);
            assert!(cursor.slice_start_offset_in_record() < acq.record_length);
            assert!(cursor.offset_in_record() <= acq.record_length);
        }
        session.finish().unwrap()
    };
    (slices, stats)
}

fn numbers(slices: &[Slice]) -> Vec<u64> {
    slices.iter().map(|s| s.slice_number()).collect()
}

#[test]
fn scenario_back_to_back_slices() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let (slices, stats) = run(SlicerConfig::new(4, 4), &acq, source(3, 0));

    assert_eq!(slices.len(), 6);
    assert_eq!(numbers(&slices), vec![0, 1, 2, 3, 4, 5]);
    for (k, slice) in slices.iter().enumerate() {
        let first = 4 * k as u64;
        assert_eq!(slice.channel(0), &[first, first + 1, first + 2, first + 3]);
        assert_eq!(slice.header.non_overlap_fraction, 1.0);
    }
    assert_eq!(stats.records_skipped, 0);
    assert_eq!(stats.partial_slices_discarded, 0);
}

#[test]
fn scenario_stride_skips_samples() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let (slices, _) = run(SlicerConfig::new(4, 8), &acq, source(2, 0));

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].channel(0), &[0, 1, 2, 3]);
    assert_eq!(slices[1].channel(0), &[8, 9, 10, 11]);
    assert_eq!(slices[0].header.non_overlap_fraction, 2.0);

    let seen: Vec<u64> = slices.iter().flat_map(|s| s.channel(0).to_vec()).collect();
    for dropped in (4..8).chain(12..16) {
        assert!(!seen.contains(&dropped));
    }
}

#[test]
fn scenario_stride_below_slice_length_rejected() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let mut slices: Vec<Slice> = Vec::new();
    let result = SlicerSession::new(&SlicerConfig::new(8, 4), &acq, &mut slices);
    assert!(matches!(result, Err(SlicerError::Configuration(_))));
    assert!(slices.is_empty());
}

#[test]
fn contiguous_slices_cover_every_sample_once() {
    for &(slice_length, record_length, n_records) in
        &[(5usize, 8usize, 8u64), (12, 8, 9), (8, 8, 4), (3, 7, 6), (1, 4, 3)]
    {
        let acq = acquisition(record_length, ChannelLayout::OneChannel);
        let (slices, _) = run(SlicerConfig::new(slice_length, 0), &acq, source(n_records, 0));

        let total = n_records as usize * record_length;
        assert_eq!(slices.len(), total / slice_length);
        let seen: Vec<u64> = slices.iter().flat_map(|s| s.channel(0).to_vec()).collect();
        let expected: Vec<u64> = (0..(total / slice_length * slice_length) as u64).collect();
        assert_eq!(seen, expected, "slice {slice_length} record {record_length}");
        assert_eq!(numbers(&slices), (0..slices.len() as u64).collect::<Vec<_>>());
    }
}

#[test]
fn strided_slices_follow_stride_phase() {
    for &(slice_length, stride, record_length, n_records) in &[
        (4usize, 8usize, 8usize, 6u64),
        (3, 10, 8, 10),
        (5, 7, 4, 12),
        (6, 20, 8, 10),
        (16, 40, 8, 12),
        (4, 9, 8, 9),
    ] {
        let acq = acquisition(record_length, ChannelLayout::OneChannel);
        let (slices, _) =
            run(SlicerConfig::new(slice_length, stride), &acq, source(n_records, 0));

        let total = (n_records as usize * record_length) as u64;
        let (l, s, r) = (slice_length as u64, stride as u64, record_length as u64);
        let expected = (0u64..).take_while(|k| k * s + l <= total).count();
        assert_eq!(slices.len(), expected, "L={l} S={s} R={r}");

        for (k, slice) in slices.iter().enumerate() {
            let start = k as u64 * s;
            let end = start + l - 1;
            let want: Vec<u64> = (start..start + l).collect();
            assert_eq!(slice.channel(0), want.as_slice());

            let h = &slice.header;
            assert_eq!(h.slice_number, k as u64);
            assert_eq!(h.start_record_number, start / r);
            assert_eq!(h.start_sample_number as u64, start % r);
            assert_eq!(h.end_record_number, end / r);
            assert_eq!(h.end_sample_number as u64, end % r);
            assert_eq!(h.record_and_sample_at(slice_length - 1), (end / r, (end % r) as usize));
            assert_eq!(h.timestamp_at_sample(1, 0), Some((start + 1) * 1_000));
            assert!((h.time_in_run - start as f64 * 1.0e-6).abs() < 1e-9);
        }

        // membership: p is sliced iff p mod stride < slice_length
        let seen: Vec<u64> = slices.iter().flat_map(|s| s.channel(0).to_vec()).collect();
        let last_end = expected as u64 * s;
        for p in 0..last_end.min(total) {
            assert_eq!(seen.contains(&p), p % s < l, "position {p}");
        }
    }
}

#[test]
fn slices_spanning_many_records_count_past_record_length() {
    let acq = acquisition(1, ChannelLayout::OneChannel);
    let slicer = SlicerConfig::new(3, 0);
    let mut slices: Vec<Slice> = Vec::new();
    let mut session = SlicerSession::new(&slicer, &acq, &mut slices).unwrap();

    let mut highest = 0;
    for record in SyntheticSource::new(&acq, source(9, 0)) {
        session.on_record(&record).unwrap();
        let since_start = session.cursor().record_offset_since_slice_start();
        assert!(since_start <= records_past_start(3, 1));
        highest = highest.max(since_start);
    }
    session.finish().unwrap();
    drop(session);

    // a slice still in progress is already one record past its start
    assert_eq!(highest, 1);
    assert!(highest >= acq.record_length as u32);
    assert_eq!(numbers(&slices), vec![0, 1, 2]);
    assert_eq!(slices[2].channel(0), &[6, 7, 8]);
}

#[test]
fn acquisition_change_mid_slice_discards_partial() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let (slices, stats) = run(SlicerConfig::new(6, 0), &acq, source(4, 2));

    assert_eq!(numbers(&slices), vec![0, 1, 3, 4]);
    assert_eq!(slices[1].channel(0), &[6, 7, 8, 9, 10, 11]);

    let restarted = &slices[2];
    assert!(restarted.header.is_new_acquisition);
    assert_eq!(restarted.channel(0), &[16, 17, 18, 19, 20, 21]);
    assert_eq!(restarted.header.start_record_number, 2);
    assert_eq!(restarted.header.start_sample_number, 0);
    assert_eq!(restarted.header.channels[0].acquisition_id, 1);
    assert!((restarted.header.time_in_run - 16.0e-6).abs() < 1e-12);

    assert!(!slices[3].header.is_new_acquisition);
    assert_eq!(slices[3].channel(0), &[22, 23, 24, 25, 26, 27]);

    // one at the boundary, one left over at finish
    assert_eq!(stats.partial_slices_discarded, 2);
    assert_eq!(stats.acquisitions_seen, 2);
}

#[test]
fn acquisition_change_between_slices_keeps_phase() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let (slices, stats) = run(SlicerConfig::new(4, 10), &acq, source(3, 1));

    assert_eq!(numbers(&slices), vec![0, 1, 2]);
    let starts: Vec<u64> = slices.iter().map(|s| s.channel(0)[0]).collect();
    assert_eq!(starts, vec![0, 10, 20]);
    assert!(slices.iter().all(|s| s.header.is_new_acquisition));
    assert_eq!(slices[1].header.start_sample_number, 2);
    assert_eq!(stats.partial_slices_discarded, 0);
}

#[test]
fn acquisition_change_inside_skipped_records_is_seen() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let mut slices: Vec<Slice> = Vec::new();
    let mut session = SlicerSession::new(&SlicerConfig::new(4, 16), &acq, &mut slices).unwrap();

    let outcomes: Vec<RecordOutcome> = SyntheticSource::new(&acq, source(3, 1))
        .map(|r| session.on_record(&r).unwrap())
        .collect();
    assert_eq!(outcomes[1], RecordOutcome::Skipped);
    session.finish().unwrap();
    drop(session);

    assert_eq!(slices.len(), 2);
    assert!(slices[1].header.is_new_acquisition);
    assert_eq!(slices[1].header.channels[0].acquisition_id, 2);
    assert_eq!(slices[1].channel(0)[0], 16);
}

#[test]
fn two_channel_layouts_agree() {
    let mut per_layout = Vec::new();
    for layout in [
        ChannelLayout::TwoChannelSeparate,
        ChannelLayout::TwoChannelInterleaved,
    ] {
        let acq = AcquisitionConfig {
            sample_width: 2,
            bit_depth: 16,
            ..acquisition(8, layout)
        };
        let (slices, _) = run(SlicerConfig::new(5, 0), &acq, source(4, 0));
        assert_eq!(slices.len(), 6);
        for (k, slice) in slices.iter().enumerate() {
            assert_eq!(slice.n_channels(), 2);
            assert_eq!(slice.header.channels.len(), 2);
            let up: Vec<u64> = (5 * k as u64..5 * k as u64 + 5).collect();
            let down: Vec<u64> = up.iter().map(|p| 0xffff - p).collect();
            assert_eq!(slice.channel(0), up.as_slice());
            assert_eq!(slice.channel(1), down.as_slice());
        }
        per_layout.push(slices.into_iter().map(Slice::into_samples).collect::<Vec<_>>());
    }
    assert_eq!(per_layout[0], per_layout[1]);
}

#[test]
fn malformed_records_abort_the_session() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let mut session =
        SlicerSession::new(&SlicerConfig::new(4, 0), &acq, Vec::<Slice>::new()).unwrap();

    let wrong_layout = Record::from_raw(0, 0, 0, 1, vec![0; 64]).unwrap();
    let err = session.on_record(&wrong_layout).unwrap_err();
    assert!(matches!(
        err,
        SlicerError::Decode(DecodeError::LayoutMismatch { .. })
    ));

    let good = SyntheticSource::new(&acq, source(1, 0)).next().unwrap();
    assert!(matches!(
        session.on_record(&good),
        Err(SlicerError::SessionAborted)
    ));
    assert!(session.into_emitter().is_empty());
}

#[test]
fn unknown_layout_code_rejected() {
    assert_eq!(
        Record::from_raw(0, 0, 0, 7, vec![]).unwrap_err(),
        DecodeError::UnsupportedLayout(7)
    );
}

#[test]
fn buffered_output_waits_for_finish() {
    let acq = acquisition(8, ChannelLayout::OneChannel);
    let (tx, rx) = crossbeam_channel::unbounded::<SliceEvent>();
    let emitter = emitter_for_mode(OutputMode::Buffer, tx);
    let mut session = SlicerSession::new(&SlicerConfig::new(4, 0), &acq, emitter).unwrap();

    for record in SyntheticSource::new(&acq, source(2, 0)) {
        session.on_record(&record).unwrap();
    }
    let before: Vec<SliceEvent> = rx.try_iter().collect();
    assert_eq!(before.len(), 1);
    assert!(matches!(before[0], SliceEvent::Header(_)));

    session.finish().unwrap();
    let after: Vec<SliceEvent> = rx.try_iter().collect();
    assert_eq!(after.len(), 5);
    assert!(matches!(after[4], SliceEvent::Finished));
}
