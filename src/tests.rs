#[cfg(test)]
mod tests {
    use std::{
        fs,
        io::Cursor,
        path::{Path, PathBuf},
    };

    use binrw::BinRead;
    use time::macros::datetime;

    use crate::{
        atom::{BoxNode, FieldSpan, FieldValue},
        atom_types::{mac_seconds, AtomType},
        consts::CREATION_DATE,
        extract_payload,
        fix::capture_start_utc,
        fix_file,
        fix_timestamp,
        gpmf::{correlate, is_fix_status, parse_gps_time, sanity_check, walk, Fix, Record, Records, Value},
        patch::{commit, locate, part_path, stage, Patch, PatchSet},
        AtomTree,
        Co64,
        FixOptions,
        FixOutcome,
        FourCC,
        Mp4,
        Mp4Error,
        Mp4Reader,
        Offsets,
        Payload,
        Stco,
        Stsz,
        Stts,
    };

    // GPMF builders

    fn klv(key: &[u8; 4], type_code: u8, size: u8, data: &[u8]) -> Vec<u8> {
        let repeat = match size {
            0 => 0,
            n => (data.len() / n as usize) as u16,
        };
        let mut bytes = key.to_vec();
        bytes.push(type_code);
        bytes.push(size);
        bytes.extend_from_slice(&repeat.to_be_bytes());
        bytes.extend_from_slice(data);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes
    }

    fn nested(key: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
        klv(key, 0, 4, &children.concat())
    }

    /// Single GPMF payload with a GPS stream.
    fn gps_payload(gpsf: u32, gpsu: &str) -> Vec<u8> {
        nested(b"DEVC", &[
            klv(b"DVID", b'L', 4, &1_u32.to_be_bytes()),
            klv(b"DVNM", b'c', 1, b"Camera"),
            nested(b"STRM", &[
                klv(b"STNM", b'c', 1, b"GPS (Lat., Long., Alt., 2D speed, 3D speed)"),
                klv(b"GPSF", b'L', 4, &gpsf.to_be_bytes()),
                klv(b"GPSU", b'U', 16, gpsu.as_bytes()),
                klv(b"GPS5", b'l', 20, &[0_u8; 40]),
            ]),
        ])
    }

    /// Five payloads without fix followed by one with fix at 5000ms.
    fn gps_payloads() -> Vec<Vec<u8>> {
        let mut payloads: Vec<Vec<u8>> = (0..5)
            .map(|_| gps_payload(0, "160101000000.000"))
            .collect();
        payloads.push(gps_payload(1, "210615100000.000"));
        payloads
    }

    fn payloads(data: &[Vec<u8>]) -> Vec<Result<Payload, Mp4Error>> {
        data.iter()
            .enumerate()
            .map(|(i, d)| Ok(Payload { data: d.to_owned(), start_ms: i as u64 * 1000 }))
            .collect()
    }

    // MP4 builders

    fn atom(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut bytes = ((data.len() + 8) as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(name);
        bytes.extend_from_slice(data);
        bytes
    }

    fn versioned(bytes: &mut Vec<u8>, version: u8, value: u64) {
        match version {
            1 => bytes.extend_from_slice(&value.to_be_bytes()),
            _ => bytes.extend_from_slice(&(value as u32).to_be_bytes()),
        }
    }

    fn version_flags(version: u8) -> Vec<u8> {
        vec![version, 0, 0, 0]
    }

    fn mvhd(version: u8, creation: u64) -> Vec<u8> {
        let mut data = version_flags(version);
        versioned(&mut data, version, creation);
        versioned(&mut data, version, creation);
        data.extend_from_slice(&1000_u32.to_be_bytes()); // time scale
        versioned(&mut data, version, 6000);
        data.extend_from_slice(&0x0001_0000_u32.to_be_bytes()); // rate
        data.extend_from_slice(&0x0100_u16.to_be_bytes()); // volume
        data.extend_from_slice(&[0; 10 + 36 + 24]);
        data.extend_from_slice(&3_u32.to_be_bytes()); // next track id
        atom(b"mvhd", &data)
    }

    fn tkhd(version: u8, creation: u64, track_id: u32) -> Vec<u8> {
        let mut data = version_flags(version);
        versioned(&mut data, version, creation);
        versioned(&mut data, version, creation);
        data.extend_from_slice(&track_id.to_be_bytes());
        data.extend_from_slice(&[0; 4]);
        versioned(&mut data, version, 6000);
        data.extend_from_slice(&[0; 8 + 2 + 2 + 2 + 2 + 36]);
        data.extend_from_slice(&[0; 8]); // width, height
        atom(b"tkhd", &data)
    }

    fn mdhd(version: u8, creation: u64, time_scale: u32) -> Vec<u8> {
        let mut data = version_flags(version);
        versioned(&mut data, version, creation);
        versioned(&mut data, version, creation);
        data.extend_from_slice(&time_scale.to_be_bytes());
        versioned(&mut data, version, 6 * time_scale as u64);
        data.extend_from_slice(&0x55c4_u16.to_be_bytes()); // und
        data.extend_from_slice(&[0; 2]);
        atom(b"mdhd", &data)
    }

    fn hdlr(sub_type: &[u8; 4], name: &str) -> Vec<u8> {
        let mut data = version_flags(0);
        data.extend_from_slice(b"mhlr");
        data.extend_from_slice(sub_type);
        data.extend_from_slice(&[0; 12]);
        data.push(name.len() as u8);
        data.extend_from_slice(name.as_bytes());
        atom(b"hdlr", &data)
    }

    fn stbl(sizes: &[u32], positions: &[u32], duration: u32) -> Vec<u8> {
        let mut stts = version_flags(0);
        stts.extend_from_slice(&1_u32.to_be_bytes());
        stts.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
        stts.extend_from_slice(&duration.to_be_bytes());

        let mut stsz = version_flags(0);
        stsz.extend_from_slice(&0_u32.to_be_bytes());
        stsz.extend_from_slice(&(sizes.len() as u32).to_be_bytes());
        sizes.iter().for_each(|s| stsz.extend_from_slice(&s.to_be_bytes()));

        let mut stco = version_flags(0);
        stco.extend_from_slice(&(positions.len() as u32).to_be_bytes());
        positions.iter().for_each(|p| stco.extend_from_slice(&p.to_be_bytes()));

        atom(b"stbl", &[
            atom(b"stts", &stts),
            atom(b"stsz", &stsz),
            atom(b"stco", &stco),
        ].concat())
    }

    fn video_trak(version: u8, creation: u64) -> Vec<u8> {
        atom(b"trak", &[
            tkhd(version, creation, 1),
            atom(b"mdia", &[
                mdhd(version, creation, 90000),
                hdlr(b"vide", "GoPro AVC"),
                atom(b"minf", &[]),
            ].concat()),
        ].concat())
    }

    fn telemetry_trak(version: u8, creation: u64, sizes: &[u32], positions: &[u32]) -> Vec<u8> {
        atom(b"trak", &[
            tkhd(version, creation, 2),
            atom(b"mdia", &[
                mdhd(version, creation, 1000),
                hdlr(b"meta", "GoPro MET"),
                atom(b"minf", &[
                    atom(b"gmhd", &atom(b"gpmd", &[])),
                    stbl(sizes, positions, 1000),
                ].concat()),
            ].concat()),
        ].concat())
    }

    /// `ftyp`, `mdat` with one sample per payload (1s each), `moov`.
    fn build_mp4(samples: &[Vec<u8>], version: u8, creation: u64, with_video: bool) -> Vec<u8> {
        let ftyp = atom(b"ftyp", b"mp41\0\0\0\0mp41");
        let mdat = atom(b"mdat", &samples.concat());

        let sizes: Vec<u32> = samples.iter().map(|s| s.len() as u32).collect();
        let mut positions = Vec::new();
        let mut pos = ftyp.len() as u32 + 8;
        for size in sizes.iter() {
            positions.push(pos);
            pos += size;
        }

        let mut moov = mvhd(version, creation);
        if with_video {
            moov.extend(video_trak(version, creation));
        }
        moov.extend(telemetry_trak(version, creation, &sizes, &positions));
        moov.extend(atom(b"udta", &[0, 0, 0, 0]));

        [ftyp, mdat, atom(b"moov", &moov)].concat()
    }

    fn wrong_creation() -> u64 {
        mac_seconds(&datetime!(2016-01-01 0:00)).unwrap()
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mp4timefix_{}_{name}.mp4", std::process::id()))
    }

    fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
        let path = temp_path(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn cleanup(paths: &[&Path]) {
        for path in paths {
            let _ = fs::remove_file(path);
        }
    }

    fn creation_dates(path: &Path) -> Vec<FieldValue> {
        let mut mp4 = Mp4::new(path).unwrap();
        let tree = mp4.atoms().unwrap();
        locate(tree.atoms(), CREATION_DATE)
            .into_iter()
            .map(|f| f.value().to_owned())
            .collect()
    }

    fn tree(bytes: Vec<u8>) -> AtomTree {
        let mut reader = Mp4Reader::new(Cursor::new(bytes)).unwrap();
        AtomTree::read(&mut reader).unwrap()
    }

    // GPMF

    #[test]
    fn gpmf_records_reencode_to_padded_length() {
        let buf = [
            klv(b"DVNM", b'c', 1, b"HERO9"),
            klv(b"TICK", b'L', 4, &7_u32.to_be_bytes()),
            klv(b"EMPT", b'L', 4, &[]),
        ].concat();

        let records: Vec<Record> = Records::new(&buf).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].data(), b"HERO9");
        assert_eq!(records[0].encoded_size(), 8 + 8);
        assert_eq!(records[2].repeat(), 0);

        let reencoded: Vec<u8> = records.iter()
            .flat_map(|r| r.to_bytes().unwrap())
            .collect();
        assert_eq!(reencoded, buf);
    }

    #[test]
    fn gpmf_walk_is_preorder_with_parent_path() {
        let buf = nested(b"DEVC", &[
            klv(b"DVID", b'L', 4, &1_u32.to_be_bytes()),
            nested(b"STRM", &[
                klv(b"GPSF", b'L', 4, &3_u32.to_be_bytes()),
                klv(b"GPSU", b'U', 16, b"210615100000.000"),
            ]),
            nested(b"STRM", &[
                klv(b"ACCL", b's', 6, &[0; 12]),
            ]),
        ]);

        let nodes: Vec<_> = walk(&buf).collect::<Result<_, _>>().unwrap();
        let paths: Vec<String> = nodes.iter().map(|n| n.path()).collect();
        assert_eq!(paths, vec![
            "DEVC/DVID",
            "DEVC/STRM/GPSF",
            "DEVC/STRM/GPSU",
            "DEVC/STRM/ACCL",
        ]);
        let depths: Vec<usize> = nodes.iter().map(|n| n.depth()).collect();
        assert_eq!(depths, vec![1, 2, 2, 2]);
    }

    #[test]
    fn gpmf_walkers_are_independent() {
        let buf = gps_payload(3, "210615100000.000");
        let mut first = walk(&buf);
        let mut second = walk(&buf);
        first.next();
        first.next();
        let from_second: Vec<_> = second.by_ref().map(|n| n.unwrap().key()).collect();
        assert_eq!(from_second.len(), 6);
        assert_eq!(first.count(), 4);
        assert_eq!(walk(&buf).count(), 6);
    }

    #[test]
    fn gpmf_truncated_header() {
        let buf = [klv(b"TICK", b'L', 4, &1_u32.to_be_bytes()), b"TSMP".to_vec()].concat();
        let mut records = Records::new(&buf);
        assert!(records.next().unwrap().is_ok());
        match records.next() {
            Some(Err(Mp4Error::TruncatedRecord { key, offset, needed, remaining })) => {
                assert_eq!(&key, b"TSMP");
                assert_eq!(offset, 12);
                assert_eq!(needed, 8);
                assert_eq!(remaining, 4);
            },
            other => panic!("expected truncated record, got {other:?}")
        }
        assert!(records.next().is_none());
    }

    #[test]
    fn gpmf_truncated_padding() {
        // 5 bytes data load, padded to 8, only 5 present
        let mut buf = klv(b"DVNM", b'c', 1, b"HERO9");
        buf.truncate(8 + 5);
        let result: Result<Vec<_>, _> = Records::new(&buf).collect();
        assert!(matches!(result, Err(Mp4Error::TruncatedRecord { needed: 16, remaining: 13, .. })));

        // same error surfaces through the walker
        let nested_buf = nested(b"DEVC", &[buf]);
        assert!(matches!(walk(&nested_buf).last(), Some(Err(Mp4Error::TruncatedRecord { .. }))));
    }

    #[test]
    fn gpmf_values() {
        let buf = [
            klv(b"SINT", b'l', 4, &[(-1_i32).to_be_bytes(), 5_i32.to_be_bytes()].concat()),
            klv(b"UINT", b'S', 2, &[0, 1, 0xff, 0xff]),
            klv(b"FLT_", b'f', 4, &1.5_f32.to_be_bytes()),
            klv(b"TEXT", b'c', 1, b"GoPro\0\0"),
            klv(b"TYPE", b'F', 4, b"GPS5ACCL"),
            klv(b"FIXQ", b'q', 4, &0x0001_8000_u32.to_be_bytes()),
        ].concat();
        let values: Vec<Value> = Records::new(&buf)
            .map(|r| r.unwrap().value().unwrap())
            .collect();
        assert_eq!(values[0], Value::Signed(vec![-1, 5]));
        assert_eq!(values[1], Value::Unsigned(vec![1, 65535]));
        assert_eq!(values[2], Value::Float(vec![1.5]));
        assert_eq!(values[3], Value::Text("GoPro".to_owned()));
        assert_eq!(values[4], Value::FourCC(vec!["GPS5".to_owned(), "ACCL".to_owned()]));
        assert_eq!(values[5], Value::Float(vec![1.5]));
    }

    #[test]
    fn gpmf_unsupported_type_falls_back_to_raw() {
        let buf = klv(b"CMPX", b'?', 4, &[1, 2, 3, 4]);
        let record = Records::new(&buf).next().unwrap().unwrap();
        assert!(matches!(record.value(), Err(Mp4Error::UnsupportedType(b'?'))));
        assert_eq!(record.value_or_raw().unwrap(), Value::Raw(vec![1, 2, 3, 4]));
    }

    #[test]
    fn gps_time_parse() {
        assert_eq!(parse_gps_time(b"210615100000.000").unwrap(), datetime!(2021-06-15 10:00:00 UTC));
        assert_eq!(parse_gps_time(b"210615100000.5\0\0").unwrap(), datetime!(2021-06-15 10:00:00.5 UTC));
        assert_eq!(parse_gps_time(b"991231235959").unwrap(), datetime!(2099-12-31 23:59:59 UTC));
        assert!(matches!(parse_gps_time(b"2106151000"), Err(Mp4Error::InvalidGpsTime(_))));
        assert!(matches!(parse_gps_time(b"211315100000.000"), Err(Mp4Error::InvalidGpsTime(_))));
        assert!(matches!(parse_gps_time(b"21061510000x.000"), Err(Mp4Error::InvalidGpsTime(_))));
    }

    // Fix correlation

    #[test]
    fn fix_subtracts_stream_offset() {
        let fix = correlate(payloads(&gps_payloads())).unwrap();
        assert_eq!(fix.gps_time, datetime!(2021-06-15 10:00:00 UTC));
        assert_eq!(fix.stream_offset_ms, 5000);
        assert_eq!(fix.capture_start, datetime!(2021-06-15 09:59:55 UTC));
    }

    #[test]
    fn fix_status_zero_never_sets_fix() {
        let data: Vec<Vec<u8>> = (0..3).map(|_| gps_payload(0, "210615100000.000")).collect();
        assert!(matches!(correlate(payloads(&data)), Err(Mp4Error::NoGpsFixFound)));
        assert!(matches!(correlate(Vec::new()), Err(Mp4Error::NoGpsFixFound)));
    }

    #[test]
    fn fix_time_before_status_is_ignored() {
        // GPSU precedes GPSF in the first payload
        let first = nested(b"DEVC", &[nested(b"STRM", &[
            klv(b"GPSU", b'U', 16, b"160101000000.000"),
            klv(b"GPSF", b'L', 4, &3_u32.to_be_bytes()),
        ])]);
        let data = vec![first, gps_payload(0, "210615100002.000")];
        let fix = correlate(payloads(&data)).unwrap();
        // fix from first payload persists, second payload's GPSF 0 does not revoke it
        assert_eq!(fix.gps_time, datetime!(2021-06-15 10:00:02 UTC));
        assert_eq!(fix.capture_start, datetime!(2021-06-15 10:00:01 UTC));
    }

    #[test]
    fn fix_first_wins() {
        let data = vec![
            gps_payload(3, "210615100000.000"),
            gps_payload(3, "220101000000.000"),
        ];
        let fix = correlate(payloads(&data)).unwrap();
        assert_eq!(fix.capture_start, datetime!(2021-06-15 10:00:00 UTC));
    }

    #[test]
    fn fix_status_with_unsupported_type_is_no_fix() {
        let payload = nested(b"DEVC", &[nested(b"STRM", &[
            klv(b"GPSF", b'?', 4, &3_u32.to_be_bytes()),
            klv(b"GPSU", b'U', 16, b"210615100000.000"),
        ])]);
        let gpsf = walk(&payload).next().unwrap().unwrap();
        assert!(!is_fix_status(&gpsf.record).unwrap());
        assert!(matches!(correlate(payloads(&[payload])), Err(Mp4Error::NoGpsFixFound)));
    }

    #[test]
    fn fix_rejects_offsets_beyond_datetime_range() {
        // 100000 samples of u32::MAX ticks at time scale 1
        let offsets = Offsets::from_tables(&[8; 100_000], &[0; 100_000], &[u32::MAX; 100_000], 1);
        let start_ms = offsets.get(99_999).unwrap().start_ms;
        let gps_time = datetime!(2021-06-15 10:00:00 UTC);
        assert!(matches!(Fix::new(gps_time, start_ms), Err(Mp4Error::InvalidTimestamp(_))));
        assert!(matches!(Fix::new(gps_time, u64::MAX), Err(Mp4Error::InvalidTimestamp(_))));
    }

    #[test]
    fn fix_sanity_check() {
        let fix = Fix::new(datetime!(2021-06-15 10:00:00 UTC), 5000).unwrap();
        assert!(sanity_check(&fix, 2021).is_ok());
        assert!(matches!(
            sanity_check(&fix, 2020),
            Err(Mp4Error::SanityCheckFailed { expected: 2020, got: 2021 })
        ));
        // year boundary
        let fix = Fix::new(datetime!(2021-01-01 00:00:02 UTC), 5000).unwrap();
        assert!(matches!(sanity_check(&fix, 2021), Err(Mp4Error::SanityCheckFailed { got: 2020, .. })));
    }

    // Offsets and payloads

    #[test]
    fn offsets_accumulate_start_time() {
        let offsets = Offsets::from_tables(&[10, 20, 30], &[100, 110, 130], &[1001, 1001, 1001], 1000);
        let starts: Vec<u64> = offsets.iter().map(|o| o.start_ms).collect();
        assert_eq!(starts, vec![0, 1001, 2002]);
        assert_eq!(offsets.sizes(), vec![10, 20, 30]);
        assert_eq!(offsets.positions(), vec![100, 110, 130]);

        // time scale 0 is clamped
        let offsets = Offsets::from_tables(&[1], &[0], &[5], 0);
        assert_eq!(offsets.first().unwrap().duration_ms, 5000);
    }

    #[test]
    fn offsets_do_not_expand_oversized_sample_counts() {
        // constant sample size 8, 0x1000_0000 samples declared in 20 bytes
        let mut data = version_flags(0);
        data.extend_from_slice(&8_u32.to_be_bytes());
        data.extend_from_slice(&0x1000_0000_u32.to_be_bytes());
        let stsz = Stsz::read(&mut Cursor::new(&data)).unwrap();
        assert_eq!(stsz.len(), 0x1000_0000);
        assert_eq!(stsz.sample_size(), 8);
        assert!(stsz.sizes.is_empty());

        let mut data = version_flags(0);
        data.extend_from_slice(&1_u32.to_be_bytes());
        data.extend_from_slice(&0x1000_0000_u32.to_be_bytes());
        data.extend_from_slice(&1001_u32.to_be_bytes());
        let stts = Stts::read(&mut Cursor::new(&data)).unwrap();
        assert_eq!(stts.durations(3), vec![1001, 1001, 1001]);

        let mut data = version_flags(0);
        data.extend_from_slice(&2_u32.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 28, 0, 0, 0, 36]);
        let co64 = Co64::from(&Stco::read(&mut Cursor::new(&data)).unwrap());

        match Offsets::new(&stsz, &co64, &stts, 1000) {
            Err(Mp4Error::SampleTableMismatch { sizes, other, table }) => {
                assert_eq!(sizes, 0x1000_0000);
                assert_eq!(other, 2);
                assert_eq!(table, "stco");
            },
            other => panic!("expected sample table mismatch, got {other:?}")
        }

        // constant size with a matching sample count
        let mut data = version_flags(0);
        data.extend_from_slice(&8_u32.to_be_bytes());
        data.extend_from_slice(&2_u32.to_be_bytes());
        let stsz = Stsz::read(&mut Cursor::new(&data)).unwrap();
        let offsets = Offsets::new(&stsz, &co64, &stts, 1000).unwrap();
        assert_eq!(offsets.sizes(), vec![8, 8]);
        assert_eq!(offsets.positions(), vec![28, 36]);
        assert_eq!(offsets.get(1).unwrap().start_ms, 1001);
    }

    #[test]
    fn payload_concatenates_in_order() {
        let bytes: Vec<u8> = (0..32).collect();
        let mut reader = Mp4Reader::new(Cursor::new(bytes)).unwrap();
        let payload = extract_payload(&mut reader, &[2, 3], &[10, 4]).unwrap();
        assert_eq!(payload, vec![10, 11, 4, 5, 6]);

        let result = extract_payload(&mut reader, &[4, 8], &[0, 30]);
        assert!(matches!(result, Err(Mp4Error::OffsetOutOfRange { offset: 30, len: 8, max: 32 })));

        // missing chunk offset
        let result = extract_payload(&mut reader, &[4, 8], &[0]);
        assert!(matches!(result, Err(Mp4Error::OffsetOutOfRange { .. })));
    }

    // Atom tree

    #[test]
    fn atom_tree_decodes_telemetry_track() {
        let samples = gps_payloads();
        let tree = tree(build_mp4(&samples, 0, wrong_creation(), true));

        let names: Vec<&str> = tree.atoms().iter().map(|a| a.name().to_str()).collect();
        assert_eq!(names, vec!["ftyp", "mdat", "moov"]);
        assert_eq!(tree.tracks().unwrap().len(), 2);

        let track = crate::TelemetryTrack::locate(&tree, "GoPro MET").unwrap();
        assert_eq!(track.id(), 2);
        assert_eq!(track.name(), "GoPro MET");
        assert_eq!(track.time_scale(), 1000);
        assert_eq!(track.len(), 6);
        assert_eq!(track.offsets().get(5).unwrap().start_ms, 5000);
        assert_eq!(track.offsets().first().unwrap().position, 20 + 8);

        let trak = tree.tracks().unwrap()[1];
        assert!(trak.find_path(&["mdia", "minf", "gmhd", "gpmd"]).is_some());
        assert!(matches!(
            trak.find_path(&["mdia", "minf", "stbl", "stco"]).map(|a| a.data()),
            Some(AtomType::Stco(_))
        ));
    }

    #[test]
    fn atom_tree_missing_handler() {
        let mp4 = [
            atom(b"ftyp", b"mp41\0\0\0\0mp41"),
            atom(b"moov", &[mvhd(0, 0), video_trak(0, 0)].concat()),
        ].concat();
        let tree = tree(mp4);
        assert!(matches!(
            crate::TelemetryTrack::locate(&tree, "GoPro MET"),
            Err(Mp4Error::MissingHandler(_))
        ));
    }

    #[test]
    fn atom_fields_versions() {
        let creation = mac_seconds(&datetime!(2021-06-15 10:00:00)).unwrap();
        for version in [0_u8, 1] {
            let tree = tree(atom(b"moov", &mvhd(version, creation)));
            let mvhd = tree.moov().unwrap().child(&FourCC::Mvhd).unwrap();
            let field = mvhd.field(CREATION_DATE).unwrap();
            let width = if version == 1 { 8 } else { 4 };
            // moov header 8 + mvhd header 8 + version/flags 4
            assert_eq!(field.span(), Some(&FieldSpan::new(20, width)));
            assert_eq!(field.value(), &FieldValue::DateTime(datetime!(2021-06-15 10:00:00)));
            assert_eq!(
                mvhd.field("time_scale").unwrap().span(),
                Some(&FieldSpan::new(20 + 2 * width as u64, 4))
            );
        }
    }

    #[test]
    fn atom_size_zero_and_64bit() {
        // 64-bit sized ftyp, then mdat with size 0 extending to end of file
        let mut bytes = 1_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"ftyp");
        bytes.extend_from_slice(&(16_u64 + 4).to_be_bytes());
        bytes.extend_from_slice(b"mp41");
        bytes.extend_from_slice(&0_u32.to_be_bytes());
        bytes.extend_from_slice(b"mdat");
        bytes.extend_from_slice(&[0; 12]);

        let tree = tree(bytes);
        let ftyp = &tree.atoms()[0];
        assert!(ftyp.header().size_64bit);
        assert_eq!(ftyp.size(), 20);
        let mdat = &tree.atoms()[1];
        assert_eq!(mdat.start(), 20);
        assert_eq!(mdat.size(), 20);
        assert_eq!(mdat.end(), tree.len());
    }

    #[test]
    fn atom_exceeding_parent_fails() {
        let mut bytes = 64_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"moov");
        let mut reader = Mp4Reader::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            AtomTree::read(&mut reader),
            Err(Mp4Error::UnexpectedAtomSize { len: 64, offset: 0 })
        ));
    }

    // Patching

    #[test]
    fn patch_width_mismatch() {
        let tree = tree(atom(b"moov", &mvhd(0, wrong_creation())));
        let fields = locate(tree.atoms(), CREATION_DATE);
        assert_eq!(fields.len(), 1);

        let result = stage(&fields, &FieldValue::U64(1));
        assert!(matches!(result, Err(Mp4Error::PatchWidthMismatch { offset: 20, expected: 4, got: 8 })));

        // 2040 exceeds 32-bit seconds since 1904
        let result = stage(&fields, &FieldValue::DateTime(datetime!(2040-03-01 0:00)));
        assert!(matches!(result, Err(Mp4Error::PatchWidthMismatch { expected: 4, got: 8, .. })));

        let tree = self::tree(mdhd(0, 0, 1000));
        let language = locate(tree.atoms(), "language");
        assert!(matches!(
            stage(&language, &FieldValue::Text("eng".to_owned())),
            Err(Mp4Error::NotPatchable(_))
        ));
    }

    #[test]
    fn patch_rejects_field_of_other_kind() {
        let tree = tree(atom(b"moov", &mvhd(0, wrong_creation())));
        let time_scale = locate(tree.atoms(), "time_scale");
        assert_eq!(time_scale.len(), 1);
        assert!(matches!(
            stage(&time_scale, &FieldValue::DateTime(datetime!(2021-06-15 10:00:00))),
            Err(Mp4Error::FieldKindMismatch { offset: 28, .. })
        ));

        let input = write_temp("kind", &build_mp4(&gps_payloads(), 0, wrong_creation(), false));
        let output = temp_path("kind_out");
        let options = FixOptions::default()
            .with_output(Some(output.as_path()))
            .with_field("time_scale");
        assert!(matches!(
            fix_timestamp(&input, &options),
            Err(Mp4Error::FieldKindMismatch { .. })
        ));
        assert!(!output.exists());
        assert!(!part_path(&output).exists());

        cleanup(&[&input, &output]);
    }

    #[test]
    fn patch_commit_copies_unpatched_bytes() {
        let src: Vec<u8> = (0..16).collect();
        let patches = PatchSet::new(vec![
            Patch { offset: 8, bytes: vec![0xff, 0xff] },
            Patch { offset: 2, bytes: vec![0xaa] },
        ]).unwrap();
        let mut dst = Vec::new();
        let len = commit(&mut Cursor::new(&src), &mut dst, &patches).unwrap();
        assert_eq!(len, 16);
        assert_eq!(dst, vec![0, 1, 0xaa, 3, 4, 5, 6, 7, 0xff, 0xff, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn patch_commit_rejects_bad_patches() {
        let overlapping = PatchSet::new(vec![
            Patch { offset: 2, bytes: vec![0; 4] },
            Patch { offset: 4, bytes: vec![0; 4] },
        ]);
        assert!(matches!(overlapping, Err(Mp4Error::OverlappingPatch { offset: 4, previous_end: 6 })));

        let src = vec![0_u8; 8];
        let patches = PatchSet::new(vec![Patch { offset: 6, bytes: vec![1; 4] }]).unwrap();
        let mut dst = Vec::new();
        let result = commit(&mut Cursor::new(&src), &mut dst, &patches);
        assert!(matches!(result, Err(Mp4Error::OffsetOutOfRange { offset: 6, len: 4, max: 8 })));
        assert!(dst.is_empty());
    }

    // Full pipeline

    #[test]
    fn fix_patches_all_creation_dates() {
        let input_bytes = build_mp4(&gps_payloads(), 0, wrong_creation(), true);
        let input = write_temp("all", &input_bytes);
        let output = temp_path("all_out");

        let options = FixOptions::default()
            .with_output(Some(output.as_path()))
            .with_sanity_year(Some(2021));
        let outcome = fix_timestamp(&input, &options).unwrap();

        match &outcome {
            FixOutcome::Written { fix, patched, path } => {
                assert_eq!(fix.capture_start, datetime!(2021-06-15 09:59:55 UTC));
                // mvhd + 2 * tkhd + 2 * mdhd
                assert_eq!(*patched, 5);
                assert_eq!(path, &output);
            },
            other => panic!("expected written, got {other:?}")
        }

        let expected = FieldValue::DateTime(datetime!(2021-06-15 09:59:55));
        let dates = creation_dates(&output);
        assert_eq!(dates.len(), 5);
        assert!(dates.iter().all(|d| d == &expected));

        // input untouched, only creation date bytes differ in output
        assert_eq!(fs::read(&input).unwrap(), input_bytes);
        let output_bytes = fs::read(&output).unwrap();
        assert_eq!(output_bytes.len(), input_bytes.len());
        let tree = tree(input_bytes.clone());
        let spans: Vec<FieldSpan> = locate(tree.atoms(), CREATION_DATE)
            .iter()
            .map(|f| *f.span().unwrap())
            .collect();
        for (i, (a, b)) in input_bytes.iter().zip(output_bytes.iter()).enumerate() {
            let i = i as u64;
            if !spans.iter().any(|s| i >= s.offset && i < s.end()) {
                assert_eq!(a, b, "byte {i} changed");
            }
        }
        // modification dates are left as they were
        let mut mp4 = Mp4::new(&output).unwrap();
        let modified = locate(mp4.atoms().unwrap().atoms(), "modification_date")
            .iter()
            .all(|f| f.value().as_datetime() == Some(&datetime!(2016-01-01 0:00)));
        assert!(modified);
        assert!(!part_path(&output).exists());

        cleanup(&[&input, &output]);
    }

    #[test]
    fn fix_is_idempotent() {
        let input = write_temp("idem", &build_mp4(&gps_payloads(), 0, wrong_creation(), false));
        let output = temp_path("idem_out");
        let second = temp_path("idem_second");

        let outcome = fix_timestamp(&input, &FixOptions::default().with_output(Some(output.as_path()))).unwrap();
        assert!(matches!(outcome, FixOutcome::Written { patched: 3, .. }));

        let outcome = fix_timestamp(&output, &FixOptions::default().with_output(Some(second.as_path()))).unwrap();
        assert!(matches!(outcome, FixOutcome::Unchanged { copied_to: None, .. }));
        assert!(!second.exists());

        cleanup(&[&input, &output, &second]);
    }

    #[test]
    fn fix_truncates_to_whole_seconds() {
        let samples = vec![gps_payload(2, "210615100000.500")];
        let input = write_temp("frac", &build_mp4(&samples, 1, wrong_creation(), false));
        let output = temp_path("frac_out");
        let second = temp_path("frac_second");

        let outcome = fix_timestamp(&input, &FixOptions::default().with_output(Some(output.as_path()))).unwrap();
        assert_eq!(capture_start_utc(outcome.fix()), datetime!(2021-06-15 10:00:00));
        let dates = creation_dates(&output);
        assert_eq!(dates.len(), 3);
        assert!(dates.iter().all(|d| d == &FieldValue::DateTime(datetime!(2021-06-15 10:00:00))));

        let outcome = fix_timestamp(&output, &FixOptions::default().with_output(Some(second.as_path()))).unwrap();
        assert!(matches!(outcome, FixOutcome::Unchanged { .. }));

        cleanup(&[&input, &output, &second]);
    }

    #[test]
    fn fix_without_matching_fields_changes_nothing() {
        let input = write_temp("nomatch", &build_mp4(&gps_payloads(), 0, wrong_creation(), false));
        let output = temp_path("nomatch_out");
        let options = FixOptions::default()
            .with_output(Some(output.as_path()))
            .with_field("no_such_field");
        let outcome = fix_timestamp(&input, &options).unwrap();
        assert!(matches!(outcome, FixOutcome::Unchanged { copied_to: None, .. }));
        assert!(!output.exists());

        let outcome = fix_timestamp(&input, &options.with_copy_unchanged(true)).unwrap();
        assert!(matches!(outcome, FixOutcome::Unchanged { copied_to: Some(_), .. }));
        assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());

        cleanup(&[&input, &output]);
    }

    #[test]
    fn fix_failures_write_nothing() {
        let bytes = build_mp4(&gps_payloads(), 0, wrong_creation(), false);
        let input = write_temp("fail", &bytes);
        let output = temp_path("fail_out");

        let options = FixOptions::default()
            .with_output(Some(output.as_path()))
            .with_sanity_year(Some(2020));
        assert!(matches!(
            fix_timestamp(&input, &options),
            Err(Mp4Error::SanityCheckFailed { expected: 2020, got: 2021 })
        ));
        assert!(!output.exists());
        assert!(!part_path(&output).exists());
        assert!(!fix_file(&input, Some(output.as_path()), false, Some(2020)));

        let no_fix: Vec<Vec<u8>> = (0..3).map(|_| gps_payload(0, "210615100000.000")).collect();
        let input_no_fix = write_temp("fail_nofix", &build_mp4(&no_fix, 0, wrong_creation(), false));
        assert!(matches!(
            fix_timestamp(&input_no_fix, &FixOptions::default().with_output(Some(output.as_path()))),
            Err(Mp4Error::NoGpsFixFound)
        ));
        assert!(!output.exists());
        assert_eq!(fs::read(&input).unwrap(), bytes);

        cleanup(&[&input, &input_no_fix, &output]);
    }

    #[test]
    fn fix_default_output_and_overwrite() {
        let input = write_temp("overwrite", &build_mp4(&gps_payloads(), 0, wrong_creation(), false));
        let default_output = FixOptions::default().output_path(&input);
        assert_eq!(default_output.to_string_lossy(), format!("{}.new", input.display()));

        assert!(fix_file(&input, None, false, Some(2021)));
        assert!(default_output.exists());
        fs::remove_file(&default_output).unwrap();

        let outcome = fix_timestamp(&input, &FixOptions::default().with_overwrite(true)).unwrap();
        assert!(matches!(&outcome, FixOutcome::Written { path, .. } if path == &input));
        assert!(!default_output.exists());
        let expected = FieldValue::DateTime(datetime!(2021-06-15 09:59:55));
        assert!(creation_dates(&input).iter().all(|d| d == &expected));

        cleanup(&[&input, &default_output]);
    }
}
