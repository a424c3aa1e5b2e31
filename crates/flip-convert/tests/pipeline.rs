//! Intake and transform driven from files on disk.

use std::fs;
use std::io::{Cursor, Read};
use std::sync::Arc;

use flip_convert::filesystem::FsUtils;
use flip_convert::{RequestId, TransformRequest, TransformResult, intake, transform};
use flip_core::config::ArchiveConfig;
use flip_core::types::{ConversionDirection, FormatPair};

#[test]
fn test_disk_batch_is_filtered_and_archived() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut paths = Vec::new();
    for (name, data) in [
        ("one.avif", b"111".as_slice()),
        ("two.AVIF", b"222".as_slice()),
        ("readme.md", b"skip".as_slice()),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, data).expect("write");
        paths.push(path);
    }

    let formats = FormatPair::default();
    let files = FsUtils::load_paths(&paths).expect("load");
    let batch = intake(files, ConversionDirection::AToB, &formats).expect("intake");
    assert_eq!(batch.count(), 2);

    let request = TransformRequest::new(
        RequestId(1),
        Arc::from(batch.files().to_vec()),
        ConversionDirection::AToB,
        &formats,
    );

    let mut progress = Vec::new();
    let result = transform(&request, &ArchiveConfig::default(), |p, i| progress.push((p, i)));
    assert_eq!(progress, vec![(50, 1), (100, 2)]);

    let TransformResult::Archive {
        blob, entry_names, ..
    } = result
    else {
        panic!("expected an archive");
    };
    assert_eq!(entry_names, vec!["one.jpg", "two.jpg"]);

    let mut zip = zip::ZipArchive::new(Cursor::new(blob.bytes.to_vec())).expect("zip");
    let mut first = String::new();
    zip.by_index(0)
        .expect("entry")
        .read_to_string(&mut first)
        .expect("read");
    assert_eq!(first, "111");
}

#[test]
fn test_small_batch_level_is_honored() {
    let config = ArchiveConfig {
        small_batch_level: Some(6),
        ..ArchiveConfig::default()
    };
    assert_eq!(config.level_for(10), 6);
    assert_eq!(config.level_for(11), 3);
}

#[test]
fn test_file_removed_after_intake_fails_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.jpg");
    fs::write(&a, b"a").expect("write");
    fs::write(&b, b"b").expect("write");

    let formats = FormatPair::default();
    let files = FsUtils::load_paths(&[&a, &b]).expect("load");
    let batch = intake(files, ConversionDirection::BToA, &formats).expect("intake");
    fs::remove_file(&b).expect("remove");

    let request = TransformRequest::new(
        RequestId(1),
        Arc::from(batch.files().to_vec()),
        ConversionDirection::BToA,
        &formats,
    );
    match transform(&request, &ArchiveConfig::default(), |_, _| {}) {
        TransformResult::Failure { message } => assert!(message.starts_with("Failed to read b.jpg")),
        other => panic!("expected failure, got {other:?}"),
    }
}
