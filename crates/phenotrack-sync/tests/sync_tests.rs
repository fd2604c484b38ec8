//! Sync engine behaviour against an in-memory remote
//!
//! Run with: cargo test --package phenotrack-sync --test sync_tests

use phenotrack_sync::{
    Algorithm, ContentOutcome, DigestOutcome, DigestProvider, LocalDirTransport, StreamingDigests, SyncConfig,
    SyncEngine, SyncError,
};
use phenotrack_test_utils::MemoryTransport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

struct Setup {
    root: TempDir,
    files: Vec<PathBuf>,
}

fn local_tree() -> Setup {
    let root = tempfile::tempdir().unwrap();
    let nested = root.path().join("2013").join("tray-01");
    std::fs::create_dir_all(&nested).unwrap();
    let a = root.path().join("bag-a.zip");
    let b = nested.join("bag-b.zip");
    std::fs::write(&a, b"first bag contents").unwrap();
    std::fs::write(&b, b"second, longer bag contents").unwrap();
    Setup {
        root,
        files: vec![a, b],
    }
}

fn config(root: &Path) -> SyncConfig {
    SyncConfig::new(root, "/archive").with_algorithms([Algorithm::Sha256, Algorithm::Blake3])
}

async fn run(transport: &Arc<MemoryTransport>, setup: &Setup) -> phenotrack_sync::SyncReport {
    let config = config(setup.root.path());
    let digests = StreamingDigests::new(config.algorithms.clone());
    SyncEngine::new(transport.clone(), config)
        .sync_with(&setup.files, &digests)
        .await
        .unwrap()
}

#[tokio::test]
async fn first_run_uploads_everything_and_mirrors_layout() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());

    let report = run(&transport, &setup).await;
    assert_eq!(report.transfers(), 6);
    assert!(report.files.iter().all(|f| f.content == ContentOutcome::Uploaded));

    let nested = Path::new("/archive/2013/tray-01/bag-b.zip");
    assert_eq!(report.files[1].remote, nested);
    assert_eq!(transport.contents(nested).unwrap(), b"second, longer bag contents");
    assert!(transport.has_dir(Path::new("/archive/2013/tray-01")));

    let sidecar = transport.contents(Path::new("/archive/bag-a.zip.sha256")).unwrap();
    let expected = StreamingDigests::new([Algorithm::Sha256])
        .digest_file(&setup.files[0])
        .await
        .unwrap();
    assert_eq!(String::from_utf8(sidecar).unwrap(), expected[&Algorithm::Sha256]);
    // local sidecar written next to the file
    assert!(setup.root.path().join("bag-a.zip.b3").exists());
}

#[tokio::test]
async fn second_run_transfers_nothing() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    run(&transport, &setup).await;
    transport.reset_ops();

    let report = run(&transport, &setup).await;
    assert_eq!(report.transfers(), 0);
    assert_eq!(report.unchanged(), 2);
    let ops = transport.ops();
    assert_eq!(ops.put, 0);
    assert_eq!(ops.rm, 0);
    assert_eq!(ops.mkdirs, 0);
    assert!(report
        .files
        .iter()
        .flat_map(|f| f.digests.values())
        .all(|d| *d == DigestOutcome::Verified));
}

#[tokio::test]
async fn wrong_size_is_replaced_once() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    run(&transport, &setup).await;
    transport.seed("/archive/bag-a.zip", b"truncated".to_vec());
    transport.reset_ops();

    let report = run(&transport, &setup).await;
    assert_eq!(
        report.files[0].content,
        ContentOutcome::Replaced {
            local: 18,
            remote: 9
        }
    );
    assert_eq!(report.transfers(), 1);
    let ops = transport.ops();
    assert_eq!(ops.rm, 1);
    assert_eq!(ops.put, 1);
    assert_eq!(
        transport.contents(Path::new("/archive/bag-a.zip")).unwrap(),
        b"first bag contents"
    );
}

#[tokio::test]
async fn wrong_sidecar_is_replaced_and_content_left_alone() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    run(&transport, &setup).await;

    let sidecar = Path::new("/archive/2013/tray-01/bag-b.zip.sha256");
    let good = transport.contents(sidecar).unwrap();
    let mut bad = good.clone();
    bad[0] = if bad[0] == b'0' { b'1' } else { b'0' };
    transport.seed(sidecar, bad);
    transport.reset_ops();

    let report = run(&transport, &setup).await;
    let b = &report.files[1];
    assert_eq!(b.content, ContentOutcome::SizeMatch);
    assert_eq!(b.digests[&Algorithm::Sha256], DigestOutcome::Replaced);
    assert_eq!(b.digests[&Algorithm::Blake3], DigestOutcome::Verified);
    assert_eq!(report.transfers(), 1);
    assert_eq!(transport.ops().rm, 1);
    assert_eq!(transport.contents(sidecar).unwrap(), good);
}

#[tokio::test]
async fn multi_line_or_empty_sidecar_counts_as_mismatch() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    run(&transport, &setup).await;

    let sha = Path::new("/archive/bag-a.zip.sha256");
    let good = String::from_utf8(transport.contents(sha).unwrap()).unwrap();
    transport.seed(sha, format!("{good}\n{good}\n"));
    transport.seed("/archive/bag-a.zip.b3", Vec::<u8>::new());

    let report = run(&transport, &setup).await;
    let a = &report.files[0];
    assert_eq!(a.digests[&Algorithm::Sha256], DigestOutcome::Replaced);
    assert_eq!(a.digests[&Algorithm::Blake3], DigestOutcome::Replaced);
}

#[tokio::test]
async fn trailing_newline_still_verifies() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    run(&transport, &setup).await;

    let sha = Path::new("/archive/bag-a.zip.sha256");
    let good = String::from_utf8(transport.contents(sha).unwrap()).unwrap();
    transport.seed(sha, format!("{good}\n"));

    let report = run(&transport, &setup).await;
    assert_eq!(report.files[0].digests[&Algorithm::Sha256], DigestOutcome::Verified);
}

#[tokio::test]
async fn file_outside_root_fails_before_any_transfer() {
    let setup = local_tree();
    let elsewhere = tempfile::tempdir().unwrap();
    let stray = elsewhere.path().join("stray.zip");
    std::fs::write(&stray, b"stray").unwrap();
    let mut files = setup.files.clone();
    files.push(stray.clone());

    let transport = Arc::new(MemoryTransport::new());
    let engine = SyncEngine::new(transport.clone(), config(setup.root.path()));
    let digests = StreamingDigests::default().digests(&setup.files).await.unwrap();
    let err = engine.sync(&files, &digests).await.unwrap_err();

    assert!(matches!(err, SyncError::OutsideLocalRoot { ref path, .. } if path == &stray));
    assert_eq!(transport.ops(), Default::default());
}

#[tokio::test]
async fn missing_digests_are_reported_not_fatal() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    let engine = SyncEngine::new(transport.clone(), config(setup.root.path()));

    let report = engine.sync(&setup.files, &Default::default()).await.unwrap();
    assert!(report.files.iter().all(|f| f.missing_digests && f.digests.is_empty()));
    assert_eq!(report.transfers(), 2);
}

#[tokio::test]
async fn local_dir_transport_end_to_end() {
    let setup = local_tree();
    let mount = tempfile::tempdir().unwrap();
    let transport = Arc::new(LocalDirTransport::new(mount.path()));
    let config = config(setup.root.path()).with_concurrency(2);
    let digests = StreamingDigests::new(config.algorithms.clone());
    let engine = SyncEngine::new(transport, config);

    let first = engine.sync_with(&setup.files, &digests).await.unwrap();
    assert_eq!(first.transfers(), 6);
    assert!(mount.path().join("archive/2013/tray-01/bag-b.zip.b3").exists());

    let second = engine.sync_with(&setup.files, &digests).await.unwrap();
    assert_eq!(second.transfers(), 0);
}

#[tokio::test]
async fn empty_remote_file_is_uploaded_over() {
    let setup = local_tree();
    let transport = Arc::new(MemoryTransport::new());
    run(&transport, &setup).await;
    transport.seed("/archive/bag-a.zip", Vec::<u8>::new());
    transport.reset_ops();

    let report = run(&transport, &setup).await;
    assert_eq!(report.files[0].content, ContentOutcome::Uploaded);
    assert_eq!(transport.ops().rm, 0);
    assert_eq!(
        transport.contents(Path::new("/archive/bag-a.zip")).unwrap(),
        b"first bag contents"
    );
}

#[tokio::test]
async fn empty_local_file_is_uploaded_every_run() {
    let root = tempfile::tempdir().unwrap();
    let empty = root.path().join("empty.zip");
    std::fs::write(&empty, b"").unwrap();
    let setup = Setup {
        root,
        files: vec![empty],
    };
    let transport = Arc::new(MemoryTransport::new());

    run(&transport, &setup).await;
    transport.reset_ops();
    let report = run(&transport, &setup).await;
    assert_eq!(report.files[0].content, ContentOutcome::Uploaded);
    assert_eq!(transport.ops().put, 1);
}
