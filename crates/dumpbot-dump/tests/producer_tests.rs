// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the dump producer using stub dump programs.

use std::time::{Duration, Instant};

use dumpbot_core::{BackupStage, CancelReason, DumpbotError, OpContext};
use dumpbot_dump::DumpProducer;
use dumpbot_test_utils::fixtures::{failing_stub, printing_stub};
use dumpbot_test_utils::{test_config, write_stub};

fn artifact_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn stub_output_lands_in_named_artifact() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = printing_stub(bin.path(), "X");
    let mut config = test_config(out.path(), &stub);
    config.mysql.tables = "orders,customers".into();

    let artifact = DumpProducer::new(&config)
        .produce(&OpContext::background())
        .await
        .expect("dump should succeed");

    assert_eq!(artifact.path.parent(), Some(out.path()));
    assert!(artifact.file_name.starts_with("shop_orders_customers_"));
    assert!(artifact.file_name.ends_with(".sql.gz"));
    let stamp = artifact
        .file_name
        .trim_start_matches("shop_orders_customers_")
        .trim_end_matches(".sql.gz");
    assert_eq!(stamp.len(), "YYYYMMDD_HHMMSS".len());
    assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "X");
    assert_eq!(artifact.size_bytes, 1);
    assert_eq!(artifact.tables, vec!["orders", "customers"]);
}

#[tokio::test]
async fn failing_dump_reports_output_and_leaves_no_file() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = failing_stub(bin.path(), "access denied", 1);
    let config = test_config(out.path(), &stub);

    let err = DumpProducer::new(&config)
        .produce(&OpContext::background())
        .await
        .unwrap_err();

    match &err {
        DumpbotError::DumpFailed { status, output } => {
            assert_eq!(*status, Some(1));
            assert!(output.contains("access denied"), "got: {output}");
        }
        other => panic!("expected DumpFailed, got {other:?}"),
    }
    assert_eq!(err.stage(), Some(BackupStage::Dump));
    assert_eq!(artifact_count(out.path()), 0);
}

#[tokio::test]
async fn failing_dump_fails_even_when_compressor_succeeds() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = write_stub(bin.path(), "fake-dump", "printf 'partial'\nexit 3");
    let config = test_config(out.path(), &stub);

    let err = DumpProducer::new(&config)
        .produce(&OpContext::background())
        .await
        .unwrap_err();
    assert!(matches!(err, DumpbotError::DumpFailed { status: Some(3), .. }));
    assert_eq!(artifact_count(out.path()), 0);
}

#[tokio::test]
async fn concurrent_runs_get_distinct_names() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = printing_stub(bin.path(), "X");
    let config = test_config(out.path(), &stub);
    let producer = DumpProducer::new(&config);
    let ctx = OpContext::background();

    let (a, b) = tokio::join!(producer.produce(&ctx), producer.produce(&ctx));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.path, b.path);
    assert_eq!(artifact_count(out.path()), 2);
}

#[tokio::test]
async fn password_is_passed_through_environment() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = write_stub(
        bin.path(),
        "fake-dump",
        "case \"$*\" in *s3cr3t*) echo 'password on argv' >&2; exit 9;; esac\nprintf '%s' \"$MYSQL_PWD\"",
    );
    let mut config = test_config(out.path(), &stub);
    config.mysql.password = Some("s3cr3t".into());

    let artifact = DumpProducer::new(&config)
        .produce(&OpContext::background())
        .await
        .unwrap();
    assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), "s3cr3t");
}

#[tokio::test]
async fn missing_program_is_a_dump_failure() {
    let out = tempfile::tempdir().unwrap();
    let config = test_config(out.path(), std::path::Path::new("/nonexistent/mysqldump"));

    let err = DumpProducer::new(&config)
        .produce(&OpContext::background())
        .await
        .unwrap_err();
    assert!(matches!(err, DumpbotError::DumpFailed { status: Some(127), .. }));
    assert_eq!(artifact_count(out.path()), 0);
}

#[tokio::test]
async fn deadline_kills_hanging_dump_promptly() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = write_stub(bin.path(), "fake-dump", "printf 'start'\nsleep 30\nprintf 'end'");
    let config = test_config(out.path(), &stub);

    let started = Instant::now();
    let ctx = OpContext::background().with_timeout(Duration::from_millis(300));
    let err = DumpProducer::new(&config).produce(&ctx).await.unwrap_err();

    assert!(matches!(
        err,
        DumpbotError::Canceled {
            stage: BackupStage::Dump,
            reason: CancelReason::DeadlineExceeded
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(artifact_count(out.path()), 0);
}

#[tokio::test]
async fn cancellation_token_stops_dump() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let stub = write_stub(bin.path(), "fake-dump", "sleep 30");
    let config = test_config(out.path(), &stub);

    let ctx = OpContext::background();
    let token = ctx.token().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        token.cancel();
    });

    let err = DumpProducer::new(&config).produce(&ctx).await.unwrap_err();
    assert!(matches!(
        err,
        DumpbotError::Canceled {
            reason: CancelReason::Canceled,
            ..
        }
    ));
    assert_eq!(artifact_count(out.path()), 0);
}

#[tokio::test]
async fn missing_storage_directory_is_a_dump_failure() {
    let bin = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let gone = out.path().join("removed");
    let config = test_config(&gone, &printing_stub(bin.path(), "X"));
    let producer = DumpProducer::new(&config);
    assert_eq!(producer.dir(), gone.as_path());

    let err = producer.produce(&OpContext::background()).await.unwrap_err();

    assert_eq!(err.stage(), Some(BackupStage::Dump));
    match err {
        DumpbotError::DumpFailed { status, output } => {
            assert_eq!(status, None);
            assert!(output.contains("cannot create artifact"), "{output}");
            assert!(output.contains(&gone.display().to_string()), "{output}");
        }
        other => panic!("expected DumpFailed, got {other:?}"),
    }
    assert!(!gone.exists());
}
