// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention sweeper behaviour against a real directory.

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};

use dumpbot_cron::{RetentionSweeper, SweepReport};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn touch(dir: &Path, name: &str, modified: SystemTime) {
    let file = File::create(dir.join(name)).unwrap();
    file.set_modified(modified).unwrap();
}

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn deletes_only_expired_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let now = SystemTime::now();
    let old = now - 10 * DAY;
    let fresh = now - DAY;

    touch(dir.path(), "shop_all_old.sql.gz", old);
    touch(dir.path(), "shop_all_fresh.sql.gz", fresh);
    touch(dir.path(), "notes_old.txt", old);
    touch(dir.path(), "shop_all_old.sql", old);
    std::fs::create_dir(dir.path().join("nested.sql.gz")).unwrap();

    let report = RetentionSweeper::new(dir.path(), 7).sweep_at(now).await.unwrap();

    assert_eq!(report, SweepReport { deleted: 1, failed: 0 });
    assert_eq!(
        names(dir.path()),
        vec![
            "nested.sql.gz",
            "notes_old.txt",
            "shop_all_fresh.sql.gz",
            "shop_all_old.sql",
        ]
    );
}

#[tokio::test]
async fn file_exactly_at_cutoff_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let now = SystemTime::UNIX_EPOCH + 1000 * DAY;
    touch(dir.path(), "at_cutoff.sql.gz", now - 7 * DAY);
    touch(dir.path(), "past_cutoff.sql.gz", now - 7 * DAY - Duration::from_secs(1));

    let report = RetentionSweeper::new(dir.path(), 7).sweep_at(now).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(names(dir.path()), vec!["at_cutoff.sql.gz"]);
}

#[tokio::test]
async fn non_positive_retention_deletes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let now = SystemTime::now();
    touch(dir.path(), "ancient.sql.gz", now - 365 * DAY);

    for days in [0, -3] {
        let report = RetentionSweeper::new(dir.path(), days).sweep_at(now).await.unwrap();
        assert_eq!(report, SweepReport::default());
    }
    assert_eq!(names(dir.path()), vec!["ancient.sql.gz"]);
}

#[tokio::test]
async fn empty_directory_reports_zero() {
    let dir = tempfile::tempdir().unwrap();
    let report = RetentionSweeper::new(dir.path(), 7).sweep().await.unwrap();
    assert_eq!(report, SweepReport::default());
}
