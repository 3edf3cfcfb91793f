// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact file naming and atomic name reservation.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dumpbot_core::ARTIFACT_SUFFIX;
use rand::Rng;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DISAMBIGUATOR_LEN: usize = 4;
const DISAMBIGUATOR_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const MAX_RESERVE_ATTEMPTS: usize = 16;

/// `{database}_{tables}_{YYYYMMDD_HHMMSS}` without suffix.
pub fn base_name(database: &str, tables: &[String], at: &DateTime<Local>) -> String {
    let tables = if tables.is_empty() {
        "all".to_string()
    } else {
        tables.join("_")
    };
    format!("{database}_{tables}_{}", at.format(STAMP_FORMAT))
}

fn disambiguator() -> String {
    let mut rng = rand::thread_rng();
    (0..DISAMBIGUATOR_LEN)
        .map(|_| DISAMBIGUATOR_CHARSET[rng.gen_range(0..DISAMBIGUATOR_CHARSET.len())] as char)
        .collect()
}

/// A file name claimed on disk, opened for writing.
#[derive(Debug)]
pub struct Reservation {
    pub path: PathBuf,
    pub file_name: String,
    pub file: std::fs::File,
}

/// Claim a fresh artifact name in `dir`.
///
/// The plain name is tried first; if another run created it in the same
/// second a random lowercase alphanumeric disambiguator is appended.
pub async fn reserve(dir: &Path, base: &str) -> io::Result<Reservation> {
    let mut file_name = format!("{base}{ARTIFACT_SUFFIX}");
    for _ in 0..MAX_RESERVE_ATTEMPTS {
        let path = dir.join(&file_name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                return Ok(Reservation {
                    path,
                    file_name,
                    file: file.into_std().await,
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(file = %file_name, "artifact name taken, adding disambiguator");
                file_name = format!("{base}_{}{ARTIFACT_SUFFIX}", disambiguator());
            }
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("could not reserve a unique artifact name for {base}"),
    ))
}
