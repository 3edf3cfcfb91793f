// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The artifact producer: runs the dump pipeline into a reserved file.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::Local;
use dumpbot_config::DumpbotConfig;
use dumpbot_core::{tables_label, Artifact, BackupStage, CancelReason, DumpbotError, OpContext};
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::naming;
use crate::shell::{self, PipelineSpec};

/// Environment variable the dump utility reads its password from.
const PASSWORD_ENV: &str = "MYSQL_PWD";

/// Upper bound on captured diagnostic output.
const MAX_DIAGNOSTIC_BYTES: usize = 64 * 1024;

/// Runs `{program} ... | {compress}` and writes the result under the storage directory.
#[derive(Debug)]
pub struct DumpProducer {
    dir: PathBuf,
    shell: String,
    program: String,
    host: String,
    port: String,
    user: String,
    password: Option<SecretString>,
    extra_args: Vec<String>,
    database: String,
    tables: Vec<String>,
    compress_command: String,
}

impl DumpProducer {
    pub fn new(config: &DumpbotConfig) -> Self {
        Self {
            dir: config.backup.dir.clone(),
            shell: config.dump.shell.clone(),
            program: config.dump.program.clone(),
            host: config.mysql.host.clone(),
            port: config.mysql.port.clone(),
            user: config.mysql.user.clone(),
            password: config
                .mysql
                .password
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| SecretString::from(p.to_string())),
            extra_args: config.dump.extra_args.clone(),
            database: config.mysql.database.trim().to_string(),
            tables: config.mysql.table_list(),
            compress_command: config.dump.compress_command.clone(),
        }
    }

    /// Storage directory artifacts are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Table selector this producer dumps (empty for the whole database).
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    fn pipeline(&self) -> String {
        shell::build_pipeline(&PipelineSpec {
            program: &self.program,
            host: &self.host,
            port: &self.port,
            user: &self.user,
            extra_args: &self.extra_args,
            database: &self.database,
            tables: &self.tables,
            compress_command: &self.compress_command,
        })
    }

    /// Produce one artifact.
    ///
    /// On any failure, including cancellation, the partially written file is
    /// removed before returning.
    pub async fn produce(&self, ctx: &OpContext) -> Result<Artifact, DumpbotError> {
        if let Some(reason) = ctx.check() {
            return Err(canceled(reason));
        }

        let created_at = Local::now();
        let base = naming::base_name(&self.database, &self.tables, &created_at);
        let reservation = naming::reserve(&self.dir, &base).await.map_err(|e| {
            DumpbotError::DumpFailed {
                status: None,
                output: format!("cannot create artifact in {}: {e}", self.dir.display()),
            }
        })?;
        let path = reservation.path;

        info!(
            database = %self.database,
            tables = %tables_label(&self.tables),
            file = %reservation.file_name,
            "starting dump"
        );

        let mut command = Command::new(&self.shell);
        command
            .arg("-c")
            .arg(self.pipeline())
            .stdin(Stdio::null())
            .stdout(Stdio::from(reservation.file))
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        if let Some(password) = &self.password {
            command.env(PASSWORD_ENV, password.expose_secret());
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                remove_partial(&path).await;
                return Err(DumpbotError::DumpFailed {
                    status: None,
                    output: format!("failed to start {}: {e}", self.shell),
                });
            }
        };

        let stderr = child.stderr.take();
        // Drain stderr fully so a chatty pipeline never blocks on a full pipe.
        let diagnostics = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut stderr) = stderr {
                let mut chunk = [0u8; 8192];
                while let Ok(n) = stderr.read(&mut chunk).await {
                    if n == 0 {
                        break;
                    }
                    let room = MAX_DIAGNOSTIC_BYTES.saturating_sub(buf.len());
                    buf.extend_from_slice(&chunk[..n.min(room)]);
                }
            }
            String::from_utf8_lossy(&buf).into_owned()
        });

        let status = tokio::select! {
            status = child.wait() => status,
            reason = ctx.done() => {
                warn!(file = %path.display(), %reason, "dump interrupted, killing pipeline");
                kill_pipeline(&mut child).await;
                diagnostics.abort();
                remove_partial(&path).await;
                return Err(canceled(reason));
            }
        };

        let output = diagnostics.await.unwrap_or_default();
        let status = match status {
            Ok(status) => status,
            Err(e) => {
                remove_partial(&path).await;
                return Err(DumpbotError::DumpFailed {
                    status: None,
                    output: format!("failed to wait for dump pipeline: {e}"),
                });
            }
        };

        if !status.success() {
            remove_partial(&path).await;
            return Err(DumpbotError::DumpFailed {
                status: status.code(),
                output,
            });
        }

        let size_bytes = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Err(DumpbotError::DumpFailed {
                    status: Some(0),
                    output: format!("artifact {} unreadable after dump: {e}", path.display()),
                });
            }
        };

        if !output.trim().is_empty() {
            debug!(output = %output.trim(), "dump pipeline diagnostics");
        }

        let artifact = Artifact {
            path,
            file_name: reservation.file_name,
            database: self.database.clone(),
            tables: self.tables.clone(),
            size_bytes,
            created_at,
        };
        info!(
            file = %artifact.file_name,
            size_mb = %format!("{:.2}", artifact.size_mb()),
            "dump complete"
        );
        Ok(artifact)
    }
}

fn canceled(reason: CancelReason) -> DumpbotError {
    DumpbotError::Canceled {
        stage: BackupStage::Dump,
        reason,
    }
}

/// Kill the shell and everything it spawned.
async fn kill_pipeline(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: killpg only sends a signal; the group was created by
            // `process_group(0)` at spawn so the pid is also the group id.
            let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if rc != 0 {
                debug!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
            }
        }
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "kill after cancellation failed");
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(file = %path.display(), "removed partial artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(file = %path.display(), error = %e, "failed to remove partial artifact"),
    }
}
