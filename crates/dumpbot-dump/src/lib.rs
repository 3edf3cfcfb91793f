// SPDX-FileCopyrightText: 2026 Dumpbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact producer for dumpbot.
//!
//! Runs the configured dump utility through a shell pipeline into the
//! compressor and writes the output to a uniquely named `.sql.gz` file.

pub mod naming;
pub mod producer;
pub mod shell;

pub use producer::DumpProducer;
pub use shell::sh_escape;
