// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Logging set-up for the capture example.

use tracing::level_filters::LevelFilter;

/// Sends logs to stderr, keeping stdout free for piping captured payloads.
///
/// Payloads are written on a worker thread while the main thread watches the
/// bus, so each line carries its thread name. `verbose` lowers the default
/// level to DEBUG, which surfaces queue drops and sink attach/detach;
/// `RUST_LOG` still overrides both.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}
