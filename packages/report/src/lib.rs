#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Enriched station report: composition, batch pipeline and export.
//!
//! [`pipeline::run`] chains the spatial join, hourly profiling and
//! neighborhood ranking stages and hands their outputs to
//! [`compose::compose_report`]. [`export`] writes the result as JSON,
//! `MessagePack` or `GeoJSON` and reads JSON/`MessagePack` back.

pub mod compose;
pub mod export;
pub mod pipeline;

use bike_map_summarize::SummarizeError;
use thiserror::Error;

use crate::export::ReportFormat;

/// Errors that can occur while building or exporting a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Input validation or configuration failed.
    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    /// File I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `MessagePack` encoding failed.
    #[error("MessagePack encode error: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    /// `MessagePack` decoding failed.
    #[error("MessagePack decode error: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),

    /// The path has no recognised report extension.
    #[error("Cannot infer report format from path: {path}")]
    UnknownExtension {
        /// Offending path.
        path: String,
    },

    /// The format does not support the requested operation.
    #[error("Report format {format} does not support {operation}")]
    UnsupportedFormat {
        /// Requested format.
        format: ReportFormat,
        /// Operation attempted (e.g. `"read"`).
        operation: &'static str,
    },
}
