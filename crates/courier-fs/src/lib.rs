//! File sink capability consumed by courier's download handlers.
//!
//! The request pipeline never creates files itself. It asks a [`FileSink`]
//! for a writer and streams response bytes into it; [`LocalFs`] is the
//! `tokio::fs` implementation.

mod error;
mod options;
mod sink;

pub use error::{Error, Result};
pub use options::SinkOptions;
pub use sink::{FileSink, LocalFs, SinkWriter};
