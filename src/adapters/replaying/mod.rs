//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_generator;
pub mod job_backend;

use serde::de::DeserializeOwned;

use crate::cassette::format::decode_outcome;
use crate::cassette::replayer::CassetteReplayer;
use crate::error::ImageError;

/// Take the next recorded outcome for `port::method`.
pub(crate) fn replay<T: DeserializeOwned>(
    replayer: &CassetteReplayer,
    port: &str,
    method: &str,
) -> Result<T, ImageError> {
    let output = replayer.next_output(port, method).map_err(ImageError::Config)?;
    decode_outcome(output)
}
