//! In-memory audio decoding via symphonia
//!
//! Decoding is CPU-bound and synchronous; callers run it through
//! `tokio::task::spawn_blocking`. The trait seam exists so the
//! orchestrator can be tested without real codec work.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::SourceBlob;

/// One channel of decoded PCM
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Normalized f32 samples of the first channel, temporal order
    pub samples: Vec<f32>,
    /// Decode sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Decoded duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Seam between the orchestrator and the codec layer
pub trait Decoder: Send + Sync {
    fn decode(&self, blob: &SourceBlob) -> Result<DecodedAudio>;
}

/// Production decoder backed by symphonia's full codec registry
#[derive(Debug, Default)]
pub struct SymphoniaDecoder;

impl Decoder for SymphoniaDecoder {
    fn decode(&self, blob: &SourceBlob) -> Result<DecodedAudio> {
        let cursor = Cursor::new(blob.content.as_ref().clone());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some((_, ext)) = blob.name.rsplit_once('.') {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| Error::Decode(format!("unrecognized container: {}", e)))?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Decode("no audio track in source".to_string()))?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| Error::Decode("sample rate missing from codec params".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("no decoder for codec: {}", e)))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(Error::Decode(format!("packet read failed: {}", e))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Recoverable corruption: skip the packet, keep going
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(name = %blob.name, error = %e, "skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(Error::Decode(format!("decode failed: {}", e))),
            };

            let frames = decoded.frames();
            if frames == 0 {
                continue;
            }

            let buf = sample_buf.get_or_insert_with(|| {
                SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec())
            });
            // Planar layout puts channel 0 in the first `frames` slots
            buf.copy_planar_ref(decoded);
            samples.extend_from_slice(&buf.samples()[..frames]);
        }

        if samples.is_empty() {
            return Err(Error::Decode(format!(
                "no decodable audio in {}",
                blob.name
            )));
        }

        debug!(
            name = %blob.name,
            sample_rate,
            samples = samples.len(),
            "decoded audio"
        );

        Ok(DecodedAudio {
            samples,
            sample_rate,
        })
    }
}
