//! The batch conversion pipeline.
//!
//! A [`Session`] holds a queue of inputs and the results of finished runs.
//! [`Session::run`] drains the queue and converts each item through a fixed
//! sequence of stages: decode, resize, flatten (opaque targets only), encode,
//! metadata. Items are processed strictly one at a time, in queue order.
//!
//! Per-item failure is contained: a failed item becomes a text
//! [`ConversionResult::Failed`] describing what went wrong, and the run
//! continues with the next item. Every queued item yields exactly one result.

use crate::imaging::compose::{flatten_onto, resize_to_limit};
use crate::imaging::{DecodeError, DecoderRegistry, EncodeError, encode};
use crate::metadata::preserve_metadata;
use crate::naming::{error_name, media_type_for, output_name};
use crate::options::ConversionOptions;
use image::DynamicImage;
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
}

/// One input waiting to be converted.
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// File name without directory components.
    pub name: String,
    /// Declared media type, used alongside the name for format sniffing.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl QueueItem {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring the media type from its extension.
    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = media_type_for(&name).to_string();
        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }
}

/// The outcome of converting one queue item.
///
/// Failures are results too: a failed item carries its message both in the
/// variant and as a downloadable text payload named after the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionResult {
    Converted {
        name: String,
        media_type: String,
        #[serde(skip)]
        payload: Vec<u8>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Failed {
        name: String,
        message: String,
    },
}

impl ConversionResult {
    pub fn name(&self) -> &str {
        match self {
            ConversionResult::Converted { name, .. } => name,
            ConversionResult::Failed { name, .. } => name,
        }
    }

    pub fn media_type(&self) -> &str {
        match self {
            ConversionResult::Converted { media_type, .. } => media_type,
            ConversionResult::Failed { .. } => "text/plain",
        }
    }

    /// The bytes to write for this result. For failures this is the error
    /// text, so the batch always produces one file per input.
    pub fn payload(&self) -> Cow<'_, [u8]> {
        match self {
            ConversionResult::Converted { payload, .. } => Cow::Borrowed(payload),
            ConversionResult::Failed { message, .. } => {
                Cow::Owned(format!("Conversion failed: {message}").into_bytes())
            }
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, ConversionResult::Converted { .. })
    }
}

/// Where an item currently is in the conversion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Decoding,
    Resizing,
    Encoding,
    Metadata,
    Done,
    Failed,
}

impl ItemStage {
    pub fn label(self) -> &'static str {
        match self {
            ItemStage::Decoding => "decoding",
            ItemStage::Resizing => "resizing",
            ItemStage::Encoding => "encoding",
            ItemStage::Metadata => "metadata",
            ItemStage::Done => "done",
            ItemStage::Failed => "failed",
        }
    }
}

/// Progress event emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertEvent {
    pub name: String,
    pub stage: ItemStage,
}

#[derive(Error, Debug)]
enum ItemError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A conversion session: the input queue plus accumulated results.
///
/// `run` takes `&mut self`, so a session can never run two batches at once.
/// Results from earlier runs stay until [`Session::clear_results`].
#[derive(Default)]
pub struct Session {
    queue: Vec<QueueItem>,
    results: Vec<ConversionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: QueueItem) {
        self.queue.push(item);
    }

    pub fn enqueue_path(&mut self, path: &Path) -> Result<(), PipelineError> {
        let item = QueueItem::from_path(path)?;
        self.enqueue(item);
        Ok(())
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn results(&self) -> &[ConversionResult] {
        &self.results
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Convert every queued item, in order, one at a time.
    ///
    /// The queue is drained up front: whatever happens per item, it is empty
    /// when the run finishes. Returns the results of this run; they are also
    /// appended to [`Session::results`].
    pub fn run(
        &mut self,
        options: &ConversionOptions,
        registry: &DecoderRegistry,
        events: Option<Sender<ConvertEvent>>,
    ) -> &[ConversionResult] {
        let queue = std::mem::take(&mut self.queue);
        let first_new = self.results.len();

        for item in queue {
            let emit = |stage: ItemStage| {
                if let Some(tx) = &events {
                    // A dropped receiver only means nobody is listening.
                    let _ = tx.send(ConvertEvent {
                        name: item.name.clone(),
                        stage,
                    });
                }
            };

            let result = match convert_item(&item, options, registry, &emit) {
                Ok(result) => {
                    emit(ItemStage::Done);
                    result
                }
                Err(e) => {
                    log::warn!("conversion of {} failed: {e}", item.name);
                    emit(ItemStage::Failed);
                    ConversionResult::Failed {
                        name: error_name(&item.name),
                        message: e.to_string(),
                    }
                }
            };
            self.results.push(result);
        }

        &self.results[first_new..]
    }
}

fn convert_item(
    item: &QueueItem,
    options: &ConversionOptions,
    registry: &DecoderRegistry,
    emit: &dyn Fn(ItemStage),
) -> Result<ConversionResult, ItemError> {
    emit(ItemStage::Decoding);
    let decoded = registry.decode(&item.name, &item.media_type, &item.bytes)?;

    emit(ItemStage::Resizing);
    let resized = resize_to_limit(&decoded, options.max_side);
    let surface = if options.format.supports_alpha() {
        DynamicImage::ImageRgba8(resized)
    } else {
        DynamicImage::ImageRgb8(flatten_onto(&resized, options.background))
    };

    emit(ItemStage::Encoding);
    let payload = encode::encode(&surface, options.format, options.quality)?;

    emit(ItemStage::Metadata);
    let outcome = preserve_metadata(
        &item.name,
        &item.media_type,
        &item.bytes,
        payload,
        options.metadata,
        options.format,
    );

    Ok(ConversionResult::Converted {
        name: output_name(&item.name, options.format.extension()),
        media_type: options.format.media_type().to_string(),
        payload: outcome.payload,
        note: outcome.note,
    })
}
