//! `multipart/form-data` request parts
//!
//! Gateways list the parts; [`ReqwestTransport`](super::ReqwestTransport)
//! turns them into a `reqwest::multipart::Form`, streaming file parts so
//! byte progress can be reported while they are written.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::multipart::{Form, Part};

use super::transport::ByteProgress;

/// Size of the file chunks fed to the connection during uploads
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

impl fmt::Debug for FormPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormPart::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("content_type", content_type)
                .field("size", &bytes.len())
                .finish(),
        }
    }
}

/// Ordered list of form parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|p| p.name() == name)
    }

    /// Value of a text field
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Bytes carried by file parts; progress is measured against this
    pub fn upload_len(&self) -> u64 {
        self.parts
            .iter()
            .map(|p| match p {
                FormPart::File { bytes, .. } => bytes.len() as u64,
                FormPart::Text { .. } => 0,
            })
            .sum()
    }

    /// Build the reqwest form, reporting file bytes to `progress` as the
    /// connection pulls them
    pub fn into_reqwest(self, progress: Option<ByteProgress>) -> Result<Form, reqwest::Error> {
        let total = self.upload_len();
        let sent = Arc::new(AtomicU64::new(0));
        let mut form = Form::new();

        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let part = match &progress {
                        Some(progress) => {
                            file_stream_part(bytes, progress.clone(), sent.clone(), total)
                        }
                        None => Part::bytes(bytes),
                    };
                    form.part(name, part.file_name(file_name).mime_str(&content_type)?)
                }
            };
        }
        Ok(form)
    }
}

fn file_stream_part(
    bytes: Vec<u8>,
    progress: ByteProgress,
    sent: Arc<AtomicU64>,
    total: u64,
) -> Part {
    let len = bytes.len() as u64;
    Part::stream_with_length(
        reqwest::Body::wrap_stream(progress_chunks(bytes, progress, sent, total)),
        len,
    )
}

/// Chunks of `bytes`, each reported to `progress` when the consumer pulls it
fn progress_chunks(
    bytes: Vec<u8>,
    progress: ByteProgress,
    sent: Arc<AtomicU64>,
    total: u64,
) -> impl futures::Stream<Item = Result<Vec<u8>, std::io::Error>> {
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

    futures::stream::iter(chunks.into_iter().map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        progress(done, total);
        Ok(chunk)
    }))
}
