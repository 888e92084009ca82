//! Archive builders and an in-memory transport for unit tests.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;
use url::Url;

use crate::utils::download::{FetchError, Transport};

pub type Entry<'a> = (&'a str, &'a [u8], u32);

pub fn tar(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    append_all(&mut builder, entries);
    builder.into_inner().unwrap()
}

pub fn tar_gz(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    append_all(&mut builder, entries);
    builder.into_inner().unwrap().finish().unwrap()
}

fn append_all<W: Write>(builder: &mut tar::Builder<W>, entries: &[Entry<'_>]) {
    for (path, data, mode) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(*mode);
        builder.append_data(&mut header, path, *data).unwrap();
    }
}

pub fn zip(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, data, mode) in entries {
        let options = zip::write::FileOptions::default().unix_permissions(*mode);
        writer.start_file(*path, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Serves fixed bodies by URL and records every request.
#[derive(Default)]
pub struct StaticTransport {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StaticTransport {
    fn fetch(&self, url: &Url, out: &mut dyn Write) -> Result<u64, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.get(url.as_str()) {
            Some(body) => {
                out.write_all(body).map_err(|source| FetchError::Io {
                    url: url.to_string(),
                    source,
                })?;
                Ok(body.len() as u64)
            }
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
