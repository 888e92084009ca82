pub mod http_server;

use flate2::write::GzEncoder;
use flate2::Compression;

/// A gzip-compressed tar holding `bin/<daemon>` as an executable script.
pub fn daemon_tar_gz(daemon: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let data: &[u8] = b"#!/bin/sh\necho upgraded\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o755);
    builder
        .append_data(&mut header, format!("bin/{}", daemon), data)
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}
