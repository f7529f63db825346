//! Single-pass gzip compression with MD5 of the uncompressed bytes.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::delivery::request::{ClientHash, HASH_LEN};

/// Read chunk size for payload streaming.
const CHUNK_SIZE: usize = 64 * 1024;

/// Output of one transform pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Gzip stream of the payload.
    pub gzipped: Vec<u8>,
    /// MD5 of the uncompressed payload.
    pub md5: [u8; HASH_LEN],
    /// Uncompressed payload length.
    pub uncompressed_len: u64,
}

impl Transformed {
    /// True if the client already holds these bytes.
    pub fn matches(&self, client_hash: &ClientHash) -> bool {
        self.md5 == *client_hash.as_bytes()
    }

    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5)
    }
}

/// Gzip and hash sinks fed from the same bytes.
struct GzipMd5Sink {
    encoder: GzEncoder<Vec<u8>>,
    context: md5::Context,
    written: u64,
}

impl GzipMd5Sink {
    fn new(level: Compression) -> Self {
        Self {
            encoder: GzEncoder::new(Vec::new(), level),
            context: md5::Context::new(),
            written: 0,
        }
    }

    fn finish(self) -> io::Result<Transformed> {
        // Compression is closed before the digest is taken.
        let gzipped = self.encoder.finish()?;
        let md5 = self.context.compute().0;
        Ok(Transformed {
            gzipped,
            md5,
            uncompressed_len: self.written,
        })
    }
}

impl Write for GzipMd5Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.context.consume(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}

/// Drain `reader` once, compressing and hashing every byte.
pub async fn gzip_and_hash<R>(mut reader: R, level: Compression) -> io::Result<Transformed>
where
    R: AsyncRead + Unpin,
{
    let mut sink = GzipMd5Sink::new(level);
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
    }
    sink.finish()
}
