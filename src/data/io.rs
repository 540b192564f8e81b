//! Shared input helpers for the tabular loaders.

use crate::error::Result;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open a text file for buffered reading, decoding gzip when the path ends in `.gz`.
pub fn open_text<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    if is_gzip(path) {
        log::debug!("Reading gzip-compressed input {}", path.display());
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};

    #[test]
    fn test_reads_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("table.tsv");
        std::fs::write(&plain, "a\tb\n1\t2\n").unwrap();

        let gz = dir.path().join("table.tsv.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"a\tb\n1\t2\n").unwrap();
        encoder.finish().unwrap();

        let mut plain_text = String::new();
        open_text(&plain).unwrap().read_to_string(&mut plain_text).unwrap();
        let mut gz_text = String::new();
        open_text(&gz).unwrap().read_to_string(&mut gz_text).unwrap();

        assert_eq!(plain_text, gz_text);
    }
}
