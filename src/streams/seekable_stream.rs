use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// A seekable byte source the demultiplexer reads from: absolute seek,
/// sequential read and tell.
pub trait SeekableStream: Read + Seek {
    /// Current read position.
    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    /// Total length of the source. The read position is preserved.
    fn source_len(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;
        if pos != len {
            self.seek(SeekFrom::Start(pos))?;
        }
        Ok(len)
    }

    /// Skip `n` bytes forward.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        self.seek(SeekFrom::Current(n as i64))
    }
}

/// Local file wrapper
pub struct LocalSeekableStream(std::fs::File);
impl LocalSeekableStream {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(LocalSeekableStream(std::fs::File::open(path)?))
    }
}
impl Read for LocalSeekableStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}
impl Seek for LocalSeekableStream {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.0.seek(pos)
    }
}
impl SeekableStream for LocalSeekableStream {
    fn source_len(&mut self) -> io::Result<u64> {
        Ok(self.0.metadata()?.len())
    }
}

/// In-memory sources, used for probing buffers and for tests
impl<T: AsRef<[u8]>> SeekableStream for Cursor<T> {
    fn source_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalSeekableStream, SeekableStream};
    use std::io::{Cursor, Read, Write};

    #[test]
    fn test_cursor_len_keeps_position() {
        let mut c = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        c.skip(2).unwrap();
        assert_eq!(c.source_len().unwrap(), 5);
        assert_eq!(c.tell().unwrap(), 2);
    }

    #[test]
    fn test_local_file_stream() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b".RMFabcdef").unwrap();
        file.flush().unwrap();

        let mut stream = LocalSeekableStream::open(file.path()).unwrap();
        assert_eq!(stream.source_len().unwrap(), 10);
        stream.skip(4).unwrap();
        let mut buf = [0u8; 3];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(stream.tell().unwrap(), 7);
    }
}
