use std::io::{ErrorKind, Read};

/// 把输入流切分为固定大小的分片, 只有最后一个分片可能更短
pub struct ChunkReader<R> {
    inner: R,
    chunk_size: usize,
    read: usize,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            chunk_size: chunk_size.max(1),
            read: 0,
        }
    }

    /// 流结束时返回`None`
    pub fn next_chunk(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        let mut off = 0;

        while off < buf.len() {
            match self.inner.read(&mut buf[off..]) {
                Ok(0) => break,
                Ok(n) => off += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        self.read += off;
        if off == 0 {
            Ok(None)
        } else {
            buf.truncate(off);
            Ok(Some(buf))
        }
    }

    /// 已从输入流中读取的字节数
    pub const fn read_len(&self) -> usize {
        self.read
    }
}

#[cfg(test)]
mod tests {
    use super::ChunkReader;
    use std::io::Read;

    // 每次最多返回3个字节
    struct Trickle<'a>(&'a [u8]);

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn chunks_fill_across_short_reads() {
        let data = (0u8..10).collect::<Vec<_>>();
        let mut r = ChunkReader::new(Trickle(&data), 4);

        assert_eq!(r.next_chunk().unwrap(), Some(vec![0, 1, 2, 3]));
        assert_eq!(r.next_chunk().unwrap(), Some(vec![4, 5, 6, 7]));
        assert_eq!(r.next_chunk().unwrap(), Some(vec![8, 9]));
        assert_eq!(r.next_chunk().unwrap(), None);
        assert_eq!(r.read_len(), 10);
    }

    #[test]
    fn empty_stream_has_no_chunks() {
        let mut r = ChunkReader::new([0u8; 0].as_slice(), 4);
        assert_eq!(r.next_chunk().unwrap(), None);
        assert_eq!(r.read_len(), 0);
    }
}
