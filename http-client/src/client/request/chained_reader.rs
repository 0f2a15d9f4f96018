use std::{
    collections::VecDeque,
    fmt::{self, Debug},
    io::{Cursor, Read, Result as IoResult},
    sync::Arc,
};

/// 串联输入流
///
/// 依次读取每一段输入流，当前段读尽后将其丢弃再读取下一段，
/// 从而在不把数据读入内存的前提下拼接出完整的请求体
#[derive(Default)]
pub struct ChainedReader {
    segments: VecDeque<Box<dyn Read + Send>>,
}

impl ChainedReader {
    /// 追加一段输入流
    #[inline]
    pub fn push(&mut self, segment: impl Read + Send + 'static) -> &mut Self {
        self.segments.push_back(Box::new(segment));
        self
    }

    /// 追加一段共享的只读数据
    #[inline]
    pub fn push_shared(&mut self, bytes: &Arc<[u8]>) -> &mut Self {
        self.push(Cursor::new(SharedBytes(bytes.to_owned())))
    }

    /// 尚未读尽的段数
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// 是否已经读尽
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Read for ChainedReader {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while let Some(segment) = self.segments.front_mut() {
            match segment.read(buf)? {
                0 => {
                    self.segments.pop_front();
                }
                n => return Ok(n),
            }
        }
        Ok(0)
    }
}

impl Debug for ChainedReader {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedReader")
            .field("segments", &self.segments.len())
            .finish()
    }
}

struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
