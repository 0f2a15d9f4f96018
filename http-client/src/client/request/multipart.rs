use super::chained_reader::ChainedReader;
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::{
    fmt::{self, Debug},
    io::{Cursor, Read},
    sync::Arc,
};
use thiserror::Error;

const BOUNDARY_PREFIX: &str = "----multipart";
const BOUNDARY_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._";
const BOUNDARY_RANDOM_LEN: usize = 32;

/// 上传的文件
///
/// 数据源只会被读取一次，随请求体一同被丢弃
pub struct FileAttachment {
    file_name: String,
    source: Box<dyn Read + Send>,
}

impl FileAttachment {
    /// 创建上传的文件
    #[inline]
    pub fn new(file_name: impl Into<String>, source: impl Read + Send + 'static) -> Self {
        Self {
            file_name: file_name.into(),
            source: Box::new(source),
        }
    }

    /// 获取文件名
    #[inline]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl Debug for FileAttachment {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAttachment")
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Multipart 表单已经关闭，无法再添加字段
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("multipart body is already closed")]
pub struct MultipartClosed;

struct Boundary {
    value: String,
    line: Arc<[u8]>,
}

/// 流式 Multipart 表单
///
/// 每个字段都被编码为若干段输入流，直到 [`MultipartBody::into_reader`] 后才被依次读取
pub struct MultipartBody {
    rng: Box<dyn RngCore + Send>,
    boundary: Option<Boundary>,
    segments: ChainedReader,
    closed: bool,
}

impl Default for MultipartBody {
    #[inline]
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl MultipartBody {
    /// 创建 Multipart 表单
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用指定的随机数生成器创建 Multipart 表单，分隔符由它生成
    #[inline]
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Box::new(rng),
            boundary: None,
            segments: Default::default(),
            closed: false,
        }
    }

    /// 获取分隔符
    ///
    /// 分隔符在首次使用时生成，之后不再改变
    pub fn boundary(&mut self) -> &str {
        &self.boundary_mut().value
    }

    /// 获取 Content-Type
    pub fn content_type(&mut self) -> String {
        format!("multipart/form-data; charset=utf-8; boundary=\"{}\"", self.boundary())
    }

    /// 是否已经关闭
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 添加文本字段
    pub fn add_param(&mut self, key: &str, value: &str) -> Result<&mut Self, MultipartClosed> {
        self.ensure_open()?;
        self.push_param(key, value);
        Ok(self)
    }

    /// 添加文件字段
    pub fn add_file_param(&mut self, key: &str, attachment: FileAttachment) -> Result<&mut Self, MultipartClosed> {
        self.ensure_open()?;
        self.push_file_param(key, attachment);
        Ok(self)
    }

    /// 写入结束分隔符，重复调用不会产生任何效果
    pub fn close(&mut self) -> &mut Self {
        if !self.closed {
            let ending = format!("--{}--", self.boundary());
            self.segments.push(Cursor::new(ending.into_bytes()));
            self.closed = true;
        }
        self
    }

    /// 转换为输入流
    #[inline]
    pub fn into_reader(self) -> ChainedReader {
        self.segments
    }

    fn ensure_open(&self) -> Result<(), MultipartClosed> {
        if self.closed {
            Err(MultipartClosed)
        } else {
            Ok(())
        }
    }

    fn push_param(&mut self, key: &str, value: &str) {
        let line = self.boundary_line();
        let header = format!(
            "\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            escape_quotes(key),
            value
        );
        self.segments.push_shared(&line).push(Cursor::new(header.into_bytes()));
    }

    fn push_file_param(&mut self, key: &str, attachment: FileAttachment) {
        let line = self.boundary_line();
        let header = format!(
            "\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            escape_quotes(key),
            escape_quotes(&attachment.file_name),
            mime::APPLICATION_OCTET_STREAM,
        );
        self.segments
            .push_shared(&line)
            .push(Cursor::new(header.into_bytes()))
            .push(attachment.source)
            .push(Cursor::new(&b"\r\n"[..]));
    }

    fn boundary_line(&mut self) -> Arc<[u8]> {
        self.boundary_mut().line.to_owned()
    }

    fn boundary_mut(&mut self) -> &Boundary {
        self.boundary.get_or_insert_with(|| {
            let value = generate_boundary(&mut *self.rng);
            Boundary {
                line: Arc::from(format!("--{}", value).into_bytes()),
                value,
            }
        })
    }

    #[cfg(test)]
    fn set_boundary(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.boundary = Some(Boundary {
            line: Arc::from(format!("--{}", value).into_bytes()),
            value,
        });
    }
}

impl Debug for MultipartBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartBody")
            .field("boundary", &self.boundary.as_ref().map(|boundary| &boundary.value))
            .field("segments", &self.segments)
            .field("closed", &self.closed)
            .finish()
    }
}

fn generate_boundary(rng: &mut dyn RngCore) -> String {
    let mut boundary = String::with_capacity(BOUNDARY_PREFIX.len() + BOUNDARY_RANDOM_LEN);
    boundary.push_str(BOUNDARY_PREFIX);
    boundary.extend(
        (0..BOUNDARY_RANDOM_LEN).map(|_| char::from(BOUNDARY_CHARSET[rng.gen_range(0..BOUNDARY_CHARSET.len())])),
    );
    boundary
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 将 Multipart 表单字段构建为请求体
pub(super) fn build<'a>(
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
    files: impl IntoIterator<Item = (String, FileAttachment)>,
    mut multipart: MultipartBody,
) -> (ChainedReader, String) {
    for (key, value) in params {
        multipart.push_param(key, value);
    }
    for (key, attachment) in files {
        multipart.push_file_param(&key, attachment);
    }
    let content_type = multipart.content_type();
    multipart.close();
    (multipart.into_reader(), content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_multipart_encoding() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let mut multipart = MultipartBody::new();
        multipart.set_boundary("boundary");
        multipart
            .add_param("bytes1", "part1")?
            .add_param("text\"2", "part2")?
            .add_file_param("file", FileAttachment::new("a\\b.txt", Cursor::new(b"file body".to_vec())))?;
        multipart.close().close();
        assert!(multipart.is_closed());
        assert_eq!(
            multipart.content_type(),
            "multipart/form-data; charset=utf-8; boundary=\"boundary\""
        );

        let mut body = String::new();
        multipart.into_reader().read_to_string(&mut body)?;
        assert_eq!(
            body,
            "--boundary\r\n\
             Content-Disposition: form-data; name=\"bytes1\"\r\n\r\n\
             part1\r\n\
             --boundary\r\n\
             Content-Disposition: form-data; name=\"text\\\"2\"\r\n\r\n\
             part2\r\n\
             --boundary\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"a\\\\b.txt\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             file body\r\n\
             --boundary--"
        );
        Ok(())
    }

    #[test]
    fn test_add_after_close() {
        env_logger::builder().is_test(true).try_init().ok();

        let mut multipart = MultipartBody::new();
        multipart.close();
        assert_eq!(multipart.add_param("k", "v").unwrap_err(), MultipartClosed);
        assert!(multipart
            .add_file_param("f", FileAttachment::new("f", Cursor::new(Vec::new())))
            .is_err());
    }

    #[test]
    fn test_boundary_generation() {
        env_logger::builder().is_test(true).try_init().ok();

        let mut multipart = MultipartBody::with_rng(StepRng::new(0, 1 << 58));
        let boundary = multipart.boundary().to_owned();
        assert!(boundary.starts_with(BOUNDARY_PREFIX));
        assert_eq!(boundary.len(), BOUNDARY_PREFIX.len() + BOUNDARY_RANDOM_LEN);
        assert!(boundary[BOUNDARY_PREFIX.len()..]
            .bytes()
            .all(|b| BOUNDARY_CHARSET.contains(&b)));
        assert_eq!(multipart.boundary(), boundary);

        let mut other = MultipartBody::with_rng(StepRng::new(0, 1 << 58));
        assert_eq!(other.boundary(), boundary);

        let mut random = MultipartBody::new();
        assert_ne!(random.boundary(), boundary);
    }

    #[test]
    fn test_build_with_attachments() -> anyhow::Result<()> {
        env_logger::builder().is_test(true).try_init().ok();

        let files = vec![(
            "upload".to_owned(),
            FileAttachment::new("x.bin", Cursor::new(vec![0u8, 1, 2])),
        )];
        let mut multipart = MultipartBody::new();
        multipart.set_boundary("b");
        let (mut reader, content_type) = build(vec![("k", "v")], files, multipart);
        assert_eq!(content_type, "multipart/form-data; charset=utf-8; boundary=\"b\"");

        let mut body = Vec::new();
        reader.read_to_end(&mut body)?;
        let mut expected = b"--b\r\nContent-Disposition: form-data; name=\"k\"\r\n\r\nv\r\n--b\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"x.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0, 1, 2]);
        expected.extend_from_slice(b"\r\n--b--");
        assert_eq!(body, expected);
        Ok(())
    }
}
