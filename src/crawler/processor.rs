use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::Client;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::utils::sanitize_filename;

static EXTENSION: &str = "webp";

/// 下载图片并转存为 WebP
#[derive(Clone)]
pub struct Processor {
    client: Client,
    quality: f32,
}

impl Processor {
    pub fn new(client: Client, quality: f32) -> Self {
        Self { client, quality }
    }

    /// 失败时只记录日志并返回 None，不影响其他图片
    #[instrument(skip(self, dir))]
    pub async fn save(&self, image_url: &str, dir: &Path, name: Option<&str>) -> Option<PathBuf> {
        match self.try_save(image_url, dir, name).await {
            Ok(path) => {
                info!("图片已保存到: {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!("Error saving image {}: {:#}", image_url, e);
                None
            }
        }
    }

    async fn try_save(&self, image_url: &str, dir: &Path, name: Option<&str>) -> Result<PathBuf> {
        let image_bytes = self.download(image_url).await?;
        let webp = encode_webp(&image_bytes, self.quality)?;

        let filename = format!("{}.{}", image_name(&image_bytes, name), EXTENSION);
        let image_path = dir.join(&filename);
        write_atomic(&image_path, &webp).await?;
        Ok(image_path)
    }

    async fn download(&self, image_url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .context("下载失败")?
            .error_for_status()?;

        response.bytes().await.context("读取响应失败")
    }
}

/// 自定义名字清理后使用，否则取内容 SHA-1 的前 10 位
pub fn image_name(image_bytes: &[u8], name: Option<&str>) -> String {
    match name {
        Some(name) => sanitize_filename(name),
        None => {
            let hash = sha1_smol::Sha1::from(image_bytes).hexdigest();
            hash[..10].to_owned()
        }
    }
}

pub fn encode_webp(image_bytes: &[u8], quality: f32) -> Result<Vec<u8>> {
    let image = image::load_from_memory(image_bytes)
        .context("无法解码图片")?
        .to_rgb8();

    let (width, height) = image.dimensions();
    let encoded = webp::Encoder::from_rgb(image.as_raw(), width, height)
        .encode_simple(false, quality)
        .map_err(|e| anyhow::anyhow!("WebP 编码失败: {:?}", e))?;

    Ok(encoded.to_vec())
}

/// 先写临时文件再重命名，中断时不会留下半个图片
async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    let result = async {
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("保存图片失败 {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_fn(8, 6, |x, y| Rgb([x as u8 * 30, y as u8 * 40, 90]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    async fn serve(body: Vec<u8>, status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/image"))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body))
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn hash_name_is_sha1_prefix() {
        // sha1("abc") = a9993e364706816aba3e25717850c26c9cd0d89d
        assert_eq!(image_name(b"abc", None), "a9993e3647");
    }

    #[test]
    fn custom_name_is_sanitized() {
        assert_eq!(
            image_name(b"abc", Some("Chapter 1: \"Start\" - 00")),
            "Chapter 1   Start  - 00"
        );
    }

    #[test]
    fn encodes_to_webp() {
        let webp = encode_webp(&png_bytes(), 95.0).unwrap();
        assert_eq!(&webp[..4], b"RIFF");
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[test]
    fn rejects_garbage() {
        assert!(encode_webp(b"<html>not an image</html>", 95.0).is_err());
    }

    #[tokio::test]
    async fn saves_with_hash_name() {
        let bytes = png_bytes();
        let expected = format!("{}.webp", &sha1_smol::Sha1::from(&bytes).hexdigest()[..10]);
        let server = serve(bytes, 200).await;
        let dir = tempfile::tempdir().unwrap();

        let processor = Processor::new(Client::new(), 95.0);
        let saved = processor
            .save(&format!("{}/image", server.uri()), dir.path(), None)
            .await
            .unwrap();

        assert_eq!(saved, dir.path().join(&expected));
        assert_eq!(files_in(dir.path()), [expected]);
        let written = std::fs::read(&saved).unwrap();
        assert_eq!(&written[8..12], b"WEBP");
    }

    #[tokio::test]
    async fn saves_with_sanitized_custom_name() {
        let server = serve(png_bytes(), 200).await;
        let dir = tempfile::tempdir().unwrap();

        let processor = Processor::new(Client::new(), 95.0);
        processor
            .save(
                &format!("{}/image", server.uri()),
                dir.path(),
                Some("What? <Foo> - 01"),
            )
            .await
            .unwrap();

        assert_eq!(files_in(dir.path()), ["What   Foo  - 01.webp"]);
    }

    #[tokio::test]
    async fn invalid_bytes_write_nothing() {
        let server = serve(b"definitely not an image".to_vec(), 200).await;
        let dir = tempfile::tempdir().unwrap();

        let processor = Processor::new(Client::new(), 95.0);
        let saved = processor
            .save(&format!("{}/image", server.uri()), dir.path(), Some("x"))
            .await;

        assert!(saved.is_none());
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn http_error_writes_nothing() {
        let server = serve(png_bytes(), 404).await;
        let dir = tempfile::tempdir().unwrap();

        let processor = Processor::new(Client::new(), 95.0);
        let saved = processor
            .save(&format!("{}/image", server.uri()), dir.path(), None)
            .await;

        assert!(saved.is_none());
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn missing_directory_writes_nothing() {
        let server = serve(png_bytes(), 200).await;
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        let processor = Processor::new(Client::new(), 95.0);
        let saved = processor
            .save(&format!("{}/image", server.uri()), &missing, None)
            .await;

        assert!(saved.is_none());
        assert!(!missing.exists());
    }
}
