//! 上传内容与扩展名的一致性检查

/// 校验所需的最长文件头（webp 需要 12 字节）
pub const MAGIC_HEADER_LEN: usize = 12;

const ZIP_HEADER: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const OLE_HEADER: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// 校验文件头部字节是否与扩展名（含点号，如 ".png"）相符
///
/// 未知扩展名一律拒绝，空内容也视为不匹配。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        // 图片
        ".png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        ".jpg" | ".jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
        ".gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
        ".webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",

        // 文档
        ".pdf" => data.starts_with(b"%PDF"),
        ".doc" | ".ppt" => data.starts_with(OLE_HEADER),
        ".docx" | ".pptx" => data.starts_with(ZIP_HEADER),

        // 视频：ISO BMFF 在偏移 4 处为 "ftyp"
        ".mp4" => data.len() >= 8 && &data[4..8] == b"ftyp",

        // 压缩包
        ".zip" => data.starts_with(ZIP_HEADER),
        ".rar" => data.starts_with(b"Rar!"),

        // 纯文本没有固定文件头
        ".txt" | ".md" => true,

        _ => false,
    }
}
