use crate::artifact::TempArtifact;
use clipvault_core::AudioFormat;
use std::io;

/// Enough for every signature `AudioFormat::sniff` knows.
const SNIFF_LEN: usize = 16;

/// Detect the encoding of a buffered upload: magic bytes, then declared MIME type, then
/// the original file extension.
pub async fn detect_format(
    artifact: &TempArtifact,
    declared_mime: &str,
    original_name: &str,
) -> io::Result<AudioFormat> {
    let header = artifact.read_header(SNIFF_LEN).await?;
    let format = AudioFormat::detect(&header, declared_mime, original_name);

    tracing::debug!(
        format = %format,
        declared_mime = %declared_mime,
        original_name = %original_name,
        "Detected audio format"
    );

    Ok(format)
}
