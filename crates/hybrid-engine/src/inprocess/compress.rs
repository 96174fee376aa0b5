use crate::error::HybridEngineError;
use crate::types::{Backend, CompressResult, CompressionFormat};
use bzip2::write::BzEncoder;
use bzip2::Compression as BzCompression;
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;
use xz2::write::XzEncoder;

fn io_err(path: &Path, source: std::io::Error) -> HybridEngineError {
    HybridEngineError::Io { path: path.display().to_string(), source }
}

fn walk_dir_size(dir: &Path) -> std::io::Result<u64> {
    let mut total = 0;
    for entry in walkdir(dir)? {
        total += std::fs::metadata(&entry)?.len();
    }
    Ok(total)
}

fn walkdir(root: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(path);
            }
        }
    }
    Ok(files)
}

/// Compress `source` (file or, for archive formats, directory) into
/// `destination`. Non-archive formats reject directory sources
/// (spec.md §4.A: "for directories only archive formats... else
/// InvalidArgument").
pub fn compress_file(
    source: &Path,
    destination: &Path,
    format: CompressionFormat,
    level: u32,
) -> Result<CompressResult, HybridEngineError> {
    let level = level.clamp(1, 9);
    let start = Instant::now();

    if source.is_dir() && !format.is_archive_format() {
        return Err(HybridEngineError::InvalidArgument(format!(
            "{:?} cannot compress a directory source: {}",
            format,
            source.display()
        )));
    }
    if !source.exists() {
        return Err(HybridEngineError::Io {
            path: source.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "source path does not exist"),
        });
    }

    let original_size = if source.is_dir() {
        walk_dir_size(source).map_err(|e| io_err(source, e))?
    } else {
        std::fs::metadata(source).map_err(|e| io_err(source, e))?.len()
    };

    match format {
        CompressionFormat::Gzip => compress_single_gzip(source, destination, level)?,
        CompressionFormat::Bzip2 => compress_single_bzip2(source, destination, level)?,
        CompressionFormat::Xz => compress_single_xz(source, destination, level)?,
        CompressionFormat::Zip => compress_zip(source, destination, level)?,
        CompressionFormat::Tar => compress_tar(source, destination, None)?,
        CompressionFormat::TarGz => compress_tar(source, destination, Some(format))?,
        CompressionFormat::TarBz2 => compress_tar(source, destination, Some(format))?,
        CompressionFormat::TarXz => compress_tar(source, destination, Some(format))?,
    }

    let compressed_size = std::fs::metadata(destination).map_err(|e| io_err(destination, e))?.len();
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
    let ratio = if original_size > 0 { compressed_size as f64 / original_size as f64 } else { 0.0 };

    Ok(CompressResult { original_size, compressed_size, ratio, duration_ms, format, backend: Backend::InProcess })
}

fn compress_single_gzip(source: &Path, destination: &Path, level: u32) -> Result<(), HybridEngineError> {
    let mut src = BufReader::new(File::open(source).map_err(|e| io_err(source, e))?);
    let dst = File::create(destination).map_err(|e| io_err(destination, e))?;
    let mut encoder = GzEncoder::new(dst, GzCompression::new(level));
    std::io::copy(&mut src, &mut encoder).map_err(|e| io_err(destination, e))?;
    encoder.finish().map_err(|e| io_err(destination, e))?;
    Ok(())
}

fn compress_single_bzip2(source: &Path, destination: &Path, level: u32) -> Result<(), HybridEngineError> {
    let mut src = BufReader::new(File::open(source).map_err(|e| io_err(source, e))?);
    let dst = File::create(destination).map_err(|e| io_err(destination, e))?;
    let mut encoder = BzEncoder::new(dst, BzCompression::new(level));
    std::io::copy(&mut src, &mut encoder).map_err(|e| io_err(destination, e))?;
    encoder.finish().map_err(|e| io_err(destination, e))?;
    Ok(())
}

fn compress_single_xz(source: &Path, destination: &Path, level: u32) -> Result<(), HybridEngineError> {
    let mut src = BufReader::new(File::open(source).map_err(|e| io_err(source, e))?);
    let dst = File::create(destination).map_err(|e| io_err(destination, e))?;
    let mut encoder = XzEncoder::new(dst, level);
    std::io::copy(&mut src, &mut encoder).map_err(|e| io_err(destination, e))?;
    encoder.finish().map_err(|e| io_err(destination, e))?;
    Ok(())
}

fn compress_zip(source: &Path, destination: &Path, level: u32) -> Result<(), HybridEngineError> {
    let dst = File::create(destination).map_err(|e| io_err(destination, e))?;
    let mut zip = zip::ZipWriter::new(BufWriter::new(dst));
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .compression_level(Some(level as i64));

    if source.is_dir() {
        for path in walkdir(source).map_err(|e| io_err(source, e))? {
            let rel = path.strip_prefix(source).unwrap_or(&path);
            zip.start_file(rel.to_string_lossy(), options).map_err(|e| zip_err(&path, e))?;
            let mut f = File::open(&path).map_err(|e| io_err(&path, e))?;
            std::io::copy(&mut f, &mut zip).map_err(|e| io_err(&path, e))?;
        }
    } else {
        let name = source.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        zip.start_file(name, options).map_err(|e| zip_err(source, e))?;
        let mut f = File::open(source).map_err(|e| io_err(source, e))?;
        std::io::copy(&mut f, &mut zip).map_err(|e| io_err(source, e))?;
    }
    zip.finish().map_err(|e| zip_err(destination, e))?;
    Ok(())
}

fn zip_err(path: &Path, e: zip::result::ZipError) -> HybridEngineError {
    HybridEngineError::Io { path: path.display().to_string(), source: e.into() }
}

fn compress_tar(source: &Path, destination: &Path, layer: Option<CompressionFormat>) -> Result<(), HybridEngineError> {
    let dst = File::create(destination).map_err(|e| io_err(destination, e))?;
    let writer: Box<dyn std::io::Write> = match layer {
        Some(CompressionFormat::TarGz) => Box::new(GzEncoder::new(dst, GzCompression::default())),
        Some(CompressionFormat::TarBz2) => Box::new(BzEncoder::new(dst, BzCompression::default())),
        Some(CompressionFormat::TarXz) => Box::new(XzEncoder::new(dst, 6)),
        _ => Box::new(dst),
    };
    let mut builder = tar::Builder::new(writer);
    if source.is_dir() {
        builder.append_dir_all(".", source).map_err(|e| io_err(source, e))?;
    } else {
        let name = source.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        let mut f = File::open(source).map_err(|e| io_err(source, e))?;
        builder.append_file(name, &mut f).map_err(|e| io_err(source, e))?;
    }
    builder.into_inner().map_err(|e| io_err(destination, e))?;
    Ok(())
}

/// Decompress `source` into `destination`; when `format` is `None` it is
/// inferred from the source's extension, defaulting to gzip.
pub fn decompress_file(
    source: &Path,
    destination: &Path,
    format: Option<CompressionFormat>,
) -> Result<(), HybridEngineError> {
    let format = format.unwrap_or_else(|| CompressionFormat::infer_from_path(&source.display().to_string()));
    let src = File::open(source).map_err(|e| io_err(source, e))?;

    match format {
        CompressionFormat::Gzip => {
            let mut decoder = flate2::read::GzDecoder::new(src);
            let mut out = File::create(destination).map_err(|e| io_err(destination, e))?;
            std::io::copy(&mut decoder, &mut out).map_err(|e| io_err(destination, e))?;
        }
        CompressionFormat::Bzip2 => {
            let mut decoder = bzip2::read::BzDecoder::new(src);
            let mut out = File::create(destination).map_err(|e| io_err(destination, e))?;
            std::io::copy(&mut decoder, &mut out).map_err(|e| io_err(destination, e))?;
        }
        CompressionFormat::Xz => {
            let mut decoder = xz2::read::XzDecoder::new(src);
            let mut out = File::create(destination).map_err(|e| io_err(destination, e))?;
            std::io::copy(&mut decoder, &mut out).map_err(|e| io_err(destination, e))?;
        }
        CompressionFormat::Zip => {
            let mut archive = zip::ZipArchive::new(src).map_err(|e| zip_err(source, e))?;
            std::fs::create_dir_all(destination).map_err(|e| io_err(destination, e))?;
            archive.extract(destination).map_err(|e| zip_err(destination, e))?;
        }
        CompressionFormat::Tar => {
            let mut archive = tar::Archive::new(src);
            archive.unpack(destination).map_err(|e| io_err(destination, e))?;
        }
        CompressionFormat::TarGz => {
            let decoder = flate2::read::GzDecoder::new(src);
            let mut archive = tar::Archive::new(decoder);
            archive.unpack(destination).map_err(|e| io_err(destination, e))?;
        }
        CompressionFormat::TarBz2 => {
            let decoder = bzip2::read::BzDecoder::new(src);
            let mut archive = tar::Archive::new(decoder);
            archive.unpack(destination).map_err(|e| io_err(destination, e))?;
        }
        CompressionFormat::TarXz => {
            let decoder = xz2::read::XzDecoder::new(src);
            let mut archive = tar::Archive::new(decoder);
            archive.unpack(destination).map_err(|e| io_err(destination, e))?;
        }
    }
    Ok(())
}
