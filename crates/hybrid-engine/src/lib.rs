mod config;
mod engine;
mod error;
mod inprocess;
mod native;
mod types;

pub use config::HybridEngineConfig;
pub use engine::HybridEngine;
pub use error::HybridEngineError;
pub use types::{
    Backend, ChecksumResult, CompareResult, CompressResult, CompressionFormat, CopyResult,
    CpuStats, DiskStats, MemoryStats, NetworkStats, SwapStats, SystemStats,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn engine_without_helper() -> HybridEngine {
        HybridEngine::new(HybridEngineConfig { helper_path: None, ..Default::default() }).await
    }

    #[tokio::test]
    async fn copy_file_falls_back_to_in_process_without_helper() {
        let engine = engine_without_helper().await;
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, b"hello world").unwrap();
        let destination = dir.path().join("dest.txt");

        let result = engine.copy_file(&source, &destination).await.unwrap();
        assert_eq!(result.bytes_copied, 11);
        assert_eq!(result.backend, Backend::InProcess);
        assert_eq!(std::fs::read(&destination).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn calculate_checksums_isolates_per_file_errors() {
        let engine = engine_without_helper().await;
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, b"data").unwrap();
        let missing = dir.path().join("missing.txt");

        let results = engine.calculate_checksums(vec![good, missing]).await.unwrap();
        assert!(results[0].error.is_none());
        assert!(!results[0].sha256.is_empty());
        assert!(results[1].error.is_some());
    }

    #[tokio::test]
    async fn compress_directory_with_non_archive_format_is_rejected() {
        let engine = engine_without_helper().await;
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("out.gz");

        let result = engine.compress_file(dir.path(), &destination, CompressionFormat::Gzip, 6).await;
        assert!(matches!(result, Err(HybridEngineError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn compress_then_decompress_gzip_round_trips() {
        let engine = engine_without_helper().await;
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.txt");
        std::fs::write(&source, b"round trip payload").unwrap();
        let archive = dir.path().join("source.txt.gz");
        let restored = dir.path().join("restored.txt");

        engine.compress_file(&source, &archive, CompressionFormat::Gzip, 6).await.unwrap();
        engine.decompress_file(&archive, &restored, None).await.unwrap();
        assert_eq!(std::fs::read(&restored).unwrap(), b"round trip payload");
    }

    #[test]
    fn infer_format_handles_compound_extensions() {
        assert_eq!(CompressionFormat::infer_from_path("a/b.tar.gz"), CompressionFormat::TarGz);
        assert_eq!(CompressionFormat::infer_from_path("a/b.tbz2"), CompressionFormat::TarBz2);
        assert_eq!(CompressionFormat::infer_from_path("a/b.unknownext"), CompressionFormat::Gzip);
    }

    #[tokio::test]
    async fn get_system_stats_reports_nonzero_cpu_count() {
        let engine = engine_without_helper().await;
        let stats = engine.get_system_stats().await.unwrap();
        assert!(stats.cpu.count > 0);
        let mut _sink = Vec::new();
        writeln!(_sink, "{stats:?}").unwrap();
    }
}
