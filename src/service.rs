use crate::platform::{HostPlatform, PlatformError, PlatformStats, VolumeCapacity};
use crate::purge::{self, PurgeOutcome};
use crate::sandbox::{Category, SandboxLayout};
use crate::usage::{self, Usage};
use crate::walker;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-category usage in the wire spelling callers expect.
/// `appCacheBytes` mirrors `cacheBytes` and exists for callers that key
/// on the older name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReport {
    #[serde(rename = "appBytes")]
    pub app_bytes: u64,
    #[serde(rename = "cacheBytes")]
    pub cache_bytes: u64,
    #[serde(rename = "dataBytes")]
    pub data_bytes: u64,
    #[serde(rename = "appCacheBytes")]
    pub app_cache_bytes: u64,
}

impl StorageReport {
    pub fn from_usage(usage: &[(Category, Usage)]) -> Self {
        let mut report = Self {
            app_bytes: 0,
            cache_bytes: 0,
            data_bytes: 0,
            app_cache_bytes: 0,
        };
        for (category, u) in usage {
            match category {
                Category::App => report.app_bytes = u.bytes,
                Category::Cache => {
                    report.cache_bytes = u.bytes;
                    report.app_cache_bytes = u.bytes;
                }
                Category::Data => report.data_bytes = u.bytes,
            }
        }
        report
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: StorageReport,
    pub skipped_entries: u64,
}

impl StatsSnapshot {
    pub fn new(report: StorageReport, skipped_entries: u64) -> Self {
        Self {
            generated_at: Utc::now(),
            report,
            skipped_entries,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSnapshot {
    pub generated_at: DateTime<Utc>,
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub used_bytes: u64,
}

impl From<VolumeCapacity> for DiskSnapshot {
    fn from(capacity: VolumeCapacity) -> Self {
        Self {
            generated_at: Utc::now(),
            total_bytes: capacity.total,
            free_bytes: capacity.free,
            used_bytes: capacity.used(),
        }
    }
}

/// All storage operations over one resolved sandbox layout. The layout
/// never changes after construction, so repeated calls agree on which
/// directories they talk about.
pub struct StorageService {
    layout: SandboxLayout,
    platform: Box<dyn PlatformStats>,
}

impl StorageService {
    pub fn new(layout: SandboxLayout, platform: Box<dyn PlatformStats>) -> Self {
        Self { layout, platform }
    }

    /// Service backed by live volume statistics for the sandbox home.
    pub fn with_host_platform(layout: SandboxLayout) -> Self {
        let probe = layout.home().to_path_buf();
        Self::new(layout, Box::new(HostPlatform::new(probe)))
    }

    pub fn layout(&self) -> &SandboxLayout {
        &self.layout
    }

    pub fn home_directory(&self) -> &Path {
        self.layout.home()
    }

    /// Measures every category root, one traversal per root. The roots
    /// are disjoint directories, so the walks run in parallel.
    pub fn category_usage(&self) -> Vec<(Category, Usage)> {
        Category::ALL
            .par_iter()
            .map(|&category| (category, usage::measure(self.layout.category_root(category))))
            .collect()
    }

    /// Per-category report, preferring host-precomputed statistics when
    /// the platform offers them.
    pub fn storage_stats(&self) -> StorageReport {
        if let Some(report) = self.platform.package_stats() {
            return report;
        }
        StorageReport::from_usage(&self.category_usage())
    }

    /// Deletes the cache category root and everything under it.
    pub fn clear_all_cache(&self) -> PurgeOutcome {
        purge::purge_subtree(self.layout.cache_root())
    }

    /// Deletes an arbitrary subtree. The path is used as given.
    pub fn delete_path(&self, path: &Path) -> PurgeOutcome {
        purge::purge_subtree(path)
    }

    /// Aggregate size of an arbitrary subtree. Missing paths measure 0.
    pub fn path_bytes(&self, path: &Path) -> u64 {
        usage::subtree_size(path)
    }

    /// Every file under `path`, or under the data root when no path is
    /// given. Directories are descended into but not listed, and the
    /// root itself never appears in its own listing.
    pub fn path_list(&self, path: Option<&Path>) -> Vec<PathBuf> {
        let root = path.unwrap_or_else(|| self.layout.data_root());
        walker::walk(root)
            .filter(|entry| entry.is_file() && entry.path.as_path() != root)
            .map(|entry| entry.path)
            .collect()
    }

    pub fn volume_capacity(&self) -> Result<VolumeCapacity, PlatformError> {
        self.platform.volume_capacity()
    }

    pub fn free_disk_space(&self) -> Result<u64, PlatformError> {
        Ok(self.volume_capacity()?.free)
    }

    pub fn total_disk_space(&self) -> Result<u64, PlatformError> {
        Ok(self.volume_capacity()?.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FakePlatform {
        capacity: Option<VolumeCapacity>,
        package: Option<StorageReport>,
    }

    impl PlatformStats for FakePlatform {
        fn volume_capacity(&self) -> Result<VolumeCapacity, PlatformError> {
            self.capacity.ok_or(PlatformError::Unsupported)
        }

        fn package_stats(&self) -> Option<StorageReport> {
            self.package
        }
    }

    fn layout(tmp: &TempDir) -> SandboxLayout {
        SandboxLayout::new(
            tmp.path().to_path_buf(),
            tmp.path().join("app"),
            tmp.path().join("cache"),
            tmp.path().join("data"),
        )
    }

    fn service(tmp: &TempDir) -> StorageService {
        StorageService::new(
            layout(tmp),
            Box::new(FakePlatform {
                capacity: Some(VolumeCapacity {
                    total: 500,
                    free: 120,
                }),
                package: None,
            }),
        )
    }

    fn seed_sandbox(tmp: &TempDir) {
        fs::create_dir(tmp.path().join("app")).unwrap();
        fs::write(tmp.path().join("app/binary"), vec![0u8; 300]).unwrap();
        fs::create_dir(tmp.path().join("cache")).unwrap();
        fs::write(tmp.path().join("cache/blob"), vec![0u8; 40]).unwrap();
        fs::create_dir_all(tmp.path().join("data/nested")).unwrap();
        fs::write(tmp.path().join("data/nested/save.bin"), vec![0u8; 25]).unwrap();
        fs::write(tmp.path().join("data/top.bin"), vec![0u8; 5]).unwrap();
    }

    #[test]
    fn stats_walk_each_category_root() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let report = service(&tmp).storage_stats();
        assert_eq!(report.app_bytes, 300);
        assert_eq!(report.cache_bytes, 40);
        assert_eq!(report.data_bytes, 30);
        assert_eq!(report.app_cache_bytes, report.cache_bytes);
    }

    #[test]
    fn missing_category_roots_count_zero() {
        let tmp = TempDir::new().unwrap();
        let report = service(&tmp).storage_stats();
        assert_eq!(report.app_bytes, 0);
        assert_eq!(report.cache_bytes, 0);
        assert_eq!(report.data_bytes, 0);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_category_root_contributes_zero() {
        use std::os::unix::fs::PermissionsExt;

        // Root ignores permission bits.
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);
        let cache = tmp.path().join("cache");
        fs::set_permissions(&cache, fs::Permissions::from_mode(0o000)).unwrap();

        let service = service(&tmp);
        let report = service.storage_stats();
        let skipped: u64 = service
            .category_usage()
            .iter()
            .map(|(_, u)| u.skipped)
            .sum();
        fs::set_permissions(&cache, fs::Permissions::from_mode(0o755)).unwrap();

        // The locked root degrades to 0 instead of failing the report.
        assert_eq!(report.cache_bytes, 0);
        assert_eq!(report.app_bytes, 300);
        assert_eq!(report.data_bytes, 30);
        assert!(skipped > 0);
    }

    #[test]
    fn host_precomputed_stats_take_priority() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let precomputed = StorageReport {
            app_bytes: 1,
            cache_bytes: 2,
            data_bytes: 3,
            app_cache_bytes: 2,
        };
        let service = StorageService::new(
            layout(&tmp),
            Box::new(FakePlatform {
                capacity: None,
                package: Some(precomputed),
            }),
        );
        assert_eq!(service.storage_stats(), precomputed);
    }

    #[test]
    fn stats_are_stable_across_calls() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let service = service(&tmp);
        assert_eq!(service.storage_stats(), service.storage_stats());
    }

    #[test]
    fn clear_all_cache_spares_other_categories() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let service = service(&tmp);
        let outcome = service.clear_all_cache();
        assert!(outcome.ok());
        assert!(!tmp.path().join("cache").exists());
        assert!(tmp.path().join("data/top.bin").exists());
        assert_eq!(service.storage_stats().cache_bytes, 0);
    }

    #[test]
    fn clear_all_cache_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        assert!(service.clear_all_cache().ok());
        assert!(service.clear_all_cache().ok());
    }

    #[test]
    fn path_list_defaults_to_data_root() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let mut listed = service(&tmp).path_list(None);
        listed.sort();
        assert_eq!(
            listed,
            vec![
                tmp.path().join("data/nested/save.bin"),
                tmp.path().join("data/top.bin"),
            ]
        );
    }

    #[test]
    fn path_list_reports_files_only() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let listed = service(&tmp).path_list(Some(tmp.path()));
        assert!(listed.iter().all(|p| p.is_file()));
        assert!(!listed.iter().any(|p| p == tmp.path()));
        assert_eq!(listed.len(), 4);
    }

    #[test]
    fn path_list_of_plain_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("solo");
        fs::write(&file, b"x").unwrap();
        assert!(service(&tmp).path_list(Some(&file)).is_empty());
    }

    #[test]
    fn delete_path_then_measure_zero() {
        let tmp = TempDir::new().unwrap();
        seed_sandbox(&tmp);

        let service = service(&tmp);
        let victim = tmp.path().join("data");
        assert!(service.delete_path(&victim).ok());
        assert_eq!(service.path_bytes(&victim), 0);
        // Still a success when nothing is left to delete.
        assert!(service.delete_path(&victim).ok());
    }

    #[test]
    fn disk_space_comes_from_the_platform() {
        let tmp = TempDir::new().unwrap();
        let service = service(&tmp);
        assert_eq!(service.free_disk_space().unwrap(), 120);
        assert_eq!(service.total_disk_space().unwrap(), 500);
    }

    #[test]
    fn snapshots_use_wire_keys() {
        let report = StorageReport {
            app_bytes: 1,
            cache_bytes: 2,
            data_bytes: 3,
            app_cache_bytes: 2,
        };
        let value = serde_json::to_value(StatsSnapshot::new(report, 4)).unwrap();
        for key in [
            "generatedAt",
            "appBytes",
            "cacheBytes",
            "dataBytes",
            "appCacheBytes",
            "skippedEntries",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }

        let value =
            serde_json::to_value(DiskSnapshot::from(VolumeCapacity { total: 10, free: 4 })).unwrap();
        assert_eq!(value["totalBytes"], 10);
        assert_eq!(value["freeBytes"], 4);
        assert_eq!(value["usedBytes"], 6);
    }
}
