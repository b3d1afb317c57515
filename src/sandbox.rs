use crate::config::SandboxConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// The three storage categories a sandbox report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    App,
    Cache,
    Data,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::App, Category::Cache, Category::Data];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::App => "app",
            Category::Cache => "cache",
            Category::Data => "data",
        };
        write!(f, "{name}")
    }
}

/// Fixed mapping from categories to directory roots, resolved once at
/// startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct SandboxLayout {
    home: PathBuf,
    app_root: PathBuf,
    cache_root: PathBuf,
    data_root: PathBuf,
}

impl SandboxLayout {
    pub fn new(
        home: PathBuf,
        app_root: PathBuf,
        cache_root: PathBuf,
        data_root: PathBuf,
    ) -> Self {
        Self {
            home,
            app_root,
            cache_root,
            data_root,
        }
    }

    /// Resolves the layout from config overrides, falling back to the
    /// conventional per-user locations for anything left unset.
    pub fn resolve(cfg: &SandboxConfig) -> Self {
        let home = cfg
            .root
            .clone()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from("/")));
        let app_root = cfg
            .app_dir
            .clone()
            .or_else(install_dir)
            .unwrap_or_else(|| home.clone());
        let cache_root = cfg.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| home.join(".cache"))
                .join(&cfg.app_id)
        });
        let data_root = cfg.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| home.join(".local/share"))
                .join(&cfg.app_id)
        });
        Self::new(home, app_root, cache_root, data_root)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn category_root(&self, category: Category) -> &Path {
        match category {
            Category::App => &self.app_root,
            Category::Cache => &self.cache_root,
            Category::Data => &self.data_root,
        }
    }
}

fn install_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
