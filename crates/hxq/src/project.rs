//! Loading a project from disk into an analyzer.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use hx_semantic::{AnalysisConfig, Analyzer, DeclarationCatalog, FileId, ProjectIndex};

use crate::discovery::{discover_hx_files, find_config, path_to_package};

/// Command-line settings that override the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub no_prelude: bool,
}

pub struct Project {
    /// Directory paths are shown relative to.
    pub root: PathBuf,
    pub analyzer: Analyzer<ProjectIndex>,
    /// Indexed project files, in discovery order.
    pub files: Vec<FileId>,
}

/// Read the configuration: the explicit file if given, else the nearest
/// `hxq.toml` at or above `start`, else defaults. Returns the directory
/// source roots are relative to.
pub fn load_config(start: &Path, overrides: &Overrides) -> Result<(AnalysisConfig, PathBuf)> {
    let found = match &overrides.config {
        Some(path) if !path.is_file() => bail!("configuration '{}' not found", path.display()),
        Some(path) => Some(path.clone()),
        None => find_config(start),
    };
    let (mut config, base) = match found {
        Some(path) => {
            log::debug!("using configuration {}", path.display());
            let config = AnalysisConfig::load(&path)
                .with_context(|| format!("invalid configuration '{}'", path.display()))?;
            let base = path
                .parent()
                .and_then(|p| p.canonicalize().ok())
                .unwrap_or_else(|| start.to_path_buf());
            (config, base)
        }
        None => (AnalysisConfig::default(), start.to_path_buf()),
    };
    if let Some(depth) = overrides.max_depth {
        config.analysis.max_depth = depth;
    }
    if overrides.no_prelude {
        config.project.prelude = false;
    }
    Ok((config, base))
}

impl Project {
    /// Index every source under `dir`.
    pub fn open(dir: &Path, overrides: &Overrides) -> Result<Self> {
        if !dir.is_dir() {
            bail!("'{}' is not a directory", dir.display());
        }
        let dir = dir
            .canonicalize()
            .with_context(|| format!("failed to resolve '{}'", dir.display()))?;
        let (config, base) = load_config(&dir, overrides)?;

        let mut source_dirs: Vec<PathBuf> = config
            .project
            .source_roots
            .iter()
            .map(|r| base.join(r))
            .filter(|d| d.is_dir() && d.starts_with(&dir))
            .collect();
        if source_dirs.is_empty() {
            source_dirs.push(dir.clone());
        }

        let mut index = ProjectIndex::from_config(&config);
        index.set_indexing(true);
        let mut files = Vec::new();
        for source_dir in &source_dirs {
            let found = discover_hx_files(source_dir)
                .with_context(|| format!("failed to walk '{}'", source_dir.display()))?;
            for relative in found {
                let path = source_dir.join(&relative);
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read '{}'", path.display()))?;
                let id = index.add_file(path.clone(), text);
                warn_on_package_mismatch(&index, id, &relative);
                files.push(id);
            }
        }
        index.set_indexing(false);
        log::debug!("indexed {} files under {}", files.len(), dir.display());

        Ok(Self {
            root: dir,
            analyzer: Analyzer::with_config(index, config.analysis),
            files,
        })
    }

    /// Open the project around `file` and return it with that file's id.
    /// A file outside every source root is indexed on its own.
    pub fn around(file: &Path, overrides: &Overrides) -> Result<(Self, FileId)> {
        let file = file
            .canonicalize()
            .with_context(|| format!("failed to read '{}'", file.display()))?;
        let start = file.parent().unwrap_or(Path::new("."));
        let root = find_config(start)
            .and_then(|cfg| cfg.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| start.to_path_buf());
        let mut project = Self::open(&root, overrides)?;
        if let Some(id) = project.analyzer.catalog().file_id(&file) {
            return Ok((project, id));
        }
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read '{}'", file.display()))?;
        let id = project.analyzer.catalog_mut().add_file(file, text);
        project.files.push(id);
        Ok((project, id))
    }

    /// `path` relative to the project root when it lies inside it.
    pub fn display_path<'p>(&self, path: &'p Path) -> std::path::Display<'p> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }

    /// Byte offset of a 1-based `line:col` in `file`.
    pub fn offset(&self, file: FileId, line: u32, col: u32) -> Result<u32> {
        let Some(info) = self.analyzer.catalog().file(file) else {
            bail!("file is not indexed");
        };
        match info.line_index.offset(line, col) {
            Some(offset) => Ok(offset),
            None => bail!(
                "position {line}:{col} is outside '{}'",
                self.display_path(&info.path)
            ),
        }
    }
}

fn warn_on_package_mismatch(index: &ProjectIndex, id: FileId, relative: &Path) {
    let Some(info) = index.file(id) else {
        return;
    };
    let expected = path_to_package(relative);
    if info.package != expected {
        log::warn!(
            "{}: package `{}` does not match its directory (`{}`)",
            info.path.display(),
            info.package,
            expected
        );
    }
}
