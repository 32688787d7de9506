//! Renderer dispatch: Plain-YAML, Chart, or Kustomize,
//! auto-selected from a directory's marker files.

pub mod chart;
pub mod kustomize;
pub mod plain;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::manifest::Manifest;
use crate::model::result::Warning;
use crate::resolver::{ResolvedSource, SourceKind};

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub values_override: Option<PathBuf>,
    pub include_metadata: bool,
    pub validate_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Chart,
    Kustomize,
    Plain,
}

/// Non-directory sources are always Plain-YAML; a directory carrying
/// `Chart.yaml` selects the Chart renderer, one carrying
/// `kustomization.yaml` selects Kustomize, otherwise Plain-YAML.
pub fn detect_renderer(resolved: &ResolvedSource) -> RendererKind {
    if resolved.kind != SourceKind::Directory {
        return RendererKind::Plain;
    }
    let root = Path::new(&resolved.path);
    if root.join("Chart.yaml").is_file() {
        RendererKind::Chart
    } else if root.join("kustomization.yaml").is_file() {
        RendererKind::Kustomize
    } else {
        RendererKind::Plain
    }
}

pub fn render(resolved: &ResolvedSource, opts: &RenderOptions) -> Result<(Vec<Manifest>, Vec<Warning>)> {
    match detect_renderer(resolved) {
        RendererKind::Chart => chart::render(
            Path::new(&resolved.path),
            &chart::ChartOptions {
                values_override: opts.values_override.clone(),
                include_metadata: opts.include_metadata,
                validate_output: opts.validate_output,
            },
        ),
        RendererKind::Kustomize => kustomize::render(
            Path::new(&resolved.path),
            &kustomize::KustomizeOptions {
                include_metadata: opts.include_metadata,
                validate_output: opts.validate_output,
            },
        ),
        RendererKind::Plain => plain::render(
            &resolved.bytes,
            &resolved.path,
            &plain::PlainOptions {
                include_metadata: opts.include_metadata,
                validate_output: opts.validate_output,
                template_name: None,
            },
        ),
    }
}
