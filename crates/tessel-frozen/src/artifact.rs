/*!
Locating and parsing frozen model artifacts.

If you load NNEF artifacts on a worker thread, call [`init_thread`] when
creating it; building the NNEF framework is noticeably expensive and happens
once per thread.
*/

use crate::error::{FrozenError, Result};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use tract_core::prelude::*;
use tract_hir::prelude::InferenceModel;
use tract_nnef::framework::Nnef;

thread_local!(
    static NNEF: Nnef = tract_nnef::nnef().with_tract_core()
);

/// Initialize the thread-local NNEF framework ahead of the first load.
pub fn init_thread() {
    NNEF.with(|_| {})
}

/// File name the training scripts export the frozen graph under.
pub const FROZEN_GRAPH_FILE: &str = "model.pb";

const NNEF_GRAPH_FILE: &str = "graph.nnef";
const ONNX_FILE: &str = "model.onnx";

/// Serialization format of a frozen graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A TensorFlow `GraphDef` protobuf.
    TensorFlow,
    Onnx,
    /// An NNEF archive or directory.
    Nnef,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::TensorFlow => f.pad("tensorflow"),
            ArtifactKind::Onnx => f.pad("onnx"),
            ArtifactKind::Nnef => f.pad("nnef"),
        }
    }
}

/// Check for `.nnef.tar` or `.nnef.tgz`.
pub fn is_nnef_archive(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(OsStr::to_str) else {
        return false;
    };

    if ext != "tar" && ext != "tgz" {
        return false;
    }

    path.file_stem()
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(OsStr::to_str)
        .map_or(false, |ext| ext == "nnef")
}

/// A model file (or NNEF directory) together with its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// A parsed graph, before any shapes are fixed.
pub(crate) enum LoadedGraph {
    Inference(InferenceModel),
    Typed(TypedModel),
}

impl Artifact {
    /// Work out what `path` holds.
    ///
    /// A directory resolves to itself when it contains `graph.nnef`, otherwise
    /// to the `model.pb` or `model.onnx` inside it.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(FrozenError::ArtifactNotFound(path.to_path_buf()));
        }

        if path.is_dir() {
            if path.join(NNEF_GRAPH_FILE).is_file() {
                return Ok(Self {
                    kind: ArtifactKind::Nnef,
                    path: path.to_path_buf(),
                });
            }

            for name in [FROZEN_GRAPH_FILE, ONNX_FILE] {
                let candidate = path.join(name);
                if candidate.is_file() {
                    return Self::resolve(candidate);
                }
            }

            return Err(FrozenError::ArtifactNotFound(path.join(FROZEN_GRAPH_FILE)));
        }

        let kind = if is_nnef_archive(path) {
            ArtifactKind::Nnef
        } else {
            match path.extension().and_then(OsStr::to_str) {
                Some("pb") => ArtifactKind::TensorFlow,
                Some("onnx") => ArtifactKind::Onnx,
                _ => return Err(FrozenError::UnknownFormat(path.to_path_buf())),
            }
        };

        Ok(Self {
            kind,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn load(&self) -> Result<LoadedGraph> {
        log::info!("loading {} model from {:?}", self.kind, self.path);

        let graph = match self.kind {
            ArtifactKind::TensorFlow => LoadedGraph::Inference(
                tract_tensorflow::tensorflow().model_for_path(&self.path)?,
            ),
            ArtifactKind::Onnx => {
                LoadedGraph::Inference(tract_onnx::onnx().model_for_path(&self.path)?)
            }
            ArtifactKind::Nnef => {
                LoadedGraph::Typed(NNEF.with(|nnef| nnef.model_for_path(&self.path))?)
            }
        };

        Ok(graph)
    }
}
