//! Background model loading.
//!
//! [`ModelLoader::load`] reads and parses a model on its own thread and
//! reports back over a channel. The owner drains the channel from its frame
//! callback, so completions are handled on the same thread as everything
//! else that touches the scene.
//!
//! Each request yields zero or more [`LoadEvent::Progress`] events followed
//! by exactly one [`LoadEvent::Loaded`] or [`LoadEvent::Failed`].

use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::color::Color;
use crate::geometry::{AssetLoadError, RawGeometry, extension_of};

const CHUNK_SIZE: usize = 64 * 1024;

/// A request to load one model into a caller-defined slot.
#[derive(Clone, Debug)]
pub struct ModelRequest<K> {
    /// Where the finished model should go. Echoed back in every event.
    pub slot: K,
    pub path: PathBuf,
    /// Name given to the model's root node.
    pub name: String,
    /// Material colour for every mesh in the model.
    pub color: Color,
}

impl<K> ModelRequest<K> {
    pub fn new(slot: K, path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            slot,
            path: path.into(),
            name: name.into(),
            color: Color::WHITE,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Geometry and colour of a renderable model node.
#[derive(Clone, Debug)]
pub struct MeshPart {
    pub geometry: RawGeometry,
    pub color: Color,
}

/// What a loaded node is, decided when the file is parsed.
#[derive(Clone, Debug)]
pub enum ModelNodeKind {
    /// A pure grouping node with no geometry.
    Group,
    Mesh(MeshPart),
}

/// One node of a loaded model's hierarchy.
#[derive(Clone, Debug)]
pub struct ModelNode {
    pub name: String,
    pub kind: ModelNodeKind,
    pub children: Vec<ModelNode>,
}

impl ModelNode {
    pub fn group(name: impl Into<String>, children: Vec<ModelNode>) -> Self {
        Self {
            name: name.into(),
            kind: ModelNodeKind::Group,
            children,
        }
    }

    pub fn mesh(name: impl Into<String>, part: MeshPart) -> Self {
        Self {
            name: name.into(),
            kind: ModelNodeKind::Mesh(part),
            children: Vec::new(),
        }
    }

    /// Number of mesh nodes in this subtree.
    pub fn mesh_count(&self) -> usize {
        let own = usize::from(matches!(self.kind, ModelNodeKind::Mesh(_)));
        own + self.children.iter().map(ModelNode::mesh_count).sum::<usize>()
    }
}

/// A parsed model ready to be instantiated into a scene.
#[derive(Clone, Debug)]
pub struct ModelAsset {
    pub root: ModelNode,
}

/// Progress and completion reports from the loader.
#[derive(Debug)]
pub enum LoadEvent<K> {
    Progress { slot: K, loaded: u64, total: u64 },
    Loaded { slot: K, asset: ModelAsset },
    Failed { slot: K, error: AssetLoadError },
}

/// Loads models on background threads.
pub struct ModelLoader<K> {
    tx: mpsc::Sender<LoadEvent<K>>,
    rx: mpsc::Receiver<LoadEvent<K>>,
}

impl<K> Default for ModelLoader<K> {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl<K: Copy + Send + Debug + 'static> ModelLoader<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts loading `request` in the background.
    pub fn load(&self, request: ModelRequest<K>) {
        let tx = self.tx.clone();
        let slot = request.slot;
        let name = format!("model-loader-{}", request.name);
        log::debug!("Loading {:?} from {}", slot, request.path.display());

        let spawned = thread::Builder::new().name(name).spawn(move || {
            let slot = request.slot;
            let event = match load_model(&request, &tx) {
                Ok(asset) => LoadEvent::Loaded { slot, asset },
                Err(error) => LoadEvent::Failed { slot, error },
            };
            // The receiver is gone once the app shuts down
            let _ = tx.send(event);
        });

        if let Err(e) = spawned {
            log::error!("Failed to spawn loader thread for {:?}: {}", slot, e);
            let _ = self.tx.send(LoadEvent::Failed {
                slot,
                error: AssetLoadError::Io(e),
            });
        }
    }

    /// Everything that has arrived since the last call, in arrival order.
    pub fn drain(&self) -> Vec<LoadEvent<K>> {
        self.rx.try_iter().collect()
    }

    /// Blocks until the next event or the timeout. For headless tools and tests.
    pub fn wait_event(&self, timeout: Duration) -> Option<LoadEvent<K>> {
        self.rx.recv_timeout(timeout).ok()
    }
}

fn load_model<K: Copy>(
    request: &ModelRequest<K>,
    tx: &mpsc::Sender<LoadEvent<K>>,
) -> Result<ModelAsset, AssetLoadError> {
    let bytes = read_with_progress(&request.path, |loaded, total| {
        let _ = tx.send(LoadEvent::Progress {
            slot: request.slot,
            loaded,
            total,
        });
    })?;

    let geometry = RawGeometry::from_bytes(&bytes, &extension_of(&request.path))?;
    log::debug!(
        "Parsed {} ({} triangles)",
        request.path.display(),
        geometry.triangle_count()
    );

    let part = MeshPart {
        geometry,
        color: request.color,
    };
    let mesh = ModelNode::mesh(format!("{}_mesh", request.name), part);
    Ok(ModelAsset {
        root: ModelNode::group(request.name.clone(), vec![mesh]),
    })
}

fn read_with_progress(
    path: &Path,
    mut progress: impl FnMut(u64, u64),
) -> Result<Vec<u8>, AssetLoadError> {
    let mut file = File::open(path)?;
    let total = file.metadata()?.len();
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
        progress(bytes.len() as u64, total);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::TRIANGLE_STL;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn collect_until_done(loader: &ModelLoader<u8>) -> Vec<LoadEvent<u8>> {
        let mut events = Vec::new();
        while let Some(event) = loader.wait_event(TIMEOUT) {
            let done = !matches!(event, LoadEvent::Progress { .. });
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn missing_file_fails_once() {
        let loader = ModelLoader::new();
        loader.load(ModelRequest::new(1u8, "definitely/not/here.stl", "ghost"));

        let events = collect_until_done(&loader);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            LoadEvent::Failed { slot: 1, error: AssetLoadError::Io(_) }
        ));
        assert!(loader.wait_event(Duration::from_millis(50)).is_none());
    }

    #[test]
    fn stl_reports_progress_then_loads() {
        let dir = std::env::temp_dir().join(format!("showroom-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("triangle.stl");
        std::fs::write(&path, TRIANGLE_STL).unwrap();

        let loader = ModelLoader::new();
        loader.load(ModelRequest::new(7u8, &path, "tri").color(Color::RED));
        let events = collect_until_done(&loader);
        std::fs::remove_dir_all(&dir).ok();

        let (last, progress) = events.split_last().unwrap();
        assert!(!progress.is_empty());
        assert!(progress.iter().all(|e| matches!(e, LoadEvent::Progress { slot: 7, .. })));
        let LoadEvent::Loaded { slot, asset } = last else {
            panic!("expected a loaded model, got {:?}", last);
        };
        assert_eq!(*slot, 7);
        assert_eq!(asset.root.name, "tri");
        assert!(matches!(asset.root.kind, ModelNodeKind::Group));
        assert_eq!(asset.root.mesh_count(), 1);
        match &asset.root.children[0].kind {
            ModelNodeKind::Mesh(part) => assert_eq!(part.color, Color::RED),
            ModelNodeKind::Group => panic!("child should be a mesh"),
        }
    }

    #[test]
    fn unsupported_format_fails() {
        let dir = std::env::temp_dir().join(format!("showroom-loader-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("car.obj");
        std::fs::write(&path, "o car\n").unwrap();

        let loader = ModelLoader::new();
        loader.load(ModelRequest::new(2u8, &path, "car"));
        let events = collect_until_done(&loader);
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(
            events.last(),
            Some(LoadEvent::Failed { error: AssetLoadError::UnknownFormat(_), .. })
        ));
    }
}
