/// Background model loading with progress reporting
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use deskview_core::{asset, AssetHandle, Model};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug)]
pub enum LoadEvent {
    Progress(f32),
    Done(deskview_core::Result<Model>),
}

/// A model file being read and decoded on its own thread
pub struct ModelLoader {
    rx: Receiver<LoadEvent>,
    worker: Option<JoinHandle<()>>,
}

impl ModelLoader {
    pub fn spawn(path: PathBuf) -> Self {
        Self::start(move |tx| {
            let result = read_with_progress(&path, |p| {
                let _ = tx.send(LoadEvent::Progress(p));
            })
            .and_then(|data| asset::decode_model(&path.display().to_string(), &data, path.parent()));
            // the receiver may already be gone if the app quit mid-load
            let _ = tx.send(LoadEvent::Done(result));
        })
    }

    fn start(job: impl FnOnce(&Sender<LoadEvent>) + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || job(&tx));
        Self {
            rx,
            worker: Some(worker),
        }
    }

    /// Apply pending loader events to `handle`.
    ///
    /// Returns the load error once, if decoding failed.
    pub fn poll(&mut self, handle: &mut AssetHandle<Model>) -> Option<deskview_core::Error> {
        if self.is_finished() {
            return None;
        }
        loop {
            match self.rx.try_recv() {
                Ok(LoadEvent::Progress(p)) => handle.set_progress(p),
                Ok(LoadEvent::Done(Ok(model))) => {
                    log::info!("model ready: {}", model.name);
                    handle.resolve(model);
                    self.join();
                    return None;
                }
                Ok(LoadEvent::Done(Err(e))) => {
                    log::error!("model load failed: {}", e);
                    self.join();
                    return Some(e);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    // the worker exited without a result, most likely a panic
                    let reason = if self.join() {
                        "loader thread panicked"
                    } else {
                        "loader thread exited without a result"
                    };
                    log::error!("model load failed: {}", reason);
                    return Some(deskview_core::Error::Loader(reason.to_string()));
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_none()
    }

    /// Reap the worker; returns whether it panicked
    fn join(&mut self) -> bool {
        match self.worker.take() {
            Some(worker) => worker.join().is_err(),
            None => false,
        }
    }
}

fn read_with_progress(path: &Path, mut progress: impl FnMut(f32)) -> deskview_core::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let total = file.metadata()?.len() as usize;
    let mut data = Vec::with_capacity(total);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    progress(0.0);
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
        if total > 0 {
            progress((data.len() as f32 / total as f32).min(1.0));
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &mut ModelLoader, handle: &mut AssetHandle<Model>) -> Option<deskview_core::Error> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(e) = loader.poll(handle) {
                return Some(e);
            }
            if loader.is_finished() {
                return None;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("loader did not finish");
    }

    #[test]
    fn test_loads_ascii_stl() {
        let path = std::env::temp_dir().join(format!("deskview-loader-{}.stl", std::process::id()));
        std::fs::write(
            &path,
            "solid t\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid t\n",
        )
        .unwrap();

        let mut handle = AssetHandle::loading();
        let mut loader = ModelLoader::spawn(path.clone());
        assert!(wait_for(&mut loader, &mut handle).is_none());
        assert_eq!(handle.ready().map(|m| m.mesh.triangles.len()), Some(1));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_reports_error() {
        let mut handle = AssetHandle::loading();
        let mut loader = ModelLoader::spawn(PathBuf::from("/nonexistent/deskview/model.stl"));
        let error = wait_for(&mut loader, &mut handle);
        assert!(matches!(error, Some(deskview_core::Error::Io(_))));
        assert!(!handle.is_ready());
    }

    #[test]
    fn test_worker_panic_reports_error() {
        let mut handle = AssetHandle::loading();
        let mut loader = ModelLoader::start(|tx| {
            let _ = tx.send(LoadEvent::Progress(0.3));
            panic!("decoder crashed");
        });
        let error = wait_for(&mut loader, &mut handle);
        assert!(matches!(error, Some(deskview_core::Error::Loader(_))));
        assert!(loader.is_finished());
        assert_eq!(handle, AssetHandle::Loading { progress: Some(0.3) });
        // reported once
        assert!(loader.poll(&mut handle).is_none());
    }

    #[test]
    fn test_progress_reaches_one() {
        let path = std::env::temp_dir().join(format!("deskview-progress-{}.bin", std::process::id()));
        std::fs::write(&path, vec![7u8; CHUNK_SIZE * 2 + 10]).unwrap();
        let mut seen = Vec::new();
        let data = read_with_progress(&path, |p| seen.push(p)).unwrap();
        assert_eq!(data.len(), CHUNK_SIZE * 2 + 10);
        assert_eq!(seen.first(), Some(&0.0));
        assert_eq!(seen.last(), Some(&1.0));
        std::fs::remove_file(path).unwrap();
    }
}
