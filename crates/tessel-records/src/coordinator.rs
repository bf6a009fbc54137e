/*!
Cooperative cancellation for a group of threads: a shared stop flag plus a
join barrier over every thread registered with the coordinator.
*/

use crate::error::{RecordError, Result};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
};

/// Cloneable handle to the stop flag. Threads poll it between iterations.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns the worker threads of one pipeline.
#[derive(Default)]
pub struct Coordinator {
    flag: StopFlag,
    threads: Vec<(String, JoinHandle<Result<()>>)>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self) -> StopFlag {
        self.flag.clone()
    }

    /// Ask every thread to stop. Safe to call repeatedly and from any thread
    /// holding a [`StopFlag`].
    pub fn request_stop(&self) {
        self.flag.request_stop();
    }

    pub fn should_stop(&self) -> bool {
        self.flag.should_stop()
    }

    /// Spawn a named thread that receives the stop flag.
    pub fn spawn<F>(&mut self, name: impl Into<String>, body: F) -> Result<()>
    where
        F: FnOnce(StopFlag) -> Result<()> + Send + 'static,
    {
        let name = name.into();
        let flag = self.flag();
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || body(flag))?;

        self.threads.push((name, handle));
        Ok(())
    }

    /// Number of threads not yet joined.
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Block until every registered thread has exited.
    ///
    /// Returns the first error in registration order; a panic counts as
    /// [`RecordError::WorkerPanicked`]. Later errors are logged.
    pub fn join(&mut self) -> Result<()> {
        let mut first = None;

        for (name, handle) in self.threads.drain(..) {
            let outcome = match handle.join() {
                Ok(result) => result,
                Err(_) => Err(RecordError::WorkerPanicked(name.clone())),
            };

            if let Err(err) = outcome {
                if first.is_none() {
                    first = Some(err);
                } else {
                    log::warn!("thread {} also failed: {}", name, err);
                }
            }
        }

        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn stop_reaches_every_thread() {
        let mut coord = Coordinator::new();
        for idx in 0..3 {
            coord
                .spawn(format!("worker-{}", idx), |flag| {
                    while !flag.should_stop() {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    Ok(())
                })
                .unwrap();
        }

        coord.request_stop();
        coord.request_stop();
        assert!(coord.join().is_ok());
        assert!(coord.is_empty());
    }

    #[test]
    fn join_reports_first_error() {
        let mut coord = Coordinator::new();
        coord.spawn("ok", |_| Ok(())).unwrap();
        coord
            .spawn("bad", |_| Err(RecordError::Malformed("boom".to_owned())))
            .unwrap();

        assert!(matches!(coord.join(), Err(RecordError::Malformed(_))));
    }

    #[test]
    fn join_reports_panics() {
        let mut coord = Coordinator::new();
        coord.spawn("panicky", |_| panic!("worker died")).unwrap();

        assert!(matches!(
            coord.join(),
            Err(RecordError::WorkerPanicked(name)) if name == "panicky"
        ));
    }
}
