// Author: Tessel Developers
// Copyright © 2026, Tessel Developers, all rights reserved.
// Created: 16 October 2026

/*!
The batch input pipeline.

A pool of reader threads pulls records from one shared, epoch-limited source,
decodes them and feeds a [`ShuffleQueue`]. The consumer draws random batches
from the queue until the epoch limit is reached or it asks the pipeline to
stop.

```no_run
use tessel_records::{BatchPipeline, PipelineConfig};

let pipeline = BatchPipeline::spawn("train.tsrc", PipelineConfig::default())?;
for batch in pipeline.batches() {
    let batch = batch?;
    println!("{:?}", batch.names);
}
pipeline.shutdown()?;
# Ok::<(), tessel_records::RecordError>(())
```
*/

use crate::{
    coordinator::{Coordinator, StopFlag},
    decode::{decode_example, DecodedExample},
    error::{RecordError, Result},
    format::{Example, RecordReader},
    queue::ShuffleQueue,
};
use candle::{Device, Tensor};
use parking_lot::Mutex;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Everything needed to run a pipeline. Defaults are defined here only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub batch_size: usize,
    /// Side length of the square images stored in the records.
    pub image_size: usize,
    pub num_classes: usize,
    /// Maximum number of decoded examples held in the shuffle buffer.
    pub capacity: usize,
    /// Items kept back after each batch to improve mixing.
    pub min_after_dequeue: usize,
    /// Number of reader threads.
    pub threads: usize,
    /// Passes over the record file; `None` reads forever.
    pub epochs: Option<usize>,
    /// Fixes the shuffle order for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            image_size: 256,
            num_classes: 21,
            capacity: 32,
            min_after_dequeue: 0,
            threads: 4,
            epochs: Some(1),
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("batch size", self.batch_size),
            ("image size", self.image_size),
            ("class count", self.num_classes),
            ("queue capacity", self.capacity),
            ("thread count", self.threads),
        ];

        for (what, value) in positive {
            if value == 0 {
                return Err(RecordError::InvalidConfig(format!(
                    "{} must be at least 1",
                    what
                )));
            }
        }

        if self.epochs == Some(0) {
            return Err(RecordError::InvalidConfig(
                "epoch limit must be at least 1".to_owned(),
            ));
        }

        if self.batch_size + self.min_after_dequeue > self.capacity {
            return Err(RecordError::InvalidConfig(format!(
                "batch size ({}) + min after dequeue ({}) exceeds queue capacity ({})",
                self.batch_size, self.min_after_dequeue, self.capacity
            )));
        }

        Ok(())
    }
}

/// A fixed-size batch of decoded examples, laid out NHWC.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub names: Vec<String>,
    pub images: Vec<f32>,
    pub masks: Vec<u8>,
    pub batch_size: usize,
    pub image_size: usize,
    pub num_classes: usize,
}

impl Batch {
    fn from_examples(examples: Vec<DecodedExample>, image_size: usize, num_classes: usize) -> Self {
        let batch_size = examples.len();
        let pixels = image_size * image_size;

        let mut names = Vec::with_capacity(batch_size);
        let mut images = Vec::with_capacity(batch_size * pixels * 3);
        let mut masks = Vec::with_capacity(batch_size * pixels * num_classes);

        for example in examples {
            names.push(example.name);
            images.extend(example.image);
            masks.extend(example.mask);
        }

        Self {
            names,
            images,
            masks,
            batch_size,
            image_size,
            num_classes,
        }
    }

    /// Shape of [`Batch::images`].
    pub fn image_shape(&self) -> [usize; 4] {
        [self.batch_size, self.image_size, self.image_size, 3]
    }

    /// Shape of [`Batch::masks`].
    pub fn mask_shape(&self) -> [usize; 4] {
        [
            self.batch_size,
            self.image_size,
            self.image_size,
            self.num_classes,
        ]
    }

    pub fn images_tensor(&self, device: &Device) -> Result<Tensor> {
        let [b, h, w, c] = self.image_shape();
        Ok(Tensor::from_slice(&self.images, (b, h, w, c), device)?)
    }

    pub fn masks_tensor(&self, device: &Device) -> Result<Tensor> {
        let [b, h, w, c] = self.mask_shape();
        Ok(Tensor::from_slice(&self.masks, (b, h, w, c), device)?)
    }
}

/// Shared record stream, reopened at every epoch boundary.
struct EpochSource {
    path: PathBuf,
    reader: Option<RecordReader<BufReader<File>>>,
    epoch: usize,
    epochs: Option<usize>,
    read_this_epoch: usize,
}

impl EpochSource {
    fn next(&mut self) -> Result<Option<Example>> {
        loop {
            if let Some(reader) = &mut self.reader {
                match reader.next() {
                    Some(example) => {
                        self.read_this_epoch += 1;
                        return example.map(Some);
                    }
                    None => {
                        log::debug!("finished epoch {} of {:?}", self.epoch + 1, self.path);
                        self.reader = None;
                        self.epoch += 1;

                        if self.read_this_epoch == 0 {
                            log::warn!("no records in {:?}", self.path);
                            return Ok(None);
                        }
                        self.read_this_epoch = 0;
                    }
                }
            }

            if self.epochs.map_or(false, |limit| self.epoch >= limit) {
                return Ok(None);
            }

            self.reader = Some(RecordReader::open(&self.path)?);
        }
    }
}

struct Shared {
    queue: ShuffleQueue<DecodedExample>,
    source: Mutex<EpochSource>,
    failure: Mutex<Option<RecordError>>,
    live: AtomicUsize,
    stop: StopFlag,
    image_size: usize,
    num_classes: usize,
}

impl Shared {
    /// Record a fatal error and bring the pipeline down.
    fn fail(&self, err: RecordError) {
        {
            let mut slot = self.failure.lock();
            if slot.is_none() {
                log::error!("input pipeline failed: {}", err);
                *slot = Some(err);
            } else {
                log::warn!("input pipeline error after failure: {}", err);
            }
        }

        self.stop.request_stop();
        self.queue.close();
    }

    fn take_failure(&self) -> Option<RecordError> {
        self.failure.lock().take()
    }

    fn produce(&self, flag: &StopFlag) -> Result<()> {
        while !flag.should_stop() {
            let Some(example) = self.source.lock().next()? else {
                break;
            };

            let decoded = decode_example(&example, self.image_size, self.num_classes)?;
            if self.queue.push(decoded).is_err() {
                break;
            }
        }

        Ok(())
    }
}

/// Closes the queue once the last worker exits, including by panic.
struct LiveWorker {
    shared: Arc<Shared>,
    name: String,
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.shared
                .fail(RecordError::WorkerPanicked(self.name.clone()));
        }

        if self.shared.live.fetch_sub(1, Ordering::AcqRel) == 1 {
            log::debug!("last reader exited, closing queue");
            self.shared.queue.close();
        }
    }
}

/// Handle to a running input pipeline. Dropping it stops and joins every
/// reader thread.
pub struct BatchPipeline {
    shared: Arc<Shared>,
    coordinator: Coordinator,
    config: PipelineConfig,
}

impl BatchPipeline {
    /// Validate `config`, open `path` and start the reader threads.
    pub fn spawn(path: impl AsRef<Path>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let path = path.as_ref().to_path_buf();
        let reader = RecordReader::open(&path)?;

        let coordinator = Coordinator::new();
        let shared = Arc::new(Shared {
            queue: ShuffleQueue::new(config.capacity, config.min_after_dequeue, config.seed),
            source: Mutex::new(EpochSource {
                path: path.clone(),
                reader: Some(reader),
                epoch: 0,
                epochs: config.epochs,
                read_this_epoch: 0,
            }),
            failure: Mutex::new(None),
            live: AtomicUsize::new(config.threads),
            stop: coordinator.flag(),
            image_size: config.image_size,
            num_classes: config.num_classes,
        });

        let mut pipeline = Self {
            shared,
            coordinator,
            config,
        };

        for idx in 0..pipeline.config.threads {
            let shared = pipeline.shared.clone();
            let name = format!("tessel-reader-{}", idx);
            let worker = LiveWorker {
                shared: shared.clone(),
                name: name.clone(),
            };

            let spawned = pipeline.coordinator.spawn(name, move |flag| {
                let _worker = worker;
                if let Err(err) = shared.produce(&flag) {
                    shared.fail(err);
                }
                Ok(())
            });

            if let Err(err) = spawned {
                return Err(pipeline.abort_spawn(err));
            }
        }

        log::info!(
            "started {} readers on {:?} (batch {}, capacity {}, epochs {:?})",
            pipeline.config.threads,
            path,
            pipeline.config.batch_size,
            pipeline.config.capacity,
            pipeline.config.epochs
        );

        Ok(pipeline)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of decoded examples currently buffered.
    pub fn buffered(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn should_stop(&self) -> bool {
        self.coordinator.should_stop()
    }

    /// Ask the readers to stop and wake any that are blocked. Idempotent.
    pub fn stop(&self) {
        self.coordinator.request_stop();
        self.shared.queue.close();
    }

    /// Block for the next batch.
    ///
    /// # Errors
    ///
    /// [`RecordError::Exhausted`] once the epoch limit has been reached and
    /// fewer than `batch_size` examples remain, or the fatal error that
    /// brought the readers down.
    pub fn next_batch(&self) -> Result<Batch> {
        if let Some(err) = self.shared.take_failure() {
            return Err(err);
        }

        match self.shared.queue.pop_many(self.config.batch_size) {
            Ok(examples) => Ok(Batch::from_examples(
                examples,
                self.config.image_size,
                self.config.num_classes,
            )),
            Err(drained) => {
                if let Some(err) = self.shared.take_failure() {
                    return Err(err);
                }

                log::info!(
                    "input exhausted, dropping {} leftover examples",
                    drained.remaining
                );
                Err(RecordError::Exhausted)
            }
        }
    }

    /// Iterate over batches until exhaustion. A fatal error is yielded once,
    /// then iteration ends.
    pub fn batches(&self) -> impl Iterator<Item = Result<Batch>> + '_ {
        let mut done = false;
        std::iter::from_fn(move || {
            if done {
                return None;
            }

            match self.next_batch() {
                Ok(batch) => Some(Ok(batch)),
                Err(err) if err.is_exhausted() => {
                    done = true;
                    None
                }
                Err(err) => {
                    done = true;
                    Some(Err(err))
                }
            }
        })
    }

    /// Tear down the readers started so far and hand back the spawn error.
    fn abort_spawn(&mut self, err: RecordError) -> RecordError {
        self.stop();
        if let Err(joined) = self.coordinator.join() {
            log::warn!("reader failed while aborting spawn: {}", joined);
        }
        err
    }

    fn stop_and_join(&mut self) -> Result<()> {
        self.stop();
        let joined = self.coordinator.join();
        let failure = self.shared.take_failure();

        joined?;
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Stop the readers and wait for all of them to exit. Returns any fatal
    /// error not already handed out by [`BatchPipeline::next_batch`].
    pub fn shutdown(mut self) -> Result<()> {
        self.stop_and_join()
    }
}

impl Drop for BatchPipeline {
    fn drop(&mut self) {
        if !self.coordinator.is_empty() {
            if let Err(err) = self.stop_and_join() {
                log::warn!("input pipeline shut down with error: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Example, RecordWriter};

    fn write_records(dir: &Path, count: usize) -> PathBuf {
        let path = dir.join("train.tsrc");
        let mut writer = RecordWriter::create_file(&path).unwrap();
        for idx in 0..count {
            writer
                .write(&Example::new(
                    format!("image_{:03}.png", idx),
                    vec![idx as u8; 2 * 2 * 3],
                    vec![1; 2 * 2 * 2],
                ))
                .unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn abort_spawn_keeps_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_records(dir.path(), 4);
        let config = PipelineConfig {
            batch_size: 2,
            image_size: 2,
            num_classes: 2,
            capacity: 4,
            threads: 1,
            epochs: Some(1),
            ..Default::default()
        };

        let mut pipeline = BatchPipeline::spawn(&path, config).unwrap();
        pipeline
            .coordinator
            .spawn("broken".to_owned(), |_| {
                Err(RecordError::Malformed("reader".to_owned()))
            })
            .unwrap();

        let err = pipeline.abort_spawn(RecordError::Malformed("spawn".to_owned()));

        assert!(matches!(err, RecordError::Malformed(ref msg) if msg == "spawn"));
        assert!(pipeline.coordinator.is_empty());
    }
}
