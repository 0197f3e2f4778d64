// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! In-memory pipeline backend shared by the integration tests.
//!
//! `FakePipeline` holds named sinks. Pushing a sample into a `FakeSink` queues
//! it and then fires the subscribed handler on the calling thread, the same way
//! a streaming thread would.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sinkbridge::{
    BufferInfo, Error, FlowStatus, MediaSample, NewSampleHandler, PipelineBackend, Result,
    SampleDuration, SinkElement,
};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// Initializes a tracing subscriber honouring `RUST_LOG`.
pub fn setup_logging() {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .init();
    });
}

/// Counts how many samples have been released.
#[derive(Clone, Default)]
pub struct Releases(Arc<AtomicUsize>);

impl Releases {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A sample whose buffer lives in memory shared with the test.
pub struct FakeSample {
    buffer: Option<Arc<Mutex<Vec<u8>>>>,
    duration: SampleDuration,
    pts: Option<Duration>,
    releases: Releases,
}

impl FakeSample {
    pub fn new(data: &[u8], duration: SampleDuration, releases: &Releases) -> Self {
        Self::shared(Arc::new(Mutex::new(data.to_vec())), duration, releases)
    }

    /// A sample whose bytes the test can still mutate after delivery.
    pub fn shared(
        buffer: Arc<Mutex<Vec<u8>>>,
        duration: SampleDuration,
        releases: &Releases,
    ) -> Self {
        FakeSample {
            buffer: Some(buffer),
            duration,
            pts: Some(Duration::ZERO),
            releases: releases.clone(),
        }
    }

    pub fn bufferless(releases: &Releases) -> Self {
        FakeSample {
            buffer: None,
            duration: SampleDuration::Unknown,
            pts: None,
            releases: releases.clone(),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buffer
            .as_ref()
            .map(|buffer| buffer.lock().unwrap().clone())
            .unwrap_or_default()
    }
}

impl MediaSample for FakeSample {
    fn buffer_info(&self) -> Option<BufferInfo> {
        let buffer = self.buffer.as_ref()?;
        Some(BufferInfo {
            size: buffer.lock().unwrap().len(),
            duration: self.duration,
            pts: self.pts,
        })
    }

    fn extract(&self, dest: &mut [u8]) -> usize {
        let Some(buffer) = &self.buffer else { return 0 };
        let data = buffer.lock().unwrap();
        let n = dest.len().min(data.len());
        dest[..n].copy_from_slice(&data[..n]);
        n
    }
}

impl Drop for FakeSample {
    fn drop(&mut self) {
        self.releases.0.fetch_add(1, Ordering::SeqCst);
    }
}

type Handler = Arc<NewSampleHandler<FakeSink>>;

#[derive(Default)]
struct SinkInner {
    pending: Mutex<VecDeque<FakeSample>>,
    handler: Mutex<Option<Handler>>,
    emit_signals: AtomicBool,
}

/// An appsink-like element.
#[derive(Clone, Default)]
pub struct FakeSink(Arc<SinkInner>);

impl FakeSink {
    /// Queues `sample` and notifies the subscriber, if any.
    ///
    /// Returns the handler's flow status, or `None` when nothing is subscribed.
    pub fn push(&self, sample: FakeSample) -> Option<FlowStatus> {
        self.0.pending.lock().unwrap().push_back(sample);
        self.notify()
    }

    /// Notifies the subscriber without queueing anything.
    pub fn notify(&self) -> Option<FlowStatus> {
        // Clone the handler out so it runs without the lock held.
        let handler = self.0.handler.lock().unwrap().clone()?;
        Some(handler(self))
    }

    pub fn emits_signals(&self) -> bool {
        self.0.emit_signals.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.0.handler.lock().unwrap().is_some()
    }

    pub fn pending(&self) -> usize {
        self.0.pending.lock().unwrap().len()
    }
}

impl SinkElement for FakeSink {
    type Sample = FakeSample;

    fn try_pull_sample(&self) -> Option<FakeSample> {
        self.0.pending.lock().unwrap().pop_front()
    }
}

/// Disconnects its sink's handler when dropped.
pub struct FakeSubscription {
    sink: FakeSink,
}

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        self.sink.0.emit_signals.store(false, Ordering::SeqCst);
        self.sink.0.handler.lock().unwrap().take();
    }
}

/// A pipeline made of named fake elements.
#[derive(Default)]
pub struct FakePipeline {
    sinks: HashMap<String, FakeSink>,
    others: HashSet<String>,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an appsink-like element.
    pub fn add_sink(&mut self, name: &str) -> FakeSink {
        let sink = FakeSink::default();
        self.sinks.insert(name.to_owned(), sink.clone());
        sink
    }

    /// Adds an element that cannot produce samples.
    pub fn add_element(&mut self, name: &str) {
        self.others.insert(name.to_owned());
    }
}

impl PipelineBackend for FakePipeline {
    type Sink = FakeSink;
    type Subscription = FakeSubscription;

    fn sink_by_name(&self, name: &str) -> Result<FakeSink> {
        if let Some(sink) = self.sinks.get(name) {
            return Ok(sink.clone());
        }
        if self.others.contains(name) {
            return Err(Error::NotASampleSink {
                name: name.to_owned(),
            });
        }
        Err(Error::ElementNotFound {
            name: name.to_owned(),
        })
    }

    fn subscribe(
        &self,
        sink: &FakeSink,
        handler: NewSampleHandler<FakeSink>,
    ) -> Result<FakeSubscription> {
        sink.0.emit_signals.store(true, Ordering::SeqCst);
        *sink.0.handler.lock().unwrap() = Some(Arc::new(handler));
        Ok(FakeSubscription { sink: sink.clone() })
    }
}
