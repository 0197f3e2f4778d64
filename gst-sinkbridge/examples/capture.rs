// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Captures the output of named appsinks to files.
//!
//! ```bash
//! cargo run --example capture -- \
//!     --pipeline "videotestsrc num-buffers=300 ! x264enc ! h264parse ! appsink name=video \
//!                 audiotestsrc num-buffers=300 ! avenc_ac3 ! appsink name=audio" \
//!     --sink video:video:video.h264 --sink audio:audio:audio.ac3
//! ```
//!
//! Samples are handed off through a bounded queue and written by a worker
//! thread, so a slow disk drops samples instead of stalling the pipeline.

mod common;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;

use clap::{Parser, ValueEnum};
use gst::prelude::*;
use gst_sinkbridge::queue::DeliveryStream;
use gst_sinkbridge::{Bridge, CopyPolicy, GstSample, Payload, Settings, SinkId, SinkType};
use gstreamer as gst;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Copy bytes out of each sample
    Copy,
    /// Hand the GStreamer sample itself to the writer
    Transfer,
}

impl From<Policy> for CopyPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Copy => CopyPolicy::Copy,
            Policy::Transfer => CopyPolicy::Transfer,
        }
    }
}

#[derive(Debug, Clone)]
struct SinkArg {
    name: String,
    sink_type: SinkType,
    path: PathBuf,
}

fn parse_sink(arg: &str) -> Result<SinkArg, String> {
    let mut parts = arg.splitn(3, ':');
    let (Some(name), Some(kind), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected NAME:TYPE:PATH, got '{arg}'"));
    };
    let sink_type = match kind {
        "raw" => SinkType::RAW,
        "video" => SinkType::VIDEO,
        "audio" => SinkType::AUDIO,
        other => other
            .parse()
            .map(SinkType::from_code)
            .map_err(|_| format!("unknown sink type '{other}'"))?,
    };
    Ok(SinkArg {
        name: name.to_owned(),
        sink_type,
        path: PathBuf::from(path),
    })
}

#[derive(Debug, Parser)]
#[command(version, about = "Capture appsink output of a GStreamer pipeline to files")]
struct Opts {
    /// Pipeline description in gst-launch syntax.
    #[arg(long)]
    pipeline: String,

    /// Sink to capture as NAME:TYPE:PATH, TYPE being raw, video, audio or a
    /// numeric code. Repeat for several sinks.
    #[arg(long = "sink", value_parser = parse_sink, required = true)]
    sinks: Vec<SinkArg>,

    /// JSON file with bridge settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the ownership policy from the settings.
    #[arg(long, value_enum)]
    policy: Option<Policy>,

    /// Overrides the queue capacity from the settings.
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Logs at debug level, including dropped payloads.
    #[arg(short, long)]
    verbose: bool,
}

fn load_settings(opts: &Opts) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = match &opts.config {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => Settings::default(),
    };
    if let Some(policy) = opts.policy {
        settings.policy = policy.into();
    }
    if let Some(capacity) = opts.queue_capacity {
        settings.queue_capacity = capacity;
    }
    Ok(settings)
}

fn write_payloads(
    stream: DeliveryStream<GstSample>,
    mut outputs: HashMap<SinkId, BufWriter<File>>,
) -> io::Result<()> {
    for delivered in stream {
        let Some(out) = outputs.get_mut(&delivered.sink) else {
            warn!(sink = %delivered.sink, "Payload for a sink without output");
            continue;
        };
        match delivered.payload {
            Payload::Copied(copied) => out.write_all(&copied.data)?,
            Payload::Transferred(owned) => {
                if let Some(buffer) = owned.sample().buffer() {
                    let map = buffer
                        .map_readable()
                        .map_err(|err| io::Error::other(err.to_string()))?;
                    out.write_all(&map)?;
                }
            }
        }
    }
    for out in outputs.values_mut() {
        out.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();
    common::setup_logging(opts.verbose);
    let settings = load_settings(&opts)?;
    gst_sinkbridge::init()?;

    let (mut bridge, stream) = Bridge::launch_queued(&opts.pipeline, &settings)?;
    info!(
        pipeline = %bridge.pipeline().id(),
        policy = ?settings.policy,
        queue_capacity = settings.queue_capacity,
        "Launched pipeline"
    );

    let mut outputs = HashMap::new();
    let mut next_index: HashMap<SinkType, u16> = HashMap::new();
    for sink in &opts.sinks {
        let index = next_index.entry(sink.sink_type).or_default();
        let id = bridge.attach(&sink.name, sink.sink_type, *index)?;
        *index += 1;
        outputs.insert(id, BufWriter::new(File::create(&sink.path)?));
        info!(name = %sink.name, %id, path = %sink.path.display(), "Capturing sink");
    }

    let writer = thread::Builder::new()
        .name("writer".into())
        .spawn(move || write_payloads(stream, outputs))?;

    bridge.start()?;
    let bus = bridge.pipeline().bus().ok_or("pipeline has no bus")?;
    for message in bus.iter_timed(gst::ClockTime::NONE) {
        match message.view() {
            gst::MessageView::Eos(..) => {
                info!("End of stream");
                break;
            }
            gst::MessageView::Error(err) => {
                error!(
                    source = ?err.src().map(|s| s.path_string()),
                    error = %err.error(),
                    debug = ?err.debug(),
                    "Pipeline error"
                );
                break;
            }
            _ => {}
        }
    }

    for sink in &opts.sinks {
        if let Some(stats) = bridge.stats(&sink.name) {
            info!(
                name = %sink.name,
                delivered = stats.delivered,
                bytes = stats.delivered_bytes,
                failed = stats.failed,
                "Sink finished"
            );
        }
    }

    // Detaching drops the queue's sending half, which ends the writer's stream.
    bridge.close()?;
    writer.join().map_err(|_| "writer thread panicked")??;
    Ok(())
}
