// SPDX-FileCopyrightText: 2025 Contributors to the sinkbridge project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests driving real `appsrc ! appsink` pipelines.
//!
//! Each test pushes hand-made buffers into an `appsrc`, lets them reach an
//! attached `appsink`, and waits on the bus for EOS or an error.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use futures::executor::block_on_stream;
use gst::prelude::*;
use gst_sinkbridge::{
    Bridge, CopyPolicy, DeliveryError, Error, GstPipeline, GstSample, Payload, SampleDuration,
    Settings, SinkId, SinkType,
};
use gstreamer as gst;
use gstreamer_app as gst_app;
use sinkbridge::MediaSample;

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

fn setup() {
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
    gst_sinkbridge::init().unwrap();
}

const ONE_SINK: &str =
    "appsrc name=src format=time caps=application/x-test ! appsink name=video sync=false";

type Received = Arc<Mutex<Vec<(SinkId, Payload<GstSample>)>>>;

fn collecting() -> (
    Received,
    impl Fn(SinkId, Payload<GstSample>) -> Result<(), DeliveryError> + Send + Sync + 'static,
) {
    let received: Received = Default::default();
    let store = received.clone();
    let consumer = move |id: SinkId, payload: Payload<GstSample>| -> Result<(), DeliveryError> {
        store.lock().unwrap().push((id, payload));
        Ok(())
    };
    (received, consumer)
}

fn appsrc(bridge: &Bridge, name: &str) -> gst_app::AppSrc {
    bridge
        .pipeline()
        .pipeline()
        .by_name(name)
        .unwrap()
        .downcast::<gst_app::AppSrc>()
        .unwrap()
}

fn buffer(data: &[u8], duration: Option<gst::ClockTime>) -> gst::Buffer {
    let mut buffer = gst::Buffer::from_slice(data.to_vec());
    {
        let buffer = buffer.get_mut().unwrap();
        buffer.set_pts(gst::ClockTime::ZERO);
        buffer.set_duration(duration);
    }
    buffer
}

/// Waits for EOS or an error and returns the final message type.
fn wait(bridge: &Bridge) -> gst::Message {
    bridge
        .pipeline()
        .bus()
        .unwrap()
        .timed_pop_filtered(
            gst::ClockTime::from_seconds(10),
            &[gst::MessageType::Eos, gst::MessageType::Error],
        )
        .expect("pipeline neither finished nor failed")
}

#[test]
fn copies_bytes_and_duration_of_each_buffer() {
    setup();
    let (received, consumer) = collecting();
    let mut bridge = Bridge::launch(ONE_SINK, CopyPolicy::Copy, consumer).unwrap();
    let id = bridge.attach("video", SinkType::VIDEO, 0).unwrap();
    assert_eq!(id.sink_type(), SinkType::VIDEO);
    assert_eq!(id.pipeline_id(), bridge.pipeline().id());

    bridge.start().unwrap();
    let src = appsrc(&bridge, "src");
    src.push_buffer(buffer(&[0x47; 1200], Some(gst::ClockTime::from_mseconds(33))))
        .unwrap();
    src.push_buffer(buffer(b"no duration", None)).unwrap();
    src.end_of_stream().unwrap();

    let message = wait(&bridge);
    assert_eq!(message.type_(), gst::MessageType::Eos);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 2);

    let (first_id, first) = &received[0];
    assert_eq!(*first_id, id);
    let Payload::Copied(first) = first else {
        panic!("expected a copy");
    };
    assert_eq!(first.data, vec![0x47; 1200]);
    assert_eq!(
        first.duration,
        SampleDuration::Known(Duration::from_millis(33))
    );
    assert_eq!(first.pts, Some(Duration::ZERO));

    assert_eq!(received[1].1.duration(), SampleDuration::Unknown);
    assert_eq!(received[1].1.len(), b"no duration".len());

    let stats = bridge.stats("video").unwrap();
    assert_eq!(stats.delivered, 2);
    assert_eq!(stats.delivered_bytes, 1200 + 11);
    drop(received);
    bridge.close().unwrap();
}

#[test]
fn transfers_the_pipeline_sample() {
    setup();
    let (received, consumer) = collecting();
    let mut bridge = Bridge::launch(ONE_SINK, CopyPolicy::Transfer, consumer).unwrap();
    bridge.attach("video", SinkType::VIDEO, 0).unwrap();
    bridge.start().unwrap();

    let src = appsrc(&bridge, "src");
    src.push_buffer(buffer(b"keyframe", Some(gst::ClockTime::from_mseconds(40))))
        .unwrap();
    src.end_of_stream().unwrap();
    assert_eq!(wait(&bridge).type_(), gst::MessageType::Eos);

    let (_, payload) = received.lock().unwrap().pop().unwrap();
    let Payload::Transferred(owned) = payload else {
        panic!("expected a transferred sample");
    };
    assert_eq!(
        owned.duration(),
        SampleDuration::Known(Duration::from_millis(40))
    );
    let sample = owned.into_inner();
    let map = sample.sample().buffer().unwrap().map_readable().unwrap();
    assert_eq!(map.as_slice(), b"keyframe");
}

#[test]
fn consumer_error_is_posted_on_the_bus() {
    setup();
    let rejecting = |_: SinkId, _: Payload<GstSample>| -> Result<(), DeliveryError> {
        Err(DeliveryError::rejected("disk full"))
    };
    let mut bridge = Bridge::launch(ONE_SINK, CopyPolicy::Copy, rejecting).unwrap();
    bridge.attach("video", SinkType::VIDEO, 0).unwrap();
    bridge.start().unwrap();

    let src = appsrc(&bridge, "src");
    src.push_buffer(buffer(b"frame", None)).unwrap();
    src.end_of_stream().unwrap();

    let message = wait(&bridge);
    let gst::MessageView::Error(err) = message.view() else {
        panic!("expected an error, got {:?}", message.type_());
    };
    assert!(err.error().matches(gst::StreamError::Failed));
    assert_eq!(bridge.stats("video").unwrap().failed, 1);
}

#[test]
fn detached_sink_receives_nothing() {
    setup();
    let (received, consumer) = collecting();
    let mut bridge = Bridge::launch(ONE_SINK, CopyPolicy::Copy, consumer).unwrap();
    let id = bridge.attach("video", SinkType::VIDEO, 0).unwrap();
    assert_eq!(bridge.detach("video").unwrap(), id);

    let appsink = bridge
        .pipeline()
        .pipeline()
        .by_name("video")
        .unwrap()
        .downcast::<gst_app::AppSink>()
        .unwrap();
    assert!(!appsink.property::<bool>("emit-signals"));

    bridge.start().unwrap();
    let src = appsrc(&bridge, "src");
    src.push_buffer(buffer(b"frame", None)).unwrap();
    src.end_of_stream().unwrap();
    assert_eq!(wait(&bridge).type_(), gst::MessageType::Eos);
    assert!(received.lock().unwrap().is_empty());
}

#[test]
fn detaching_mid_stream_leaves_the_appsink_leaky() {
    setup();
    let (received, consumer) = collecting();
    let mut bridge = Bridge::launch(ONE_SINK, CopyPolicy::Copy, consumer).unwrap();
    bridge.attach("video", SinkType::VIDEO, 0).unwrap();
    bridge.start().unwrap();

    let src = appsrc(&bridge, "src");
    src.push_buffer(buffer(b"attached", None)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    while received.lock().unwrap().is_empty() {
        assert!(Instant::now() < deadline, "first buffer never delivered");
        thread::sleep(Duration::from_millis(5));
    }

    bridge.detach("video").unwrap();
    let appsink = bridge
        .pipeline()
        .pipeline()
        .by_name("video")
        .unwrap()
        .downcast::<gst_app::AppSink>()
        .unwrap();
    assert!(appsink.property::<bool>("drop"));
    assert_eq!(appsink.property::<u32>("max-buffers"), 1);

    for n in 0..64u8 {
        src.push_buffer(buffer(&[n; 256], None)).unwrap();
    }
    src.end_of_stream().unwrap();
    assert_eq!(wait(&bridge).type_(), gst::MessageType::Eos);
    assert_eq!(received.lock().unwrap().len(), 1);

    // Everything after the detach was discarded except the newest buffer.
    let mut left_behind = 0;
    while appsink.try_pull_sample(gst::ClockTime::ZERO).is_some() {
        left_behind += 1;
    }
    assert!(left_behind <= 1, "{left_behind} buffers piled up");
    bridge.close().unwrap();
}

#[test]
fn attach_rejects_unknown_and_non_appsink_elements() {
    setup();
    let (_, consumer) = collecting();
    let mut bridge = Bridge::launch(
        "appsrc name=src ! fakesink name=fake",
        CopyPolicy::Copy,
        consumer,
    )
    .unwrap();

    assert!(matches!(
        bridge.attach("missing", SinkType::RAW, 0),
        Err(Error::Bridge(sinkbridge::Error::ElementNotFound { .. }))
    ));
    assert!(matches!(
        bridge.attach("fake", SinkType::RAW, 0),
        Err(Error::Bridge(sinkbridge::Error::NotASampleSink { .. }))
    ));
    assert!(bridge.registry().is_empty());
}

#[test]
fn two_sinks_are_tagged_separately() {
    setup();
    let description = "appsrc name=vsrc format=time caps=application/x-video ! appsink name=video sync=false \
                       appsrc name=asrc format=time caps=application/x-audio ! appsink name=audio sync=false";
    let (received, consumer) = collecting();
    let mut bridge = Bridge::launch(description, CopyPolicy::Copy, consumer).unwrap();
    let video = bridge.attach("video", SinkType::VIDEO, 0).unwrap();
    let audio = bridge.attach("audio", SinkType::AUDIO, 0).unwrap();
    assert_eq!(bridge.registry().identifier("video"), Some(video));
    bridge.start().unwrap();

    let vsrc = appsrc(&bridge, "vsrc");
    let asrc = appsrc(&bridge, "asrc");
    for n in 0..3u8 {
        vsrc.push_buffer(buffer(&[b'v', n], None)).unwrap();
        asrc.push_buffer(buffer(&[b'a', n], None)).unwrap();
    }
    vsrc.end_of_stream().unwrap();
    asrc.end_of_stream().unwrap();
    assert_eq!(wait(&bridge).type_(), gst::MessageType::Eos);

    let received = received.lock().unwrap();
    for (id, tag) in [(video, b'v'), (audio, b'a')] {
        let frames: Vec<Vec<u8>> = received
            .iter()
            .filter(|(sink, _)| *sink == id)
            .map(|(_, payload)| match payload {
                Payload::Copied(copied) => copied.data.clone(),
                Payload::Transferred(_) => panic!("expected copies"),
            })
            .collect();
        assert_eq!(frames, [vec![tag, 0], vec![tag, 1], vec![tag, 2]]);
    }
}

#[test]
fn queued_bridge_delivers_off_the_streaming_thread() {
    setup();
    let settings = Settings {
        policy: CopyPolicy::Transfer,
        queue_capacity: 8,
    };
    let (mut bridge, stream) = Bridge::launch_queued(ONE_SINK, &settings).unwrap();
    let id = bridge.attach("video", SinkType::VIDEO, 3).unwrap();
    assert_eq!(id.index(), 3);
    bridge.start().unwrap();

    let src = appsrc(&bridge, "src");
    for frame in [b"one".as_slice(), b"two"] {
        src.push_buffer(buffer(frame, None)).unwrap();
    }
    src.end_of_stream().unwrap();
    assert_eq!(wait(&bridge).type_(), gst::MessageType::Eos);
    bridge.close().unwrap();

    let frames: Vec<(SinkId, usize)> = block_on_stream(stream)
        .map(|delivered| {
            let Payload::Transferred(owned) = delivered.payload else {
                panic!("expected transferred samples");
            };
            let size = owned.buffer_info().map_or(0, |info| info.size);
            (delivered.sink, size)
        })
        .collect();
    assert_eq!(frames, [(id, 3), (id, 3)]);
}

#[test]
fn pipeline_is_stopped_when_dropped() {
    setup();
    let id = gst_sinkbridge::next_pipeline_id().unwrap();
    let pipeline = GstPipeline::launch(ONE_SINK, id).unwrap();
    let handle = pipeline.pipeline().clone();
    pipeline.start().unwrap();
    drop(pipeline);
    assert_eq!(handle.current_state(), gst::State::Null);
}
