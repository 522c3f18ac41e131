//! End-to-end pipeline tests driven by mock capture, encode and transport
//! backends.
//!
//! These verify the wire contract of one streaming cycle — a 24-byte picture
//! widget followed by the payload — together with the error policy for short
//! writes and transfer failures, without any hardware attached.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use picoproj::capture::{self, ScreenCapture, ScreenImage};
use picoproj::encode::{self, EncoderFactory, PictureEncoder, ResizeFilter};
use picoproj::projector::{FrameSink, Projector, ProjectorConfig};
use picoproj::usb;
use picoproj::widget::{Brightness, BrightnessWidget, WIDGET_SIZE};
use picoproj::Error;

// =============================================================================
// Mock backends
// =============================================================================

/// Records every write; can be told to cut writes short or fail outright.
struct RecordingSink {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    short_by: usize,
    fail: bool,
}

impl RecordingSink {
    fn new() -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
        let writes = Arc::new(Mutex::new(Vec::new()));
        (
            RecordingSink {
                writes: Arc::clone(&writes),
                short_by: 0,
                fail: false,
            },
            writes,
        )
    }
}

impl FrameSink for RecordingSink {
    fn write(&mut self, data: &[u8], _timeout: Duration) -> usb::Result<usize> {
        if self.fail {
            return Err(usb::Error::Transfer {
                endpoint: 0x02,
                source: picoproj::rusb::Error::Timeout,
            });
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(data.len() - self.short_by.min(data.len()))
    }
}

/// Capture backend handing out the same frame forever.
struct FixedCapture {
    image: ScreenImage,
    updates: Arc<AtomicUsize>,
}

impl FixedCapture {
    fn new() -> (Self, Arc<AtomicUsize>) {
        let updates = Arc::new(AtomicUsize::new(0));
        let capture = FixedCapture {
            image: ScreenImage::new(8, 8, vec![0x40; 8 * 8 * 3]),
            updates: Arc::clone(&updates),
        };
        (capture, updates)
    }
}

impl ScreenCapture for FixedCapture {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn update_screenshot(&mut self) -> capture::Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn image(&mut self) -> capture::Result<ScreenImage> {
        Ok(self.image.clone())
    }
}

/// Encoder reporting a fixed payload regardless of input.
struct FixedEncoder {
    payload: Vec<u8>,
    updates: Arc<AtomicUsize>,
}

impl PictureEncoder for FixedEncoder {
    fn update_image(&mut self, _image: &ScreenImage) -> encode::Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        self.payload.len()
    }

    fn encoded_bytes(&self) -> &[u8] {
        &self.payload
    }

    fn set_filter(&mut self, _filter: ResizeFilter) {}
}

/// Factory for [`FixedEncoder`]s, counting constructions and image updates.
fn fixed_encoder_factory(
    payload_len: usize,
) -> (EncoderFactory, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let constructions = Arc::new(AtomicUsize::new(0));
    let updates = Arc::new(AtomicUsize::new(0));

    let factory_constructions = Arc::clone(&constructions);
    let factory_updates = Arc::clone(&updates);
    let factory: EncoderFactory = Box::new(move |_image, _geometry, _filter, _budget| {
        factory_constructions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixedEncoder {
            payload: vec![0xa5; payload_len],
            updates: Arc::clone(&factory_updates),
        }) as Box<dyn PictureEncoder>)
    });

    (factory, constructions, updates)
}

// =============================================================================
// Streaming cycle
// =============================================================================

#[test]
fn test_cycle_writes_header_then_payload() {
    let (sink, writes) = RecordingSink::new();
    let (capture, _) = FixedCapture::new();
    let (factory, _, _) = fixed_encoder_factory(6749);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );
    projector.run_cycle().unwrap();

    let writes = writes.lock().unwrap();
    assert_eq!(writes.len(), 2, "one header write, one payload write");

    let header = &writes[0];
    assert_eq!(header.len(), WIDGET_SIZE);
    assert_eq!(header[0], 0x02);
    // 6749 = 0x1a5d, little-endian in bytes 20..23.
    assert_eq!(&header[20..24], &[0x5d, 0x1a, 0x00, 0x00]);

    assert_eq!(writes[1].len(), 6749);
    assert!(writes[1].iter().all(|&byte| byte == 0xa5));
}

#[test]
fn test_encoder_constructed_once_then_fed() {
    let (sink, writes) = RecordingSink::new();
    let (capture, capture_updates) = FixedCapture::new();
    let (factory, constructions, encoder_updates) = fixed_encoder_factory(100);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );
    for _ in 0..3 {
        projector.run_cycle().unwrap();
    }

    assert_eq!(capture_updates.load(Ordering::SeqCst), 3);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    // The first cycle encodes through the factory, the remaining two feed
    // the existing encoder.
    assert_eq!(encoder_updates.load(Ordering::SeqCst), 2);
    assert_eq!(writes.lock().unwrap().len(), 6);
}

#[test]
fn test_latency_counter_follows_cycles() {
    let (sink, _) = RecordingSink::new();
    let (capture, _) = FixedCapture::new();
    let (factory, _, _) = fixed_encoder_factory(10);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    assert_eq!(projector.average_frame_duration(), None);

    projector.run_cycle().unwrap();
    projector.run_cycle().unwrap();
    assert!(projector.average_frame_duration().is_some());
}

// =============================================================================
// Error policy
// =============================================================================

#[test]
fn test_short_write_is_a_typed_error() {
    let (mut sink, _writes) = RecordingSink::new();
    sink.short_by = 1;
    let (capture, _) = FixedCapture::new();
    let (factory, _, _) = fixed_encoder_factory(50);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    match projector.run_cycle() {
        Err(Error::ShortWrite { expected, written }) => {
            assert_eq!(expected, WIDGET_SIZE);
            assert_eq!(written, WIDGET_SIZE - 1);
        }
        other => panic!("expected ShortWrite, got {other:?}"),
    }
}

#[test]
fn test_transfer_failure_propagates() {
    let (mut sink, writes) = RecordingSink::new();
    sink.fail = true;
    let (capture, _) = FixedCapture::new();
    let (factory, _, _) = fixed_encoder_factory(50);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    assert!(matches!(
        projector.run_cycle(),
        Err(Error::Usb(usb::Error::Transfer { endpoint: 0x02, .. }))
    ));
    assert!(writes.lock().unwrap().is_empty());
}

#[test]
fn test_oversized_payload_never_reaches_the_wire() {
    struct OversizedEncoder;

    impl PictureEncoder for OversizedEncoder {
        fn update_image(&mut self, _image: &ScreenImage) -> encode::Result<()> {
            Ok(())
        }
        fn encoded_len(&self) -> usize {
            0x100_0000
        }
        fn encoded_bytes(&self) -> &[u8] {
            &[]
        }
        fn set_filter(&mut self, _filter: ResizeFilter) {}
    }

    let (sink, writes) = RecordingSink::new();
    let (capture, _) = FixedCapture::new();
    let factory: EncoderFactory = Box::new(|_image, _geometry, _filter, _budget| {
        Ok(Box::new(OversizedEncoder) as Box<dyn PictureEncoder>)
    });

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    assert!(matches!(projector.run_cycle(), Err(Error::Widget(_))));
    assert!(writes.lock().unwrap().is_empty());
}

#[test]
fn test_encoder_budget_failure_propagates() {
    let (sink, _) = RecordingSink::new();
    let (capture, _) = FixedCapture::new();
    let factory: EncoderFactory = Box::new(|_image, _geometry, _filter, budget| {
        Err(encode::Error::TooLarge {
            size: budget + 1,
            budget,
        })
    });

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    assert!(matches!(
        projector.run_cycle(),
        Err(Error::Encode(encode::Error::TooLarge { .. }))
    ));
}

// =============================================================================
// Brightness
// =============================================================================

#[test]
fn test_brightness_frame_on_the_wire() {
    let (sink, writes) = RecordingSink::new();
    let (capture, _) = FixedCapture::new();
    let (factory, _, _) = fixed_encoder_factory(10);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    assert_eq!(projector.brightness(), Brightness::Maximum);
    projector.set_brightness(Brightness::Low).unwrap();
    assert_eq!(projector.brightness(), Brightness::Low);

    let writes = writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        writes[0].as_slice(),
        BrightnessWidget::new(Brightness::Low).as_bytes()
    );
}

#[test]
fn test_brightness_resend_is_byte_identical() {
    let (sink, writes) = RecordingSink::new();
    let (capture, _) = FixedCapture::new();
    let (factory, _, _) = fixed_encoder_factory(10);

    let mut projector = Projector::with_transport(
        Box::new(sink),
        Box::new(capture),
        factory,
        ProjectorConfig::default(),
    );

    projector.set_brightness(Brightness::Medium).unwrap();
    projector.set_brightness(Brightness::Medium).unwrap();

    let writes = writes.lock().unwrap();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], writes[1]);
}
