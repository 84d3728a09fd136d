//! Mock construction helpers

use oscnet_rs::config::LinkConfig;
use oscnet_rs::link::{LinkSession, MockLink, MockLinkHandle};
use oscnet_rs::protocol::telemetry::encode_group;
use std::f64::consts::PI;

/// Open session on an in-memory link that acknowledges matrix frames
pub fn acking_session() -> (LinkSession, MockLinkHandle) {
    session_on(MockLink::new("mock").with_auto_ack())
}

/// Open session on an in-memory link that never answers
pub fn silent_session(ack_timeout_ms: u64) -> (LinkSession, MockLinkHandle) {
    let link = MockLink::new("mock");
    let device = link.handle();
    let config = LinkConfig {
        ack_timeout_ms,
        ..LinkConfig::default()
    };
    let session = LinkSession::open(Box::new(link), config).expect("mock link is open");
    (session, device)
}

pub fn session_on(link: MockLink) -> (LinkSession, MockLinkHandle) {
    let device = link.handle();
    let session = LinkSession::open(Box::new(link), LinkConfig::default()).expect("mock link is open");
    (session, device)
}

/// Raw telemetry for `ticks` ticks of sine oscillators, one per frequency,
/// sampled at `sample_rate` ticks per second
pub fn sine_capture(frequencies: &[f64], sample_rate: f64, ticks: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(ticks * frequencies.len() * 3);
    for tick in 0..ticks {
        let t = tick as f64 / sample_rate;
        for (channel, &freq) in frequencies.iter().enumerate() {
            let adc = 2048.0 + 1500.0 * (2.0 * PI * freq * t).sin();
            bytes.extend(encode_group(channel as u8, adc.round() as u16));
        }
    }
    bytes
}
