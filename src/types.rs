//! Core data types for OscNet
//!
//! This module contains the fundamental data structures of the oscillator
//! network: nodes, the edges that couple them, and their attributes.
//!
//! # Main Types
//!
//! - [`NodeId`] - Positive, user-visible oscillator identifier
//! - [`Node`] - An oscillator with position, frequency and color
//! - [`Edge`] - A directed or bidirectional coupling between two nodes
//! - [`EdgeKey`] - Orientation-insensitive identity of an edge
//!
//! # Identity
//!
//! A node is identified by its [`NodeId`]. At most one edge may exist between
//! an unordered pair of nodes, so an edge is identified by the [`EdgeKey`] of
//! its endpoints regardless of direction.

use crate::error::EditRejection;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest oscillator frequency accepted by the hardware
pub const MIN_FREQUENCY_HZ: f64 = 0.01;

/// Highest oscillator frequency accepted by the hardware
pub const MAX_FREQUENCY_HZ: f64 = 100.0;

/// Positive oscillator identifier. Ids are kept dense (1..=N) by the
/// [`IdAllocator`](crate::graph::IdAllocator).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Value as used in indices and files
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Ids start at 1
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        NodeId(value)
    }
}

/// Canvas position of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// RGBA color of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Default node fill (translucent blue)
    pub const DEFAULT_NODE: Color = Color::rgba(100, 100, 255, 150);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Format as `#RRGGBB`, dropping alpha (the network file format)
    pub fn to_rgb_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Format as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            self.to_rgb_hex()
        } else {
            format!("{}{:02X}", self.to_rgb_hex(), self.a)
        }
    }

    /// Parse `#RRGGBB` (opaque) or `#RRGGBBAA`
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_NODE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::from_hex(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", text)))
    }
}

/// Check that a frequency is within the oscillator range
pub fn validate_frequency(frequency: f64) -> Result<f64, EditRejection> {
    if frequency.is_finite() && (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency) {
        Ok(frequency)
    } else {
        Err(EditRejection::FrequencyOutOfRange(frequency))
    }
}

/// An oscillator node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identity of the node
    pub id: NodeId,
    /// Canvas position
    pub position: Position,
    /// Oscillation frequency in Hz
    pub frequency: f64,
    /// Fill color
    pub color: Color,
}

impl Node {
    /// Create a node at the origin with the default color
    pub fn new(id: impl Into<NodeId>, frequency: f64) -> Self {
        Self {
            id: id.into(),
            position: Position::default(),
            frequency,
            color: Color::default(),
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Orientation-insensitive edge identity: the endpoints in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(NodeId, NodeId);

impl EdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn low(&self) -> NodeId {
        self.0
    }

    pub fn high(&self) -> NodeId {
        self.1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0 == id || self.1 == id
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// Coupling between two oscillators
///
/// For a directed edge (`bidirectional == false`) `start` couples into `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub start: NodeId,
    pub end: NodeId,
    pub bidirectional: bool,
}

impl Edge {
    pub fn new(start: impl Into<NodeId>, end: impl Into<NodeId>, bidirectional: bool) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            bidirectional,
        }
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.start, self.end)
    }

    /// Whether either endpoint is `id`
    pub fn touches(&self, id: NodeId) -> bool {
        self.start == id || self.end == id
    }

    /// Same edge with `start` and `end` exchanged
    pub fn inverted(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            bidirectional: self.bidirectional,
        }
    }

    /// Replace endpoint `from` with `to`
    pub(crate) fn rename_endpoint(&mut self, from: NodeId, to: NodeId) {
        if self.start == from {
            self.start = to;
        }
        if self.end == from {
            self.end = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_round_trip() {
        let color = Color::rgb(0x12, 0xAB, 0xFF);
        assert_eq!(color.to_hex(), "#12ABFF");
        assert_eq!(Color::from_hex("#12abff"), Some(color));

        let translucent = Color::rgba(100, 100, 255, 150);
        assert_eq!(translucent.to_hex(), "#6464FF96");
        assert_eq!(translucent.to_rgb_hex(), "#6464FF");
        assert_eq!(Color::from_hex(&translucent.to_hex()), Some(translucent));
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert_eq!(Color::from_hex("6464FF"), None);
        assert_eq!(Color::from_hex("#64F"), None);
        assert_eq!(Color::from_hex("#GGGGGG"), None);
        assert_eq!(Color::from_hex("#ééé"), None);
        assert_eq!(Color::from_hex("#+1+2+3"), None);
        assert_eq!(Color::from_hex("#FF00FF+1"), None);
    }

    #[test]
    fn test_frequency_bounds() {
        assert!(validate_frequency(0.01).is_ok());
        assert!(validate_frequency(100.0).is_ok());
        assert!(validate_frequency(0.0).is_err());
        assert!(validate_frequency(100.01).is_err());
        assert!(validate_frequency(f64::NAN).is_err());
    }

    #[test]
    fn test_edge_key_ignores_direction() {
        let a = Edge::new(1, 2, false);
        let b = Edge::new(2, 1, false);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().low(), NodeId(1));
        assert_eq!(a.inverted(), b);
    }

    #[test]
    fn test_rename_endpoint() {
        let mut edge = Edge::new(1, 2, true);
        edge.rename_endpoint(NodeId(2), NodeId(5));
        assert_eq!(edge, Edge::new(1, 5, true));
        assert!(edge.touches(NodeId(5)));
        assert!(!edge.touches(NodeId(2)));
    }
}
