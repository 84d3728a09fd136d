//! # OscNet-RS: Oscillator Network Editor Core
//!
//! Editing, persistence and device communication for networks of coupled
//! oscillators. A network is a graph of oscillator nodes joined by directed
//! or bidirectional couplings; it is uploaded to the oscillator controller as
//! a coupling matrix, and the controller streams back the oscillator voltages.
//!
//! ## Architecture
//!
//! - **Graph**: [`graph::GraphStore`] holds nodes and edges, [`graph::IdAllocator`] keeps node ids dense
//! - **Editor**: [`editor::NetworkEditor`] turns user actions into undoable [`editor::Command`]s
//! - **Protocol**: coupling matrix frames `<0,1;1,0>`, 3-byte telemetry groups, frequency-mode lines
//! - **Link**: [`link::LinkSession`] owns one serial link and runs the ACK handshake
//! - **Acquisition**: a worker thread decodes telemetry every tick and streams samples over crossbeam channels
//! - **Analysis**: spectrum and dominant frequency of a decoded channel
//!
//! ## Configuration
//!
//! Settings are stored in the platform-appropriate data directory under
//! `dev.oscnet.oscnet-rs`:
//!
//! - **Linux**: `~/.local/share/dev.oscnet.oscnet-rs/`
//! - **macOS**: `~/Library/Application Support/dev.oscnet.oscnet-rs/`
//! - **Windows**: `%APPDATA%\dev.oscnet.oscnet-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use oscnet_rs::{AppConfig, LinkSession, MockLink, NetworkEditor};
//!
//! let config = AppConfig::load_or_default();
//! let mut editor = NetworkEditor::from_config(&config);
//!
//! let a = editor.add_node(Some(1.0), None)?;
//! let b = editor.add_node(Some(1.5), None)?;
//! editor.add_edge(a, b, None)?;
//!
//! let mut session = LinkSession::open(Box::new(MockLink::new("mock").with_auto_ack()), config.link.clone())?;
//! session.transmit_matrix(&editor.coupling_matrix())?;
//! ```

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod editor;
pub mod error;
pub mod graph;
pub mod history;
pub mod link;
pub mod protocol;
pub mod types;

// Re-export commonly used types
pub use acquisition::{AcquisitionBackend, AcquisitionHandle, AcquisitionMessage, SampleRecorder};
pub use config::{AppConfig, NetworkFile};
pub use editor::{Command, NetworkEditor};
pub use error::{EditRejection, OscNetError, Result};
pub use graph::{GraphStore, IdAllocator};
pub use history::{CommandHistory, Reversible};
pub use link::{LinkSession, MockLink, SerialLink};
pub use protocol::{CouplingMatrix, SampleStreamDecoder};
pub use types::{Color, Edge, EdgeKey, Node, NodeId, Position};
