//! The streaming pipeline: capture thread → frame ring → chunk assembly →
//! transcription → hook dispatch.
//!
//! The capture thread pushes raw frames into a bounded drop-oldest ring so a
//! hardware-driven producer never blocks on downstream work. A single worker
//! thread assembles fixed-duration chunks, transcribes them in order (one
//! inference in flight at a time), and hands each result to the dispatcher.

pub mod assembler;
pub mod orchestrator;
pub mod ring;
pub mod types;

pub use assembler::{AssemblerState, ChunkAssembler, ChunkAssemblerConfig};
pub use orchestrator::{Session, SessionConfig, SessionHandle, SessionSummary};
pub use ring::FrameRing;
pub use types::{AudioChunk, AudioFrame};
