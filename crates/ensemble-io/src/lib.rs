// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Ensemble I/O
//!
//! Getting decoded vectors off the machine:
//! - [`MulticastOutput`]: splits an output vector into keyed packets
//! - [`SdpTransmitter`]: filters incoming vectors and forwards them to the
//!   host as [`SdpMessage`]s every `transmission_delay` ticks
//! - [`P2pTransport`]: where messages go ([`MemoryTransport`], and
//!   `UdpTransport` behind the `udp-transport` feature)
//!
//! ## Usage
//!
//! ```rust
//! use ensemble_io::{MemoryTransport, SdpSource, SdpTransmitter, SdpTxParameters};
//! use ensemble_npu_runtime::DeterministicScheduler;
//!
//! let transport = MemoryTransport::new();
//! let mut scheduler = DeterministicScheduler::new();
//! let mut tx = SdpTransmitter::boot(
//!     &SdpTxParameters::new(2, 1000, 10),
//!     SdpSource { p2p_addr: 0, core_id: 1 },
//!     transport.clone(),
//!     &mut scheduler,
//! )
//! .unwrap();
//!
//! tx.run(&mut scheduler, 100);
//! assert_eq!(transport.len(), 10);
//! ```

pub mod error;
pub mod multicast;
pub mod sdp;
pub mod sdp_tx;
pub mod transport;

pub use error::{Result, SdpDecodeError, SdpTxError, TransportError};
pub use multicast::MulticastOutput;
pub use sdp::{SdpMessage, CMD_HEADER_BYTES, MAX_DIMENSIONS, SDP_HEADER_BYTES};
pub use sdp_tx::{
    SdpSource, SdpTransmitter, SdpTxParameters, TxRunOutcome, TxRunSummary, TxTick,
    UNBOUNDED_TICKS,
};
pub use transport::{MemoryTransport, P2pTransport};

#[cfg(feature = "udp-transport")]
pub use transport::UdpTransport;
