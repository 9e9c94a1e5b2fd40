// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Property tests for transmission cadence and the wire format

use ensemble_io::{MemoryTransport, SdpMessage, SdpSource, SdpTransmitter, SdpTxParameters};
use ensemble_npu_neural::S1615;
use ensemble_npu_runtime::{DeterministicScheduler, FilterRoute, FilterSpec};
use proptest::prelude::*;

proptest! {
    #[test]
    fn messages_follow_the_delay(delay in 1u32..20, runs in prop::collection::vec(0u32..60, 1..4)) {
        let transport = MemoryTransport::new();
        let mut scheduler = DeterministicScheduler::new();
        let mut tx = SdpTransmitter::boot(
            &SdpTxParameters::new(1, 1000, delay),
            SdpSource::default(),
            transport.clone(),
            &mut scheduler,
        ).unwrap();

        // The counter is not reset between runs
        let mut total = 0u64;
        for ticks in runs {
            total += tx.run(&mut scheduler, ticks).ticks;
        }
        prop_assert_eq!(transport.len() as u64, total / u64::from(delay));
    }

    #[test]
    fn wire_form_decodes_to_the_sent_vector(
        bits in prop::collection::vec(any::<i32>(), 0..64),
        p2p_addr in any::<u16>(),
        core_id in 1u8..18,
    ) {
        let mut message = SdpMessage::to_host(p2p_addr, core_id, bits.len());
        message.data = bits.iter().map(|&b| S1615::from_bits(b)).collect();
        let bytes = message.to_bytes();
        prop_assert_eq!(bytes.len(), 24 + 4 * bits.len());
        prop_assert_eq!(SdpMessage::decode(&bytes).unwrap(), message);
    }
}

#[test]
fn test_latched_vector_is_resent_until_replaced() {
    let route = FilterRoute {
        key: 0x0400_0000,
        mask: 0xFFFF_0000,
        filter_index: 0,
        dimension_mask: 0x0000_FFFF,
    };
    let params = SdpTxParameters::new(1, 1000, 2)
        .with_input_filters(vec![FilterSpec::pass_through(1).latching()], vec![route]);
    let transport = MemoryTransport::new();
    let mut scheduler = DeterministicScheduler::new();
    let mut tx =
        SdpTransmitter::boot(&params, SdpSource::default(), transport.clone(), &mut scheduler)
            .unwrap();

    scheduler.inject_packet_before_tick(0, 0x0400_0000, S1615::from_f32(0.75));
    scheduler.inject_packet_before_tick(4, 0x0400_0000, S1615::from_f32(-0.25));
    tx.run(&mut scheduler, 6);

    let values: Vec<f32> = transport.sent().iter().map(|m| m.data[0].to_f32()).collect();
    assert_eq!(values, vec![0.75, 0.75, -0.25]);
}
