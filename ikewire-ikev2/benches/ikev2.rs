use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ikewire_ikev2::{
    decode, encode, ExchangeType, Header, IkeFlags, KeyExchange, KnownTransform, Notify,
    NotifyType, Packet, Payload, Proposal, ProtocolId,
};

fn ike_sa_init() -> Packet {
    let transforms = [
        KnownTransform::EncrAesCbc128,
        KnownTransform::EncrAesCbc256,
        KnownTransform::EncrAesGcm16_256,
        KnownTransform::EncrChacha20Poly1305,
        KnownTransform::IntegHmacSha2_256_128,
        KnownTransform::IntegHmacSha2_512_256,
        KnownTransform::PrfHmacSha2_256,
        KnownTransform::PrfHmacSha2_512,
        KnownTransform::DhEcp256,
        KnownTransform::DhCurve25519,
        KnownTransform::DhModp2048,
    ];
    Packet {
        header: Header {
            initiator_spi: [0xec, 0xd8, 0x3d, 0x2b, 0x7b, 0x74, 0x04, 0xe6],
            responder_spi: [0; 8],
            version: Header::VERSION_2_0,
            exchange_type: ExchangeType::IkeSaInit,
            flags: IkeFlags::INITIATOR,
            message_id: 0,
        },
        payloads: vec![
            Payload::SecurityAssociation(vec![Proposal {
                proposal_num: 1,
                protocol_id: ProtocolId::Ike,
                spi: Vec::new(),
                transforms: transforms.iter().map(|t| t.transform()).collect(),
            }]),
            Payload::KeyExchange(KeyExchange {
                dh_group: 19,
                data: vec![0x5a; 64],
            }),
            Payload::Nonce(vec![0xa5; 32]),
            Payload::Notify(Notify::with_data(
                NotifyType::NatDetectionSourceIp,
                vec![0x11; 20],
            )),
            Payload::Notify(Notify::with_data(
                NotifyType::NatDetectionDestinationIp,
                vec![0x22; 20],
            )),
            Payload::Notify(Notify::new(NotifyType::Ikev2FragmentationSupported)),
        ],
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let packet = ike_sa_init();
    let bytes = encode(&packet).unwrap();

    c.bench_function("ikev2 encode", |b| b.iter(|| encode(black_box(&packet))));
    c.bench_function("ikev2 decode", |b| b.iter(|| decode(black_box(&bytes))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
