//! Named transform ids (IANA "IKEv2 Transform Type N Transform IDs") and a
//! lookup table between them and [`Transform`] values.

use crate::sa::{Attribute, Transform, TransformType};

/// Transform Type 1
pub mod encr {
    pub const DES3: u16 = 3;
    pub const AES_CBC: u16 = 12;
    pub const AES_CTR: u16 = 13;
    pub const AES_CCM_8: u16 = 14;
    pub const AES_CCM_12: u16 = 15;
    pub const AES_CCM_16: u16 = 16;
    pub const AES_GCM_8: u16 = 18;
    pub const AES_GCM_12: u16 = 19;
    pub const AES_GCM_16: u16 = 20;
    pub const CAMELLIA_CBC: u16 = 23;
    pub const CHACHA20_POLY1305: u16 = 28;
}

/// Transform Type 2
pub mod prf {
    pub const HMAC_SHA1: u16 = 2;
    pub const AES128_XCBC: u16 = 4;
    pub const HMAC_SHA2_256: u16 = 5;
    pub const HMAC_SHA2_384: u16 = 6;
    pub const HMAC_SHA2_512: u16 = 7;
    pub const AES128_CMAC: u16 = 8;
}

/// Transform Type 3
pub mod integ {
    pub const HMAC_SHA1_96: u16 = 2;
    pub const AES_XCBC_96: u16 = 5;
    pub const AES_CMAC_96: u16 = 8;
    pub const HMAC_SHA2_256_128: u16 = 12;
    pub const HMAC_SHA2_384_192: u16 = 13;
    pub const HMAC_SHA2_512_256: u16 = 14;
}

/// Transform Type 4, also the group number carried by a Key Exchange
/// payload.
pub mod dh {
    pub const MODP_2048: u16 = 14;
    pub const MODP_3072: u16 = 15;
    pub const MODP_4096: u16 = 16;
    pub const MODP_6144: u16 = 17;
    pub const MODP_8192: u16 = 18;
    pub const ECP_256: u16 = 19;
    pub const ECP_384: u16 = 20;
    pub const ECP_521: u16 = 21;
    pub const BRAINPOOL_P256R1: u16 = 28;
    pub const BRAINPOOL_P384R1: u16 = 29;
    pub const BRAINPOOL_P512R1: u16 = 30;
    pub const CURVE25519: u16 = 31;
    pub const CURVE448: u16 = 32;
    // private use range
    pub const NTRU_128: u16 = 1031;
    pub const NTRU_192: u16 = 1032;
    pub const NTRU_256: u16 = 1033;
    pub const NEWHOPE_128: u16 = 1040;
}

/// Transform Type 5
pub mod esn {
    pub const NONE: u16 = 0;
    pub const ENABLED: u16 = 1;
}

macro_rules! known_transforms {
    ($($name:ident => ($ttype:ident, $id:expr, $keylen:expr),)*) => {
        /// Algorithms with a well-known (type, id, key length) triple.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum KnownTransform {
            $($name,)*
        }

        impl KnownTransform {
            pub const ALL: &'static [KnownTransform] = &[$(KnownTransform::$name,)*];

            /// (type, id, key length in bits)
            pub fn triple(self) -> (TransformType, u16, Option<u16>) {
                match self {
                    $(KnownTransform::$name => (TransformType::$ttype, $id, $keylen),)*
                }
            }
        }
    };
}

known_transforms! {
    EncrDes3 => (EncryptionAlgorithm, encr::DES3, None),
    EncrAesCbc128 => (EncryptionAlgorithm, encr::AES_CBC, Some(128)),
    EncrAesCbc192 => (EncryptionAlgorithm, encr::AES_CBC, Some(192)),
    EncrAesCbc256 => (EncryptionAlgorithm, encr::AES_CBC, Some(256)),
    EncrAesCtr128 => (EncryptionAlgorithm, encr::AES_CTR, Some(128)),
    EncrAesCtr192 => (EncryptionAlgorithm, encr::AES_CTR, Some(192)),
    EncrAesCtr256 => (EncryptionAlgorithm, encr::AES_CTR, Some(256)),
    EncrAesCcm8_128 => (EncryptionAlgorithm, encr::AES_CCM_8, Some(128)),
    EncrAesCcm8_192 => (EncryptionAlgorithm, encr::AES_CCM_8, Some(192)),
    EncrAesCcm8_256 => (EncryptionAlgorithm, encr::AES_CCM_8, Some(256)),
    EncrAesCcm12_128 => (EncryptionAlgorithm, encr::AES_CCM_12, Some(128)),
    EncrAesCcm12_192 => (EncryptionAlgorithm, encr::AES_CCM_12, Some(192)),
    EncrAesCcm12_256 => (EncryptionAlgorithm, encr::AES_CCM_12, Some(256)),
    EncrAesCcm16_128 => (EncryptionAlgorithm, encr::AES_CCM_16, Some(128)),
    EncrAesCcm16_192 => (EncryptionAlgorithm, encr::AES_CCM_16, Some(192)),
    EncrAesCcm16_256 => (EncryptionAlgorithm, encr::AES_CCM_16, Some(256)),
    EncrAesGcm8_128 => (EncryptionAlgorithm, encr::AES_GCM_8, Some(128)),
    EncrAesGcm8_192 => (EncryptionAlgorithm, encr::AES_GCM_8, Some(192)),
    EncrAesGcm8_256 => (EncryptionAlgorithm, encr::AES_GCM_8, Some(256)),
    EncrAesGcm12_128 => (EncryptionAlgorithm, encr::AES_GCM_12, Some(128)),
    EncrAesGcm12_192 => (EncryptionAlgorithm, encr::AES_GCM_12, Some(192)),
    EncrAesGcm12_256 => (EncryptionAlgorithm, encr::AES_GCM_12, Some(256)),
    EncrAesGcm16_128 => (EncryptionAlgorithm, encr::AES_GCM_16, Some(128)),
    EncrAesGcm16_192 => (EncryptionAlgorithm, encr::AES_GCM_16, Some(192)),
    EncrAesGcm16_256 => (EncryptionAlgorithm, encr::AES_GCM_16, Some(256)),
    EncrCamelliaCbc128 => (EncryptionAlgorithm, encr::CAMELLIA_CBC, Some(128)),
    EncrCamelliaCbc192 => (EncryptionAlgorithm, encr::CAMELLIA_CBC, Some(192)),
    EncrCamelliaCbc256 => (EncryptionAlgorithm, encr::CAMELLIA_CBC, Some(256)),
    EncrChacha20Poly1305 => (EncryptionAlgorithm, encr::CHACHA20_POLY1305, None),

    PrfHmacSha1 => (PseudoRandomFunction, prf::HMAC_SHA1, None),
    PrfAes128Xcbc => (PseudoRandomFunction, prf::AES128_XCBC, None),
    PrfHmacSha2_256 => (PseudoRandomFunction, prf::HMAC_SHA2_256, None),
    PrfHmacSha2_384 => (PseudoRandomFunction, prf::HMAC_SHA2_384, None),
    PrfHmacSha2_512 => (PseudoRandomFunction, prf::HMAC_SHA2_512, None),
    PrfAes128Cmac => (PseudoRandomFunction, prf::AES128_CMAC, None),

    IntegHmacSha1_96 => (IntegrityAlgorithm, integ::HMAC_SHA1_96, None),
    IntegAesXcbc96 => (IntegrityAlgorithm, integ::AES_XCBC_96, None),
    IntegAesCmac96 => (IntegrityAlgorithm, integ::AES_CMAC_96, None),
    IntegHmacSha2_256_128 => (IntegrityAlgorithm, integ::HMAC_SHA2_256_128, None),
    IntegHmacSha2_384_192 => (IntegrityAlgorithm, integ::HMAC_SHA2_384_192, None),
    IntegHmacSha2_512_256 => (IntegrityAlgorithm, integ::HMAC_SHA2_512_256, None),

    DhModp2048 => (DiffieHellmanGroup, dh::MODP_2048, None),
    DhModp3072 => (DiffieHellmanGroup, dh::MODP_3072, None),
    DhModp4096 => (DiffieHellmanGroup, dh::MODP_4096, None),
    DhModp6144 => (DiffieHellmanGroup, dh::MODP_6144, None),
    DhModp8192 => (DiffieHellmanGroup, dh::MODP_8192, None),
    DhEcp256 => (DiffieHellmanGroup, dh::ECP_256, None),
    DhEcp384 => (DiffieHellmanGroup, dh::ECP_384, None),
    DhEcp521 => (DiffieHellmanGroup, dh::ECP_521, None),
    DhBrainpoolP256r1 => (DiffieHellmanGroup, dh::BRAINPOOL_P256R1, None),
    DhBrainpoolP384r1 => (DiffieHellmanGroup, dh::BRAINPOOL_P384R1, None),
    DhBrainpoolP512r1 => (DiffieHellmanGroup, dh::BRAINPOOL_P512R1, None),
    DhCurve25519 => (DiffieHellmanGroup, dh::CURVE25519, None),
    DhCurve448 => (DiffieHellmanGroup, dh::CURVE448, None),
    DhNtru128 => (DiffieHellmanGroup, dh::NTRU_128, None),
    DhNtru192 => (DiffieHellmanGroup, dh::NTRU_192, None),
    DhNtru256 => (DiffieHellmanGroup, dh::NTRU_256, None),
    DhNewHope128 => (DiffieHellmanGroup, dh::NEWHOPE_128, None),

    EsnNone => (ExtendedSequenceNumbers, esn::NONE, None),
    EsnEnabled => (ExtendedSequenceNumbers, esn::ENABLED, None),
}

impl KnownTransform {
    /// Build the transform, with a Key Length attribute when the algorithm
    /// takes one.
    pub fn transform(self) -> Transform {
        let (transform_type, transform_id, key_length) = self.triple();
        let mut transform = Transform::new(transform_type, transform_id);
        if let Some(bits) = key_length {
            transform.attributes.push(Attribute::key_length(bits));
        }
        transform
    }

    /// Reverse lookup. A transform carrying attributes other than a single
    /// Key Length is not one of the named algorithms.
    pub fn identify(transform: &Transform) -> Option<Self> {
        let key_length = transform.key_length();
        let expected_attributes = usize::from(key_length.is_some());
        if transform.attributes.len() != expected_attributes {
            return None;
        }
        Self::ALL.iter().copied().find(|known| {
            known.triple() == (transform.transform_type, transform.transform_id, key_length)
        })
    }
}

impl From<KnownTransform> for Transform {
    fn from(known: KnownTransform) -> Self {
        known.transform()
    }
}
