use proptest::prelude::*;

use bc_primitives::chainhash::Hash;
use bc_primitives::util::{reverse_hex_string, u32_to_le_bytes, VarInt};

proptest! {
    #[test]
    fn varint_round_trips(v in any::<u64>()) {
        let bytes = VarInt(v).to_bytes();
        prop_assert_eq!(bytes.len(), VarInt(v).length());
        let (decoded, size) = VarInt::from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded.value(), v);
        prop_assert_eq!(size, bytes.len());
    }

    #[test]
    fn hash_hex_round_trips(bytes in prop::array::uniform32(any::<u8>())) {
        let h = Hash::new(bytes);
        let parsed = Hash::from_hex(&h.to_string()).unwrap();
        prop_assert_eq!(h, parsed);
    }

    #[test]
    fn even_hex_reversal_is_an_involution(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let s = hex::encode(&bytes);
        prop_assert_eq!(reverse_hex_string(&reverse_hex_string(&s)), s);
    }

    #[test]
    fn odd_hex_reversal_restores_padded_form(bytes in prop::collection::vec(any::<u8>(), 1..64)) {
        // Strip the leading nibble to get an odd-length string.
        let s = &hex::encode(&bytes)[1..];
        let twice = reverse_hex_string(&reverse_hex_string(s));
        prop_assert_eq!(twice.len(), s.len() + 1);
        prop_assert_eq!(&twice[1..], s);
    }

    #[test]
    fn u32_le_round_trips(v in any::<u32>()) {
        prop_assert_eq!(u32::from_le_bytes(u32_to_le_bytes(v)), v);
    }
}
