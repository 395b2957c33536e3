use proptest::prelude::*;

use bc_transaction::{Transaction, TransactionInput, TransactionOutput};

fn arb_input() -> impl Strategy<Value = TransactionInput> {
    (
        prop::array::uniform32(any::<u8>()),
        any::<u32>(),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(source_txid, source_tx_out_index, sequence_number, unlocking_script)| {
            TransactionInput {
                source_txid,
                source_tx_out_index,
                sequence_number,
                unlocking_script,
            }
        })
}

fn arb_output() -> impl Strategy<Value = TransactionOutput> {
    (any::<u64>(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(
        |(satoshis, locking_script)| TransactionOutput {
            satoshis,
            locking_script,
        },
    )
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        any::<u32>(),
        prop::collection::vec(arb_input(), 0..4),
        prop::collection::vec(arb_output(), 0..4),
        any::<u32>(),
    )
        .prop_map(|(version, inputs, outputs, lock_time)| Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transaction_bytes_round_trip(tx in arb_transaction()) {
        let bytes = tx.to_bytes();
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(parsed, tx);
    }

    #[test]
    fn transaction_hex_round_trip(tx in arb_transaction()) {
        let parsed = Transaction::from_hex(&tx.to_hex()).unwrap();
        prop_assert_eq!(parsed.to_hex(), tx.to_hex());
    }
}
