//! Lowering: target normal form → ordered stage chain.
//!
//! 3NF and BCNF are alternative targets that both start from 2NF output;
//! 4NF and 5NF build on BCNF.

use normform_core::prelude::NormalForm;

pub fn stage_chain(target: NormalForm) -> Vec<NormalForm> {
    use NormalForm::*;
    match target {
        First => vec![First],
        Second => vec![First, Second],
        Third => vec![First, Second, Third],
        BoyceCodd => vec![First, Second, BoyceCodd],
        Fourth => vec![First, Second, BoyceCodd, Fourth],
        Fifth => vec![First, Second, BoyceCodd, Fourth, Fifth],
    }
}
