//! CLI Exit Code Registry
//!
//! Single source of truth for `capledger` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (IO, serialization)                        |
//! | 2    | Usage error (bad arguments, unparseable dates)           |
//! | 3    | Verification found at least one warn/fail interval       |
//! | 4    | Dataset invalid (parse, ordering, settings)              |
//! | 5    | Requested date precedes the first anchor                 |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - IO or output failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

/// `verify` completed but at least one interval warned or failed.
pub const EXIT_DISCREPANCIES: u8 = 3;

/// Dataset could not be parsed or failed validation.
pub const EXIT_DATASET_INVALID: u8 = 4;

/// No anchor at or before the requested date.
pub const EXIT_NOT_COVERED: u8 = 5;

/// Exit code for an engine load error.
pub fn ledger_exit_code(err: &capledger_recon::LedgerError) -> u8 {
    use capledger_recon::LedgerError;
    match err {
        LedgerError::Io(_) => EXIT_ERROR,
        LedgerError::ConfigParse(_)
        | LedgerError::ConfigValidation(_)
        | LedgerError::DatasetParse(_)
        | LedgerError::SnapshotOrder { .. }
        | LedgerError::DuplicateSnapshot(_)
        | LedgerError::EventOrder { .. }
        | LedgerError::InvalidSplitRatio(_) => EXIT_DATASET_INVALID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capledger_recon::LedgerError;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_DISCREPANCIES,
            EXIT_DATASET_INVALID,
            EXIT_NOT_COVERED,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn load_errors_map_to_dataset_invalid() {
        assert_eq!(ledger_exit_code(&LedgerError::DatasetParse("x".into())), EXIT_DATASET_INVALID);
        assert_eq!(ledger_exit_code(&LedgerError::InvalidSplitRatio("x".into())), EXIT_DATASET_INVALID);
        assert_eq!(ledger_exit_code(&LedgerError::Io("x".into())), EXIT_ERROR);
    }
}
