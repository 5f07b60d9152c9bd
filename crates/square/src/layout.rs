//! Non-interactive default rules.
//!
//! A blob of `len` shares starts either at the beginning of a row or at a
//! multiple of the largest power of two not above `len`. Anyone who knows the
//! square size and the blob lengths can therefore tell where each blob is,
//! and the subtrees of a blob's share commitment always sit inside one row.

use da_square_primitives::{square::next_lowest_power_of_two, MAX_SQUARE_SIZE};

use crate::error::LayoutError;

pub(crate) fn check_square_size(k: usize) -> Result<(), LayoutError> {
    if !k.is_power_of_two() {
        return Err(LayoutError::InvalidSquareSize(k));
    }
    if k > MAX_SQUARE_SIZE {
        return Err(LayoutError::SquareTooLarge {
            size: k,
            max: MAX_SQUARE_SIZE,
        });
    }
    Ok(())
}

/// Rounds `cursor` up to the next multiple of `v`.
fn round_up_by(cursor: usize, v: usize) -> usize {
    cursor.div_ceil(v) * v
}

/// Next index at or after `cursor` a message of `msg_len` shares may start
/// at in a square of width `k`. The flag is false when the message, starting
/// there, spills over into the next row.
pub fn next_aligned_power_of_two(
    cursor: usize,
    msg_len: usize,
    k: usize,
) -> Result<(usize, bool), LayoutError> {
    check_square_size(k)?;
    if msg_len == 0 {
        return Err(LayoutError::EmptyMessage);
    }
    if cursor % k == 0 {
        return Ok((cursor, true));
    }

    let next_lowest = next_lowest_power_of_two(msg_len);
    let end_of_row = (cursor / k + 1) * k;
    let aligned = round_up_by(cursor, next_lowest);
    if aligned + msg_len <= end_of_row {
        // all of it fits in this row
        Ok((aligned, true))
    } else if aligned + next_lowest <= end_of_row {
        Ok((aligned, false))
    } else {
        Ok((end_of_row, false))
    }
}

/// Shares used by messages of `msg_lens` placed one after another from
/// `cursor`, alignment gaps included, and where each message starts.
pub fn msg_shares_used_ni_defaults(
    cursor: usize,
    k: usize,
    msg_lens: &[usize],
) -> Result<(usize, Vec<u32>), LayoutError> {
    let start = cursor;
    let mut cursor = cursor;
    let mut indexes = Vec::with_capacity(msg_lens.len());
    for &len in msg_lens {
        (cursor, _) = next_aligned_power_of_two(cursor, len, k)?;
        indexes.push(u32::try_from(cursor).map_err(|_| LayoutError::IndexOverflow(cursor))?);
        cursor += len;
    }
    log::trace!("{} messages from {start} use {} shares", msg_lens.len(), cursor - start);
    Ok((cursor - start, indexes))
}

/// Whether messages of `msg_lens` fit in a `k * k` square once the shares
/// before `cursor` are taken. Also returns the shares the messages use.
pub fn fits_in_square(
    cursor: usize,
    k: usize,
    msg_lens: &[usize],
) -> Result<(bool, usize), LayoutError> {
    check_square_size(k)?;
    let Some(&first) = msg_lens.first() else {
        return Ok((cursor <= k * k, 0));
    };
    // padding between the contiguous shares and the first message
    let (cursor, _) = next_aligned_power_of_two(cursor, first, k)?;
    let (used, _) = msg_shares_used_ni_defaults(cursor, k, msg_lens)?;
    Ok((cursor + used <= k * k, used))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_next_aligned_power_of_two() {
        struct Case {
            cursor: usize,
            msg_len: usize,
            k: usize,
            expected: (usize, bool),
        }
        let cases = [
            // row starts stay put
            Case { cursor: 0, msg_len: 4, k: 4, expected: (0, true) },
            Case { cursor: 8, msg_len: 3, k: 4, expected: (8, true) },
            // aligned to the message length within the row
            Case { cursor: 1, msg_len: 2, k: 4, expected: (2, true) },
            Case { cursor: 3, msg_len: 3, k: 8, expected: (4, true) },
            // aligned, but only the power of two part fits
            Case { cursor: 2, msg_len: 3, k: 4, expected: (2, false) },
            Case { cursor: 5, msg_len: 6, k: 8, expected: (8, false) },
            // nothing fits, move to the next row
            Case { cursor: 3, msg_len: 2, k: 4, expected: (4, false) },
            Case { cursor: 3, msg_len: 8, k: 4, expected: (4, false) },
            Case { cursor: 11, msg_len: 16, k: 16, expected: (16, false) },
        ];
        for case in cases {
            assert_eq!(
                next_aligned_power_of_two(case.cursor, case.msg_len, case.k).unwrap(),
                case.expected,
                "cursor {} len {} k {}",
                case.cursor,
                case.msg_len,
                case.k
            );
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            next_aligned_power_of_two(1, 1, 3),
            Err(LayoutError::InvalidSquareSize(3))
        );
        assert_eq!(
            next_aligned_power_of_two(1, 0, 4),
            Err(LayoutError::EmptyMessage)
        );
        assert_eq!(fits_in_square(0, 0, &[]), Err(LayoutError::InvalidSquareSize(0)));
        assert_eq!(
            fits_in_square(0, 1 << 32, &[1]),
            Err(LayoutError::SquareTooLarge {
                size: 1 << 32,
                max: MAX_SQUARE_SIZE
            })
        );
    }

    #[test]
    fn test_msg_shares_used() {
        assert_eq!(msg_shares_used_ni_defaults(0, 4, &[]).unwrap(), (0, vec![]));
        assert_eq!(
            msg_shares_used_ni_defaults(1, 4, &[1, 2, 4]).unwrap(),
            (7, vec![1, 2, 4])
        );
        // a gap before the second message
        assert_eq!(
            msg_shares_used_ni_defaults(0, 8, &[3, 4]).unwrap(),
            (8, vec![0, 4])
        );
        assert_eq!(
            msg_shares_used_ni_defaults(2, 4, &[3, 3]).unwrap(),
            (7, vec![2, 6])
        );
    }

    #[test]
    fn test_fits_in_square() {
        assert_eq!(fits_in_square(16, 4, &[]).unwrap(), (true, 0));
        assert_eq!(fits_in_square(17, 4, &[]).unwrap(), (false, 0));
        assert_eq!(fits_in_square(1, 4, &[15]).unwrap(), (false, 15));
        assert_eq!(fits_in_square(4, 4, &[12]).unwrap(), (true, 12));
        assert_eq!(fits_in_square(1, 2, &[1, 1, 1]).unwrap(), (true, 3));
        assert_eq!(fits_in_square(1, 2, &[2]).unwrap(), (true, 2));
        assert_eq!(fits_in_square(3, 2, &[2]).unwrap(), (false, 2));
    }

    fn power_of_two() -> impl Strategy<Value = usize> {
        (0u32..7).prop_map(|e| 1usize << e)
    }

    proptest! {
        #[test]
        fn test_alignment_correctness(
            (k, cursor, msg_len) in power_of_two().prop_flat_map(|k| {
                (Just(k), 0..k * k, 1..=k * k)
            })
        ) {
            let (index, _) = next_aligned_power_of_two(cursor, msg_len, k).unwrap();
            prop_assert!(index >= cursor);
            let p = next_lowest_power_of_two(msg_len);
            prop_assert!(index % p == 0 || index % k == 0);
            // never past the start of the next row
            prop_assert!(index <= (cursor / k + 1) * k);
        }

        #[test]
        fn test_fit_monotonicity(
            (k, cursor, lens) in power_of_two().prop_flat_map(|k| {
                (Just(k), 0..=k * k, prop::collection::vec(1..=k * k, 0..5))
            })
        ) {
            let (fits, _) = fits_in_square(cursor, k, &lens).unwrap();
            if fits {
                for bigger in [2 * k, 4 * k] {
                    prop_assert!(fits_in_square(cursor, bigger, &lens).unwrap().0);
                    prop_assert!(fits_in_square(cursor * bigger / k, bigger, &lens).unwrap().0);
                }
            }
            if lens.is_empty() {
                prop_assert_eq!(fits, cursor <= k * k);
            }
        }
    }
}
