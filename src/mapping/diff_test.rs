use std::error::Error;

use crate::mapping::{
    diff::{report_diff, Diff},
    selector::{choose_candidate, find_single_bit_change, Candidate},
};

fn diff(index: usize, before: u8, after: u8) -> Diff {
    Diff {
        index,
        before,
        after,
        xor: before ^ after,
    }
}

#[tokio::test]
async fn test_identical_reports() -> Result<(), Box<dyn Error>> {
    let report = [0x01, 0x80, 0x7f, 0x00, 0xff];
    assert!(report_diff(&report, &report).is_empty());
    assert!(report_diff(&[], &[]).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_changed_indices() -> Result<(), Box<dyn Error>> {
    let a = [0x00, 0x10, 0x20, 0x30];
    let b = [0x00, 0x11, 0x20, 0xf0];
    let diffs = report_diff(&a, &b);
    println!("Diffs: {diffs:?}");
    assert_eq!(diffs, vec![diff(1, 0x10, 0x11), diff(3, 0x30, 0xf0)]);
    assert_eq!(diffs[1].xor, 0xc0);

    Ok(())
}

#[tokio::test]
async fn test_unequal_lengths_pad_with_zero() -> Result<(), Box<dyn Error>> {
    let short = [0x05];
    let long = [0x05, 0x00, 0x09];
    assert_eq!(report_diff(&short, &long), vec![diff(2, 0x00, 0x09)]);
    assert_eq!(report_diff(&long, &short), vec![diff(2, 0x09, 0x00)]);

    Ok(())
}

#[tokio::test]
async fn test_choose_single_bit() -> Result<(), Box<dyn Error>> {
    // Axis jitter at byte 1, a button bit at byte 6
    let diffs = vec![diff(1, 0x80, 0x83), diff(6, 0x00, 0x02), diff(9, 0x00, 0x30)];
    let candidate = choose_candidate(&diffs);
    assert_eq!(candidate, Some(Candidate { index: 6, xor: 0x02 }));

    Ok(())
}

#[tokio::test]
async fn test_choose_first_single_bit() -> Result<(), Box<dyn Error>> {
    let diffs = vec![diff(3, 0x00, 0x40), diff(6, 0x00, 0x02)];
    assert_eq!(
        choose_candidate(&diffs),
        Some(Candidate {
            index: 3,
            xor: 0x40
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_choose_fewest_bits() -> Result<(), Box<dyn Error>> {
    // No single-bit change: 0x07 has three bits, 0x30 and 0x0c two each
    let diffs = vec![diff(2, 0x00, 0x07), diff(4, 0x00, 0x30), diff(5, 0x00, 0x0c)];
    assert_eq!(
        choose_candidate(&diffs),
        Some(Candidate {
            index: 4,
            xor: 0x30
        })
    );
    assert_eq!(choose_candidate(&[]), None);

    Ok(())
}

#[tokio::test]
async fn test_find_single_bit_change() -> Result<(), Box<dyn Error>> {
    let prev = [0x00, 0x80, 0x00, 0x00];
    let cur = [0x00, 0x7f, 0x00, 0x20, 0x01];
    assert_eq!(
        find_single_bit_change(&prev, &cur),
        Some(Candidate {
            index: 3,
            xor: 0x20
        })
    );
    assert_eq!(find_single_bit_change(&prev, &prev), None);

    Ok(())
}
