use std::error::Error;

use crate::mapping::profiler::{
    byte_statistics, most_variable_byte, profile, ProfilerThresholds,
};

#[tokio::test]
async fn test_most_variable_byte() -> Result<(), Box<dyn Error>> {
    let window = vec![
        vec![0u8, 0, 0, 0],
        vec![0, 32, 0, 0],
        vec![0, 64, 0, 0],
        vec![0, 0, 0, 0],
    ];
    assert_eq!(most_variable_byte(&window), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_most_variable_byte_edge_cases() -> Result<(), Box<dyn Error>> {
    let empty: Vec<Vec<u8>> = vec![];
    assert_eq!(most_variable_byte(&empty), None);
    assert_eq!(most_variable_byte(&[Vec::<u8>::new()]), None);

    // Nothing moves: first index wins
    let flat = vec![vec![3u8, 3, 3], vec![3, 3, 3]];
    assert_eq!(most_variable_byte(&flat), Some(0));

    Ok(())
}

#[tokio::test]
async fn test_byte_statistics() -> Result<(), Box<dyn Error>> {
    // The short report reads as zero at index 1
    let window = vec![vec![10u8, 4], vec![20]];
    let stats = byte_statistics(&window);
    println!("Stats: {stats:?}");
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].mean, 15.0);
    assert_eq!(stats[0].variance, 25.0);
    assert_eq!(stats[1].mean, 2.0);
    assert_eq!(stats[1].variance, 4.0);

    Ok(())
}

#[tokio::test]
async fn test_profile() -> Result<(), Box<dyn Error>> {
    // byte 0: constant zero, byte 1: battery-like, byte 2: gyro-like
    let window = vec![
        vec![0u8, 200, 10],
        vec![0, 201, 90],
        vec![0, 200, 30],
        vec![0, 199, 120],
    ];
    let result = profile(&window, &ProfilerThresholds::default());
    println!("Profile: {result:?}");
    assert!(!result.steady_candidates.contains(&0));
    assert!(result.steady_candidates.contains(&1));
    assert!(!result.variable_candidates.contains(&1));
    assert!(result.variable_candidates.contains(&2));

    Ok(())
}
