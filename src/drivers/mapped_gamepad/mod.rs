pub mod driver;
pub mod event;

#[cfg(test)]
pub mod driver_test;
