pub mod assignment;
pub mod priority_compare;
pub mod scheduler;

#[cfg(test)]
mod test_scheduler;
