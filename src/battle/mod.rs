pub mod state;
pub mod sweeper;
pub mod tracker;

#[cfg(test)]
mod tests;
