//! Live config reload: the file watcher plus load and validate.

mod manager;

#[cfg(test)]
mod tests;

pub use manager::ReloadManager;
