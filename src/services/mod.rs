pub mod bridge;
pub mod gateway;
pub mod genie;
pub mod poller;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;
