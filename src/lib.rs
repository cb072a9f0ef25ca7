pub mod api;
pub mod cli;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod listener;
pub mod logging;
pub mod service;
pub mod synchronizer;
