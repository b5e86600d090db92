pub mod cli;
pub mod playback;
pub mod provider;
pub mod state;
