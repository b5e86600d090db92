pub mod edit;
pub mod playback;
pub mod utils;
pub mod view;
