pub mod banner;
pub mod banner_frames;
