pub mod ad_ideas;
pub mod character;
pub mod final_video;
pub mod scene_images;
