// Seams to the external collaborators: camera acquisition and the
// pose-estimation model

pub mod camera;
pub mod pose;
